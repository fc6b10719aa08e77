//! Scrape orchestration.
//!
//! The orchestrator drives the pipeline over one browser session: load the
//! index, discover chapter URLs, then per chapter run
//! extract → validate → persist. Chapters fail independently; only an
//! unreadable index (or a dead browser session) aborts the run.

use std::sync::Arc;

use crate::app::Result;
use crate::browser::PageSession;
use crate::config::Config;
use crate::domain::{Chapter, ChapterOutcome, Outcome, RunReport, Stage};
use crate::extractor::Extractor;
use crate::fetcher::ImageFetcher;
use crate::store::Store;
use crate::validator::validate;

pub struct Scraper<S> {
    extractor: Extractor,
    store: Arc<S>,
    /// Re-extract chapters that are already stored; their children are
    /// replaced on upsert. Without it, known chapters are skipped before
    /// the expensive interactive phase.
    refresh: bool,
}

impl<S: Store> Scraper<S> {
    pub fn new(
        session: Arc<dyn PageSession>,
        images: Arc<dyn ImageFetcher>,
        store: Arc<S>,
        config: Config,
        refresh: bool,
    ) -> Self {
        Self {
            extractor: Extractor::new(session, images, config),
            store,
            refresh,
        }
    }

    /// Run the full pipeline.
    ///
    /// With `urls` given, only those chapters are scraped; otherwise the
    /// list is discovered from the index page. Index discovery failure is
    /// fatal; everything after it is chapter-scoped.
    pub async fn run(&self, urls: Option<Vec<String>>) -> Result<RunReport> {
        let urls = match urls {
            Some(urls) => {
                tracing::info!("Using provided list of {} chapter URLs", urls.len());
                urls
            }
            None => self.extractor.discover_chapter_urls().await?,
        };

        let mut report = RunReport::default();
        if urls.is_empty() {
            tracing::warn!("No chapter URLs to scrape");
            return Ok(report);
        }

        let total = urls.len();
        for (index, url) in urls.iter().enumerate() {
            tracing::info!("Processing chapter [{}/{}]: {}", index + 1, total, url);

            let outcome = self.process_chapter(url).await;
            match &outcome.result {
                Outcome::Persisted {
                    questions,
                    images_missing,
                } => {
                    if *images_missing > 0 {
                        tracing::warn!(
                            "Persisted {} with {} questions, {} images missing",
                            url,
                            questions,
                            images_missing
                        );
                    } else {
                        tracing::info!("Persisted {} with {} questions", url, questions);
                    }
                }
                Outcome::Skipped => {
                    tracing::info!("Chapter already stored, skipping: {}", url);
                }
                Outcome::Failed { stage, message } => {
                    tracing::error!("Chapter {} failed while {}: {}", url, stage, message);
                }
            }
            report.record(outcome);
        }

        tracing::info!(
            "Scrape finished: {} persisted ({} partial), {} failed, {} total",
            report.persisted_count(),
            report.partial_count(),
            report.failure_count(),
            report.outcomes.len()
        );
        Ok(report)
    }

    /// Take one chapter through Extracting → Validating → Persisting.
    /// Never returns an error: every failure is folded into the outcome.
    async fn process_chapter(&self, url: &str) -> ChapterOutcome {
        let failed = |stage: Stage, message: String| ChapterOutcome {
            url: url.to_string(),
            result: Outcome::Failed { stage, message },
        };

        if !self.refresh {
            match self.store.chapter_exists(&Chapter::generate_key(url)) {
                Ok(true) => {
                    return ChapterOutcome {
                        url: url.to_string(),
                        result: Outcome::Skipped,
                    }
                }
                Ok(false) => {}
                Err(e) => return failed(Stage::Persisting, e.to_string()),
            }
        }

        let chapter = match self.extractor.extract_chapter(url).await {
            Ok(chapter) => chapter,
            Err(e) => return failed(Stage::Extracting, e.to_string()),
        };

        let questions = chapter.questions.len();
        let images_missing = chapter.missing_image_count();

        let valid = match validate(chapter) {
            Ok(valid) => valid,
            Err(e) => return failed(Stage::Validating, e.to_string()),
        };

        if let Err(e) = self.store.upsert_chapter(&valid) {
            return failed(Stage::Persisting, e.to_string());
        }

        ChapterOutcome {
            url: url.to_string(),
            result: Outcome::Persisted {
                questions,
                images_missing,
            },
        }
    }
}

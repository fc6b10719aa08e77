//! Chapter extraction.
//!
//! Extraction is a two-phase read. Phase one is static: the DOM snapshot
//! and the embedded script state are read into [`RawPageData`] and
//! reconciled into a candidate chapter, and referenced images are fetched
//! concurrently. Phase two is interactive: the quiz is answered to reach
//! the results page, where the per-question explanations and the
//! authoritative correct-answer markers live.
//!
//! All scripts run in the page through [`PageSession::evaluate`]; the
//! extractor only generates them.

mod driver;
mod page_data;

pub use driver::QuizDriver;
pub use page_data::{DomSnapshot, RawPageData, ScriptModule};

use std::sync::Arc;

use serde::Deserialize;

use crate::app::{Result, SignpostError};
use crate::browser::PageSession;
use crate::config::Config;
use crate::domain::Chapter;
use crate::fetcher::{fetch_indexed, ImageFetcher};

/// One carousel card on the results page.
#[derive(Debug, Clone, Default, Deserialize)]
struct ExplanationCard {
    number: Option<String>,
    correct: Option<String>,
    #[serde(default)]
    explanation: String,
}

pub struct Extractor {
    session: Arc<dyn PageSession>,
    images: Arc<dyn ImageFetcher>,
    config: Config,
}

impl Extractor {
    pub fn new(
        session: Arc<dyn PageSession>,
        images: Arc<dyn ImageFetcher>,
        config: Config,
    ) -> Self {
        Self {
            session,
            images,
            config,
        }
    }

    /// Discover the ordered list of chapter URLs from the index page.
    ///
    /// Any failure here is an index-load error: with no chapter list there
    /// is nothing to scrape and the run aborts.
    pub async fn discover_chapter_urls(&self) -> Result<Vec<String>> {
        let index_url = self.config.scrape.index_url();

        self.session
            .navigate(&index_url)
            .await
            .map_err(|e| SignpostError::IndexLoad(e.to_string()))?;
        self.session
            .wait_for("body", self.config.scrape.timeout())
            .await
            .map_err(|e| SignpostError::IndexLoad(e.to_string()))?;

        // Chapter links hide behind collapsed accordions.
        let expanded: i64 = serde_json::from_value(
            self.session
                .evaluate(&self.expand_accordions_script())
                .await
                .map_err(|e| SignpostError::IndexLoad(e.to_string()))?,
        )
        .unwrap_or(0);
        tracing::debug!("Expanded {} collapsed accordions on the index page", expanded);
        tokio::time::sleep(self.config.scrape.wait_after_load()).await;

        let hrefs: Vec<String> = serde_json::from_value(
            self.session
                .evaluate(&self.chapter_links_script())
                .await
                .map_err(|e| SignpostError::IndexLoad(e.to_string()))?,
        )
        .map_err(|e| SignpostError::IndexLoad(format!("Malformed link list: {}", e)))?;

        let urls: Vec<String> = hrefs
            .iter()
            .map(|href| self.config.scrape.absolutize(href))
            .collect();

        if urls.is_empty() {
            tracing::warn!("No chapter URLs found on {}", index_url);
        } else {
            tracing::info!("Discovered {} chapter URLs", urls.len());
        }
        Ok(urls)
    }

    /// Extract one chapter from its quiz page.
    ///
    /// Failures are chapter-scoped extraction errors; image fetch failures
    /// degrade to questions without images instead.
    pub async fn extract_chapter(&self, url: &str) -> Result<Chapter> {
        self.session
            .navigate(url)
            .await
            .map_err(|e| SignpostError::Extraction(e.to_string()))?;
        self.session
            .wait_for(&self.config.selectors.title, self.config.scrape.timeout())
            .await
            .map_err(|e| SignpostError::Extraction(e.to_string()))?;

        let raw = self.read_raw_page_data().await?;
        let mut chapter = raw.reconcile(url, &self.config.scrape)?;
        tracing::info!(
            "Extracted chapter '{}' with {} questions",
            chapter.display_title(),
            chapter.questions.len()
        );

        self.attach_images(&mut chapter).await;
        self.reveal_explanations(&mut chapter).await?;

        Ok(chapter)
    }

    async fn read_raw_page_data(&self) -> Result<RawPageData> {
        let dom: DomSnapshot = serde_json::from_value(
            self.session
                .evaluate(&self.dom_snapshot_script())
                .await
                .map_err(|e| SignpostError::Extraction(e.to_string()))?,
        )
        .map_err(|e| SignpostError::Extraction(format!("Malformed DOM snapshot: {}", e)))?;

        let script_value = self
            .session
            .evaluate(Self::module_content_script())
            .await
            .map_err(|e| SignpostError::Extraction(e.to_string()))?;

        let script = if script_value.is_null() {
            None
        } else {
            Some(
                serde_json::from_value(script_value).map_err(|e| {
                    SignpostError::Extraction(format!("Malformed module content: {}", e))
                })?,
            )
        };

        Ok(RawPageData { dom, script })
    }

    /// Fan out fetches for every referenced image and rejoin them to their
    /// questions. A failed fetch leaves the question without an image.
    async fn attach_images(&self, chapter: &mut Chapter) {
        let jobs: Vec<(usize, String)> = chapter
            .questions
            .iter()
            .enumerate()
            .filter_map(|(index, q)| q.image_url.clone().map(|url| (index, url)))
            .collect();

        if jobs.is_empty() {
            return;
        }

        let results = fetch_indexed(
            self.images.clone(),
            jobs,
            self.config.scrape.image_concurrency,
        )
        .await;

        for (index, result) in results {
            match result {
                Ok(image) => chapter.questions[index].image = Some(image),
                Err(e) => {
                    tracing::warn!(
                        "Image for question {} of '{}' skipped: {}",
                        index + 1,
                        chapter.display_title(),
                        e
                    );
                }
            }
        }
    }

    /// Interactive phase: take the quiz, open the results accordion and
    /// read explanation + correct-answer marker for every question.
    async fn reveal_explanations(&self, chapter: &mut Chapter) -> Result<()> {
        let driver = QuizDriver::new(self.session.as_ref(), &self.config.selectors);
        driver
            .run_through(chapter)
            .await
            .map_err(|e| SignpostError::Extraction(e.to_string()))?;
        driver
            .open_results_accordion()
            .await
            .map_err(|e| SignpostError::Extraction(e.to_string()))?;

        self.session
            .wait_for(
                &self.config.selectors.carousel_card,
                self.config.scrape.timeout(),
            )
            .await
            .map_err(|e| SignpostError::Extraction(e.to_string()))?;

        let cards: Vec<ExplanationCard> = serde_json::from_value(
            self.session
                .evaluate(&self.explanations_script())
                .await
                .map_err(|e| SignpostError::Extraction(e.to_string()))?,
        )
        .map_err(|e| SignpostError::Extraction(format!("Malformed results carousel: {}", e)))?;

        if cards.len() != chapter.questions.len() {
            tracing::warn!(
                "Results carousel has {} cards for {} questions in '{}'",
                cards.len(),
                chapter.questions.len(),
                chapter.display_title()
            );
        }

        // Cards attach to questions by carousel order, up to the shorter
        // length on a mismatch.
        for (index, (question, card)) in chapter.questions.iter_mut().zip(cards).enumerate() {
            if let Some(number) = card.number.as_deref() {
                let expected = (index + 1).to_string();
                if !number.contains(&expected) {
                    tracing::warn!(
                        "Carousel card {} is labelled '{}', order may be off",
                        index + 1,
                        number
                    );
                }
            }
            question.explanation = card.explanation.trim().to_string();

            if let Some(correct) = card.correct.as_deref().map(str::trim) {
                // The carousel read is authoritative over the script state.
                // The card text is sometimes prefixed ("Correct answer: ...").
                let matched = question.mark_correct_by_text(correct)
                    || correct
                        .split_once(':')
                        .map(|(_, rest)| question.mark_correct_by_text(rest.trim()))
                        .unwrap_or(false);
                if !matched {
                    tracing::warn!(
                        "Carousel names correct answer '{}' but no choice matches",
                        correct
                    );
                }
            }
        }

        Ok(())
    }

    // --- Script generation -------------------------------------------------

    fn module_content_script() -> &'static str {
        r#"
        (() => {
            return window._rrltModuleContent ?? null;
        })()
        "#
    }

    fn expand_accordions_script(&self) -> String {
        let selector = js_quote(&self.config.selectors.index_accordion_inactive);
        format!(
            r#"
            (() => {{
                const accordions = document.querySelectorAll({selector});
                accordions.forEach(el => el.click());
                return accordions.length;
            }})()
            "#
        )
    }

    fn chapter_links_script(&self) -> String {
        let list = js_quote(&self.config.selectors.index_card_list);
        let card = js_quote(&self.config.selectors.index_card);
        format!(
            r#"
            (() => {{
                const urls = [];
                for (const list of document.querySelectorAll({list})) {{
                    const cards = list.querySelectorAll({card});
                    if (!cards.length) continue;
                    const anchor = cards[cards.length - 1].querySelector('a');
                    if (anchor) {{
                        const href = anchor.getAttribute('href');
                        if (href) urls.push(href);
                    }}
                }}
                return urls;
            }})()
            "#
        )
    }

    fn dom_snapshot_script(&self) -> String {
        let title = js_quote(&self.config.selectors.title);
        let count = js_quote(&self.config.selectors.question_count);
        let no_image = js_quote(&self.config.selectors.question_no_image);
        let with_image = js_quote(&self.config.selectors.question_with_image);
        let image = js_quote(&self.config.selectors.question_image);
        let choice = js_quote(&self.config.selectors.choice_item);
        format!(
            r#"
            (() => {{
                const text = (sel) => {{
                    const el = document.querySelector(sel);
                    return el && el.innerText ? el.innerText.trim() : null;
                }};
                const img = document.querySelector({image});
                const choices = [];
                document.querySelectorAll({choice}).forEach(el => {{
                    if (el.innerText) choices.push(el.innerText.trim());
                }});
                return {{
                    title: text({title}),
                    questionCount: text({count}),
                    prompt: text({no_image}) ?? text({with_image}),
                    image: img ? img.getAttribute('src') : null,
                    choices: choices,
                }};
            }})()
            "#
        )
    }

    fn explanations_script(&self) -> String {
        let card = js_quote(&self.config.selectors.carousel_card);
        let number = js_quote(&self.config.selectors.carousel_question_number);
        let correct = js_quote(&self.config.selectors.carousel_correct_answer);
        let main = js_quote(&self.config.selectors.explanation_main);
        let additional = js_quote(&self.config.selectors.explanation_additional);
        format!(
            r#"
            (() => {{
                const out = [];
                for (const card of document.querySelectorAll({card})) {{
                    const text = (sel) => {{
                        const el = card.querySelector(sel);
                        return el && el.innerText ? el.innerText.trim() : null;
                    }};
                    const parts = [];
                    const main = text({main});
                    if (main) parts.push(main);
                    const extra = text({additional});
                    if (extra) parts.push(extra);
                    out.push({{
                        number: text({number}),
                        correct: text({correct}),
                        explanation: parts.join('\n'),
                    }});
                }}
                return out;
            }})()
            "#
        )
    }
}

fn js_quote(selector: &str) -> String {
    format!("'{}'", selector.replace('\'', "\\'"))
}

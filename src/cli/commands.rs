use std::sync::Arc;

use crate::app::{AppContext, Result, SignpostError};
use crate::browser::ChromeSession;
use crate::domain::{Chapter, Outcome};
use crate::fetcher::HttpImageFetcher;
use crate::scraper::Scraper;
use crate::store::Store;

pub async fn scrape(
    ctx: &AppContext,
    headed: bool,
    refresh: bool,
    urls: Vec<String>,
) -> Result<()> {
    let mut config = ctx.config.clone();
    if headed {
        config.scrape.headless = false;
    }

    let session = Arc::new(ChromeSession::launch(&config.scrape).await?);
    let images = Arc::new(HttpImageFetcher::new(&config.scrape));

    let scraper = Scraper::new(session, images, ctx.store.clone(), config, refresh);
    let urls = if urls.is_empty() { None } else { Some(urls) };

    let report = scraper.run(urls).await?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Outcome::Persisted {
                questions,
                images_missing: 0,
            } => {
                println!("  + {} ({} questions)", outcome.url, questions);
            }
            Outcome::Persisted {
                questions,
                images_missing,
            } => {
                println!(
                    "  ~ {} ({} questions, {} images missing)",
                    outcome.url, questions, images_missing
                );
            }
            Outcome::Skipped => {
                println!("  = {} (already stored)", outcome.url);
            }
            Outcome::Failed { stage, message } => {
                eprintln!("  ! {} ({}: {})", outcome.url, stage, message);
            }
        }
    }

    println!(
        "Scrape complete: {} persisted ({} partial), {} failed",
        report.persisted_count(),
        report.partial_count(),
        report.failure_count()
    );
    Ok(())
}

pub fn list_chapters(ctx: &AppContext) -> Result<()> {
    let chapters = ctx.store.get_all_chapters()?;

    if chapters.is_empty() {
        println!("No chapters stored");
        return Ok(());
    }

    for chapter in chapters {
        println!(
            "{} ({} questions)\n  {}",
            chapter.title, chapter.question_count, chapter.source_url
        );
    }

    Ok(())
}

pub fn list_questions(ctx: &AppContext) -> Result<()> {
    let summaries = ctx.store.get_all_chapters()?;

    if summaries.is_empty() {
        println!("No chapters stored");
        return Ok(());
    }

    for summary in summaries {
        let Some(chapter) = ctx.store.get_chapter(&summary.key)? else {
            continue;
        };
        println!("{}", chapter.title);
        for (index, question) in chapter.questions.iter().enumerate() {
            let marker = if question.image.is_some() { "#" } else { " " };
            println!("  {:>3}. {} {}", index + 1, marker, question.prompt);
        }
    }

    Ok(())
}

pub fn show_chapter(ctx: &AppContext, chapter_ref: &str) -> Result<()> {
    // Accept either the stored key or the source URL it derives from.
    let key = if chapter_ref.contains("://") {
        Chapter::generate_key(chapter_ref)
    } else {
        chapter_ref.to_string()
    };

    let chapter = ctx
        .store
        .get_chapter(&key)?
        .ok_or_else(|| SignpostError::ChapterNotFound(chapter_ref.to_string()))?;

    println!("{}", chapter.title);
    if let Some(intro) = &chapter.intro {
        println!("{}", intro);
    }
    println!("  {}\n", chapter.source_url);

    for (index, question) in chapter.questions.iter().enumerate() {
        println!("{}. {}", index + 1, question.prompt);
        for choice in &question.choices {
            let marker = if choice.is_correct { "*" } else { " " };
            println!("   [{}] {}", marker, choice.text);
        }
        if !question.explanation.is_empty() {
            println!("   > {}", question.explanation);
        }
        println!();
    }

    Ok(())
}

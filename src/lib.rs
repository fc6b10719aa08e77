//! # Signpost
//!
//! A headless-browser scraper that walks a fixed set of road code quiz
//! pages and persists their chapters, questions, choices and images into a
//! local SQLite database.
//!
//! ## Architecture
//!
//! Signpost is a linear pipeline over one browser session:
//!
//! ```text
//! Index page → Extractor → Validator → Store
//!                  ↑
//!            Image Fetcher (concurrent fan-out per chapter)
//! ```
//!
//! Per chapter the extractor performs a two-phase read: a static pass over
//! the DOM and the embedded script state, then an interactive pass that
//! answers the quiz to reveal explanations and the authoritative
//! correct-answer markers on the results page.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape every discovered chapter
//! signpost scrape
//!
//! # Re-scrape two specific chapters, replacing stored data
//! signpost scrape --refresh https://drive.govt.nz/quiz/road-signs/test \
//!     https://drive.govt.nz/quiz/giving-way/test
//!
//! # Inspect the result
//! signpost list
//! signpost show https://drive.govt.nz/quiz/road-signs/test
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store and
/// configuration; [`SignpostError`](app::SignpostError) is the crate-wide
/// error taxonomy.
pub mod app;

/// Browser session abstraction.
///
/// - [`PageSession`](browser::PageSession): trait the pipeline drives
/// - [`ChromeSession`](browser::ChromeSession): chromiumoxide implementation
pub mod browser;

/// Command-line interface using clap.
///
/// - `scrape [--headed] [--refresh] [URL ...]` - Run the pipeline
/// - `list [--questions]` - List stored chapters or questions
/// - `show <key-or-url>` - Print one chapter in full
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/signpost/config.toml`: browser settings, timeouts
/// and the CSS selector table.
pub mod config;

/// Core domain models.
///
/// - [`Chapter`](domain::Chapter), [`Question`](domain::Question),
///   [`Choice`](domain::Choice), [`Image`](domain::Image)
/// - [`RunReport`](domain::RunReport): per-chapter outcomes of a run
pub mod domain;

/// Chapter extraction.
///
/// Two-phase reads against a [`PageSession`](browser::PageSession):
/// static DOM + script state reconciliation, then quiz simulation for
/// explanations.
pub mod extractor;

/// Image fetching.
///
/// - [`ImageFetcher`](fetcher::ImageFetcher): async trait
/// - [`HttpImageFetcher`](fetcher::HttpImageFetcher): reqwest implementation
/// - [`fetch_indexed`](fetcher::fetch_indexed): bounded fan-out rejoined by
///   question index
pub mod fetcher;

/// Scrape orchestration: index discovery, then per-chapter
/// extract → validate → persist with independent failure handling.
pub mod scraper;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): rusqlite implementation with an
///   atomic chapter upsert
pub mod store;

/// Structural validation of extracted chapters.
pub mod validator;

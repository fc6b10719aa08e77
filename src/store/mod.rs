pub mod sqlite;

use crate::app::Result;
use crate::domain::Chapter;
use crate::validator::ValidChapter;

pub use sqlite::SqliteStore;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The chapter key was new; chapter and children were inserted.
    Inserted,
    /// The chapter key existed; its row was updated and its child rows
    /// replaced.
    Replaced,
}

/// Summary row for listings.
#[derive(Debug, Clone)]
pub struct ChapterSummary {
    pub key: String,
    pub source_url: String,
    pub title: String,
    pub question_count: i64,
}

/// Row counts across the four tables; used to check idempotence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub chapters: i64,
    pub questions: i64,
    pub choices: i64,
    pub images: i64,
}

pub trait Store {
    /// Write a validated chapter durably and idempotently.
    ///
    /// This is the one named transaction boundary of the store: insert the
    /// chapter with all children, or atomically replace the children of an
    /// existing chapter. A crash mid-write must never leave a partial
    /// chapter visible.
    fn upsert_chapter(&self, chapter: &ValidChapter) -> Result<UpsertOutcome>;

    fn chapter_exists(&self, key: &str) -> Result<bool>;

    /// Load a full chapter back, questions and choices in stored order.
    fn get_chapter(&self, key: &str) -> Result<Option<Chapter>>;

    fn get_all_chapters(&self) -> Result<Vec<ChapterSummary>>;

    fn table_counts(&self) -> Result<TableCounts>;
}

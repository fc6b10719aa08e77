use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One quiz chapter as extracted from a single source page.
///
/// A freshly extracted chapter is a candidate record: it has not passed
/// validation yet and must go through [`crate::validator::validate`] before
/// it may reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Stable key derived from the source URL. Re-scraping the same URL
    /// always produces the same key, which is what makes upserts idempotent.
    pub key: String,
    pub source_url: String,
    pub title: String,
    pub intro: Option<String>,
    pub questions: Vec<Question>,
    pub scraped_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(source_url: &str, title: String) -> Self {
        Self {
            key: Self::generate_key(source_url),
            source_url: source_url.to_string(),
            title,
            intro: None,
            questions: Vec::new(),
            scraped_at: Utc::now(),
        }
    }

    /// Generate a deterministic chapter key from the source URL.
    pub fn generate_key(source_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_url.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.source_url
        } else {
            &self.title
        }
    }

    /// Number of questions whose image fetch failed or was absent even
    /// though the page referenced one.
    pub fn missing_image_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.image_url.is_some() && q.image.is_none())
            .count()
    }
}

/// A single question belonging to exactly one chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub choices: Vec<Choice>,
    /// Explanation revealed on the results page. Always present as a field;
    /// an empty string means the page provided none.
    pub explanation: String,
    /// Absolute URL of the question's image, when the page referenced one.
    pub image_url: Option<String>,
    /// Fetched and encoded image. None when there was no image or the
    /// fetch failed (the question then persists without an image).
    pub image: Option<Image>,
}

impl Question {
    pub fn new(prompt: String) -> Self {
        Self {
            prompt,
            choices: Vec::new(),
            explanation: String::new(),
            image_url: None,
            image: None,
        }
    }

    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }

    pub fn correct_choice_count(&self) -> usize {
        self.choices.iter().filter(|c| c.is_correct).count()
    }

    /// Re-point the correct flag at the choice matching `text` exactly.
    ///
    /// Used when the results carousel names the correct answer: the
    /// interactive read is authoritative over the embedded script state.
    /// Returns false (and leaves flags untouched) when no choice matches.
    pub fn mark_correct_by_text(&mut self, text: &str) -> bool {
        if !self.choices.iter().any(|c| c.text == text) {
            return false;
        }
        for choice in &mut self.choices {
            choice.is_correct = choice.text == text;
        }
        true
    }
}

/// One answer choice of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub is_correct: bool,
}

impl Choice {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// A fetched question image, stored base64-encoded with its source URL
/// kept for provenance and dedupe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Stable reference derived from the source URL; images table dedupes
    /// on this.
    pub ref_key: String,
    pub source_url: String,
    pub content_base64: String,
}

impl Image {
    pub fn new(source_url: &str, content_base64: String) -> Self {
        Self {
            ref_key: Self::generate_ref(source_url),
            source_url: source_url.to_string(),
            content_base64,
        }
    }

    pub fn generate_ref(source_url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

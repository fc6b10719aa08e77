//! Raw page state and its reconciliation into a candidate chapter.
//!
//! A quiz page exposes its content twice: as rendered DOM (title, progress
//! counter, the currently visible question) and as an embedded script blob
//! (`window._rrltModuleContent`) holding the full question list. Both reads
//! land in [`RawPageData`]; [`RawPageData::reconcile`] applies one explicit
//! rule: script state wins over DOM text when both are present.

use html_escape::decode_html_entities;
use serde::Deserialize;
use serde_json::Value;

use crate::app::{Result, SignpostError};
use crate::config::ScrapeConfig;
use crate::domain::{Chapter, Choice, Question};

/// Typed view of `window._rrltModuleContent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptModule {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Intro")]
    pub intro: Option<String>,
    #[serde(rename = "Questions", default)]
    pub questions: Vec<ScriptQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptQuestion {
    #[serde(rename = "Question", default)]
    pub question: String,
    #[serde(rename = "Image")]
    pub image: Option<String>,
    #[serde(rename = "Answers", default)]
    pub answers: Vec<ScriptAnswer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptAnswer {
    #[serde(rename = "Answer", default)]
    pub answer: String,
    /// The site marks the correct answer by the presence of this key.
    #[serde(rename = "CorrectAnswer")]
    pub correct_answer: Option<Value>,
}

impl ScriptAnswer {
    pub fn is_correct(&self) -> bool {
        self.correct_answer
            .as_ref()
            .map(|v| !v.is_null())
            .unwrap_or(false)
    }
}

/// Fields read from the rendered DOM.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomSnapshot {
    pub title: Option<String>,
    #[serde(rename = "questionCount")]
    pub question_count: Option<String>,
    /// Prompt of the currently visible question, when one is on screen.
    pub prompt: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
}

impl DomSnapshot {
    /// Parse the trailing integer out of the progress counter text
    /// (e.g. "Question 1 of 12" or "12 questions").
    pub fn expected_question_count(&self) -> Option<usize> {
        let text = self.question_count.as_deref()?;
        text.split(|c: char| !c.is_ascii_digit())
            .filter(|s| !s.is_empty())
            .last()
            .and_then(|s| s.parse().ok())
    }
}

/// Everything read from one chapter page before any UI simulation.
#[derive(Debug, Clone, Default)]
pub struct RawPageData {
    pub dom: DomSnapshot,
    pub script: Option<ScriptModule>,
}

impl RawPageData {
    /// Merge DOM and script reads into a candidate chapter.
    ///
    /// Script state wins wherever both sources carry a field. Without
    /// script state the DOM only shows the question currently on screen,
    /// so the fallback covers single-question chapters and nothing more.
    pub fn reconcile(self, source_url: &str, config: &ScrapeConfig) -> Result<Chapter> {
        let expected = self.dom.expected_question_count();

        let (title, intro, questions) = match self.script {
            Some(module) => {
                let title = module
                    .title
                    .or(self.dom.title)
                    .unwrap_or_default();
                let questions = module
                    .questions
                    .into_iter()
                    .map(|q| build_question(q, config))
                    .collect();
                (title, module.intro, questions)
            }
            None => {
                if expected.unwrap_or(0) != 1 || self.dom.prompt.is_none() {
                    return Err(SignpostError::Extraction(
                        "Embedded module content not found and the DOM exposes \
                         only the visible question"
                            .into(),
                    ));
                }
                let question = build_dom_question(&self.dom, config);
                (self.dom.title.unwrap_or_default(), None, vec![question])
            }
        };

        if let Some(expected) = expected {
            if expected != questions.len() {
                tracing::warn!(
                    "Page reports {} questions but {} were extracted from {}",
                    expected,
                    questions.len(),
                    source_url
                );
            }
        }

        let mut chapter = Chapter::new(source_url, clean(&title));
        chapter.intro = intro.map(|i| clean(&i)).filter(|i| !i.is_empty());
        chapter.questions = questions;
        Ok(chapter)
    }
}

fn build_question(raw: ScriptQuestion, config: &ScrapeConfig) -> Question {
    let mut question = Question::new(clean(&raw.question));
    question.image_url = raw
        .image
        .filter(|path| !path.is_empty())
        .map(|path| config.absolutize(&path));
    question.choices = raw
        .answers
        .into_iter()
        .map(|a| {
            let is_correct = a.is_correct();
            Choice::new(clean(&a.answer), is_correct)
        })
        .collect();
    question
}

fn build_dom_question(dom: &DomSnapshot, config: &ScrapeConfig) -> Question {
    let mut question = Question::new(clean(dom.prompt.as_deref().unwrap_or_default()));
    question.image_url = dom
        .image
        .as_deref()
        .filter(|path| !path.is_empty())
        .map(|path| config.absolutize(path));
    // Correctness is unknown from markup alone; the interactive phase
    // re-points the flag from the results carousel.
    question.choices = dom
        .choices
        .iter()
        .map(|text| Choice::new(clean(text), false))
        .collect();
    question
}

fn clean(text: &str) -> String {
    decode_html_entities(text.trim()).to_string()
}

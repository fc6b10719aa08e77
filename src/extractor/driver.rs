//! Simulated quiz interaction.
//!
//! The site only reveals explanations and the authoritative correct-answer
//! markers on the results page, so the extractor has to take the quiz:
//! start it, click an answer for every question, finish, and open the
//! results accordion.

use crate::app::{Result, SignpostError};
use crate::browser::PageSession;
use crate::config::Selectors;
use crate::domain::Chapter;

pub struct QuizDriver<'a> {
    session: &'a dyn PageSession,
    selectors: &'a Selectors,
}

impl<'a> QuizDriver<'a> {
    pub fn new(session: &'a dyn PageSession, selectors: &'a Selectors) -> Self {
        Self { session, selectors }
    }

    /// Answer every question and land on the results page.
    ///
    /// Clicks an INCORRECT choice where one exists: the site renders the
    /// fullest explanation for wrong answers.
    pub async fn run_through(&self, chapter: &Chapter) -> Result<()> {
        self.session.click_by_text("Start").await?;

        let count = chapter.questions.len();
        for (index, question) in chapter.questions.iter().enumerate() {
            let choice = question
                .choices
                .iter()
                .find(|c| !c.is_correct)
                .or_else(|| question.choices.first())
                .ok_or_else(|| {
                    SignpostError::Extraction(format!(
                        "Question {} has no choices to click",
                        index + 1
                    ))
                })?;

            tracing::debug!(
                "Answering question {}/{} with '{}'",
                index + 1,
                count,
                choice.text
            );
            self.session.click_by_text(&choice.text).await?;

            if index + 1 < count {
                self.session.click_by_text("Next question").await?;
            } else {
                self.session.click_by_text("Finish").await?;
            }
        }

        Ok(())
    }

    /// Open the accordion on the results page that hides the explanation
    /// carousel.
    pub async fn open_results_accordion(&self) -> Result<()> {
        self.session
            .click(&self.selectors.results_accordion_toggle)
            .await
    }
}

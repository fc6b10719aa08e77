//! Structural validation of extracted chapters.
//!
//! Validation is pure and synchronous: it inspects the candidate's shape,
//! never performs I/O, and reports the first violated constraint. Only a
//! [`ValidChapter`] can reach the store.

use crate::app::{Result, SignpostError};
use crate::domain::Chapter;

/// A chapter that passed structural validation.
///
/// The store accepts only this type; constructing one outside
/// [`validate`] is not possible.
#[derive(Debug, Clone)]
pub struct ValidChapter(Chapter);

impl ValidChapter {
    pub fn as_chapter(&self) -> &Chapter {
        &self.0
    }

    pub fn into_inner(self) -> Chapter {
        self.0
    }
}

/// Check a candidate chapter against the structural constraints.
///
/// Constraints, in check order:
/// - title is non-empty
/// - at least one question
/// - every question has a non-empty prompt
/// - every question has at least two choices
/// - every question has exactly one correct choice
pub fn validate(chapter: Chapter) -> Result<ValidChapter> {
    if chapter.title.trim().is_empty() {
        return Err(violation(&chapter, "chapter title is empty"));
    }

    if chapter.questions.is_empty() {
        return Err(violation(&chapter, "chapter has no questions"));
    }

    for (index, question) in chapter.questions.iter().enumerate() {
        let number = index + 1;

        if question.prompt.trim().is_empty() {
            return Err(violation(
                &chapter,
                &format!("question {} has an empty prompt", number),
            ));
        }

        if question.choices.len() < 2 {
            return Err(violation(
                &chapter,
                &format!(
                    "question {} has {} choices, need at least 2",
                    number,
                    question.choices.len()
                ),
            ));
        }

        let correct = question.correct_choice_count();
        if correct != 1 {
            return Err(violation(
                &chapter,
                &format!(
                    "question {} has {} correct choices, need exactly 1",
                    number, correct
                ),
            ));
        }
    }

    Ok(ValidChapter(chapter))
}

fn violation(chapter: &Chapter, detail: &str) -> SignpostError {
    SignpostError::Validation(format!("{} ({})", detail, chapter.source_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{Choice, Question};

    fn valid_chapter() -> Chapter {
        let mut question = Question::new("What does a stop sign mean?".into());
        question.choices = vec![
            Choice::new("Stop", true),
            Choice::new("Slow down", false),
            Choice::new("Give way", false),
        ];

        let mut chapter = Chapter::new("https://drive.govt.nz/quiz/signs/test", "Signs".into());
        chapter.questions = vec![question];
        chapter
    }

    #[test]
    fn test_valid_chapter_passes() {
        let chapter = valid_chapter();
        let valid = validate(chapter).unwrap();
        assert_eq!(valid.as_chapter().title, "Signs");
    }

    #[test]
    fn test_empty_title_rejected() {
        let mut chapter = valid_chapter();
        chapter.title = "  ".into();

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("title is empty"));
    }

    #[test]
    fn test_no_questions_rejected() {
        let mut chapter = valid_chapter();
        chapter.questions.clear();

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("no questions"));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let mut chapter = valid_chapter();
        chapter.questions[0].prompt = String::new();

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("question 1 has an empty prompt"));
    }

    #[test]
    fn test_single_choice_rejected() {
        let mut chapter = valid_chapter();
        chapter.questions[0].choices.truncate(1);

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("need at least 2"));
    }

    #[test]
    fn test_no_correct_choice_rejected() {
        let mut chapter = valid_chapter();
        for choice in &mut chapter.questions[0].choices {
            choice.is_correct = false;
        }

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("0 correct choices"));
    }

    #[test]
    fn test_two_correct_choices_rejected() {
        let mut chapter = valid_chapter();
        chapter.questions[0].choices[1].is_correct = true;

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("2 correct choices"));
    }

    #[test]
    fn test_empty_explanation_is_fine() {
        let chapter = valid_chapter();
        assert_eq!(chapter.questions[0].explanation, "");
        assert!(validate(chapter).is_ok());
    }

    #[test]
    fn test_reports_first_violation() {
        // Both an empty title and a bad question; the title violation wins.
        let mut chapter = valid_chapter();
        chapter.title = String::new();
        chapter.questions[0].choices.clear();

        let err = validate(chapter).unwrap_err();
        assert!(err.to_string().contains("title is empty"));
    }
}

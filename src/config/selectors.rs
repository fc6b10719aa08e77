use serde::{Deserialize, Serialize};

/// CSS selectors used to find elements on the quiz pages.
///
/// Centralized so they are easy to update when the site's markup changes,
/// and overridable from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Main title of a chapter page
    pub title: String,
    /// Element showing the total question count in a chapter
    pub question_count: String,
    /// Question text when there is no associated image
    pub question_no_image: String,
    /// Question text when there is an associated image
    pub question_with_image: String,
    /// Image associated with a question
    pub question_image: String,
    /// An individual answer choice within the choice list
    pub choice_item: String,
    /// Card lists on the index page that group chapter links
    pub index_card_list: String,
    /// An individual card within a card list
    pub index_card: String,
    /// Collapsed accordions on the index page hiding chapter links
    pub index_accordion_inactive: String,
    /// Accordion toggle on the results page revealing explanations
    pub results_accordion_toggle: String,
    /// Cards in the results carousel (one per question)
    pub carousel_card: String,
    /// Question number within a carousel card
    pub carousel_question_number: String,
    /// Text naming the correct answer within a carousel card
    pub carousel_correct_answer: String,
    /// Main explanation paragraph within a carousel card
    pub explanation_main: String,
    /// Additional explanation text within a carousel card
    pub explanation_additional: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            title: "h2.module__title".to_string(),
            question_count: "span.progress__question".to_string(),
            question_no_image: "div.question__question.question__question--noimage".to_string(),
            question_with_image: "div.question__question".to_string(),
            question_image: "img.question__image".to_string(),
            choice_item: "div.blocklist > div".to_string(),
            index_card_list: "div.card__list".to_string(),
            index_card: "div.card".to_string(),
            index_accordion_inactive:
                "div.accordion.layout--container.layout--nopadding.accordion--inactive".to_string(),
            results_accordion_toggle: "span.accordion__toggle".to_string(),
            carousel_card: "div.carousel__card".to_string(),
            carousel_question_number: "p.carousel__questionNumber".to_string(),
            carousel_correct_answer: "div.carousel__point > p".to_string(),
            explanation_main: "div.carousel__content.carousel__content--tint > p".to_string(),
            explanation_additional:
                "div.carousel__content.carousel__content--tint > span > p".to_string(),
        }
    }
}

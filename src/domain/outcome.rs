use std::fmt;

/// Pipeline stage a chapter was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Validating,
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extracting => write!(f, "extracting"),
            Stage::Validating => write!(f, "validating"),
            Stage::Persisting => write!(f, "persisting"),
        }
    }
}

/// Per-chapter result of one scrape run.
#[derive(Debug, Clone)]
pub struct ChapterOutcome {
    pub url: String,
    pub result: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Chapter reached the store. `images_missing` > 0 marks a partial
    /// success: some referenced images could not be fetched.
    Persisted {
        questions: usize,
        images_missing: usize,
    },
    /// Chapter was already stored and `--refresh` was not given.
    Skipped,
    /// A chapter-scoped error; the run continued with the next chapter.
    Failed { stage: Stage, message: String },
}

impl ChapterOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.result, Outcome::Failed { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(
            self.result,
            Outcome::Persisted {
                images_missing, ..
            } if images_missing > 0
        )
    }
}

/// Ordered outcomes for every discovered chapter URL.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<ChapterOutcome>,
}

impl RunReport {
    pub fn record(&mut self, outcome: ChapterOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn persisted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Outcome::Persisted { .. }))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn partial_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_partial()).count()
    }
}

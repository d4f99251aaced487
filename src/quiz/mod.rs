pub mod format;
pub mod scaling;
pub mod scaling_quiz;
pub mod strategy;
pub mod strategy_quiz;

/// Outcome of grading a single answer.
///
/// This is the correctness signal handed to whatever plays feedback cues;
/// `points` is what was added to the session score (zero on a miss).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Grade {
    pub correct: bool,
    pub points: u32,
}

impl Grade {
    pub fn new(correct: bool, award: u32) -> Self {
        Self {
            correct,
            points: if correct { award } else { 0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    /// Free-text answer that is not an integer. The quiz stays where it was.
    #[error("Please enter a valid number!")]
    InvalidInput(String),

    #[error("cannot {action} while the quiz is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

//! Question-by-question controller for the strategy game.
//!
//! One problem is live at a time. The player submits a typed answer, may ask
//! for a hint beforehand, and advances once the answer is graded. After the
//! last problem the session ends with a banded celebration message.

use rand::Rng;

use crate::quiz::strategy::{generate_problem, Problem, Strategy};
use crate::quiz::{Grade, QuizError};

pub const MAX_PROBLEMS: u32 = 20;
pub const POINTS_PER_QUESTION: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Active { hint_revealed: bool },
    Graded { correct: bool },
    Ended,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Active { .. } => "active",
            Phase::Graded { .. } => "graded",
            Phase::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub strategy: Strategy,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next,
    Ended(Summary),
}

/// Final tally shown when the game is over.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub celebration: Celebration,
}

impl Summary {
    pub fn percentage_text(&self) -> String {
        format!("{:.0}%", self.percentage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Celebration {
    Perfect,
    Fantastic,
    KeepPracticing,
    GoodStart,
}

impl Celebration {
    /// Each band includes its lower bound.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Celebration::Perfect
        } else if percentage >= 80.0 {
            Celebration::Fantastic
        } else if percentage >= 50.0 {
            Celebration::KeepPracticing
        } else {
            Celebration::GoodStart
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Celebration::Perfect => "🎉 PERFECT SCORE! You are a Mental Math Master! 🎉",
            Celebration::Fantastic => "🌟 Fantastic effort! Great work applying those strategies! 🌟",
            Celebration::KeepPracticing => "👍 Keep practicing! You've successfully used the properties! 👍",
            Celebration::GoodStart => {
                "🧠 Good start! Review how to break numbers apart to make multiplication easier. 🧠"
            }
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StrategyQuiz {
    problem: Problem,
    phase: Phase,
    score: u32,
    problem_count: u32,
    max_problems: u32,
}

impl StrategyQuiz {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_max_problems(MAX_PROBLEMS, rng)
    }

    pub fn with_max_problems<R: Rng + ?Sized>(max_problems: u32, rng: &mut R) -> Self {
        Self {
            problem: generate_problem(rng),
            phase: Phase::Active {
                hint_revealed: false,
            },
            score: 0,
            problem_count: 1,
            max_problems: max_problems.max(1),
        }
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// 1-based position of the current problem.
    pub fn problem_count(&self) -> u32 {
        self.problem_count
    }

    pub fn max_problems(&self) -> u32 {
        self.max_problems
    }

    pub fn max_score(&self) -> u32 {
        self.max_problems.saturating_mul(POINTS_PER_QUESTION)
    }

    pub fn score_text(&self) -> String {
        format!("Total Score: {} / {}", self.score, self.max_score())
    }

    pub fn progress_text(&self) -> String {
        format!("Question {} of {}", self.problem_count, self.max_problems)
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    /// Grades a typed answer. Non-integer input leaves the problem open.
    pub fn submit(&mut self, input: &str) -> Result<Grade, QuizError> {
        if !matches!(self.phase, Phase::Active { .. }) {
            return Err(self.invalid("submit an answer"));
        }
        let input = input.trim();
        let value = parse_whole_number(input).ok_or_else(|| QuizError::InvalidInput(input.to_string()))?;

        let grade = Grade::new(value == self.problem.answer, POINTS_PER_QUESTION);
        self.score += grade.points;
        self.phase = Phase::Graded {
            correct: grade.correct,
        };
        log::debug!(
            "Graded {} = {} (expected {}): {}",
            self.problem.question,
            value,
            self.problem.answer,
            grade.correct
        );
        Ok(grade)
    }

    /// Reveals the hint for the live problem. Asking again returns the same hint.
    pub fn hint(&mut self) -> Result<Hint, QuizError> {
        match self.phase {
            Phase::Active { .. } => {
                self.phase = Phase::Active {
                    hint_revealed: true,
                };
                Ok(Hint {
                    strategy: self.problem.strategy,
                    text: self.problem.hint.clone(),
                })
            }
            _ => Err(self.invalid("show a hint")),
        }
    }

    pub fn hint_revealed(&self) -> bool {
        matches!(
            self.phase,
            Phase::Active {
                hint_revealed: true
            }
        )
    }

    /// Moves past a graded problem, ending the game after the last one.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Advance, QuizError> {
        if !matches!(self.phase, Phase::Graded { .. }) {
            return Err(self.invalid("advance"));
        }
        if self.problem_count >= self.max_problems {
            self.phase = Phase::Ended;
            let summary = self.summary();
            log::info!(
                "Strategy quiz finished with {} of {}",
                summary.score,
                summary.max_score
            );
            return Ok(Advance::Ended(summary));
        }

        self.problem = generate_problem(rng);
        self.problem_count += 1;
        self.phase = Phase::Active {
            hint_revealed: false,
        };
        Ok(Advance::Next)
    }

    pub fn summary(&self) -> Summary {
        let max_score = self.max_score();
        let percentage = f64::from(self.score) / f64::from(max_score) * 100.0;
        Summary {
            score: self.score,
            max_score,
            percentage,
            celebration: Celebration::from_percentage(percentage),
        }
    }

    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), QuizError> {
        if self.phase != Phase::Ended {
            return Err(self.invalid("restart"));
        }
        self.score = 0;
        self.problem_count = 1;
        self.problem = generate_problem(rng);
        self.phase = Phase::Active {
            hint_revealed: false,
        };
        Ok(())
    }
}

/// Accepts `182` as well as a whole number written as a decimal, `182.0`.
fn parse_whole_number(input: &str) -> Option<i64> {
    if let Ok(value) = input.parse::<i64>() {
        return Some(value);
    }
    let value: f64 = input.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Some(value as i64);
    }
    None
}

//! Walks a pre-built batch of multiple-choice scaling questions.
//!
//! Grading locks the current question; the caller advances after its
//! presentation delay by calling [`ScalingQuiz::advance`].

use rand::Rng;

use crate::quiz::scaling::{generate_questions, ScalingQuestion};
use crate::quiz::{Grade, QuizError};

pub const POINTS_PER_QUESTION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScalingPhase {
    Idle,
    InProgress { index: usize, graded: Option<bool> },
    Finished,
}

impl ScalingPhase {
    fn name(&self) -> &'static str {
        match self {
            ScalingPhase::Idle => "idle",
            ScalingPhase::InProgress { graded: None, .. } => "in progress",
            ScalingPhase::InProgress { graded: Some(_), .. } => "graded",
            ScalingPhase::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Graded(Grade),
    /// The current question was already answered.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingSummary {
    pub score: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingAdvance {
    Next,
    Finished(ScalingSummary),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScalingQuiz {
    questions: Vec<ScalingQuestion>,
    phase: ScalingPhase,
    score: u32,
}

impl ScalingQuiz {
    pub fn new(questions: Vec<ScalingQuestion>) -> Self {
        Self {
            questions,
            phase: ScalingPhase::Idle,
            score: 0,
        }
    }

    pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        Self::new(generate_questions(count, rng))
    }

    pub fn questions(&self) -> &[ScalingQuestion] {
        &self.questions
    }

    pub fn phase(&self) -> ScalingPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            ScalingPhase::InProgress { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&ScalingQuestion> {
        self.current_index().and_then(|index| self.questions.get(index))
    }

    fn invalid(&self, action: &'static str) -> QuizError {
        QuizError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }

    pub fn start(&mut self) -> Result<(), QuizError> {
        if self.phase != ScalingPhase::Idle {
            return Err(self.invalid("start"));
        }
        self.phase = if self.questions.is_empty() {
            ScalingPhase::Finished
        } else {
            ScalingPhase::InProgress {
                index: 0,
                graded: None,
            }
        };
        log::info!("Scaling quiz started with {} questions", self.questions.len());
        Ok(())
    }

    /// Grades `answer` against the current question. A second selection for
    /// the same question is ignored and never scores.
    pub fn select(&mut self, answer: &str) -> Result<Selection, QuizError> {
        let index = match self.phase {
            ScalingPhase::InProgress { graded: Some(_), .. } => return Ok(Selection::Ignored),
            ScalingPhase::InProgress {
                index,
                graded: None,
            } => index,
            _ => return Err(self.invalid("select an answer")),
        };

        let correct = self.questions[index].is_correct(answer);
        let grade = Grade::new(correct, POINTS_PER_QUESTION);
        self.score += grade.points;
        self.phase = ScalingPhase::InProgress {
            index,
            graded: Some(correct),
        };
        log::debug!("Question {} answered {:?}: {}", index + 1, answer, correct);
        Ok(Selection::Graded(grade))
    }

    pub fn advance(&mut self) -> Result<ScalingAdvance, QuizError> {
        let index = match self.phase {
            ScalingPhase::InProgress {
                index,
                graded: Some(_),
            } => index,
            _ => return Err(self.invalid("advance")),
        };

        if index + 1 >= self.questions.len() {
            self.phase = ScalingPhase::Finished;
            return Ok(ScalingAdvance::Finished(self.finish()));
        }
        self.phase = ScalingPhase::InProgress {
            index: index + 1,
            graded: None,
        };
        Ok(ScalingAdvance::Next)
    }

    pub fn finish(&self) -> ScalingSummary {
        ScalingSummary {
            score: self.score,
            total: self.questions.len(),
        }
    }

    /// Back to idle with the same batch of questions.
    pub fn restart(&mut self) {
        self.score = 0;
        self.phase = ScalingPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quiz(count: usize) -> ScalingQuiz {
        ScalingQuiz::generate(count, &mut StdRng::seed_from_u64(17))
    }

    fn wrong_answer(question: &ScalingQuestion) -> &str {
        question
            .options
            .iter()
            .find(|o| !question.is_correct(o))
            .map(|o| o.as_str())
            .unwrap_or("not an option")
    }

    #[test]
    fn select_before_start_is_rejected() {
        let mut quiz = quiz(3);
        assert_eq!(quiz.phase(), ScalingPhase::Idle);
        assert!(quiz.select("1").is_err());
        assert!(quiz.current_question().is_none());
    }

    #[test]
    fn second_selection_does_not_score_twice() {
        let mut quiz = quiz(3);
        quiz.start().unwrap();
        let correct = quiz.current_question().unwrap().correct_answer.clone();

        let first = quiz.select(&correct).unwrap();
        assert_eq!(first, Selection::Graded(Grade::new(true, 1)));
        assert_eq!(quiz.select(&correct).unwrap(), Selection::Ignored);
        assert_eq!(quiz.score(), 1);
    }

    #[test]
    fn graded_question_stays_current_until_advance() {
        let mut quiz = quiz(3);
        quiz.start().unwrap();
        let before = quiz.current_question().unwrap().clone();
        quiz.select(&before.correct_answer).unwrap();

        assert_eq!(quiz.current_question(), Some(&before));
        assert_eq!(quiz.select("anything").unwrap(), Selection::Ignored);
        assert_eq!(quiz.advance().unwrap(), ScalingAdvance::Next);
        assert_eq!(quiz.current_question(), quiz.questions().get(1));
    }

    #[test]
    fn advance_waits_for_grading() {
        let mut quiz = quiz(3);
        quiz.start().unwrap();
        assert!(quiz.advance().is_err());

        let wrong = wrong_answer(quiz.current_question().unwrap()).to_string();
        assert_eq!(
            quiz.select(&wrong).unwrap(),
            Selection::Graded(Grade::new(false, 1))
        );
        assert_eq!(quiz.advance().unwrap(), ScalingAdvance::Next);
        assert_eq!(quiz.current_index(), Some(1));
        assert_eq!(quiz.score(), 0);
    }

    #[test]
    fn walks_the_whole_batch_then_finishes() {
        let mut quiz = quiz(4);
        quiz.start().unwrap();
        let mut outcome = ScalingAdvance::Next;
        let mut answered = 0;
        while outcome == ScalingAdvance::Next {
            let question = quiz.current_question().unwrap();
            let answer = if answered % 2 == 0 {
                question.correct_answer.clone()
            } else {
                wrong_answer(question).to_string()
            };
            quiz.select(&answer).unwrap();
            answered += 1;
            outcome = quiz.advance().unwrap();
        }
        assert_eq!(answered, 4);
        assert_eq!(
            outcome,
            ScalingAdvance::Finished(ScalingSummary { score: 2, total: 4 })
        );
        assert_eq!(quiz.phase(), ScalingPhase::Finished);
        assert!(quiz.select("1").is_err());
    }

    #[test]
    fn restart_reuses_the_batch() {
        let mut quiz = quiz(2);
        let batch = quiz.questions().to_vec();
        quiz.start().unwrap();
        let correct = quiz.current_question().unwrap().correct_answer.clone();
        quiz.select(&correct).unwrap();

        quiz.restart();
        assert_eq!(quiz.phase(), ScalingPhase::Idle);
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.questions(), batch.as_slice());
        quiz.start().unwrap();
        assert_eq!(quiz.current_index(), Some(0));
    }

    #[test]
    fn empty_batch_finishes_immediately() {
        let mut quiz = ScalingQuiz::new(Vec::new());
        quiz.start().unwrap();
        assert_eq!(quiz.phase(), ScalingPhase::Finished);
        assert_eq!(quiz.finish(), ScalingSummary { score: 0, total: 0 });
    }
}

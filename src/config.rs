//! Runtime settings for the bot.
//!
//! Read from the process environment after `dotenv` has loaded an optional
//! `.env` file. The bot token itself (`TELOXIDE_TOKEN`) is picked up by
//! `Bot::from_env` and is not part of this struct.

use std::str::FromStr;
use std::time::Duration;

use crate::quiz::scaling::DEFAULT_QUESTION_COUNT;
use crate::quiz::strategy_quiz::MAX_PROBLEMS;

pub const STRATEGY_PROBLEMS_VAR: &str = "MATHBOT_STRATEGY_PROBLEMS";
pub const SCALING_QUESTIONS_VAR: &str = "MATHBOT_SCALING_QUESTIONS";
pub const ADVANCE_DELAY_VAR: &str = "MATHBOT_ADVANCE_DELAY_MS";
pub const FEEDBACK_CUES_VAR: &str = "MATHBOT_FEEDBACK_CUES";

const DEFAULT_ADVANCE_DELAY_MS: u64 = 1500;
/// Upper bound for either quiz length.
pub const MAX_QUIZ_LENGTH: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub strategy_problems: u32,
    pub scaling_questions: usize,
    /// Pause between grading a scaling answer and showing the next question.
    pub advance_delay: Duration,
    pub feedback_cues: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            strategy_problems: MAX_PROBLEMS,
            scaling_questions: DEFAULT_QUESTION_COUNT,
            advance_delay: Duration::from_millis(DEFAULT_ADVANCE_DELAY_MS),
            feedback_cues: true,
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let strategy_problems = parse_or(&lookup, STRATEGY_PROBLEMS_VAR, defaults.strategy_problems);
        let scaling_questions = parse_or(&lookup, SCALING_QUESTIONS_VAR, defaults.scaling_questions);
        let delay_ms = parse_or(&lookup, ADVANCE_DELAY_VAR, DEFAULT_ADVANCE_DELAY_MS);
        let feedback_cues = parse_or(&lookup, FEEDBACK_CUES_VAR, defaults.feedback_cues);

        Self {
            strategy_problems: capped(
                STRATEGY_PROBLEMS_VAR,
                non_zero(STRATEGY_PROBLEMS_VAR, strategy_problems, defaults.strategy_problems),
                MAX_QUIZ_LENGTH,
            ),
            scaling_questions: capped(
                SCALING_QUESTIONS_VAR,
                non_zero(SCALING_QUESTIONS_VAR, scaling_questions, defaults.scaling_questions),
                MAX_QUIZ_LENGTH as usize,
            ),
            advance_delay: Duration::from_millis(delay_ms),
            feedback_cues,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            default
        }),
    }
}

fn non_zero<T: PartialEq + Default>(key: &str, value: T, default: T) -> T {
    if value == T::default() {
        log::warn!("{} must be greater than zero, using the default", key);
        return default;
    }
    value
}

fn capped<T: PartialOrd + std::fmt::Display>(key: &str, value: T, max: T) -> T {
    if value > max {
        log::warn!("{} is capped at {}", key, max);
        return max;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> BotConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config(&[]);
        assert_eq!(config, BotConfig::default());
        assert_eq!(config.strategy_problems, 20);
        assert_eq!(config.scaling_questions, 10);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            (STRATEGY_PROBLEMS_VAR, "5"),
            (SCALING_QUESTIONS_VAR, " 12 "),
            (ADVANCE_DELAY_VAR, "250"),
            (FEEDBACK_CUES_VAR, "false"),
        ]);
        assert_eq!(config.strategy_problems, 5);
        assert_eq!(config.scaling_questions, 12);
        assert_eq!(config.advance_delay, Duration::from_millis(250));
        assert!(!config.feedback_cues);
    }

    #[test]
    fn oversized_lengths_are_capped() {
        let config = config(&[
            (STRATEGY_PROBLEMS_VAR, "4294967295"),
            (SCALING_QUESTIONS_VAR, "5000000"),
        ]);
        assert_eq!(config.strategy_problems, MAX_QUIZ_LENGTH);
        assert_eq!(config.scaling_questions, MAX_QUIZ_LENGTH as usize);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config(&[
            (STRATEGY_PROBLEMS_VAR, "0"),
            (SCALING_QUESTIONS_VAR, "lots"),
            (FEEDBACK_CUES_VAR, "maybe"),
        ]);
        assert_eq!(config, BotConfig::default());
    }
}

use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::format::format_answer;

pub const DEFAULT_QUESTION_COUNT: usize = 10;
pub const DISTRACTOR_COUNT: usize = 3;
pub const MAX_DISTRACTOR_ATTEMPTS: usize = 20;

pub const BENCHMARK_FRACTIONS: [(&str, f64); 6] = [
    ("½", 0.5),
    ("¼", 0.25),
    ("¾", 0.75),
    ("⅓", 1.0 / 3.0),
    ("⅔", 2.0 / 3.0),
    ("⅕", 0.2),
];

pub const POWERS_OF_TEN: [(&str, f64); 5] = [
    ("10", 10.0),
    ("100", 100.0),
    ("1000", 1000.0),
    ("0.1", 0.1),
    ("0.01", 0.01),
];

// Extra decades a careless student slips in or drops.
const DECADE_SHIFTS: [f64; 2] = [10.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Multiply,
    Divide,
}

impl Operation {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operation::Multiply => lhs * rhs,
            Operation::Divide => lhs / rhs,
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Operation::Multiply => Operation::Divide,
            Operation::Divide => Operation::Multiply,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Multiply => "×",
            Operation::Divide => "÷",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OperandKind {
    Decimal,
    Whole,
    Benchmark,
}

/// The number being scaled, as shown and as computed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Operand {
    pub kind: OperandKind,
    pub display: String,
    pub value: f64,
}

impl Operand {
    /// Rounds to three decimal places.
    pub fn decimal(value: f64) -> Self {
        let value = (value * 1000.0).round() / 1000.0;
        Self {
            kind: OperandKind::Decimal,
            display: format_answer(value),
            value,
        }
    }

    pub fn whole(value: u32) -> Self {
        Self {
            kind: OperandKind::Whole,
            display: value.to_string(),
            value: f64::from(value),
        }
    }

    pub fn benchmark(label: &str, value: f64) -> Self {
        Self {
            kind: OperandKind::Benchmark,
            display: label.to_string(),
            value,
        }
    }

    /// 40% decimal in [0, 200), 40% whole number in [1, 500], 20% benchmark fraction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let roll: f64 = rng.gen();
        if roll < 0.4 {
            Operand::decimal(rng.gen::<f64>() * 200.0)
        } else if roll < 0.8 {
            Operand::whole(rng.gen_range(1..=500))
        } else {
            let (label, value) = BENCHMARK_FRACTIONS[rng.gen_range(0..BENCHMARK_FRACTIONS.len())];
            Operand::benchmark(label, value)
        }
    }
}

/// A power of ten together with the operation applied with it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scaling {
    pub operation: Operation,
    pub display: String,
    pub value: f64,
}

impl Scaling {
    pub fn new(operation: Operation, display: &str, value: f64) -> Self {
        Self {
            operation,
            display: display.to_string(),
            value,
        }
    }

    /// Uniform over every power crossed with both operations.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let pick = rng.gen_range(0..POWERS_OF_TEN.len() * 2);
        let (display, value) = POWERS_OF_TEN[pick / 2];
        let operation = if pick % 2 == 0 {
            Operation::Multiply
        } else {
            Operation::Divide
        };
        Self::new(operation, display, value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OptionsStatus {
    Complete,
    /// The attempt budget ran out before enough distinct distractors turned up.
    Short { found: usize },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScalingQuestion {
    pub number_display: String,
    pub number_value: f64,
    pub operation: Operation,
    pub power_display: String,
    pub power_value: f64,
    pub correct_answer: String,
    pub options: Vec<String>,
    pub options_status: OptionsStatus,
}

impl ScalingQuestion {
    pub fn build<R: Rng + ?Sized>(operand: Operand, scaling: Scaling, rng: &mut R) -> Self {
        let correct = scaling.operation.apply(operand.value, scaling.value);
        let correct_answer = format_answer(correct);
        let (distractors, options_status) = collect_distractors(
            operand.value,
            scaling.operation,
            scaling.value,
            &correct_answer,
            rng,
        );
        if let OptionsStatus::Short { found } = options_status {
            log::warn!(
                "Only {} distractors for {} {} {}",
                found,
                operand.display,
                scaling.operation.symbol(),
                scaling.display
            );
        }

        let mut options = Vec::with_capacity(1 + distractors.len());
        options.push(correct_answer.clone());
        options.extend(distractors);
        // So the correct answer isn't always first
        options.shuffle(rng);

        Self {
            number_display: operand.display,
            number_value: operand.value,
            operation: scaling.operation,
            power_display: scaling.display,
            power_value: scaling.value,
            correct_answer,
            options,
            options_status,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let operand = Operand::random(rng);
        let scaling = Scaling::random(rng);
        Self::build(operand, scaling, rng)
    }

    pub fn text(&self) -> String {
        format!(
            "{} {} {} = ?",
            self.number_display,
            self.operation.symbol(),
            self.power_display
        )
    }

    /// The worked expression, e.g. `50 × 100 = 5000`.
    pub fn solution_text(&self) -> String {
        format!(
            "{} {} {} = {}",
            self.number_display,
            self.operation.symbol(),
            self.power_display,
            self.correct_answer
        )
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

/// Results of the usual scaling slips: the inverse operation, and the right
/// operation with the power off by `shift` in each direction.
pub fn mistake_candidates(number: f64, operation: Operation, power: f64, shift: f64) -> [f64; 3] {
    [
        operation.inverse().apply(number, power),
        operation.apply(number, power * shift),
        operation.apply(number, power / shift),
    ]
}

/// Gathers up to [`DISTRACTOR_COUNT`] distinct wrong answers, never the
/// correct answer's string, within [`MAX_DISTRACTOR_ATTEMPTS`] rounds.
pub fn collect_distractors<R: Rng + ?Sized>(
    number: f64,
    operation: Operation,
    power: f64,
    correct_answer: &str,
    rng: &mut R,
) -> (Vec<String>, OptionsStatus) {
    let mut distractors: Vec<String> = Vec::with_capacity(DISTRACTOR_COUNT);
    let mut attempts = 0;
    while distractors.len() < DISTRACTOR_COUNT && attempts < MAX_DISTRACTOR_ATTEMPTS {
        attempts += 1;
        let shift = DECADE_SHIFTS[rng.gen_range(0..DECADE_SHIFTS.len())];
        for candidate in mistake_candidates(number, operation, power, shift) {
            let text = format_answer(candidate);
            if distractors.len() < DISTRACTOR_COUNT
                && text != correct_answer
                && !distractors.contains(&text)
            {
                distractors.push(text);
            }
        }
    }

    let status = if distractors.len() == DISTRACTOR_COUNT {
        OptionsStatus::Complete
    } else {
        OptionsStatus::Short {
            found: distractors.len(),
        }
    };
    (distractors, status)
}

/// Builds the whole batch up front.
pub fn generate_questions<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<ScalingQuestion> {
    let questions: Vec<ScalingQuestion> = (0..count).map(|_| ScalingQuestion::random(rng)).collect();
    log::debug!("Generated {} scaling questions", questions.len());
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn whole_number_times_hundred() {
        let mut rng = StdRng::seed_from_u64(1);
        let question = ScalingQuestion::build(
            Operand::whole(50),
            Scaling::new(Operation::Multiply, "100", 100.0),
            &mut rng,
        );
        assert_eq!(question.correct_answer, "5000");
        assert_eq!(question.text(), "50 × 100 = ?");
        assert_eq!(question.solution_text(), "50 × 100 = 5000");
        assert!(question.options.contains(&"0.5".to_string()));
        assert_eq!(question.options_status, OptionsStatus::Complete);
        assert_eq!(question.options.len(), 4);
    }

    #[test]
    fn inverse_mistake_comes_first() {
        let candidates = mistake_candidates(50.0, Operation::Multiply, 100.0, 10.0);
        assert_eq!(format_answer(candidates[0]), "0.5");
        assert_eq!(format_answer(candidates[1]), "50000");
        assert_eq!(format_answer(candidates[2]), "500");
    }

    #[test]
    fn benchmark_fraction_keeps_label_separate() {
        let mut rng = StdRng::seed_from_u64(2);
        let question = ScalingQuestion::build(
            Operand::benchmark("¾", 0.75),
            Scaling::new(Operation::Divide, "0.1", 0.1),
            &mut rng,
        );
        assert_eq!(question.number_display, "¾");
        assert_eq!(question.correct_answer, "7.5");
        assert!(question.options.contains(&"7.5".to_string()));
    }

    #[test]
    fn collapsed_mistake_space_degrades_instead_of_hanging() {
        let mut rng = StdRng::seed_from_u64(3);
        let question = ScalingQuestion::build(
            Operand::decimal(0.0),
            Scaling::new(Operation::Multiply, "10", 10.0),
            &mut rng,
        );
        assert_eq!(question.correct_answer, "0");
        assert_eq!(question.options, vec!["0".to_string()]);
        assert_eq!(question.options_status, OptionsStatus::Short { found: 0 });
    }

    #[test]
    fn decimal_operands_are_rounded_to_three_places() {
        let operand = Operand::decimal(12.34567);
        assert_eq!(operand.value, 12.346);
        assert_eq!(operand.display, "12.346");
    }

    #[test]
    fn operands_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut kinds = HashSet::new();
        for _ in 0..1000 {
            let operand = Operand::random(&mut rng);
            match operand.kind {
                OperandKind::Decimal => assert!((0.0..=200.0).contains(&operand.value)),
                OperandKind::Whole => assert!((1.0..=500.0).contains(&operand.value)),
                OperandKind::Benchmark => assert!(BENCHMARK_FRACTIONS
                    .iter()
                    .any(|(label, value)| *label == operand.display && *value == operand.value)),
            }
            kinds.insert(operand.kind);
        }
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn batch_has_requested_size_and_is_deterministic() {
        let first = generate_questions(DEFAULT_QUESTION_COUNT, &mut StdRng::seed_from_u64(9));
        let second = generate_questions(DEFAULT_QUESTION_COUNT, &mut StdRng::seed_from_u64(9));
        assert_eq!(first.len(), DEFAULT_QUESTION_COUNT);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn options_hold_one_correct_and_are_distinct(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let question = ScalingQuestion::random(&mut rng);

            let correct = question.options.iter().filter(|o| question.is_correct(o)).count();
            prop_assert_eq!(correct, 1);

            let distinct: HashSet<&String> = question.options.iter().collect();
            prop_assert_eq!(distinct.len(), question.options.len());

            if question.options_status == OptionsStatus::Complete {
                prop_assert_eq!(question.options.len(), 1 + DISTRACTOR_COUNT);
            }
        }
    }
}

use rand::Rng;
use std::fmt;

pub const TIMES: &str = "\u{00D7}";

/// Second factors for the distributive strategy: 11, 16, 21, 26, 31.
pub const DISTRIBUTIVE_SPLITS: [i64; 5] = [11, 16, 21, 26, 31];
pub const COMPENSATION_ANCHORS: [i64; 2] = [99, 49];
pub const COMPATIBLE_PAIRS: [(i64, i64); 2] = [(4, 25), (2, 50)];

/// A mental-math technique. Decides how operands are picked and explained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Strategy {
    Distributive,
    Compensation,
    CompatibleNumbers,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Distributive,
        Strategy::Compensation,
        Strategy::CompatibleNumbers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Distributive => "Distributive Property",
            Strategy::Compensation => "Compensation",
            Strategy::CompatibleNumbers => "Compatible Numbers",
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Strategy {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Problem {
    /// Rendered expression, e.g. `7 × 26`.
    pub question: String,
    pub answer: i64,
    pub strategy: Strategy,
    pub hint: String,
}

impl Problem {
    /// `factor × split`, solved by breaking `split` into tens and ones.
    pub fn distributive(factor: i64, split: i64) -> Self {
        let tens = split / 10 * 10;
        let ones = split % 10;
        Self {
            question: format!("{} {} {}", factor, TIMES, split),
            answer: factor * split,
            strategy: Strategy::Distributive,
            hint: format!(
                "Break {} into tens and ones ({} = {} + {}), multiply both parts by {}, then add the results.",
                split, split, tens, ones, factor
            ),
        }
    }

    /// `factor × anchor`, solved by rounding the anchor up by one and
    /// taking the extra `factor` back off.
    pub fn compensation(factor: i64, anchor: i64) -> Self {
        let rounded = anchor + 1;
        let target = if anchor > 50 { "hundred" } else { "fifty" };
        Self {
            question: format!("{} {} {}", factor, TIMES, anchor),
            answer: factor * anchor,
            strategy: Strategy::Compensation,
            hint: format!(
                "Round {} up to the nearest {} ({}), work out {} {} {}, then subtract the extra {} you added.",
                anchor, target, rounded, factor, TIMES, rounded, factor
            ),
        }
    }

    /// `pair.0 × middle × pair.1`, solved by multiplying the pair first.
    pub fn compatible(pair: (i64, i64), middle: i64) -> Self {
        let (left, right) = pair;
        Self {
            question: format!("{} {} {} {} {}", left, TIMES, middle, TIMES, right),
            answer: left * middle * right,
            strategy: Strategy::CompatibleNumbers,
            hint: format!(
                "Use the Commutative Property to reorder the factors. Multiply the compatible pair ({} {} {} = {}) first!",
                left,
                TIMES,
                right,
                left * right
            ),
        }
    }
}

/// Picks one of the three strategies uniformly and samples its operands.
pub fn generate_problem<R: Rng + ?Sized>(rng: &mut R) -> Problem {
    let problem = match Strategy::random(rng) {
        Strategy::Distributive => {
            let factor = rng.gen_range(3..=10);
            let split = DISTRIBUTIVE_SPLITS[rng.gen_range(0..DISTRIBUTIVE_SPLITS.len())];
            Problem::distributive(factor, split)
        }
        Strategy::Compensation => {
            let factor = rng.gen_range(2..=9);
            let anchor = if rng.gen_bool(0.5) {
                COMPENSATION_ANCHORS[0]
            } else {
                COMPENSATION_ANCHORS[1]
            };
            Problem::compensation(factor, anchor)
        }
        Strategy::CompatibleNumbers => {
            let pair = if rng.gen_bool(0.5) {
                COMPATIBLE_PAIRS[0]
            } else {
                COMPATIBLE_PAIRS[1]
            };
            let middle = rng.gen_range(5..=19);
            Problem::compatible(pair, middle)
        }
    };
    log::debug!("Generated {} problem: {}", problem.strategy, problem.question);
    problem
}

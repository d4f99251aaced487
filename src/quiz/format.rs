//! Canonical string form of numeric answers.
//!
//! Multiple-choice grading compares strings, so every value that is shown as
//! an option or stored as a correct answer goes through [`format_answer`].

/// Magnitudes at or above this switch to exponential notation.
pub const EXPONENTIAL_UPPER: f64 = 1e6;
/// Non-zero magnitudes below this switch to exponential notation.
pub const EXPONENTIAL_LOWER: f64 = 1e-4;
pub const MAX_DECIMALS: usize = 6;
const EXPONENT_DIGITS: usize = 4;

/// Formats `value` so that equal values always render identically.
///
/// Very large and very small magnitudes use exponential notation with four
/// fractional digits (`1.2346e6`). Everything else is rounded to at most six
/// decimal places with trailing zeros and a trailing decimal point removed.
pub fn format_answer(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= EXPONENTIAL_UPPER || (magnitude != 0.0 && magnitude < EXPONENTIAL_LOWER) {
        return format!("{:.*e}", EXPONENT_DIGITS, value);
    }

    let fixed = format!("{:.*}", MAX_DECIMALS, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    // -0.0 and tiny negatives that round to zero
    if trimmed == "-0" {
        return "0".to_string();
    }
    trimmed.to_string()
}

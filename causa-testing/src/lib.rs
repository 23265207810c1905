//! Assertion helpers for slices of probabilities and rates.

use assert_float_eq::*;

fn assert_same_len(expected: &[f64], actual: &[f64]) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
}

pub fn assert_slice_f64_absolute(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_same_len(expected, actual);
    for (&expected, &actual) in expected.iter().zip(actual) {
        assert_float_absolute_eq!(expected, actual, epsilon);
    }
}

/// Asserts that no element exceeds its predecessor.
pub fn assert_non_increasing(values: &[f64]) {
    for (index, pair) in values.windows(2).enumerate() {
        assert!(
            pair[1] <= pair[0],
            "element {} ({}) exceeds element {} ({})",
            index + 1,
            pair[1],
            index,
            pair[0]
        );
    }
}

/// Asserts that every element is a probability in `[0, 1]`.
pub fn assert_probabilities(values: &[f64]) {
    for (index, &value) in values.iter().enumerate() {
        assert!(
            (0.0..=1.0).contains(&value),
            "element {index} ({value}) is not a probability"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_within_epsilon() {
        assert_slice_f64_absolute(&[0.5, 0.25], &[0.5001, 0.2499], 1e-3);
    }

    #[test]
    #[should_panic = "lengths do not match: 2 ≠ 1"]
    fn length_mismatch() {
        assert_slice_f64_absolute(&[0.5, 0.25], &[0.5], 1e-3);
    }

    #[test]
    fn non_increasing_accepts_plateaus() {
        assert_non_increasing(&[0.9, 0.6, 0.6, 0.1]);
        assert_non_increasing(&[]);
    }

    #[test]
    #[should_panic = "element 2 (0.7) exceeds element 1 (0.6)"]
    fn non_increasing_rejects_rise() {
        assert_non_increasing(&[0.9, 0.6, 0.7]);
    }

    #[test]
    #[should_panic = "element 1 (1.2) is not a probability"]
    fn probabilities_out_of_range() {
        assert_probabilities(&[0.3, 1.2]);
    }
}

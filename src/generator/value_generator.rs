//! Pluggable value generation strategies for sample instances

use crate::declaration::Validator;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which strategy to generate property values with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    /// Zero values, empty strings, empty arrays
    Empty,
    /// Randomized values, one-element arrays
    Sample,
}

/// Supplies primitive values during instance generation
///
/// Generated values honor range and length validators; regex-constrained
/// strings are generated without pattern awareness.
pub trait ValueGenerator {
    fn string(&mut self, property_name: &str, validator: Option<&Validator>) -> String;
    fn boolean(&mut self) -> bool;
    fn integer(&mut self, validator: Option<&Validator>) -> i32;
    fn long(&mut self, validator: Option<&Validator>) -> i64;
    fn double(&mut self, validator: Option<&Validator>) -> f64;
    fn date_time(&mut self) -> DateTime<Utc>;
    /// Pick one of `count` enum values
    fn enum_index(&mut self, count: usize) -> usize;
    /// How many elements to put in a generated array
    fn array_size(&mut self) -> usize;
    /// A synthetic identifier: a zero-padded 4-digit number
    fn identifier(&mut self) -> String;
}

fn integer_bounds(validator: Option<&Validator>) -> (Option<i64>, Option<i64>) {
    match validator {
        Some(Validator::IntegerRange { lower, upper }) => (*lower, *upper),
        _ => (None, None),
    }
}

fn double_bounds(validator: Option<&Validator>) -> (Option<f64>, Option<f64>) {
    match validator {
        Some(Validator::DoubleRange { lower, upper }) => (*lower, *upper),
        _ => (None, None),
    }
}

fn length_bounds(validator: Option<&Validator>) -> (Option<u64>, Option<u64>) {
    match validator {
        Some(Validator::Length { min, max }) => (*min, *max),
        _ => (None, None),
    }
}

fn fit_length(mut value: String, validator: Option<&Validator>) -> String {
    let (min, max) = length_bounds(validator);
    if let Some(max) = max {
        if value.chars().count() as u64 > max {
            value = value.chars().take(max as usize).collect();
        }
    }
    if let Some(min) = min {
        while (value.chars().count() as u64) < min {
            value.push('a');
        }
    }
    value
}

/// Generates zero values: empty strings, false, zeroes, the epoch
#[derive(Debug, Default)]
pub struct EmptyValueGenerator;

impl EmptyValueGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ValueGenerator for EmptyValueGenerator {
    fn string(&mut self, _property_name: &str, validator: Option<&Validator>) -> String {
        fit_length(String::new(), validator)
    }

    fn boolean(&mut self) -> bool {
        false
    }

    fn integer(&mut self, validator: Option<&Validator>) -> i32 {
        let (lower, upper) = integer_bounds(validator);
        0i64.clamp(lower.unwrap_or(i64::MIN), upper.unwrap_or(i64::MAX))
            .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    fn long(&mut self, validator: Option<&Validator>) -> i64 {
        let (lower, upper) = integer_bounds(validator);
        0i64.clamp(lower.unwrap_or(i64::MIN), upper.unwrap_or(i64::MAX))
    }

    fn double(&mut self, validator: Option<&Validator>) -> f64 {
        let (lower, upper) = double_bounds(validator);
        0f64.clamp(lower.unwrap_or(f64::MIN), upper.unwrap_or(f64::MAX))
    }

    fn date_time(&mut self) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
    }

    fn enum_index(&mut self, _count: usize) -> usize {
        0
    }

    fn array_size(&mut self) -> usize {
        0
    }

    fn identifier(&mut self) -> String {
        "0000".to_string()
    }
}

/// Generates randomized sample values
#[derive(Debug)]
pub struct SampleValueGenerator {
    rng: StdRng,
}

impl SampleValueGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A deterministic generator for reproducible samples
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SampleValueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueGenerator for SampleValueGenerator {
    fn string(&mut self, property_name: &str, validator: Option<&Validator>) -> String {
        let suffix: u32 = self.rng.gen_range(0..10_000);
        fit_length(format!("{}_{}", property_name, suffix), validator)
    }

    fn boolean(&mut self) -> bool {
        self.rng.gen()
    }

    fn integer(&mut self, validator: Option<&Validator>) -> i32 {
        let (lower, upper) = integer_bounds(validator);
        let lo = lower.unwrap_or(0).max(i32::MIN as i64);
        let hi = upper.unwrap_or(lo + 100).min(i32::MAX as i64);
        self.rng.gen_range(lo..=hi.max(lo)) as i32
    }

    fn long(&mut self, validator: Option<&Validator>) -> i64 {
        let (lower, upper) = integer_bounds(validator);
        let lo = lower.unwrap_or(0);
        let hi = upper.unwrap_or(lo.saturating_add(100_000));
        self.rng.gen_range(lo..=hi.max(lo))
    }

    fn double(&mut self, validator: Option<&Validator>) -> f64 {
        let (lower, upper) = double_bounds(validator);
        let lo = lower.unwrap_or(0.0);
        let hi = upper.unwrap_or(lo + 100.0);
        self.rng.gen_range(lo..=hi.max(lo))
    }

    fn date_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    fn enum_index(&mut self, count: usize) -> usize {
        if count == 0 {
            0
        } else {
            self.rng.gen_range(0..count)
        }
    }

    fn array_size(&mut self) -> usize {
        1
    }

    fn identifier(&mut self) -> String {
        format!("{:04}", self.rng.gen_range(0..10_000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_generator_zero_values() {
        let mut gen = EmptyValueGenerator::new();
        assert_eq!(gen.string("name", None), "");
        assert!(!gen.boolean());
        assert_eq!(gen.integer(None), 0);
        assert_eq!(gen.long(None), 0);
        assert_eq!(gen.double(None), 0.0);
        assert_eq!(gen.array_size(), 0);
        assert_eq!(gen.identifier(), "0000");
    }

    #[test]
    fn test_empty_generator_respects_lower_bound() {
        let v = Validator::IntegerRange {
            lower: Some(10),
            upper: Some(20),
        };
        let mut gen = EmptyValueGenerator::new();
        assert_eq!(gen.integer(Some(&v)), 10);

        let v = Validator::Length {
            min: Some(3),
            max: None,
        };
        assert_eq!(gen.string("name", Some(&v)), "aaa");
    }

    #[test]
    fn test_sample_generator_ranges() {
        let v = Validator::IntegerRange {
            lower: Some(5),
            upper: Some(9),
        };
        let mut gen = SampleValueGenerator::with_seed(7);
        for _ in 0..32 {
            let value = gen.integer(Some(&v));
            assert!((5..=9).contains(&value));
        }
    }

    #[test]
    fn test_sample_generator_double_range() {
        let v = Validator::DoubleRange {
            lower: Some(1.0),
            upper: Some(2.0),
        };
        let mut gen = SampleValueGenerator::with_seed(7);
        for _ in 0..32 {
            let value = gen.double(Some(&v));
            assert!((1.0..=2.0).contains(&value));
        }
    }

    #[test]
    fn test_sample_generator_string_length() {
        let v = Validator::Length {
            min: Some(2),
            max: Some(6),
        };
        let mut gen = SampleValueGenerator::with_seed(7);
        for _ in 0..8 {
            let len = gen.string("tag", Some(&v)).chars().count() as u64;
            assert!((2..=6).contains(&len));
        }
    }

    #[test]
    fn test_sample_identifier_is_four_digits() {
        let mut gen = SampleValueGenerator::with_seed(7);
        for _ in 0..16 {
            let id = gen.identifier();
            assert_eq!(id.len(), 4);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_sample_generator_deterministic_with_seed() {
        let mut a = SampleValueGenerator::with_seed(42);
        let mut b = SampleValueGenerator::with_seed(42);
        assert_eq!(a.integer(None), b.integer(None));
        assert_eq!(a.string("x", None), b.string("x", None));
    }
}

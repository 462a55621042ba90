//! Property validators, compiled at model load

use crate::error::{ConcertoError, Result};
use crate::metamodel::ValidatorAst;
use crate::util::PrimitiveType;
use regex::{Regex, RegexBuilder};

/// A compiled validator attached to a field
#[derive(Debug, Clone)]
pub enum Validator {
    /// Pattern match over String values
    Regex(StringRegexValidator),
    /// Inclusive bounds over Integer/Long values
    IntegerRange {
        lower: Option<i64>,
        upper: Option<i64>,
    },
    /// Inclusive bounds over Double values
    DoubleRange {
        lower: Option<f64>,
        upper: Option<f64>,
    },
    /// Inclusive length bounds over String values
    Length {
        min: Option<u64>,
        max: Option<u64>,
    },
}

/// A regex validator with its compiled pattern
#[derive(Debug, Clone)]
pub struct StringRegexValidator {
    pub pattern: String,
    pub flags: Option<String>,
    compiled: Regex,
}

impl PartialEq for StringRegexValidator {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.flags == other.flags
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Validator::Regex(a), Validator::Regex(b)) => a == b,
            (
                Validator::IntegerRange { lower: a1, upper: a2 },
                Validator::IntegerRange { lower: b1, upper: b2 },
            ) => a1 == b1 && a2 == b2,
            (
                Validator::DoubleRange { lower: a1, upper: a2 },
                Validator::DoubleRange { lower: b1, upper: b2 },
            ) => a1 == b1 && a2 == b2,
            (
                Validator::Length { min: a1, max: a2 },
                Validator::Length { min: b1, max: b2 },
            ) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl StringRegexValidator {
    /// Compile a pattern with optional flags (`i`, `m`, `s`, `x`, `u`)
    pub fn new(pattern: &str, flags: Option<&str>, context: &str) -> Result<Self> {
        let mut builder = RegexBuilder::new(pattern);
        if let Some(flags) = flags {
            for flag in flags.chars() {
                match flag {
                    'i' => {
                        builder.case_insensitive(true);
                    }
                    'm' => {
                        builder.multi_line(true);
                    }
                    's' => {
                        builder.dot_matches_new_line(true);
                    }
                    'x' => {
                        builder.ignore_whitespace(true);
                    }
                    // patterns are unicode-aware already
                    'u' => {}
                    other => {
                        return Err(ConcertoError::IllegalModel(format!(
                            "{}: unsupported regex flag \"{}\"",
                            context, other
                        )));
                    }
                }
            }
        }
        let compiled = builder.build().map_err(|e| {
            ConcertoError::IllegalModel(format!(
                "{}: invalid regex /{}/: {}",
                context, pattern, e
            ))
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            flags: flags.map(|f| f.to_string()),
            compiled,
        })
    }

    /// Search-match a value against the pattern
    pub fn is_match(&self, value: &str) -> bool {
        self.compiled.is_match(value)
    }
}

impl Validator {
    /// Compile a validator clause for a field of the given primitive type
    ///
    /// Enforces the family rules: regex and length apply only to String,
    /// range only to the numeric primitives, and range bounds must be of the
    /// field's numeric kind with lower <= upper.
    pub fn from_ast(
        ast: &ValidatorAst,
        field_type: PrimitiveType,
        context: &str,
    ) -> Result<Self> {
        match ast {
            ValidatorAst::Regex { pattern, flags } => {
                if field_type != PrimitiveType::String {
                    return Err(ConcertoError::IllegalModel(format!(
                        "{}: regex validator requires a String field, found {}",
                        context,
                        field_type.name()
                    )));
                }
                Ok(Validator::Regex(StringRegexValidator::new(
                    pattern,
                    flags.as_deref(),
                    context,
                )?))
            }
            ValidatorAst::Length { min, max } => {
                if field_type != PrimitiveType::String {
                    return Err(ConcertoError::IllegalModel(format!(
                        "{}: length validator requires a String field, found {}",
                        context,
                        field_type.name()
                    )));
                }
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(ConcertoError::IllegalModel(format!(
                            "{}: length lower bound {} exceeds upper bound {}",
                            context, min, max
                        )));
                    }
                }
                Ok(Validator::Length {
                    min: *min,
                    max: *max,
                })
            }
            ValidatorAst::Range { lower, upper } => match field_type {
                PrimitiveType::Integer | PrimitiveType::Long => {
                    let as_int = |bound: &Option<serde_json::Number>| -> Result<Option<i64>> {
                        match bound {
                            None => Ok(None),
                            Some(n) => n.as_i64().map(Some).ok_or_else(|| {
                                ConcertoError::IllegalModel(format!(
                                    "{}: range bound {} is not an integer",
                                    context, n
                                ))
                            }),
                        }
                    };
                    let lower = as_int(lower)?;
                    let upper = as_int(upper)?;
                    if let (Some(lo), Some(hi)) = (lower, upper) {
                        if lo > hi {
                            return Err(ConcertoError::IllegalModel(format!(
                                "{}: range lower bound {} exceeds upper bound {}",
                                context, lo, hi
                            )));
                        }
                    }
                    Ok(Validator::IntegerRange { lower, upper })
                }
                PrimitiveType::Double => {
                    let lower = lower.as_ref().and_then(|n| n.as_f64());
                    let upper = upper.as_ref().and_then(|n| n.as_f64());
                    if let (Some(lo), Some(hi)) = (lower, upper) {
                        if lo > hi {
                            return Err(ConcertoError::IllegalModel(format!(
                                "{}: range lower bound {} exceeds upper bound {}",
                                context, lo, hi
                            )));
                        }
                    }
                    Ok(Validator::DoubleRange { lower, upper })
                }
                other => Err(ConcertoError::IllegalModel(format!(
                    "{}: range validator requires a numeric field, found {}",
                    context,
                    other.name()
                ))),
            },
        }
    }

    /// Validate a String value
    pub fn validate_string(&self, value: &str, context: &str) -> Result<()> {
        match self {
            Validator::Regex(regex) => {
                if !regex.is_match(value) {
                    return Err(ConcertoError::ModelViolation(format!(
                        "{} failed validation: value \"{}\" does not match /{}/",
                        context, value, regex.pattern
                    )));
                }
            }
            Validator::Length { min, max } => {
                let len = value.chars().count() as u64;
                if min.map_or(false, |min| len < min) || max.map_or(false, |max| len > max) {
                    return Err(ConcertoError::ModelViolation(format!(
                        "{} failed validation: length {} outside [{:?},{:?}]",
                        context, len, min, max
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate an Integer/Long value
    pub fn validate_integer(&self, value: i64, context: &str) -> Result<()> {
        if let Validator::IntegerRange { lower, upper } = self {
            if lower.map_or(false, |lo| value < lo) || upper.map_or(false, |hi| value > hi) {
                return Err(ConcertoError::ModelViolation(format!(
                    "{} failed validation: value {} outside range [{:?},{:?}]",
                    context, value, lower, upper
                )));
            }
        }
        Ok(())
    }

    /// Validate a Double value
    pub fn validate_double(&self, value: f64, context: &str) -> Result<()> {
        if let Validator::DoubleRange { lower, upper } = self {
            if lower.map_or(false, |lo| value < lo) || upper.map_or(false, |hi| value > hi) {
                return Err(ConcertoError::ModelViolation(format!(
                    "{} failed validation: value {} outside range [{:?},{:?}]",
                    context, value, lower, upper
                )));
            }
        }
        Ok(())
    }
}

//! Input-schema validation for company and job payloads.
//!
//! Inputs are first shaped by serde (unknown fields and wrong JSON types are
//! rejected there); the checks in this module cover the value constraints the
//! schemas carry on top of that: lengths, minimums, URL and pattern formats.

use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// A machine-friendly validation code.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    Len,
    Range,
    Regex,
    Url,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Range => "range",
            Self::Regex => "regex",
            Self::Url => "url",
        }
    }
}

impl Serialize for ValidationCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

/// A collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub items: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.items.push(err);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.items.iter()
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Require `value` to have between `min` and `max` characters (inclusive).
    pub fn check_len(&mut self, field: &str, value: &str, min: usize, max: Option<usize>) {
        let len = value.chars().count();
        if len < min {
            self.push(ValidationError::new(
                field,
                ValidationCode::Len,
                format!("must be at least {min} characters"),
            ));
        } else if let Some(max) = max.filter(|max| len > *max) {
            self.push(ValidationError::new(
                field,
                ValidationCode::Len,
                format!("must be at most {max} characters"),
            ));
        }
    }

    /// Require `value >= min`.
    pub fn check_min(&mut self, field: &str, value: i32, min: i32) {
        if value < min {
            self.push(ValidationError::new(
                field,
                ValidationCode::Range,
                format!("must be at least {min}"),
            ));
        }
    }

    pub fn check_url(&mut self, field: &str, value: &str) {
        if !is_url(value) {
            self.push(ValidationError::new(
                field,
                ValidationCode::Url,
                "must be a valid URL",
            ));
        }
    }

    pub fn check_equity(&mut self, field: &str, value: &str) {
        if !is_equity(value) {
            self.push(ValidationError::new(
                field,
                ValidationCode::Regex,
                "must be a decimal between 0 and 1",
            ));
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Equity is a fraction in `[0, 1]` written as a decimal string (`"0"`, `".5"`, `"0.25"`, `"1.0"`).
pub fn is_equity(s: &str) -> bool {
    static EQUITY_RE: OnceLock<regex::Regex> = OnceLock::new();
    EQUITY_RE
        .get_or_init(|| {
            regex::Regex::new(r"^(0|0?\.[0-9]+|1(\.0+)?)$").expect("invalid built-in equity regex")
        })
        .is_match(s)
}

//! Input validation primitives
//!
//! Payload structs implement [`Validate`]; checks accumulate into a
//! [`FieldErrors`] collector so a caller sees every problem at once.

use crate::error::{ClubError, ClubResult, FieldError};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Typed payload that can check itself before it reaches authorization or storage
pub trait Validate: Sized {
    /// Context the checks need, such as the configured catalogs
    type Rules: ?Sized;

    fn validate(&self, rules: &Self::Rules, errors: &mut FieldErrors);

    /// Run the checks and hand the value back only if all of them passed
    fn validated(self, rules: &Self::Rules) -> ClubResult<Self> {
        let mut errors = FieldErrors::default();
        self.validate(rules, &mut errors);
        errors.into_result(self)
    }
}

/// Accumulator for field-level failures with nested path support
#[derive(Debug, Default)]
pub struct FieldErrors {
    prefix: Vec<String>,
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        let path = if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix.join("."), field)
        };
        self.errors.push(FieldError::new(path, message));
    }

    /// Run `f` with `segment` prepended to every field it reports
    pub fn nested<F: FnOnce(&mut Self)>(&mut self, segment: String, f: F) {
        self.prefix.push(segment);
        f(self);
        self.prefix.pop();
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn into_result<T>(self, value: T) -> ClubResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ClubError::validation(self.errors, "validation"))
        }
    }

    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }

    pub fn non_empty(&mut self, field: &str, value: Option<&str>) {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            self.push(field, "must not be empty");
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            if !is_email(value) {
                self.push(field, "must be a valid email");
            }
        }
    }

    pub fn url(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            if !is_url(value) {
                self.push(field, "must be a valid URL");
            }
        }
    }

    /// Each element of `values` must appear in `allowed`
    pub fn each_one_of(&mut self, field: &str, values: &[String], allowed: &[String], what: &str) {
        for (index, value) in values.iter().enumerate() {
            if !allowed.contains(value) {
                self.push(
                    &format!("{}[{}]", field, index),
                    format!("must be a valid {}", what),
                );
            }
        }
    }

    pub fn one_of(&mut self, field: &str, value: Option<&str>, allowed: &[String], what: &str) {
        if let Some(value) = value {
            if !allowed.iter().any(|a| a == value) {
                self.push(field, format!("must be a valid {}", what));
            }
        }
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Absolute http(s) URL
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

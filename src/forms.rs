//! Client-side form validation shared by the record inputs.
//! Inputs implement `Validate`; wrappers call it before anything goes on the wire.

use std::fmt;

use chrono::{Local, NaiveDate};

/// Field name to message, in the order the problems were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<(String, String)>,
}

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn single<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut e = Self::new();
        e.add(field, message);
        e
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.errors.push((field.into(), message.into()));
    }

    pub fn is_empty(&self) -> bool { self.errors.is_empty() }

    pub fn len(&self) -> usize { self.errors.len() }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|(f, _)| f == field).map(|(_, m)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    // Rule helpers ----------------------------------------------------------

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
    }

    pub fn require_id(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        } else if uuid::Uuid::parse_str(value.trim()).is_err() {
            self.add(field, "must be a valid identifier");
        }
    }

    /// Parse a `YYYY-MM-DD` field, recording a message on failure.
    pub fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        match parse_date(value) {
            Some(d) => Some(d),
            None => {
                self.add(field, "must be a date in YYYY-MM-DD format");
                None
            }
        }
    }

    pub fn not_in_future(&mut self, field: &str, date: NaiveDate) {
        if date > Local::now().date_naive() {
            self.add(field, "must not be in the future");
        }
    }

    pub fn range<T: PartialOrd + fmt::Display + Copy>(&mut self, field: &str, value: Option<T>, min: T, max: T) {
        if let Some(v) = value {
            if v < min || v > max {
                self.add(field, format!("must be between {} and {}", min, max));
            }
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|(k, m)| format!("{} {}", k, m)).collect();
        f.write_str(&parts.join("; "))
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

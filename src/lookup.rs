//! Routing a staff search to the barcode or email procedure

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static BARCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2}[0-9]{10}$").expect("barcode pattern is valid"));

/// A classified staff search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// Two letters and ten digits, uppercased
    Barcode(String),
    Email(String),
}

impl LookupQuery {
    /// Classify raw search input. Empty input is rejected.
    pub fn classify(input: &str) -> Result<Self> {
        let query = input.trim();
        if query.is_empty() {
            return Err(Error::validation("enter an email or barcode"));
        }
        if BARCODE.is_match(query) {
            Ok(LookupQuery::Barcode(query.to_uppercase()))
        } else {
            Ok(LookupQuery::Email(query.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LookupQuery::Barcode(code) => code,
            LookupQuery::Email(email) => email,
        }
    }
}

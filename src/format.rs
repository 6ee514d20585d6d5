//! Presentation formatting shared by both views

use chrono::{DateTime, Utc};

use crate::models::Amount;

/// Label used when a purchase carries no staff attribution
pub const SYSTEM_LABEL: &str = "System";

pub fn money(amount: Amount) -> String {
    format!("${}", amount)
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y %H:%M").to_string()
}

pub fn barcode(code: Option<&str>) -> String {
    code.unwrap_or("N/A").to_string()
}

pub fn attribution(label: Option<&str>) -> String {
    label.unwrap_or(SYSTEM_LABEL).to_string()
}

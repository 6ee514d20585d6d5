//! Rows exchanged with the remote store

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A monetary amount, always held at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::from_parts(0, 0, 0, false, 2));

    /// Largest amount accepted from input, the range of a `numeric(10,2)` column
    pub const MAX: Amount = Amount(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    pub fn new(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Amount(rounded)
    }

    /// Parse user input; only strictly positive amounts are accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("amount is required"));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| Error::validation(format!("'{}' is not a valid amount", trimmed)))?;
        if value > Amount::MAX.0 {
            return Err(Error::validation(format!(
                "amount cannot be more than {}",
                Amount::MAX
            )));
        }
        let amount = Amount::new(value);
        if amount.0 <= Decimal::ZERO {
            return Err(Error::validation("amount must be greater than zero"));
        }
        Ok(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::ZERO
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded purchase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Amount,
    #[serde(default)]
    pub notes: Option<String>,
    pub purchase_date: DateTime<Utc>,
    #[serde(default)]
    pub added_by_admin_id: Option<Uuid>,
    #[serde(default)]
    pub added_by_admin_email: Option<String>,
}

/// Insert payload; the store assigns the id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPurchase {
    pub user_id: Uuid,
    pub amount: Amount,
    pub notes: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub added_by_admin_id: Option<Uuid>,
    pub added_by_admin_email: Option<String>,
}

impl NewPurchase {
    /// A purchase the customer records for themselves
    pub fn self_service(user_id: Uuid, amount: Amount, notes: Option<String>) -> Self {
        Self {
            user_id,
            amount,
            notes,
            purchase_date: Utc::now(),
            added_by_admin_id: None,
            added_by_admin_email: None,
        }
    }

    /// A purchase staff records on a customer's behalf
    pub fn by_staff(
        user_id: Uuid,
        amount: Amount,
        notes: Option<String>,
        staff_id: Uuid,
        staff_label: Option<String>,
    ) -> Self {
        Self {
            added_by_admin_id: Some(staff_id),
            added_by_admin_email: staff_label,
            ..Self::self_service(user_id, amount, notes)
        }
    }
}

/// Self-service edit payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseUpdate {
    pub user_id: Uuid,
    pub amount: Amount,
    pub notes: Option<String>,
    pub purchase_date: DateTime<Utc>,
}

impl PurchaseUpdate {
    pub fn new(user_id: Uuid, amount: Amount, notes: Option<String>) -> Self {
        Self {
            user_id,
            amount,
            notes,
            purchase_date: Utc::now(),
        }
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Amount>::deserialize(deserializer)?.unwrap_or(Amount::ZERO))
}

/// One row from the customer lookup procedures
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerStats {
    pub user_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub total_purchases: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_spent: Amount,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub average_spent: Amount,
}

/// Count, total and average over a set of purchases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerStats {
    pub count: usize,
    pub total: Amount,
    pub average: Amount,
}

impl LedgerStats {
    /// Fails with `Error::Overflow` when the total does not fit a `Decimal`
    pub fn from_purchases(purchases: &[Purchase]) -> Result<Self> {
        let count = purchases.len();
        let total = purchases
            .iter()
            .try_fold(Decimal::ZERO, |sum, p| sum.checked_add(p.amount.value()))
            .ok_or_else(|| Error::overflow(format!("total of {} purchases", count)))?;
        let average = if count > 0 {
            total / Decimal::from(count)
        } else {
            Decimal::ZERO
        };
        Ok(Self {
            count,
            total: Amount::new(total),
            average: Amount::new(average),
        })
    }
}

/// Empty notes are stored as null
pub fn normalize_note(note: &str) -> Option<String> {
    let trimmed = note.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

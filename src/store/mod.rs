//! The remote store capability the views depend on

mod memory;
mod rest;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CustomerStats, NewPurchase, Purchase, PurchaseUpdate};

pub use memory::{MemoryStore, StoreCall};
pub use rest::RestStore;

/// Row fetch/insert/update/delete and procedure calls against the store.
///
/// Authorization happens remotely; the owner filters here only narrow what a
/// call can touch.
#[async_trait]
pub trait LoyaltyStore: Send + Sync {
    /// All purchases of `owner`, newest first
    async fn list_purchases(&self, owner: Uuid) -> Result<Vec<Purchase>>;

    /// One purchase, only if it belongs to `owner`
    async fn find_purchase(&self, id: Uuid, owner: Uuid) -> Result<Option<Purchase>>;

    /// Insert one or more purchases in a single call
    async fn insert_purchases(&self, rows: &[NewPurchase]) -> Result<()>;

    /// Update a purchase scoped by id and owner; returns affected rows
    async fn update_purchase(&self, id: Uuid, owner: Uuid, update: &PurchaseUpdate) -> Result<u64>;

    /// Delete a purchase by id, optionally also scoped by owner; returns affected rows
    async fn delete_purchase(&self, id: Uuid, owner: Option<Uuid>) -> Result<u64>;

    /// Delete every purchase of `owner`; returns affected rows
    async fn delete_purchases_for(&self, owner: Uuid) -> Result<u64>;

    /// Whether `user` carries the admin marker
    async fn is_admin(&self, user: Uuid) -> Result<bool>;

    /// Customer aggregate row by exact email
    async fn lookup_by_email(&self, email: &str) -> Result<Option<CustomerStats>>;

    /// Customer aggregate row by barcode (already uppercased)
    async fn lookup_by_barcode(&self, barcode: &str) -> Result<Option<CustomerStats>>;

    /// The barcode assigned to `user`, if any
    async fn barcode_for(&self, user: Uuid) -> Result<Option<String>>;
}

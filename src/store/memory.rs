//! In-memory `LoyaltyStore` for tests and demos

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{CustomerStats, LedgerStats, NewPurchase, Purchase, PurchaseUpdate};
use crate::store::LoyaltyStore;

/// One call made against the store, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListPurchases(Uuid),
    FindPurchase(Uuid, Uuid),
    InsertPurchases(usize),
    UpdatePurchase(Uuid, Uuid),
    DeletePurchase(Uuid, Option<Uuid>),
    DeletePurchasesFor(Uuid),
    IsAdmin(Uuid),
    LookupByEmail(String),
    LookupByBarcode(String),
    BarcodeFor(Uuid),
}

#[derive(Debug, Clone)]
struct Customer {
    email: String,
    barcode: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    purchases: Vec<Purchase>,
    customers: HashMap<Uuid, Customer>,
    admins: HashSet<Uuid>,
    calls: Vec<StoreCall>,
    failing: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, then fail if the store is set to fail
    fn enter(&self, call: StoreCall) -> Result<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(call);
        if state.failing {
            return Err(Error::UnparsedApi {
                message: "store unavailable".to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(state)
    }

    pub fn add_customer(&self, id: Uuid, email: &str, barcode: Option<&str>) {
        self.state().customers.insert(
            id,
            Customer {
                email: email.to_string(),
                barcode: barcode.map(str::to_string),
            },
        );
    }

    pub fn add_admin(&self, id: Uuid) {
        self.state().admins.insert(id);
    }

    /// Seed a purchase directly, bypassing the call log
    pub fn seed(&self, row: NewPurchase) -> Uuid {
        let id = Uuid::new_v4();
        self.state().purchases.push(materialize(id, row));
        id
    }

    /// Make every following call fail like an unreachable backend
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn purchases_of(&self, owner: Uuid) -> Vec<Purchase> {
        let mut rows: Vec<Purchase> = self
            .state()
            .purchases
            .iter()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.purchase_date.cmp(&a.purchase_date));
        rows
    }
}

fn stats_for(state: &State, id: Uuid) -> Result<Option<CustomerStats>> {
    let customer = match state.customers.get(&id) {
        Some(customer) => customer,
        None => return Ok(None),
    };
    let rows: Vec<Purchase> = state
        .purchases
        .iter()
        .filter(|p| p.user_id == id)
        .cloned()
        .collect();
    let stats = LedgerStats::from_purchases(&rows)?;
    Ok(Some(CustomerStats {
        user_id: id,
        email: customer.email.clone(),
        barcode: customer.barcode.clone(),
        total_purchases: stats.count as u64,
        total_spent: stats.total,
        average_spent: stats.average,
    }))
}

fn materialize(id: Uuid, row: NewPurchase) -> Purchase {
    Purchase {
        id,
        user_id: row.user_id,
        amount: row.amount,
        notes: row.notes,
        purchase_date: row.purchase_date,
        added_by_admin_id: row.added_by_admin_id,
        added_by_admin_email: row.added_by_admin_email,
    }
}

#[async_trait]
impl LoyaltyStore for MemoryStore {
    async fn list_purchases(&self, owner: Uuid) -> Result<Vec<Purchase>> {
        drop(self.enter(StoreCall::ListPurchases(owner))?);
        Ok(self.purchases_of(owner))
    }

    async fn find_purchase(&self, id: Uuid, owner: Uuid) -> Result<Option<Purchase>> {
        let state = self.enter(StoreCall::FindPurchase(id, owner))?;
        Ok(state
            .purchases
            .iter()
            .find(|p| p.id == id && p.user_id == owner)
            .cloned())
    }

    async fn insert_purchases(&self, rows: &[NewPurchase]) -> Result<()> {
        let mut state = self.enter(StoreCall::InsertPurchases(rows.len()))?;
        for row in rows {
            state.purchases.push(materialize(Uuid::new_v4(), row.clone()));
        }
        Ok(())
    }

    async fn update_purchase(&self, id: Uuid, owner: Uuid, update: &PurchaseUpdate) -> Result<u64> {
        let mut state = self.enter(StoreCall::UpdatePurchase(id, owner))?;
        let mut affected = 0;
        for row in state
            .purchases
            .iter_mut()
            .filter(|p| p.id == id && p.user_id == owner)
        {
            row.user_id = update.user_id;
            row.amount = update.amount;
            row.notes = update.notes.clone();
            row.purchase_date = update.purchase_date;
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete_purchase(&self, id: Uuid, owner: Option<Uuid>) -> Result<u64> {
        let mut state = self.enter(StoreCall::DeletePurchase(id, owner))?;
        let before = state.purchases.len();
        state
            .purchases
            .retain(|p| !(p.id == id && owner.map_or(true, |o| p.user_id == o)));
        Ok((before - state.purchases.len()) as u64)
    }

    async fn delete_purchases_for(&self, owner: Uuid) -> Result<u64> {
        let mut state = self.enter(StoreCall::DeletePurchasesFor(owner))?;
        let before = state.purchases.len();
        state.purchases.retain(|p| p.user_id != owner);
        Ok((before - state.purchases.len()) as u64)
    }

    async fn is_admin(&self, user: Uuid) -> Result<bool> {
        let state = self.enter(StoreCall::IsAdmin(user))?;
        Ok(state.admins.contains(&user))
    }

    async fn lookup_by_email(&self, email: &str) -> Result<Option<CustomerStats>> {
        let state = self.enter(StoreCall::LookupByEmail(email.to_string()))?;
        let id = state
            .customers
            .iter()
            .find(|(_, c)| c.email == email)
            .map(|(id, _)| *id);
        match id {
            Some(id) => stats_for(&state, id),
            None => Ok(None),
        }
    }

    async fn lookup_by_barcode(&self, barcode: &str) -> Result<Option<CustomerStats>> {
        let state = self.enter(StoreCall::LookupByBarcode(barcode.to_string()))?;
        let id = state
            .customers
            .iter()
            .find(|(_, c)| c.barcode.as_deref() == Some(barcode))
            .map(|(id, _)| *id);
        match id {
            Some(id) => stats_for(&state, id),
            None => Ok(None),
        }
    }

    async fn barcode_for(&self, user: Uuid) -> Result<Option<String>> {
        let state = self.enter(StoreCall::BarcodeFor(user))?;
        Ok(state.customers.get(&user).and_then(|c| c.barcode.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Amount;

    fn row(owner: Uuid, amount: &str) -> NewPurchase {
        NewPurchase::self_service(owner, Amount::parse(amount).unwrap(), None)
    }

    #[tokio::test]
    async fn scoped_update_ignores_other_owners() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let id = store.seed(row(owner, "5"));

        let update = PurchaseUpdate::new(Uuid::new_v4(), Amount::parse("9").unwrap(), None);
        let affected = store
            .update_purchase(id, Uuid::new_v4(), &update)
            .await
            .unwrap();
        assert_eq!(affected, 0);
        assert_eq!(store.purchases_of(owner)[0].amount.to_string(), "5.00");
    }

    #[tokio::test]
    async fn lookup_aggregates_purchases() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.add_customer(owner, "ana@example.com", Some("DN0000000001"));
        store.seed(row(owner, "10"));
        store.seed(row(owner, "20"));

        let stats = store
            .lookup_by_barcode("DN0000000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.email, "ana@example.com");
        assert_eq!(stats.total_purchases, 2);
        assert_eq!(stats.total_spent.to_string(), "30.00");
        assert_eq!(stats.average_spent.to_string(), "15.00");
        assert!(store.lookup_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_over_overflowing_rows_is_an_error() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.add_customer(owner, "ana@example.com", None);
        let huge: Amount =
            serde_json::from_value(serde_json::json!("79228162514264337593543950335")).unwrap();
        store.seed(NewPurchase::self_service(owner, huge, None));
        store.seed(NewPurchase::self_service(owner, huge, None));

        let result = store.lookup_by_email("ana@example.com").await;
        assert!(matches!(result, Err(Error::Overflow(_))));
    }

    #[tokio::test]
    async fn failing_store_still_records_calls() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let user = Uuid::new_v4();
        assert!(store.is_admin(user).await.is_err());
        assert_eq!(store.calls(), vec![StoreCall::IsAdmin(user)]);
    }
}

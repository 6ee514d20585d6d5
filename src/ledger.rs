//! Customer ledger view
//!
//! Shows the signed-in customer their own purchases, barcode and totals, and
//! lets them add, correct or remove a purchase one at a time. Every command
//! re-fetches from the store; nothing is cached between loads except the form.

use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::identity::{Identity, SessionAccessor};
use crate::models::{normalize_note, Amount, LedgerStats, NewPurchase, Purchase, PurchaseUpdate};
use crate::notice::{Confirm, Notifier};
use crate::outcome::{report, Outcome};
use crate::store::LoyaltyStore;

const ADDED: &str = "Purchase added successfully!";
const UPDATED: &str = "Purchase updated successfully!";
const DELETED: &str = "Purchase deleted successfully!";
const CONFIRM_DELETE: &str =
    "Are you sure you want to delete this purchase? This action cannot be undone.";

/// What the ledger renders after a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSnapshot {
    pub identity: Identity,
    pub barcode: Option<String>,
    pub purchases: Vec<Purchase>,
    pub stats: LedgerStats,
}

/// Contents of the add/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseForm {
    pub amount: String,
    pub note: String,
}

pub struct LedgerView {
    store: Arc<dyn LoyaltyStore>,
    session: Arc<dyn SessionAccessor>,
    notifier: Arc<dyn Notifier>,
    options: ClientOptions,
    snapshot: Option<LedgerSnapshot>,
    form: Option<PurchaseForm>,
    editing: Option<Uuid>,
    welcomed: Option<Uuid>,
}

impl LedgerView {
    pub fn new(
        store: Arc<dyn LoyaltyStore>,
        session: Arc<dyn SessionAccessor>,
        notifier: Arc<dyn Notifier>,
        options: ClientOptions,
    ) -> Self {
        Self {
            store,
            session,
            notifier,
            options,
            snapshot: None,
            form: None,
            editing: None,
            welcomed: None,
        }
    }

    pub fn snapshot(&self) -> Option<&LedgerSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn form(&self) -> Option<&PurchaseForm> {
        self.form.as_ref()
    }

    /// The purchase being edited, `None` when the form adds a new one
    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    async fn identity(&self) -> Result<Identity> {
        self.session.current_identity().await.ok_or(Error::NotSignedIn)
    }

    pub async fn load(&mut self) -> Outcome {
        let identity = match self.identity().await {
            Ok(identity) => identity,
            Err(err) => return report(self.notifier.as_ref(), "Failed to load purchases", err),
        };

        match self.fetch(identity).await {
            Ok(snapshot) => {
                info!(
                    "ledger loaded: {} purchases for {}",
                    snapshot.stats.count, snapshot.identity.id
                );
                self.snapshot = Some(snapshot);
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Failed to load purchases. Please refresh the page.",
                err,
            ),
        }
    }

    async fn fetch(&mut self, identity: Identity) -> Result<LedgerSnapshot> {
        let mut purchases = self.store.list_purchases(identity.id).await?;

        if purchases.is_empty() && self.welcomed != Some(identity.id) {
            self.welcomed = Some(identity.id);
            match self.grant_welcome_credit(identity.id).await {
                Ok(()) => match self.store.list_purchases(identity.id).await {
                    Ok(rows) => purchases = rows,
                    Err(err) => warn!("reload after welcome credit failed: {}", err),
                },
                Err(err) => warn!("welcome credit for {} failed: {}", identity.id, err),
            }
        }

        let barcode = match self.store.barcode_for(identity.id).await {
            Ok(barcode) => barcode,
            Err(err) => {
                warn!("could not load barcode for {}: {}", identity.id, err);
                None
            }
        };

        let stats = LedgerStats::from_purchases(&purchases)?;
        Ok(LedgerSnapshot {
            identity,
            barcode,
            purchases,
            stats,
        })
    }

    /// First-visit rows, inserted in one batch
    async fn grant_welcome_credit(&self, owner: Uuid) -> Result<()> {
        let credit = &self.options.welcome_credit;
        let now = Utc::now();
        let rows: Vec<NewPurchase> = (0..credit.rows)
            .map(|_| NewPurchase {
                user_id: owner,
                amount: Amount::new(credit.amount),
                notes: Some(credit.note.clone()),
                purchase_date: now,
                added_by_admin_id: None,
                added_by_admin_email: Some(credit.label.clone()),
            })
            .collect();
        info!("granting {} welcome rows to {}", rows.len(), owner);
        self.store.insert_purchases(&rows).await
    }

    pub fn open_new(&mut self) {
        self.editing = None;
        self.form = Some(PurchaseForm::default());
    }

    pub async fn save(&mut self, amount: &str, note: &str) -> Outcome {
        let editing = self.editing;
        match self.submit(amount, note).await {
            Ok(()) => {
                self.editing = None;
                self.form = None;
                self.notifier
                    .success(if editing.is_some() { UPDATED } else { ADDED });
                self.load().await;
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Failed to save purchase. Please try again.",
                err,
            ),
        }
    }

    async fn submit(&self, amount: &str, note: &str) -> Result<()> {
        let amount = Amount::parse(amount)?;
        let notes = normalize_note(note);
        let identity = self.identity().await?;

        match self.editing {
            Some(id) => {
                let update = PurchaseUpdate::new(identity.id, amount, notes);
                let affected = self.store.update_purchase(id, identity.id, &update).await?;
                if affected == 0 {
                    return Err(Error::not_found(format!("purchase {}", id)));
                }
                Ok(())
            }
            None => {
                let row = NewPurchase::self_service(identity.id, amount, notes);
                self.store.insert_purchases(&[row]).await
            }
        }
    }

    pub async fn edit(&mut self, id: Uuid) -> Outcome {
        match self.find(id).await {
            Ok(purchase) => {
                self.form = Some(PurchaseForm {
                    amount: purchase.amount.to_string(),
                    note: purchase.notes.unwrap_or_default(),
                });
                self.editing = Some(id);
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Failed to load purchase. Please try again.",
                err,
            ),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Purchase> {
        let identity = self.identity().await?;
        self.store
            .find_purchase(id, identity.id)
            .await?
            .ok_or_else(|| Error::not_found(format!("purchase {}", id)))
    }

    pub async fn delete(&mut self, id: Uuid, confirm: &mut dyn Confirm) -> Outcome {
        if !confirm.confirm(CONFIRM_DELETE) {
            return Outcome::Declined;
        }

        let result = match self.identity().await {
            Ok(identity) => self.store.delete_purchase(id, Some(identity.id)).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(0) => report(
                self.notifier.as_ref(),
                "Failed to delete purchase. Please try again.",
                Error::not_found(format!("purchase {}", id)),
            ),
            Ok(_) => {
                self.notifier.success(DELETED);
                self.load().await;
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Failed to delete purchase. Please try again.",
                err,
            ),
        }
    }

    pub fn close(&mut self) {
        self.editing = None;
        self.form = None;
        self.snapshot = None;
        self.notifier.clear();
    }
}

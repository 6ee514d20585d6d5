//! Staff console: find a customer, then adjust their purchases

use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::identity::{Identity, SessionAccessor};
use crate::lookup::LookupQuery;
use crate::models::{normalize_note, Amount, CustomerStats, NewPurchase, Purchase};
use crate::notice::{Confirm, Notifier};
use crate::outcome::{report, Outcome};
use crate::store::LoyaltyStore;

const FOUND: &str = "Customer found successfully!";
const NOT_FOUND: &str = "No customer found with that email or barcode.";
const ADDED: &str = "Purchase added successfully!";
const DELETED: &str = "Purchase deleted successfully!";
const RESET: &str = "History reset successfully!";
const CONFIRM_DELETE: &str =
    "Are you sure you want to delete this purchase? This action cannot be undone.";
const CONFIRM_RESET_FINAL: &str = "This is your final confirmation. Are you absolutely sure?";

/// The customer the console is working on, until the next lookup or teardown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffContext {
    pub customer_id: Uuid,
    pub email: String,
}

/// What the console shows for a resolved customer
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerPanel {
    pub stats: CustomerStats,
    /// Whether the bulk reset control is offered
    pub reset_visible: bool,
    pub purchases: Vec<Purchase>,
}

pub struct StaffConsole {
    store: Arc<dyn LoyaltyStore>,
    session: Arc<dyn SessionAccessor>,
    notifier: Arc<dyn Notifier>,
    options: ClientOptions,
    context: Option<StaffContext>,
    panel: Option<CustomerPanel>,
}

impl StaffConsole {
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
            context: None,
            panel: None,
        }
    }

    pub fn context(&self) -> Option<&StaffContext> {
        self.context.as_ref()
    }

    pub fn panel(&self) -> Option<&CustomerPanel> {
        self.panel.as_ref()
    }

    async fn identity(&self) -> Result<Identity> {
        self.session.current_identity().await.ok_or(Error::NotSignedIn)
    }

    fn selected(&self) -> Result<StaffContext> {
        self.context.clone().ok_or(Error::NoCustomerSelected)
    }

    /// Whether the signed-in user carries the admin marker. Errors count as no.
    pub async fn check_admin(&self) -> bool {
        let identity = match self.session.current_identity().await {
            Some(identity) => identity,
            None => return false,
        };
        match self.store.is_admin(identity.id).await {
            Ok(is_admin) => is_admin,
            Err(err) => {
                warn!("admin check for {} failed: {}", identity.id, err);
                false
            }
        }
    }

    pub async fn lookup(&mut self, query: &str) -> Outcome {
        self.resolve(query, true).await
    }

    /// Re-run the lookup for the cached customer without announcing it
    async fn reload(&mut self, email: &str) {
        self.resolve(email, false).await;
    }

    async fn resolve(&mut self, query: &str, announce: bool) -> Outcome {
        let query = match LookupQuery::classify(query) {
            Ok(query) => query,
            Err(err) => return report(self.notifier.as_ref(), "Lookup rejected", err),
        };

        let found = match &query {
            LookupQuery::Barcode(code) => self.store.lookup_by_barcode(code).await,
            LookupQuery::Email(email) => self.store.lookup_by_email(email).await,
        };
        let stats = match found {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                self.forget();
                warn!("no customer matches {:?}", query);
                self.notifier.error(NOT_FOUND);
                return Outcome::Failed;
            }
            Err(err) => {
                self.forget();
                return report(
                    self.notifier.as_ref(),
                    "Error looking up customer. Please try again.",
                    err,
                );
            }
        };

        info!(
            "resolved {} to {} ({} purchases)",
            query.as_str(),
            stats.user_id,
            stats.total_purchases
        );
        self.context = Some(StaffContext {
            customer_id: stats.user_id,
            email: stats.email.clone(),
        });
        let reset_visible = stats.total_purchases >= u64::from(self.options.reset_threshold);
        let purchases = self.store.list_purchases(stats.user_id).await;
        self.panel = Some(CustomerPanel {
            stats,
            reset_visible,
            purchases: Vec::new(),
        });

        match purchases {
            Ok(rows) => {
                if let Some(panel) = self.panel.as_mut() {
                    panel.purchases = rows;
                }
                if announce {
                    self.notifier.success(FOUND);
                }
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Error loading the customer's purchases.",
                err,
            ),
        }
    }

    pub async fn add_purchase(&mut self, amount: &str, note: &str) -> Outcome {
        match self.insert(amount, note).await {
            Ok(context) => {
                info!("staff added a purchase for {}", context.customer_id);
                self.notifier.success(ADDED);
                self.reload(&context.email).await;
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Error adding the purchase. Please try again.",
                err,
            ),
        }
    }

    async fn insert(&self, amount: &str, note: &str) -> Result<StaffContext> {
        let context = self.selected()?;
        let amount = Amount::parse(amount)?;
        let staff = self.identity().await?;
        let row = NewPurchase::by_staff(
            context.customer_id,
            amount,
            normalize_note(note),
            staff.id,
            staff.email,
        );
        self.store.insert_purchases(&[row]).await?;
        Ok(context)
    }

    pub async fn delete_purchase(&mut self, id: Uuid, confirm: &mut dyn Confirm) -> Outcome {
        let context = match self.selected() {
            Ok(context) => context,
            Err(err) => return report(self.notifier.as_ref(), "Delete rejected", err),
        };
        if !confirm.confirm(CONFIRM_DELETE) {
            return Outcome::Declined;
        }

        let result = match self.store.delete_purchase(id, None).await {
            Ok(0) => Err(Error::not_found(format!("purchase {}", id))),
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                self.notifier.success(DELETED);
                self.reload(&context.email).await;
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Error deleting the purchase. Please try again.",
                err,
            ),
        }
    }

    /// Delete every purchase of the resolved customer after two confirmations
    pub async fn reset_history(&mut self, confirm: &mut dyn Confirm) -> Outcome {
        let context = match self.selected() {
            Ok(context) => context,
            Err(err) => return report(self.notifier.as_ref(), "Reset rejected", err),
        };

        let first = format!(
            "Are you sure you want to reset the purchase history of {}?\n\n\
             This will DELETE ALL of this customer's purchases. This action cannot be undone.",
            context.email
        );
        if !confirm.confirm(&first) || !confirm.confirm(CONFIRM_RESET_FINAL) {
            info!("history reset for {} declined", context.email);
            return Outcome::Declined;
        }

        match self.store.delete_purchases_for(context.customer_id).await {
            Ok(deleted) => {
                info!("deleted {} purchases of {}", deleted, context.customer_id);
                self.notifier.success(RESET);
                self.reload(&context.email).await;
                Outcome::Done
            }
            Err(err) => report(
                self.notifier.as_ref(),
                "Error resetting the history. Please try again.",
                err,
            ),
        }
    }

    fn forget(&mut self) {
        self.context = None;
        self.panel = None;
    }

    pub fn teardown(&mut self) {
        self.forget();
        self.notifier.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticSession;
    use crate::notice::{NoticeBoard, NoticeKind, ScriptedConfirm};
    use crate::store::{MemoryStore, StoreCall};

    struct Fixture {
        store: Arc<MemoryStore>,
        board: Arc<NoticeBoard>,
        staff: Uuid,
        customer: Uuid,
        console: StaffConsole,
    }

    fn fixture() -> Fixture {
        let staff = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        store.add_admin(staff);
        store.add_customer(customer, "ana@example.com", Some("DN0000000001"));
        let board = Arc::new(NoticeBoard::default());
        let console = StaffConsole::new(
            store.clone(),
            Arc::new(StaticSession::signed_in(Identity::new(
                staff,
                Some("staff@deli.mx".to_string()),
            ))),
            board.clone(),
            ClientOptions::default(),
        );
        Fixture {
            store,
            board,
            staff,
            customer,
            console,
        }
    }

    fn seed(f: &Fixture, count: usize) {
        for _ in 0..count {
            f.store.seed(NewPurchase::self_service(
                f.customer,
                Amount::parse("10").unwrap(),
                None,
            ));
        }
    }

    #[tokio::test]
    async fn admin_check_follows_the_marker() {
        let f = fixture();
        assert!(f.console.check_admin().await);

        let stranger = StaffConsole::new(
            f.store.clone(),
            Arc::new(StaticSession::signed_in(Identity::new(Uuid::new_v4(), None))),
            f.board.clone(),
            ClientOptions::default(),
        );
        assert!(!stranger.check_admin().await);

        f.store.set_failing(true);
        assert!(!f.console.check_admin().await);
    }

    #[tokio::test]
    async fn barcode_queries_use_the_barcode_procedure() {
        let mut f = fixture();
        assert_eq!(f.console.lookup(" dn0000000001 ").await, Outcome::Done);
        assert_eq!(
            f.store.calls()[0],
            StoreCall::LookupByBarcode("DN0000000001".to_string())
        );
        assert_eq!(
            f.console.context(),
            Some(&StaffContext {
                customer_id: f.customer,
                email: "ana@example.com".to_string(),
            })
        );
        assert_eq!(f.board.latest().unwrap().message, FOUND);
    }

    #[tokio::test]
    async fn other_queries_use_the_email_procedure() {
        let mut f = fixture();
        assert_eq!(f.console.lookup("ana@example.com").await, Outcome::Done);
        assert_eq!(
            f.store.calls()[0],
            StoreCall::LookupByEmail("ana@example.com".to_string())
        );
        assert!(f
            .store
            .calls()
            .contains(&StoreCall::ListPurchases(f.customer)));
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_calls() {
        let mut f = fixture();
        assert_eq!(f.console.lookup("   ").await, Outcome::Rejected);
        assert!(f.store.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_customer_clears_the_panel() {
        let mut f = fixture();
        f.console.lookup("ana@example.com").await;
        assert!(f.console.panel().is_some());

        assert_eq!(f.console.lookup("nobody@example.com").await, Outcome::Failed);
        assert!(f.console.context().is_none());
        assert!(f.console.panel().is_none());
        let notice = f.board.latest().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_during_lookup_clears_the_panel() {
        let mut f = fixture();
        f.console.lookup("ana@example.com").await;
        assert!(f.console.context().is_some());

        f.store.set_failing(true);
        assert_eq!(f.console.lookup("ana@example.com").await, Outcome::Failed);
        assert!(f.console.context().is_none());
        assert!(f.console.panel().is_none());
        let notice = f.board.latest().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Error looking up customer. Please try again.");
    }

    #[tokio::test]
    async fn reset_shows_from_ten_purchases() {
        let mut f = fixture();
        seed(&f, 9);
        f.console.lookup("ana@example.com").await;
        assert!(!f.console.panel().unwrap().reset_visible);

        seed(&f, 1);
        f.console.lookup("ana@example.com").await;
        let panel = f.console.panel().unwrap();
        assert!(panel.reset_visible);
        assert_eq!(panel.purchases.len(), 10);
        assert_eq!(panel.stats.total_spent.to_string(), "100.00");
    }

    #[tokio::test]
    async fn add_purchase_needs_a_customer() {
        let mut f = fixture();
        assert_eq!(f.console.add_purchase("5", "").await, Outcome::Rejected);
        assert!(f.store.calls().is_empty());
    }

    #[tokio::test]
    async fn add_purchase_rejects_bad_amounts_for_a_resolved_customer() {
        let mut f = fixture();
        f.console.lookup("ana@example.com").await;
        f.store.clear_calls();

        for input in ["0", "abc", "100000000"] {
            assert_eq!(f.console.add_purchase(input, "").await, Outcome::Rejected);
        }
        assert!(f.store.calls().is_empty());
        assert!(f.store.purchases_of(f.customer).is_empty());
        assert!(f.console.context().is_some());
        assert_eq!(f.board.latest().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn add_purchase_is_attributed_to_staff() {
        let mut f = fixture();
        f.console.lookup("DN0000000001").await;

        assert_eq!(f.console.add_purchase("7.5", " soup ").await, Outcome::Done);
        let row = &f.store.purchases_of(f.customer)[0];
        assert_eq!(row.amount.to_string(), "7.50");
        assert_eq!(row.notes.as_deref(), Some("soup"));
        assert_eq!(row.added_by_admin_id, Some(f.staff));
        assert_eq!(row.added_by_admin_email.as_deref(), Some("staff@deli.mx"));

        // Reloaded through the cached email, quietly
        assert_eq!(
            f.store.calls().last(),
            Some(&StoreCall::ListPurchases(f.customer))
        );
        assert!(f
            .store
            .calls()
            .contains(&StoreCall::LookupByEmail("ana@example.com".to_string())));
        assert_eq!(f.console.panel().unwrap().stats.total_purchases, 1);
        assert_eq!(f.board.latest().unwrap().message, ADDED);
    }

    #[tokio::test]
    async fn delete_purchase_goes_by_id_only() {
        let mut f = fixture();
        seed(&f, 2);
        f.console.lookup("ana@example.com").await;
        let id = f.console.panel().unwrap().purchases[0].id;

        let mut confirm = ScriptedConfirm::new(&[true]);
        assert_eq!(f.console.delete_purchase(id, &mut confirm).await, Outcome::Done);
        assert!(f.store.calls().contains(&StoreCall::DeletePurchase(id, None)));
        assert_eq!(f.console.panel().unwrap().purchases.len(), 1);
    }

    #[tokio::test]
    async fn reset_declined_at_either_step_deletes_nothing() {
        for answers in [&[false][..], &[true, false][..]] {
            let mut f = fixture();
            seed(&f, 12);
            f.console.lookup("ana@example.com").await;
            f.store.clear_calls();

            let mut confirm = ScriptedConfirm::new(answers);
            assert_eq!(f.console.reset_history(&mut confirm).await, Outcome::Declined);
            assert_eq!(confirm.asked.len(), answers.len());
            assert!(confirm.asked[0].contains("ana@example.com"));
            assert!(f.store.calls().is_empty());
            assert_eq!(f.store.purchases_of(f.customer).len(), 12);
        }
    }

    #[tokio::test]
    async fn reset_confirmed_twice_clears_the_history() {
        let mut f = fixture();
        seed(&f, 12);
        f.console.lookup("ana@example.com").await;

        let mut confirm = ScriptedConfirm::new(&[true, true]);
        assert_eq!(f.console.reset_history(&mut confirm).await, Outcome::Done);
        assert!(f
            .store
            .calls()
            .contains(&StoreCall::DeletePurchasesFor(f.customer)));
        assert!(f.store.purchases_of(f.customer).is_empty());
        let panel = f.console.panel().unwrap();
        assert_eq!(panel.stats.total_purchases, 0);
        assert!(!panel.reset_visible);
        assert_eq!(f.board.latest().unwrap().message, RESET);
    }

    #[tokio::test]
    async fn teardown_forgets_the_customer() {
        let mut f = fixture();
        f.console.lookup("ana@example.com").await;
        f.console.teardown();
        assert!(f.console.context().is_none());

        let mut confirm = ScriptedConfirm::new(&[true, true]);
        assert_eq!(f.console.reset_history(&mut confirm).await, Outcome::Rejected);
        assert!(confirm.asked.is_empty());
    }
}

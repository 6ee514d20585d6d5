//! Which view a session lands on

use log::{info, warn};

use crate::identity::SessionAccessor;
use crate::store::LoyaltyStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    SignIn,
    Ledger,
    StaffConsole,
}

/// Staff go to the console, everyone else to their ledger. A failed admin
/// check falls back to the ledger.
pub async fn route(session: &dyn SessionAccessor, store: &dyn LoyaltyStore) -> Screen {
    let identity = match session.current_identity().await {
        Some(identity) => identity,
        None => return Screen::SignIn,
    };

    let screen = match store.is_admin(identity.id).await {
        Ok(true) => Screen::StaffConsole,
        Ok(false) => Screen::Ledger,
        Err(err) => {
            warn!("admin check for {} failed: {}", identity.id, err);
            Screen::Ledger
        }
    };
    info!("routing {} to {:?}", identity.id, screen);
    screen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, StaticSession};
    use crate::store::MemoryStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn routes_by_session_and_marker() {
        let store = MemoryStore::new();
        let staff = Uuid::new_v4();
        store.add_admin(staff);

        let signed_out = StaticSession::signed_out();
        assert_eq!(route(&signed_out, &store).await, Screen::SignIn);

        let admin = StaticSession::signed_in(Identity::new(staff, None));
        assert_eq!(route(&admin, &store).await, Screen::StaffConsole);

        let customer = StaticSession::signed_in(Identity::new(Uuid::new_v4(), None));
        assert_eq!(route(&customer, &store).await, Screen::Ledger);

        store.set_failing(true);
        assert_eq!(route(&admin, &store).await, Screen::Ledger);
    }
}

//! Deli loyalty client
//!
//! Customers see their purchase ledger and barcode; staff look customers up by
//! email or barcode and adjust their purchases. Persistence and sign-in are
//! delegated to a Supabase project; this crate holds the command handlers and
//! what they render.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod identity;
pub mod ledger;
pub mod lookup;
pub mod models;
pub mod notice;
pub mod outcome;
pub mod postgrest;
pub mod screen;
pub mod staff;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::Auth;
use crate::config::{ClientOptions, StoreConfig};
use crate::error::Result;
use crate::ledger::LedgerView;
use crate::notice::NoticeBoard;
use crate::screen::Screen;
use crate::staff::StaffConsole;
use crate::store::RestStore;

/// Entry point wiring the auth client, the REST store and the views together
pub struct Loyalty {
    pub config: StoreConfig,
    pub http_client: Client,
    pub auth: Arc<Auth>,
    pub store: Arc<RestStore>,
    pub notices: Arc<NoticeBoard>,
    pub options: ClientOptions,
}

impl Loyalty {
    /// Create a client for a project
    ///
    /// # Example
    ///
    /// ```
    /// use deli_loyalty::Loyalty;
    ///
    /// let loyalty = Loyalty::new("https://your-project.supabase.co", "your-anon-key").unwrap();
    /// ```
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        Self::new_with_options(url, anon_key, ClientOptions::default())
    }

    /// Create a client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use deli_loyalty::{Loyalty, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_reset_threshold(20);
    /// let loyalty = Loyalty::new_with_options(
    ///     "https://your-project.supabase.co",
    ///     "your-anon-key",
    ///     options,
    /// )
    /// .unwrap();
    /// ```
    pub fn new_with_options(url: &str, anon_key: &str, options: ClientOptions) -> Result<Self> {
        let config = StoreConfig::new(url, anon_key.to_string())?;
        Ok(Self::with_config(config, options))
    }

    /// Create a client from `SUPABASE_URL` and `SUPABASE_ANON_KEY`
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_config(StoreConfig::from_env()?, ClientOptions::default()))
    }

    pub fn with_config(config: StoreConfig, options: ClientOptions) -> Self {
        let http_client = Client::new();
        let auth = Arc::new(Auth::new(
            &config.base_url(),
            &config.anon_key,
            http_client.clone(),
        ));
        let store = Arc::new(RestStore::new(
            config.clone(),
            options.clone(),
            http_client.clone(),
            auth.clone(),
        ));
        let notices = Arc::new(NoticeBoard::new(options.notice_duration));

        Self {
            config,
            http_client,
            auth,
            store,
            notices,
            options,
        }
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Which view the current session should see
    pub async fn route(&self) -> Screen {
        screen::route(self.auth.as_ref(), self.store.as_ref()).await
    }

    pub fn ledger(&self) -> LedgerView {
        LedgerView::new(
            self.store.clone(),
            self.auth.clone(),
            self.notices.clone(),
            self.options.clone(),
        )
    }

    pub fn staff_console(&self) -> StaffConsole {
        StaffConsole::new(
            self.store.clone(),
            self.auth.clone(),
            self.notices.clone(),
            self.options.clone(),
        )
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{ClientOptions, StoreConfig};
    pub use crate::error::{Error, Result};
    pub use crate::identity::{Identity, SessionAccessor, StaticSession};
    pub use crate::ledger::LedgerView;
    pub use crate::notice::{Confirm, NoticeBoard, Notifier};
    pub use crate::outcome::Outcome;
    pub use crate::screen::Screen;
    pub use crate::staff::StaffConsole;
    pub use crate::store::{LoyaltyStore, MemoryStore, RestStore};
    pub use crate::Loyalty;
}

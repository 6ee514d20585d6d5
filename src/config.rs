//! Configuration for the loyalty client

use rust_decimal::Decimal;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

const URL_PLACEHOLDER: &str = "YOUR_SUPABASE_PROJECT_URL";
const KEY_PLACEHOLDER: &str = "YOUR_SUPABASE_ANON_KEY";

/// Connection settings for the remote store.
///
/// The anon key is the project's public key; row access is enforced remotely.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: Url,
    pub anon_key: String,
}

impl StoreConfig {
    /// Creates a new configuration, validating the URL and key.
    pub fn new(url_str: &str, anon_key: String) -> Result<Self> {
        if url_str.is_empty() || url_str == URL_PLACEHOLDER {
            return Err(Error::config("SUPABASE_URL is not configured"));
        }
        if anon_key.is_empty() || anon_key == KEY_PLACEHOLDER {
            return Err(Error::config("anon_key cannot be empty"));
        }
        let url = Url::parse(url_str)?;
        Ok(Self { url, anon_key })
    }

    /// Attempts to create configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not found"))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not found"))?;
        Self::new(&url_str, anon_key)
    }

    /// Base URL without a trailing slash, ready for path concatenation
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

/// Rows granted to a brand-new customer on first load
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeCredit {
    /// How many rows to synthesize
    pub rows: usize,

    /// Amount of each row
    pub amount: Decimal,

    /// Note attached to each row
    pub note: String,

    /// Attribution label shown where staff would normally appear
    pub label: String,
}

impl Default for WelcomeCredit {
    fn default() -> Self {
        Self {
            rows: 2,
            amount: Decimal::new(10000, 2),
            note: "¡Las primeras dos van por nuestra cuenta!".to_string(),
            label: "System".to_string(),
        }
    }
}

/// Configuration options for the loyalty client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout; none by default, requests run to completion
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// How long a notice stays visible before it auto-dismisses
    pub notice_duration: Duration,

    /// Purchase count at which the staff console offers a history reset
    pub reset_threshold: u32,

    /// Welcome rows for new customers
    pub welcome_credit: WelcomeCredit,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: None,
            db_schema: "public".to_string(),
            notice_duration: Duration::from_secs(5),
            reset_threshold: 10,
            welcome_credit: WelcomeCredit::default(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set how long notices stay visible
    pub fn with_notice_duration(mut self, value: Duration) -> Self {
        self.notice_duration = value;
        self
    }

    /// Set the reset threshold
    pub fn with_reset_threshold(mut self, value: u32) -> Self {
        self.reset_threshold = value;
        self
    }

    /// Set the welcome credit
    pub fn with_welcome_credit(mut self, value: WelcomeCredit) -> Self {
        self.welcome_credit = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_valid() {
        let config = StoreConfig::new("http://localhost:54321", "anon".to_string()).unwrap();
        assert_eq!(config.url.to_string(), "http://localhost:54321/");
        assert_eq!(config.base_url(), "http://localhost:54321");
    }

    #[test]
    fn config_new_invalid_url() {
        let config = StoreConfig::new("not a valid url", "anon".to_string());
        assert!(matches!(config, Err(Error::Url(_))));
    }

    #[test]
    fn config_rejects_placeholders() {
        let url = StoreConfig::new(URL_PLACEHOLDER, "anon".to_string());
        assert!(matches!(url, Err(Error::Config(_))));

        let key = StoreConfig::new("http://localhost:54321", KEY_PLACEHOLDER.to_string());
        match key {
            Err(Error::Config(msg)) => assert!(msg.contains("anon_key cannot be empty")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn default_welcome_credit_is_two_rows_of_one_hundred() {
        let credit = ClientOptions::default().welcome_credit;
        assert_eq!(credit.rows, 2);
        assert_eq!(credit.amount.to_string(), "100.00");
        assert_eq!(credit.label, "System");
    }
}

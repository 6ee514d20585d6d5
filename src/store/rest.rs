//! `LoyaltyStore` over the project's REST endpoint

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Auth;
use crate::config::{ClientOptions, StoreConfig};
use crate::error::Result;
use crate::models::{CustomerStats, NewPurchase, Purchase, PurchaseUpdate};
use crate::postgrest::PostgrestClient;
use crate::store::LoyaltyStore;

const PURCHASES: &str = "purchases";
const USER_BARCODES: &str = "user_barcodes";
const ADMINS: &str = "admins";
const STATS_BY_EMAIL: &str = "get_user_stats";
const STATS_BY_BARCODE: &str = "get_user_stats_by_barcode";

#[derive(Deserialize)]
struct BarcodeRow {
    barcode: Option<String>,
}

/// Store backed by PostgREST; requests carry the signed-in user's token
pub struct RestStore {
    config: StoreConfig,
    options: ClientOptions,
    http_client: Client,
    auth: Arc<Auth>,
}

impl RestStore {
    pub fn new(config: StoreConfig, options: ClientOptions, http_client: Client, auth: Arc<Auth>) -> Self {
        Self {
            config,
            options,
            http_client,
            auth,
        }
    }

    fn from(&self, table: &str) -> Result<PostgrestClient> {
        let client = PostgrestClient::new(
            &self.config.base_url(),
            &self.config.anon_key,
            table,
            self.http_client.clone(),
        )?
        .with_schema(&self.options.db_schema)?
        .with_timeout(self.options.request_timeout);

        match self.auth.access_token() {
            Some(token) => client.with_auth(&token),
            None => Ok(client),
        }
    }

    async fn lookup(&self, function: &str, params: serde_json::Value) -> Result<Option<CustomerStats>> {
        debug!("calling {}", function);
        let rows = self
            .from(PURCHASES)?
            .rpc(function, params)
            .execute::<Vec<CustomerStats>>()
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl LoyaltyStore for RestStore {
    async fn list_purchases(&self, owner: Uuid) -> Result<Vec<Purchase>> {
        self.from(PURCHASES)?
            .select("*")
            .eq("user_id", owner)
            .order_desc("purchase_date")
            .execute::<Purchase>()
            .await
    }

    async fn find_purchase(&self, id: Uuid, owner: Uuid) -> Result<Option<Purchase>> {
        self.from(PURCHASES)?
            .select("*")
            .eq("id", id)
            .eq("user_id", owner)
            .execute_one::<Purchase>()
            .await
    }

    async fn insert_purchases(&self, rows: &[NewPurchase]) -> Result<()> {
        self.from(PURCHASES)?.insert(rows).execute_no_return().await
    }

    async fn update_purchase(&self, id: Uuid, owner: Uuid, update: &PurchaseUpdate) -> Result<u64> {
        self.from(PURCHASES)?
            .update(update)
            .eq("id", id)
            .eq("user_id", owner)
            .execute()
            .await
    }

    async fn delete_purchase(&self, id: Uuid, owner: Option<Uuid>) -> Result<u64> {
        let mut delete = self.from(PURCHASES)?.delete().eq("id", id);
        if let Some(owner) = owner {
            delete = delete.eq("user_id", owner);
        }
        delete.execute().await
    }

    async fn delete_purchases_for(&self, owner: Uuid) -> Result<u64> {
        self.from(PURCHASES)?
            .delete()
            .eq("user_id", owner)
            .execute()
            .await
    }

    async fn is_admin(&self, user: Uuid) -> Result<bool> {
        let row = self
            .from(ADMINS)?
            .select("user_id")
            .eq("user_id", user)
            .execute_one::<serde_json::Value>()
            .await?;
        Ok(row.is_some())
    }

    async fn lookup_by_email(&self, email: &str) -> Result<Option<CustomerStats>> {
        self.lookup(STATS_BY_EMAIL, json!({ "target_email": email }))
            .await
    }

    async fn lookup_by_barcode(&self, barcode: &str) -> Result<Option<CustomerStats>> {
        self.lookup(STATS_BY_BARCODE, json!({ "search_barcode": barcode }))
            .await
    }

    async fn barcode_for(&self, user: Uuid) -> Result<Option<String>> {
        let row = self
            .from(USER_BARCODES)?
            .select("barcode")
            .eq("user_id", user)
            .execute_one::<BarcodeRow>()
            .await?;
        Ok(row.and_then(|r| r.barcode))
    }
}

//! Database operations through the PostgREST API

mod query;
mod types;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};

pub use query::*;
pub use types::*;

/// Everything a builder needs to issue its request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub(crate) url: String,
    pub(crate) client: Client,
    pub(crate) headers: HeaderMap,
    pub(crate) timeout: Option<Duration>,
}

/// Client for database operations on one table
pub struct PostgrestClient {
    /// The base URL for the project
    base_url: String,

    /// The table or view name
    table: String,

    /// HTTP client
    client: Client,

    /// apikey, Authorization and schema headers
    headers: HeaderMap,

    /// Per-request timeout
    timeout: Option<Duration>,
}

impl PostgrestClient {
    /// Create a new PostgrestClient
    pub fn new(base_url: &str, api_key: &str, table: &str, client: Client) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| Error::config("anon_key is not a valid header value"))?;
        headers.insert("apikey", key);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            client,
            headers,
            timeout: None,
        })
    }

    /// Add a header sent with every request from this client
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self> {
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| Error::config(format!("Invalid header value for {}", key)))?;
        let header_name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| Error::config(format!("Invalid header name: {}", key)))?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Authenticate requests as the signed-in user
    pub fn with_auth(self, token: &str) -> Result<Self> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Target a schema other than `public`
    pub fn with_schema(self, schema: &str) -> Result<Self> {
        if schema == "public" {
            return Ok(self);
        }
        self.with_header("Accept-Profile", schema)?
            .with_header("Content-Profile", schema)
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn context(&self, url: String) -> RequestContext {
        RequestContext {
            url,
            client: self.client.clone(),
            headers: self.headers.clone(),
            timeout: self.timeout,
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.context(self.table_url()), columns)
    }

    /// Insert one row or a batch of rows
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.context(self.table_url()), values)
    }

    /// Update rows matching the filters added to the builder
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.context(self.table_url()), values)
    }

    /// Delete rows matching the filters added to the builder
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.context(self.table_url()))
    }

    /// Call a stored procedure; the table name is ignored
    pub fn rpc<T: Serialize>(&self, function: &str, params: T) -> RpcBuilder<T> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        RpcBuilder::new(self.context(url), params)
    }
}

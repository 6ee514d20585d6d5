//! Query builders for PostgrestClient

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::fetch::{Fetch, FetchBuilder};
use crate::postgrest::{RequestContext, ReturnOption};

const CLIENT_INFO: &str = "deli-loyalty/0.1.0";

/// Ordered query parameters
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    params: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Create a new QueryBuilder
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter, replacing an earlier one with the same key
    pub fn add_param(&mut self, key: &str, value: &str) {
        self.params.retain(|(k, _)| k != key);
        self.params.push((key.to_string(), value.to_string()));
    }

    /// Get the query parameters
    pub fn get_params(&self) -> &[(String, String)] {
        &self.params
    }

    fn eq(&mut self, column: &str, value: &str) {
        self.add_param(column, &format!("eq.{}", value));
    }
}

fn prepare<'a>(
    fetch: FetchBuilder<'a>,
    ctx: &RequestContext,
    query: &QueryBuilder,
) -> Result<FetchBuilder<'a>> {
    Ok(fetch
        .headers(&ctx.headers)
        .header("X-Client-Info", CLIENT_INFO)?
        .query(query.get_params())
        .timeout(ctx.timeout))
}

/// Number of rows in a `return=representation` body
fn affected_rows(value: &Value) -> u64 {
    match value {
        Value::Array(rows) => rows.len() as u64,
        Value::Null => 0,
        _ => 1,
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    ctx: RequestContext,
    query: QueryBuilder,
}

impl SelectBuilder {
    pub(crate) fn new(ctx: RequestContext, columns: &str) -> Self {
        let mut query = QueryBuilder::new();
        query.add_param("select", columns);
        Self { ctx, query }
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.query.eq(column, &value.to_string());
        self
    }

    /// Newest first by `column`
    pub fn order_desc(mut self, column: &str) -> Self {
        self.query.add_param("order", &format!("{}.desc", column));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: u32) -> Self {
        self.query.add_param("limit", &count.to_string());
        self
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let fetch = prepare(
            Fetch::get(&self.ctx.client, &self.ctx.url),
            &self.ctx,
            &self.query,
        )?;
        fetch.execute::<Vec<T>>().await
    }

    /// Execute the query and return the first row
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let results = self.limit(1).execute::<T>().await?;
        Ok(results.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    ctx: RequestContext,
    values: T,
    query: QueryBuilder,
}

impl<T: Serialize> InsertBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, values: T) -> Self {
        Self {
            ctx,
            values,
            query: QueryBuilder::new(),
        }
    }

    /// Execute the insert without asking for the inserted rows back
    pub async fn execute_no_return(&self) -> Result<()> {
        prepare(
            Fetch::post(&self.ctx.client, &self.ctx.url),
            &self.ctx,
            &self.query,
        )?
        .header("Prefer", ReturnOption::Minimal.as_prefer())?
        .json(&self.values)?
        .execute_value()
        .await?;
        Ok(())
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    ctx: RequestContext,
    values: T,
    query: QueryBuilder,
}

impl<T: Serialize> UpdateBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, values: T) -> Self {
        Self {
            ctx,
            values,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query.eq(column, &value.to_string());
        self
    }

    /// Execute the update and return how many rows it touched
    pub async fn execute(&self) -> Result<u64> {
        let value = prepare(
            Fetch::patch(&self.ctx.client, &self.ctx.url),
            &self.ctx,
            &self.query,
        )?
        .header("Prefer", ReturnOption::Representation.as_prefer())?
        .json(&self.values)?
        .execute_value()
        .await?;
        Ok(affected_rows(&value))
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    ctx: RequestContext,
    query: QueryBuilder,
}

impl DeleteBuilder {
    pub(crate) fn new(ctx: RequestContext) -> Self {
        Self {
            ctx,
            query: QueryBuilder::new(),
        }
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.query.eq(column, &value.to_string());
        self
    }

    /// Execute the delete and return how many rows it removed
    pub async fn execute(&self) -> Result<u64> {
        let value = prepare(
            Fetch::delete(&self.ctx.client, &self.ctx.url),
            &self.ctx,
            &self.query,
        )?
        .header("Prefer", ReturnOption::Representation.as_prefer())?
        .execute_value()
        .await?;
        Ok(affected_rows(&value))
    }
}

/// Builder for RPC (stored procedure) calls
pub struct RpcBuilder<T: Serialize> {
    ctx: RequestContext,
    params: T,
}

impl<T: Serialize> RpcBuilder<T> {
    pub(crate) fn new(ctx: RequestContext, params: T) -> Self {
        Self { ctx, params }
    }

    /// Execute the RPC call and return the results
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R> {
        prepare(
            Fetch::post(&self.ctx.client, &self.ctx.url),
            &self.ctx,
            &QueryBuilder::new(),
        )?
        .json(&self.params)?
        .execute::<R>()
        .await
    }
}

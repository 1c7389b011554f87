//! Data store backed by the hosted PostgREST endpoint

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{DataStore, SelectQuery, TableKind, TableNames};
use crate::auth::TokenSource;
use crate::error::{StoreError, StoreResult};
use crate::http::SupabaseHttpClient;

/// `DataStore` over the PostgREST REST dialect
pub struct SupabaseStore {
    http: SupabaseHttpClient,
    tables: TableNames,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl SupabaseStore {
    pub fn new(http: SupabaseHttpClient, tables: TableNames) -> Self {
        Self {
            http,
            tables,
            tokens: None,
        }
    }

    /// Authorize requests with the signed-in user's token instead of the anon key
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    async fn bearer(&self) -> Option<String> {
        match &self.tokens {
            Some(tokens) => tokens.access_token().await,
            None => None,
        }
    }
}

/// PostgREST query-string parameters for a select
pub fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for filter in &query.filters {
        let value = match &filter.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push((filter.column.clone(), format!("eq.{}", value)));
    }
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    params
}

#[async_trait]
impl DataStore for SupabaseStore {
    async fn select(&self, table: TableKind, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        let url = self.http.rest_url(self.tables.name(table));
        let bearer = self.bearer().await;
        let request = self
            .http
            .request(Method::GET, &url, bearer.as_deref())
            .query(&select_params(query));

        let rows: Vec<Value> = self.http.send_json(request).await?;
        debug!("Selected {} row(s) from {}", rows.len(), table);
        Ok(rows)
    }

    async fn insert(&self, table: TableKind, rows: Vec<Value>) -> StoreResult<Vec<Value>> {
        let expected = rows.len();
        let url = self.http.rest_url(self.tables.name(table));
        let bearer = self.bearer().await;
        let request = self
            .http
            .request(Method::POST, &url, bearer.as_deref())
            .header("Prefer", "return=representation")
            .json(&rows);

        let created: Vec<Value> = self.http.send_json(request).await?;
        if created.len() != expected {
            return Err(StoreError::UnexpectedResponse(format!(
                "{} insert returned {} row(s), expected {}",
                table,
                created.len(),
                expected
            )));
        }
        Ok(created)
    }

    async fn update(&self, table: TableKind, id: Uuid, patch: Value) -> StoreResult<()> {
        let url = self.http.rest_url(self.tables.name(table));
        let bearer = self.bearer().await;
        let request = self
            .http
            .request(Method::PATCH, &url, bearer.as_deref())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(&patch);

        self.http.send_empty(request).await?;
        Ok(())
    }
}

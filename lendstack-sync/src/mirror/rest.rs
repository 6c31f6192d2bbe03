//! PostgREST-style remote mirror over HTTPS.
//!
//! Tables live under `<base>/rest/v1/<table>`. Upserts use
//! `on_conflict=<key>` with `Prefer: resolution=merge-duplicates`, counts use
//! `Prefer: count=exact` and read the total from `Content-Range`.

use super::{Predicate, RemoteMirror};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`RestMirror`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestMirrorConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Sent as `apikey` and as the bearer token.
    pub api_key: String,
    /// Non-default schema, sent as `Accept-Profile`/`Content-Profile`.
    pub schema: Option<String>,
    /// HTTP client timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RestMirrorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            schema: None,
            timeout_secs: 10,
        }
    }
}

/// Remote mirror speaking the PostgREST dialect.
pub struct RestMirror {
    config: RestMirrorConfig,
    client: Client,
}

impl RestMirror {
    /// Creates a client for `config`.
    pub fn new(config: RestMirrorConfig) -> SyncResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(SyncError::Config("remote mirror base URL is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RestMirrorConfig {
        &self.config
    }

    fn rest_root(&self) -> String {
        format!("{}/rest/v1", self.config.base_url.trim_end_matches('/'))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_root(), table)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if !self.config.api_key.is_empty() {
            request = request
                .header("apikey", &self.config.api_key)
                .bearer_auth(&self.config.api_key);
        }
        if let Some(schema) = &self.config.schema {
            request = request
                .header("Accept-Profile", schema)
                .header("Content-Profile", schema);
        }
        request
    }
}

#[async_trait]
impl RemoteMirror for RestMirror {
    fn provider_name(&self) -> &'static str {
        "PostgREST"
    }

    async fn ping(&self) -> SyncResult<()> {
        let response = self
            .request(Method::GET, format!("{}/", self.rest_root()))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn upsert(&self, table: &str, row: &Value, conflict_key: &str) -> SyncResult<()> {
        let response = self
            .request(Method::POST, self.table_url(table))
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await?;
        check(response).await?;
        debug!(table, "Upserted row");
        Ok(())
    }

    async fn select_count(&self, table: &str) -> SyncResult<u64> {
        let response = self
            .request(Method::HEAD, self.table_url(table))
            .query(&[("select", "id")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check(response).await?;
        let status = response.status().as_u16();

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| SyncError::Remote {
                status,
                message: format!("no usable Content-Range for {table}"),
            })
    }

    async fn select_by_id(&self, table: &str, id: u64) -> SyncResult<Option<Value>> {
        let response = self
            .request(Method::GET, self.table_url(table))
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_where(&self, table: &str, predicate: &Predicate) -> SyncResult<()> {
        let (column, filter) = id_filter(predicate);
        let response = self
            .request(Method::DELETE, self.table_url(table))
            .query(&[(column, filter)])
            .header("Prefer", "return=minimal")
            .send()
            .await?;
        check(response).await?;
        debug!(table, ?predicate, "Deleted rows");
        Ok(())
    }
}

async fn check(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(SyncError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// PostgREST refuses an unfiltered DELETE, so "all rows" is `id >= 0`.
fn id_filter(predicate: &Predicate) -> (&'static str, String) {
    match predicate {
        Predicate::IdEq(id) => ("id", format!("eq.{id}")),
        Predicate::IdNotIn(ids) if !ids.is_empty() => {
            let list: Vec<String> = ids.iter().map(u64::to_string).collect();
            ("id", format!("not.in.({})", list.join(",")))
        }
        Predicate::All | Predicate::IdNotIn(_) => ("id", "gte.0".to_string()),
    }
}

/// Total from `0-24/25` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

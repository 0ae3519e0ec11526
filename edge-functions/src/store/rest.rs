//! REST client for the managed backend's PostgREST API.
//!
//! Tables live under `{backend_url}/rest/v1/<table>`. Every request carries an
//! `apikey` header and a bearer token.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use super::{AuditSink, RecordSource};
use crate::config::Config;
use crate::dispatch::AuditRecord;
use crate::error::{Result, WebhookError};

/// Characters of an error body kept in the error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// PostgREST backed store. Cheap to clone, the HTTP client is pooled.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    service_role_key: String,
    anon_key: String,
}

impl RestStore {
    /// Create a store from configuration.
    ///
    /// An empty backend URL is accepted here and reported on first use.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.backend_timeout_ms))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
            service_role_key: config.service_role_key.clone(),
            anon_key: config.anon_key.clone(),
        })
    }

    /// Endpoint URL for `table`.
    fn table_url(&self, table: &str) -> std::result::Result<Url, String> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|base| base.join(&format!("rest/v1/{}", table)))
            .map_err(|e| format!("invalid backend url {:?}: {}", self.base_url, e))
    }

    /// Attach the service role credentials.
    fn with_service_role(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }
}

/// Turn a non-2xx response into an error message with a body preview.
async fn check_status(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(status = status.as_u16(), error = %e, "backend_error_body_unreadable");
            String::new()
        }
    };
    let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
    Err(format!("backend returned {}: {}", status, preview))
}

#[async_trait]
impl AuditSink for RestStore {
    async fn insert(&self, table: &str, record: &AuditRecord) -> Result<()> {
        let url = self.table_url(table).map_err(WebhookError::Persistence)?;

        let request = self
            .with_service_role(self.client.post(url))
            .header("Prefer", "return=minimal")
            .json(record);

        let response = request
            .send()
            .await
            .map_err(|e| WebhookError::Persistence(e.to_string()))?;

        check_status(response).await.map_err(|e| {
            error!(table = table, error = %e, "backend_insert_rejected");
            WebhookError::Persistence(e)
        })?;

        info!(table = table, event_type = %record.event_type, "backend_insert_complete");
        Ok(())
    }
}

#[async_trait]
impl RecordSource for RestStore {
    async fn select(
        &self,
        table: &str,
        limit: usize,
        authorization: Option<&str>,
    ) -> Result<Vec<Value>> {
        let url = self.table_url(table).map_err(WebhookError::Backend)?;

        let limit_param = limit.to_string();
        let request = self
            .client
            .get(url)
            .query(&[("select", "*"), ("limit", limit_param.as_str())]);

        // Row level security applies when the caller brings their own token
        let request = match authorization {
            Some(auth) => request
                .header("apikey", &self.anon_key)
                .header("Authorization", auth),
            None => self.with_service_role(request),
        };

        info!(
            table = table,
            limit = limit,
            as_caller = authorization.is_some(),
            "backend_select_start"
        );

        let response = request
            .send()
            .await
            .map_err(|e| WebhookError::Backend(e.to_string()))?;

        let rows = check_status(response)
            .await
            .map_err(WebhookError::Backend)?
            .json::<Vec<Value>>()
            .await
            .map_err(|e| WebhookError::Backend(e.to_string()))?;

        info!(table = table, rows = rows.len(), "backend_select_complete");
        Ok(rows)
    }
}

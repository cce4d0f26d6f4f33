//! `http.json`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use aether_protocols::{ActionError, HandlerContext, TaskHandler};

/// Outbound HTTP policy.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    allowed_domains: Vec<String>,
    timeout_cap_s: u64,
}

impl HttpPolicy {
    pub fn new(allowed_domains: Vec<String>, timeout_cap_s: u64) -> Self {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .collect(),
            timeout_cap_s,
        }
    }

    /// Check the URL against the allowlist.
    ///
    /// An entry matches either the bare host or `host:port`.
    pub fn check(&self, raw_url: &str) -> Result<Url, ActionError> {
        if self.allowed_domains.is_empty() {
            return Err(ActionError::Policy(
                "HTTP blocked by policy (no allowed domains set)".to_string(),
            ));
        }

        let url = Url::parse(raw_url)
            .map_err(|_| ActionError::Policy(format!("HTTP URL not allowed: {}", raw_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ActionError::Policy(format!(
                "HTTP scheme not allowed: {}",
                url.scheme()
            )));
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let host_port = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };
        let allowed = self
            .allowed_domains
            .iter()
            .any(|d| *d == host || *d == host_port);
        if !allowed {
            return Err(ActionError::Policy(format!("HTTP domain not allowed: {}", host)));
        }
        Ok(url)
    }

    /// Effective timeout for a requested budget.
    pub fn effective_timeout(&self, timeout_s: u64) -> Duration {
        Duration::from_secs(timeout_s.min(self.timeout_cap_s).max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResult {
    pub ok: bool,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// HTTP adapter holding a shared client.
pub struct HttpActions {
    client: Client,
    policy: HttpPolicy,
}

impl HttpActions {
    pub fn new(policy: HttpPolicy, user_agent: &str) -> Result<Self, ActionError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ActionError::ExecutionFailed(format!("HTTP client: {}", e)))?;
        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> &HttpPolicy {
        &self.policy
    }

    /// Perform a JSON request to an allow-listed host.
    ///
    /// JSON responses (by content type) are parsed; anything else comes back
    /// as text. Transport failures and error statuses are retryable faults.
    pub async fn http_json(
        &self,
        url: &str,
        method: &str,
        headers: &HashMap<String, String>,
        body: Option<&serde_json::Value>,
        timeout_s: u64,
    ) -> Result<HttpResult, ActionError> {
        let url = self.policy.check(url)?;

        let method = match method.to_ascii_uppercase().as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "PATCH" => Method::PATCH,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            other => {
                return Err(ActionError::InvalidPayload(format!(
                    "Unsupported method: {}",
                    other
                )));
            }
        };

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .timeout(self.policy.effective_timeout(timeout_s));
        for (key, value) in headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, url = %url, "HTTP request");
        let response = request
            .send()
            .await
            .map_err(|e| ActionError::ExecutionFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ActionError::ExecutionFailed(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ActionError::ExecutionFailed(format!("Failed to read body: {}", e)))?;

        let (json, text) = if is_json && !bytes.is_empty() {
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| ActionError::ExecutionFailed(format!("Invalid JSON body: {}", e)))?;
            (Some(value), None)
        } else {
            (None, Some(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(HttpResult {
            ok: true,
            status: status.as_u16(),
            json,
            text,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HttpJsonParams {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<serde_json::Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Task handler for `http.json`.
pub struct HttpJsonHandler {
    actions: Arc<HttpActions>,
}

impl HttpJsonHandler {
    pub fn new(actions: Arc<HttpActions>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl TaskHandler for HttpJsonHandler {
    fn task_type(&self) -> &str {
        "http.json"
    }

    async fn handle(
        &self,
        payload: serde_json::Value,
        ctx: HandlerContext,
    ) -> Result<serde_json::Value, ActionError> {
        let params: HttpJsonParams = serde_json::from_value(payload)
            .map_err(|e| ActionError::InvalidPayload(e.to_string()))?;

        let result = self
            .actions
            .http_json(
                &params.url,
                &params.method,
                &params.headers,
                params.body.as_ref(),
                ctx.timeout_s,
            )
            .await?;

        serde_json::to_value(&result).map_err(|e| ActionError::ExecutionFailed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "http_json_tests.rs"]
mod tests;

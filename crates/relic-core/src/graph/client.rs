use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{GraphBackend, GraphErrorEntry, GraphErrors, Operation};
use crate::config::UpstreamConfig;
use crate::credentials::Caller;
use crate::error::{RelicError, Result};

/// HTTP client for the upstream graph API.
///
/// Every call is a `POST` of `{query, operationName, variables}`. Caller
/// credentials ride along as query parameters and selected inbound headers
/// are forwarded. There is no retry here; the caller sees the first outcome.
pub struct GraphClient {
    url: String,
    client_name: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct GraphResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphErrorEntry>>,
}

impl GraphClient {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| RelicError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: config.url.clone(),
            client_name: config.client_name.clone(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, operation: Operation, variables: Value, caller: &Caller) -> Result<Value> {
        let body = json!({
            "query": operation.document(),
            "operationName": operation.name(),
            "variables": variables,
        });

        let mut request = self
            .http
            .post(&self.url)
            .query(&caller.credential_params())
            .header("apollographql-client-name", &self.client_name)
            .json(&body);
        for (name, value) in &caller.forwarded {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        let parsed: GraphResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                let preview = if text.len() > 300 {
                    let mut end = 300;
                    while !text.is_char_boundary(end) {
                        end -= 1;
                    }
                    &text[..end]
                } else {
                    &text
                };
                return Err(RelicError::Upstream(format!(
                    "{operation} returned {status} with unreadable body: {e}\nBody: {preview}"
                )));
            }
        };

        if let Some(errors) = parsed.errors.filter(|errs| !errs.is_empty()) {
            return Err(GraphErrors::new(status.as_u16(), errors).into());
        }

        if !status.is_success() {
            return Err(RelicError::Upstream(format!(
                "{operation} returned {status} without an error list"
            )));
        }

        match parsed.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => Err(RelicError::Upstream(format!("{operation} returned no data"))),
        }
    }
}

impl GraphBackend for GraphClient {
    async fn execute(
        &self,
        operation: Operation,
        variables: Value,
        caller: &Caller,
    ) -> Result<Value> {
        tracing::debug!(operation = operation.name(), "upstream call");
        self.post(operation, variables, caller).await
    }
}

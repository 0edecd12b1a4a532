//! Collects legacy parameters from the query string and the body.
//!
//! Query string, form body and JSON body are interchangeable on every
//! endpoint; body keys win over query keys.

use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use relic_core::config::ApiConfig;
use relic_core::credentials::Caller;
use relic_core::params::LegacyParams;
use serde_json::Value;

use crate::error::ApiError;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Which credential besides `consumer_key` a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    AccessToken,
    Guid,
}

pub struct LegacyRequest {
    pub params: LegacyParams,
    pub headers: HeaderMap,
}

impl<S> FromRequest<S> for LegacyRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();

        let mut params = match parts.uri.query() {
            Some(query) => parse_form(query.as_bytes())?,
            None => LegacyParams::new(),
        };

        let bytes = axum::body::to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|e| ApiError::bad_request(format!("unreadable request body: {e}")))?;

        if !bytes.iter().all(u8::is_ascii_whitespace) {
            let content_type = parts
                .headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            let is_json = content_type.starts_with("application/json")
                || (content_type.is_empty() && bytes.trim_ascii_start().starts_with(b"{"));
            let body_params = if is_json {
                parse_json(&bytes)?
            } else {
                parse_form(&bytes)?
            };
            params.merge(body_params);
        }

        Ok(Self {
            params,
            headers: parts.headers,
        })
    }
}

fn parse_form(raw: &[u8]) -> Result<LegacyParams, ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw)
        .map_err(|e| ApiError::bad_request(format!("malformed form parameters: {e}")))?;
    Ok(LegacyParams::from_pairs(pairs))
}

fn parse_json(raw: &[u8]) -> Result<LegacyParams, ApiError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ApiError::bad_request(format!("malformed JSON body: {e}")))?;
    if !value.is_object() {
        return Err(ApiError::bad_request("JSON body must be an object"));
    }
    Ok(LegacyParams::from_json(value))
}

impl LegacyRequest {
    /// Build the caller from the credential parameters and forwarded headers.
    pub fn caller(&self, api: &ApiConfig, auth: Auth) -> Result<Caller, ApiError> {
        let consumer_key = self
            .params
            .non_empty_str("consumer_key")
            .ok_or_else(|| ApiError::bad_request("consumer_key is required"))?;

        let mut caller = Caller::new(consumer_key, &api.extension_consumer_ids);
        match auth {
            Auth::AccessToken => {
                let token = self
                    .params
                    .non_empty_str("access_token")
                    .ok_or_else(|| ApiError::bad_request("access_token is required"))?;
                caller = caller.with_access_token(token);
            }
            Auth::Guid => {
                let guid = self
                    .params
                    .non_empty_str("guid")
                    .ok_or_else(|| ApiError::bad_request("guid is required"))?;
                caller = caller.with_guid(guid);
            }
        }
        if let Some(locale) = self.params.non_empty_str("locale_lang") {
            caller = caller.with_locale(locale);
        }

        let forwarded = self.headers.iter().filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        });
        Ok(caller.with_forwarded(forwarded))
    }
}

mod client;
mod operations;
#[cfg(any(test, feature = "test-util"))]
mod scripted;

pub use client::GraphClient;
pub use operations::Operation;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{RecordedCall, ScriptedBackend};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credentials::Caller;
use crate::error::{RelicError, Result};

/// The one capability the proxy needs from upstream: run a named operation
/// with variables on behalf of a caller.
///
/// Returns the `data` object on success. Structured failures come back as
/// [`RelicError::Graph`]; anything else (transport, bad shape) as another
/// [`RelicError`] variant.
pub trait GraphBackend: Send + Sync {
    fn execute(
        &self,
        operation: Operation,
        variables: Value,
        caller: &Caller,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;
}

/// Run an operation and deserialize its `data` into `R`.
pub async fn execute_as<B, V, R>(
    backend: &B,
    operation: Operation,
    variables: V,
    caller: &Caller,
) -> Result<R>
where
    B: GraphBackend + ?Sized,
    V: Serialize,
    R: DeserializeOwned,
{
    let variables = serde_json::to_value(variables)?;
    let data = backend.execute(operation, variables, caller).await?;
    serde_json::from_value(data)
        .map_err(|e| RelicError::Upstream(format!("unexpected {operation} response: {e}")))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,
}

/// One element of an upstream `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphErrorEntry {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<ErrorExtensions>,
}

impl GraphErrorEntry {
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: Some(ErrorExtensions {
                code: Some(code.into()),
            }),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.code.as_deref()
    }
}

/// A structured upstream failure: the error list plus an HTTP-equivalent status.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphErrors {
    pub status: u16,
    pub errors: Vec<GraphErrorEntry>,
}

impl GraphErrors {
    /// `http_status` is the transport status. A 2xx transport status carries
    /// no information, so the status is derived from the first error code.
    pub fn new(http_status: u16, errors: Vec<GraphErrorEntry>) -> Self {
        let status = if (200..300).contains(&http_status) {
            status_for_code(errors.first().and_then(|e| e.code()))
        } else {
            http_status
        };
        Self { status, errors }
    }

    pub fn code(&self) -> Option<&str> {
        self.errors.first().and_then(|e| e.code())
    }

    pub fn first_message(&self) -> &str {
        self.errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or("unknown upstream error")
    }
}

impl std::fmt::Display for GraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.first_message(), self.status)
    }
}

fn status_for_code(code: Option<&str>) -> u16 {
    match code {
        Some("BAD_USER_INPUT") | Some("GRAPHQL_VALIDATION_FAILED") => 400,
        Some("UNAUTHENTICATED") => 401,
        Some("FORBIDDEN") => 403,
        Some("NOT_FOUND") => 404,
        _ => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_code_on_200() {
        let errs = GraphErrors::new(200, vec![GraphErrorEntry::with_code("x", "FORBIDDEN")]);
        assert_eq!(errs.status, 403);
        let errs = GraphErrors::new(200, vec![GraphErrorEntry::with_code("x", "BAD_USER_INPUT")]);
        assert_eq!(errs.status, 400);
        let errs = GraphErrors::new(200, vec![GraphErrorEntry::with_code("x", "WHO_KNOWS")]);
        assert_eq!(errs.status, 500);
    }

    #[test]
    fn test_transport_status_wins_when_not_2xx() {
        let errs = GraphErrors::new(
            429,
            vec![GraphErrorEntry::with_code("slow down", "NOT_FOUND")],
        );
        assert_eq!(errs.status, 429);
    }

    #[test]
    fn test_entry_without_extensions() {
        let entry: GraphErrorEntry = serde_json::from_str(r#"{"message": "boom"}"#).unwrap();
        assert_eq!(entry.code(), None);
        let errs = GraphErrors::new(200, vec![entry]);
        assert_eq!(errs.status, 500);
        assert_eq!(errs.first_message(), "boom");
    }

    #[test]
    fn test_empty_error_list_message() {
        let errs = GraphErrors::new(502, vec![]);
        assert_eq!(errs.first_message(), "unknown upstream error");
        assert_eq!(errs.to_string(), "unknown upstream error (502)");
    }
}

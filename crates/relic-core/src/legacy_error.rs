//! Classification of failures into legacy outcomes, and the telemetry that
//! goes with each class.
//!
//! Expected outcomes (validation, NOT_FOUND, FORBIDDEN) are silent. Other
//! structured upstream errors below 500 are reported as non-fatal; everything
//! else is a fault and gets an event id.

use uuid::Uuid;

use crate::error::RelicError;
use crate::model::{ActionKind, ActionResult, LegacyError};

/// Tracing target for reportable failures.
pub const TELEMETRY_TARGET: &str = "relic::telemetry";

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorClass {
    /// Rejected before any upstream call.
    Validation(String),
    /// Upstream said the target does not exist.
    NotFound(String),
    Forbidden,
    /// Structured upstream error with a status below 500.
    Client { status: u16, message: String },
    /// Anything unexpected: transport, shape, or a 5xx.
    Fault(String),
}

impl ErrorClass {
    pub fn of(err: &RelicError) -> Self {
        match err {
            RelicError::InvalidInput(msg) => Self::Validation(msg.clone()),
            RelicError::Graph(errors) => match errors.code() {
                Some("NOT_FOUND") => Self::NotFound(errors.first_message().to_string()),
                Some("FORBIDDEN") => Self::Forbidden,
                _ if errors.status == 403 => Self::Forbidden,
                _ if errors.status < 500 => Self::Client {
                    status: errors.status,
                    message: errors.first_message().to_string(),
                },
                _ => Self::Fault(err.to_string()),
            },
            other => Self::Fault(other.to_string()),
        }
    }

    /// HTTP status when the failure is the whole response.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Forbidden => 403,
            Self::Client { status, .. } => *status,
            Self::Fault(_) => 500,
        }
    }

    /// Whether this failure belongs in telemetry.
    pub fn is_reportable(&self) -> bool {
        matches!(self, Self::Client { .. } | Self::Fault(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Fault(msg) => msg,
            Self::Client { message, .. } => message,
            Self::Forbidden => "forbidden",
        }
    }
}

/// Emit the telemetry event for a failure, if its class is reportable.
///
/// Returns the fault event id when one was generated.
pub fn report(class: &ErrorClass, context: &str) -> Option<Uuid> {
    match class {
        ErrorClass::Client { status, message } => {
            tracing::warn!(
                target: TELEMETRY_TARGET,
                context,
                status,
                error = %message,
                "upstream rejected request"
            );
            None
        }
        ErrorClass::Fault(message) => {
            let event_id = Uuid::now_v7();
            tracing::error!(
                target: TELEMETRY_TARGET,
                context,
                event_id = %event_id,
                error = %message,
                "unexpected failure"
            );
            Some(event_id)
        }
        ErrorClass::Validation(_) | ErrorClass::NotFound(_) | ErrorClass::Forbidden => None,
    }
}

/// Emit one telemetry event for all reportable failures of a batch.
///
/// A single failure is reported as [`report`] would. Several are folded into
/// one event: an `error!` with one event id if any of them is a fault,
/// otherwise a `warn!`.
pub fn report_batch(failures: &[(&str, ErrorClass)]) -> Option<Uuid> {
    let reportable: Vec<&(&str, ErrorClass)> =
        failures.iter().filter(|(_, class)| class.is_reportable()).collect();

    match reportable.as_slice() {
        [] => None,
        [(context, class)] => report(class, context),
        many => {
            let faults = many
                .iter()
                .filter(|(_, class)| matches!(class, ErrorClass::Fault(_)))
                .count();
            let summary = many
                .iter()
                .map(|(context, class)| format!("{context}: {}", class.message()))
                .collect::<Vec<_>>()
                .join("; ");

            if faults == 0 {
                tracing::warn!(
                    target: TELEMETRY_TARGET,
                    context = "batch",
                    failures = many.len(),
                    error = %summary,
                    "upstream rejected batch actions"
                );
                return None;
            }
            let event_id = Uuid::now_v7();
            tracing::error!(
                target: TELEMETRY_TARGET,
                context = "batch",
                event_id = %event_id,
                faults,
                failures = many.len(),
                error = %summary,
                "unexpected failures in batch"
            );
            Some(event_id)
        }
    }
}

/// Translate the failure of one batch action into its per-index outcome.
pub fn action_outcome(kind: &ActionKind, class: &ErrorClass) -> ActionResult {
    match class {
        ErrorClass::NotFound(_) if kind.not_found_is_success() => {
            ActionResult::Success(serde_json::Value::Bool(true))
        }
        ErrorClass::NotFound(message) => {
            ActionResult::Failure(LegacyError::client(404, message.as_str()))
        }
        ErrorClass::Forbidden => ActionResult::Failure(LegacyError::forbidden()),
        ErrorClass::Client { status, message } => {
            ActionResult::Failure(LegacyError::client(*status, message.as_str()))
        }
        ErrorClass::Validation(message) => {
            ActionResult::Failure(LegacyError::client(400, message.as_str()))
        }
        ErrorClass::Fault(_) => ActionResult::Failure(LegacyError::internal()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphErrorEntry, GraphErrors};
    use serde_json::json;

    fn graph(status: u16, code: &str, msg: &str) -> RelicError {
        GraphErrors::new(status, vec![GraphErrorEntry::with_code(msg, code)]).into()
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            ErrorClass::of(&RelicError::invalid("bad")),
            ErrorClass::Validation("bad".into())
        );
        assert_eq!(
            ErrorClass::of(&graph(200, "NOT_FOUND", "gone")),
            ErrorClass::NotFound("gone".into())
        );
        assert_eq!(ErrorClass::of(&graph(200, "FORBIDDEN", "no")), ErrorClass::Forbidden);
        assert_eq!(
            ErrorClass::of(&graph(200, "BAD_USER_INPUT", "bad url")),
            ErrorClass::Client {
                status: 400,
                message: "bad url".into()
            }
        );
        assert!(matches!(
            ErrorClass::of(&graph(200, "INTERNAL_SERVER_ERROR", "boom")),
            ErrorClass::Fault(_)
        ));
        assert!(matches!(
            ErrorClass::of(&RelicError::Upstream("reset".into())),
            ErrorClass::Fault(_)
        ));
    }

    #[test]
    fn test_not_found_is_success_for_idempotent_actions() {
        let err = graph(200, "NOT_FOUND", "gone");
        let kinds = [
            ActionKind::Delete,
            ActionKind::Archive,
            ActionKind::Favorite,
            ActionKind::TagsClear,
        ];
        for kind in kinds {
            assert_eq!(
                action_outcome(&kind, &ErrorClass::of(&err)),
                ActionResult::Success(json!(true))
            );
        }
    }

    #[test]
    fn test_not_found_fails_readd() {
        let err = graph(200, "NOT_FOUND", "no such item");
        match action_outcome(&ActionKind::ReAdd, &ErrorClass::of(&err)) {
            ActionResult::Failure(e) => {
                assert_eq!(e.message, "no such item");
                assert_eq!(e.kind, "Not Found");
                assert_eq!(e.code, 199);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_forbidden_descriptor() {
        let err = graph(200, "FORBIDDEN", "nope");
        assert_eq!(
            action_outcome(&ActionKind::Archive, &ErrorClass::of(&err)),
            ActionResult::Failure(LegacyError::forbidden())
        );
    }

    #[test]
    fn test_fault_descriptor() {
        let err = RelicError::Upstream("connection refused".into());
        assert_eq!(
            action_outcome(&ActionKind::Delete, &ErrorClass::of(&err)),
            ActionResult::Failure(LegacyError::internal())
        );
    }

    #[test]
    fn test_report_only_for_reportable() {
        assert!(report(&ErrorClass::Forbidden, "t").is_none());
        assert!(report(&ErrorClass::Validation("x".into()), "t").is_none());
        assert!(report(&ErrorClass::Fault("x".into()), "t").is_some());
    }

    #[test]
    fn test_batch_faults_share_one_event() {
        let failures = [
            ("archive", ErrorClass::Fault("connection reset".into())),
            ("delete", ErrorClass::Forbidden),
            ("favorite", ErrorClass::Fault("timed out".into())),
        ];
        assert!(report_batch(&failures).is_some());
    }

    #[test]
    fn test_batch_without_faults_has_no_event_id() {
        assert!(report_batch(&[]).is_none());
        let failures = [
            (
                "tags_add",
                ErrorClass::Client {
                    status: 400,
                    message: "bad".into(),
                },
            ),
            ("delete", ErrorClass::NotFound("gone".into())),
            (
                "readd",
                ErrorClass::Client {
                    status: 429,
                    message: "slow".into(),
                },
            ),
        ];
        assert!(report_batch(&failures).is_none());
    }

    #[test]
    fn test_class_messages() {
        assert_eq!(ErrorClass::Fault("boom".into()).message(), "boom");
        assert!(!ErrorClass::NotFound("gone".into()).is_reportable());
        let conflict = ErrorClass::Client {
            status: 409,
            message: "dup".into(),
        };
        assert!(conflict.is_reportable());
    }
}

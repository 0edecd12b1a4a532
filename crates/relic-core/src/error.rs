use thiserror::Error;

use crate::graph::GraphErrors;

#[derive(Debug, Error)]
pub enum RelicError {
    #[error("Upstream returned errors: {0}")]
    Graph(GraphErrors),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RelicError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// The first `extensions.code` of a structured upstream error, if any.
    pub fn graph_code(&self) -> Option<&str> {
        match self {
            Self::Graph(errors) => errors.code(),
            _ => None,
        }
    }

    /// `true` for failures raised before any upstream call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<GraphErrors> for RelicError {
    fn from(errors: GraphErrors) -> Self {
        Self::Graph(errors)
    }
}

pub type Result<T> = std::result::Result<T, RelicError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphErrorEntry;

    #[test]
    fn test_graph_code_first_entry() {
        let err = RelicError::from(GraphErrors::new(
            200,
            vec![
                GraphErrorEntry::with_code("gone", "NOT_FOUND"),
                GraphErrorEntry::with_code("nope", "FORBIDDEN"),
            ],
        ));
        assert_eq!(err.graph_code(), Some("NOT_FOUND"));
    }

    #[test]
    fn test_graph_code_absent_for_transport_errors() {
        let err = RelicError::Upstream("connection reset".into());
        assert_eq!(err.graph_code(), None);
        assert!(!err.is_validation());
    }

    #[test]
    fn test_invalid_input_is_validation() {
        let err = RelicError::invalid("count must be a number");
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Invalid input: count must be a number");
    }
}

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use relic_core::error::RelicError;
use relic_core::legacy_error::{report, ErrorClass};
use relic_core::model::{CODE_FORBIDDEN, CODE_INVALID_ACTION, SOMETHING_WENT_WRONG};

static X_ERROR: HeaderName = HeaderName::from_static("x-error");
static X_ERROR_CODE: HeaderName = HeaderName::from_static("x-error-code");

/// JSON error for the legacy endpoints: `{"error": message}`, plus the
/// `X-Error` / `X-Error-Code` headers old clients read.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<u32>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: message.into(),
            code: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(400, msg).with_code(CODE_INVALID_ACTION)
    }

    pub fn forbidden() -> Self {
        Self::new(403, SOMETHING_WENT_WRONG).with_code(CODE_FORBIDDEN)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(404, msg)
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        let mut response = (self.status, Json(body)).into_response();
        let headers = response.headers_mut();
        if let Ok(value) = HeaderValue::from_str(&self.message) {
            headers.insert(X_ERROR.clone(), value);
        }
        if let Some(code) = self.code {
            headers.insert(X_ERROR_CODE.clone(), HeaderValue::from(code));
        }
        response
    }
}

impl From<RelicError> for ApiError {
    fn from(err: RelicError) -> Self {
        let class = ErrorClass::of(&err);
        report(&class, "route");
        match class {
            ErrorClass::Validation(msg) => Self::bad_request(msg),
            ErrorClass::NotFound(msg) => Self::not_found(msg),
            ErrorClass::Forbidden => Self::forbidden(),
            ErrorClass::Client { status, message } => Self::new(status, message),
            ErrorClass::Fault(msg) => Self::new(500, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_core::graph::{GraphErrorEntry, GraphErrors};

    #[test]
    fn test_validation_is_400_with_code() {
        let err = ApiError::from(RelicError::invalid("count must be between 1 and 5000"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "count must be between 1 and 5000");
        assert_eq!(err.code, Some(130));
    }

    #[test]
    fn test_forbidden() {
        let err = ApiError::from(RelicError::from(GraphErrors::new(
            200,
            vec![GraphErrorEntry::with_code("denied", "FORBIDDEN")],
        )));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Something Went Wrong");
        assert_eq!(err.code, Some(5200));
    }

    #[test]
    fn test_client_status_passes_through() {
        let err = ApiError::from(RelicError::from(GraphErrors::new(
            429,
            vec![GraphErrorEntry::with_code("slow down", "RATE_LIMITED")],
        )));
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message, "slow down");
    }

    #[test]
    fn test_fault_is_500() {
        let err = ApiError::from(RelicError::Upstream("no data".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Upstream error: no data");
    }

    #[test]
    fn test_headers() {
        let response = ApiError::bad_request("tags must not contain empty names").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-error-code"], "130");
        assert_eq!(response.headers()["x-error"], "tags must not contain empty names");
    }
}

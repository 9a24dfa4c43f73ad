//! Error types shared by the request client and the orchestration components.

use thiserror::Error;

/// Longest backend body kept verbatim in a rejection detail.
const MAX_DETAIL_LEN: usize = 500;

/// How a failed user action is classified when it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network, DNS, or connection failure before a status arrived.
    Transport,
    /// Non-2xx status with a detail string.
    BackendRejection,
    /// 2xx response whose payload reports `success: false`.
    SoftFailure,
    /// The client declined to call the backend at all.
    ValidationSkip,
}

/// Failure of a single request/response exchange with the backend.
///
/// The request client surfaces these unchanged; it never retries.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// Builds a rejection from a non-2xx status and its raw body.
    ///
    /// Prefers the `detail` field of a JSON error body. String details are used
    /// as-is; structured ones (validation error lists) are re-serialized.
    pub fn rejected(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| truncate(body.trim()));
        ApiError::Rejected { status, detail }
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ApiError::Rejected { .. } => FailureKind::BackendRejection,
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::InvalidBaseUrl { .. } => {
                FailureKind::Transport
            }
        }
    }

    /// Backend-provided detail suitable for showing to the user, if any.
    pub fn user_detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_DETAIL_LEN {
        return body.to_owned();
    }
    let mut end = MAX_DETAIL_LEN;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_prefers_detail_field() {
        let err = ApiError::rejected(400, r#"{"detail":"unsupported file type: .exe"}"#);
        assert_eq!(err.user_detail(), Some("unsupported file type: .exe"));
        assert_eq!(err.failure_kind(), FailureKind::BackendRejection);
    }

    #[test]
    fn rejection_falls_back_to_body_text() {
        let err = ApiError::rejected(502, "Bad Gateway\n");
        match err {
            ApiError::Rejected { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "Bad Gateway");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn structured_detail_is_serialized() {
        let err = ApiError::rejected(422, r#"{"detail":[{"loc":["body","chunk_size"]}]}"#);
        assert!(err.user_detail().unwrap().contains("chunk_size"));
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(400);
        let err = ApiError::rejected(500, &body);
        let detail = err.user_detail().unwrap();
        assert!(detail.ends_with("..."));
        assert!(detail.len() <= MAX_DETAIL_LEN + 3);
    }
}

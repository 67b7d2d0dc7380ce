use serde::{Deserialize, Serialize};

/// Error body the backend attaches to non-success responses. Only the
/// `detail` field is contractual; anything else in the body is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// Best-effort extraction of a human-readable message from a raw
    /// response body, falling back to the caller's generic message when
    /// the body is not the expected shape.
    pub fn message_from_body(body: &str, fallback: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.detail)
            .filter(|detail| !detail.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

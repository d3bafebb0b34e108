//! Error response DTOs.

use serde::Serialize;
use serde_json::{Map, Value};

/// Standard error body: `{"error": ..., "code": ..., ...extra}`.
///
/// Extra fields sit at the top level so availability conflicts expose
/// `disponibile`, `richiesta`, `mancante` next to the message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
            extra: Map::new(),
        }
    }

    /// Merges extra top-level fields; `error` and `code` cannot be shadowed.
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        for (key, value) in extra {
            if key != "error" && key != "code" {
                self.extra.insert(key, value);
            }
        }
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

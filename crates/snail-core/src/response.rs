use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP status codes used in response envelopes.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// The uniform API response: status, body and CORS headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status_code: u16,
    pub body: Value,
    pub headers: CorsHeaders,
}

/// Permissive CORS headers attached to every envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorsHeaders {
    #[serde(rename = "Access-Control-Allow-Headers")]
    pub allow_headers: String,
    #[serde(rename = "Access-Control-Allow-Methods")]
    pub allow_methods: String,
    #[serde(rename = "Access-Control-Allow-Origin")]
    pub allow_origin: String,
    #[serde(rename = "Access-Control-Allow-Credentials")]
    pub allow_credentials: bool,
}

impl Default for CorsHeaders {
    fn default() -> Self {
        Self {
            allow_headers: "Content-Type".to_string(),
            allow_methods: "OPTIONS,POST,GET".to_string(),
            allow_origin: "*".to_string(),
            allow_credentials: true,
        }
    }
}

impl CorsHeaders {
    /// Header name/value pairs, in wire form.
    pub fn pairs(&self) -> [(&'static str, String); 4] {
        [
            ("Access-Control-Allow-Headers", self.allow_headers.clone()),
            ("Access-Control-Allow-Methods", self.allow_methods.clone()),
            ("Access-Control-Allow-Origin", self.allow_origin.clone()),
            (
                "Access-Control-Allow-Credentials",
                self.allow_credentials.to_string(),
            ),
        ]
    }
}

/// Build a response envelope.
pub fn response(status_code: u16, body: impl Into<Value>) -> Envelope {
    Envelope {
        status_code,
        body: body.into(),
        headers: CorsHeaders::default(),
    }
}

/// Shorthand for `{"error": message}` envelopes.
pub fn error_response(status_code: u16, message: impl std::fmt::Display) -> Envelope {
    response(
        status_code,
        serde_json::json!({ "error": message.to_string() }),
    )
}

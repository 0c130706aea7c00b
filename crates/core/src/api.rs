//! Wire types for the daemon HTTP API.

use serde::{Deserialize, Serialize};

/// Payload the widget hands to its listener, forwarded verbatim by the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerPayload {
    /// URL of the verified user's claim document.
    pub user_json_url: String,
}

/// Policy generation request. Missing fields fall back to the daemon's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratePolicyRequest {
    /// Company name; defaults to the configured brand.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Website URL; defaults to the configured site.
    #[serde(default)]
    pub website_url: Option<String>,
}

/// Acknowledgement for requests whose result arrives asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedResponse {
    /// Always true; rejections use [`ErrorResponse`].
    pub accepted: bool,
    /// Optional human-readable note.
    pub message: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// What went wrong.
    pub error: String,
}

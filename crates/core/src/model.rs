//! Domain values produced and consumed by the demo.

use serde::{Deserialize, Serialize};

/// Outcome of a completed phone verification.
///
/// The widget only hands back a pointer to the verified user's claim data;
/// fetching that document is left to whoever consumes the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResult {
    /// URL of the hosted JSON document describing the verified user.
    pub url: String,
}

impl VerificationResult {
    /// Wraps the claim document URL as handed back by the widget.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Generated privacy policy (markdown).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Markdown body, shown verbatim.
    pub text: String,
}

/// Plain-language security explanation for one verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsightText {
    /// Plain text, a few sentences.
    pub text: String,
}

/// Arguments for a privacy policy generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRequest {
    /// Company the policy is written for.
    pub company_name: String,
    /// Website the policy covers.
    pub website_url: String,
}

/// Sampling settings sent with a text-generation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff. `None` leaves the backend default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl GenerationConfig {
    /// Settings for privacy policy generation.
    pub const POLICY: Self = Self {
        temperature: 0.7,
        top_p: Some(0.95),
    };

    /// Settings for the security insight.
    pub const INSIGHT: Self = Self {
        temperature: 0.7,
        top_p: None,
    };
}

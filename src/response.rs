//! Interpretation of cobalt's JSON responses.

use serde_json::Value;

use crate::cobalt::RawResponse;
use crate::markup::html_to_markdown;

/// Message used when cobalt claims success but sends no link.
const MISSING_URL: &str = "no download link in response";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success { download_url: String },
    Failure { message: String, status_code: u16 },
}

impl ConversionResult {
    /// Reply text for a failed conversion, e.g. `rate limited (403)`.
    pub fn failure_text(message: &str, status_code: u16) -> String {
        format!("{message} ({status_code})").trim().to_string()
    }
}

/// Parse a raw cobalt response.
///
/// Fails only when the body is not JSON at all. Fields that are missing or not
/// strings count as absent, so any JSON without `"status": "success"` is a
/// `Failure`, not an `Err`.
pub fn interpret(raw: &RawResponse) -> Result<ConversionResult, serde_json::Error> {
    let parsed: Value = serde_json::from_str(&raw.body)?;
    let field = |name: &str| parsed.get(name).and_then(Value::as_str);

    if field("status") == Some("success") {
        return Ok(match field("url") {
            Some(download_url) => ConversionResult::Success {
                download_url: download_url.to_string(),
            },
            None => ConversionResult::Failure {
                message: MISSING_URL.to_string(),
                status_code: raw.status,
            },
        });
    }

    Ok(ConversionResult::Failure {
        message: html_to_markdown(field("text").unwrap_or_default()),
        status_code: raw.status,
    })
}

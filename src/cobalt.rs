//! Client for the cobalt `/api/json` endpoint.

use serde::Serialize;
use tracing::debug;

/// Default public cobalt instance.
pub const DEFAULT_API_URL: &str = "https://co.wuk.sh/api/json";

/// Cobalt sits behind bot filtering that rejects non-browser agents.
const USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Mobile Safari/537.36";

/// What the user asked cobalt to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub url: String,
    pub audio_only: bool,
}

impl ConversionRequest {
    pub fn new(url: impl Into<String>, audio_only: bool) -> Self {
        Self {
            url: url.into(),
            audio_only,
        }
    }
}

/// Status and body exactly as cobalt returned them.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    url: &'a str,
    #[serde(rename = "isNoTTWatermark")]
    is_no_tt_watermark: &'static str,
    v_quality: &'static str,
    a_format: &'static str,
    v_codec: &'static str,
    filename_pattern: &'static str,
    twitter_gif: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_audio_only: Option<&'static str>,
}

impl<'a> From<&'a ConversionRequest> for ApiRequest<'a> {
    fn from(request: &'a ConversionRequest) -> Self {
        Self {
            url: &request.url,
            is_no_tt_watermark: "true",
            v_quality: "1080",
            a_format: "mp3",
            v_codec: "h264",
            filename_pattern: "basic",
            twitter_gif: "true",
            is_audio_only: request.audio_only.then_some("true"),
        }
    }
}

pub struct Client {
    endpoint: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Send one conversion request. The response is not interpreted here;
    /// a non-2xx status still comes back as `Ok`.
    pub async fn send(&self, request: &ConversionRequest) -> Result<RawResponse, reqwest::Error> {
        debug!(
            "cobalt request: {} (audio only: {})",
            request.url, request.audio_only
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&ApiRequest::from(request))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("cobalt response status: {status}");
        Ok(RawResponse { status, body })
    }
}

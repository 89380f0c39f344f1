use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::wire::{ErrorPayload, GeneratedImage, ImageRequest};
use super::ImageProvider;

/// An HTTP function that wraps an image API behind `{ "prompt": ... }`.
pub struct Relay {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    image_base64: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

fn mime_from_data_url(url: &str) -> Option<&str> {
    url.strip_prefix("data:")?.split(';').next()
}

fn parse_reply(status: reqwest::StatusCode, text: &str) -> Result<GeneratedImage> {
    if let Ok(err) = serde_json::from_str::<ErrorPayload>(text) {
        return Err(anyhow!("relay error ({status}): {}", err.error));
    }
    if !status.is_success() {
        return Err(anyhow!("relay error ({status}): {text}"));
    }
    let parsed: RelayResponse = serde_json::from_str(text)
        .map_err(|e| anyhow!("relay response parse error: {e}"))?;
    let base64 = match parsed.image_base64 {
        Some(b) if parsed.success && !b.is_empty() => b,
        _ => return Err(anyhow!("relay returned no image")),
    };
    let mime = parsed
        .image_url
        .as_deref()
        .and_then(mime_from_data_url)
        .unwrap_or("image/png")
        .to_string();
    Ok(GeneratedImage { base64, mime, seed: None })
}

#[async_trait]
impl ImageProvider for Relay {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn generate(&self, req: &ImageRequest, debug: bool) -> Result<GeneratedImage> {
        let client = Client::builder().timeout(self.timeout).build()?;
        if debug {
            tracing::debug!(url = %self.url, prompt = %req.prompt, "relay request");
        }

        let mut call = client.post(&self.url).json(&RelayRequest { prompt: &req.prompt });
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let resp = call.send().await.context("relay request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("relay read body failed")?;
        if debug {
            tracing::debug!(%status, bytes = text.len(), "relay response");
        }
        parse_reply(status, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn success_payload_yields_image() {
        let img = parse_reply(
            StatusCode::OK,
            r#"{"success":true,"imageBase64":"QUJD","imageUrl":"data:image/jpeg;base64,QUJD"}"#,
        )
        .unwrap();
        assert_eq!(img.base64, "QUJD");
        assert_eq!(img.mime, "image/jpeg");
    }

    #[test]
    fn error_payload_is_surfaced() {
        let err = parse_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"GOOGLE_API_KEY is not set","success":false}"#,
        )
        .unwrap_err();
        assert!(err.to_string().ends_with("GOOGLE_API_KEY is not set"));

        let err = parse_reply(StatusCode::BAD_REQUEST, r#"{"error":"Prompt is required"}"#).unwrap_err();
        assert!(err.to_string().contains("Prompt is required"));
    }

    #[test]
    fn missing_image_is_an_error() {
        assert!(parse_reply(StatusCode::OK, r#"{"success":true}"#).is_err());
        assert!(parse_reply(StatusCode::BAD_GATEWAY, "upstream down").is_err());
    }
}

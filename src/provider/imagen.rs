use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::wire::{GeneratedImage, ImageRequest};
use super::{check_status, ImageProvider};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

pub struct Imagen {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    config: GenerateConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateConfig<'a> {
    aspect_ratio: &'a str,
    seed: u32,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    generated_images: Vec<Generated>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Generated {
    bytes_base64_encoded: String,
}

fn request_body(req: &ImageRequest) -> GenerateRequest<'_> {
    GenerateRequest {
        prompt: &req.prompt,
        config: GenerateConfig {
            aspect_ratio: &req.aspect_ratio,
            seed: req.seed,
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting { category, threshold: "BLOCK_ONLY_HIGH" })
                .collect(),
        },
    }
}

fn parse_image(text: &str) -> Result<GeneratedImage> {
    let parsed: GenerateResponse = serde_json::from_str(text)
        .map_err(|e| anyhow!("imagen response parse error: {e}"))?;
    let first = parsed
        .generated_images
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No image generated"))?;
    Ok(GeneratedImage {
        base64: first.bytes_base64_encoded,
        mime: "image/png".into(),
        seed: None,
    })
}

#[async_trait]
impl ImageProvider for Imagen {
    fn name(&self) -> &'static str {
        "imagen"
    }

    async fn generate(&self, req: &ImageRequest, debug: bool) -> Result<GeneratedImage> {
        let url = format!(
            "{}/v1beta/models/{}:generateImage",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let client = Client::builder().timeout(self.timeout).build()?;
        let body = request_body(req);

        if debug {
            tracing::debug!(%url, body = %serde_json::to_string_pretty(&body)?, "imagen request");
        }

        let resp = client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .context("imagen request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("imagen read body failed")?;
        if debug {
            tracing::debug!(%status, bytes = text.len(), "imagen response");
        }
        check_status("imagen", status, &text)?;

        let mut image = parse_image(&text)?;
        image.seed = Some(req.seed);
        Ok(image)
    }
}

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::wire::{GeneratedImage, ImageRequest};
use super::{check_status, ImageProvider};

pub const DEFAULT_API_BASE: &str = "https://api.stability.ai";

/// Stable Diffusion 3 through the v2beta stable-image endpoint.
pub struct Stability {
    pub model: String,
    pub api_key: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Deserialize)]
struct Sd3Response {
    image: String,
    #[serde(default)]
    seed: Option<u32>,
}

fn form_fields(model: &str, req: &ImageRequest) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("prompt", req.prompt.clone()),
        ("aspect_ratio", req.aspect_ratio.clone()),
        ("output_format", req.output_format.as_str().to_string()),
        ("model", model.to_string()),
        ("seed", req.seed.to_string()),
    ];
    // Turbo models reject negative prompts.
    if !req.negative_prompt.trim().is_empty() && !model.ends_with("turbo") {
        fields.push(("negative_prompt", req.negative_prompt.clone()));
    }
    fields
}

#[async_trait]
impl ImageProvider for Stability {
    fn name(&self) -> &'static str {
        "stability"
    }

    async fn generate(&self, req: &ImageRequest, debug: bool) -> Result<GeneratedImage> {
        let url = format!("{}/v2beta/stable-image/generate/sd3", self.api_base.trim_end_matches('/'));
        let client = Client::builder().timeout(self.timeout).build()?;

        let fields = form_fields(&self.model, req);
        if debug {
            tracing::debug!(%url, ?fields, "stability request");
        }
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let resp = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await
            .context("stability request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("stability read body failed")?;
        if debug {
            tracing::debug!(%status, bytes = text.len(), "stability response");
        }
        check_status("stability", status, &text)?;

        let parsed: Sd3Response = serde_json::from_str(&text)
            .map_err(|e| anyhow!("stability response parse error: {e}"))?;

        Ok(GeneratedImage {
            base64: parsed.image,
            mime: req.output_format.mime().to_string(),
            seed: parsed.seed.or(Some(req.seed)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::OutputFormat;

    fn request(negative: &str) -> ImageRequest {
        ImageRequest {
            prompt: "Red shell bonbon".into(),
            negative_prompt: negative.into(),
            aspect_ratio: "4:5".into(),
            output_format: OutputFormat::Webp,
            seed: 7,
        }
    }

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn sends_negative_prompt_for_regular_models() {
        let req = request("blurry");
        let fields = form_fields("sd3-medium", &req);
        assert_eq!(field(&fields, "negative_prompt"), Some("blurry"));
        assert_eq!(field(&fields, "output_format"), Some("webp"));
        assert_eq!(field(&fields, "seed"), Some("7"));
    }

    #[test]
    fn omits_negative_prompt_for_turbo_or_blank() {
        let req = request("blurry");
        assert_eq!(field(&form_fields("sd3-large-turbo", &req), "negative_prompt"), None);
        let blank = request("  ");
        assert_eq!(field(&form_fields("sd3-medium", &blank), "negative_prompt"), None);
    }
}

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::cli::ProviderKind;
use crate::wire::{GeneratedImage, ImageRequest};

pub mod imagen;
pub mod relay;
pub mod stability;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate(&self, req: &ImageRequest, debug: bool) -> Result<GeneratedImage>;
}

pub type DynProvider = Box<dyn ImageProvider + Send + Sync>;

pub fn default_model(kind: &ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Imagen => "imagen-3.0-generate-001",
        ProviderKind::Stability => "sd3-medium",
        ProviderKind::Relay => "relay",
    }
}

fn api_key(var: &str) -> Result<String> {
    std::env::var(var).map_err(|_| anyhow!("{var} env var is not set"))
}

pub fn make_provider(
    kind: ProviderKind,
    model: String,
    timeout_secs: u64,
    api_base: Option<String>,
) -> Result<DynProvider> {
    let timeout = Duration::from_secs(timeout_secs);
    match kind {
        ProviderKind::Imagen => Ok(Box::new(imagen::Imagen {
            model,
            api_key: api_key("GOOGLE_API_KEY")?,
            api_base: api_base.unwrap_or_else(|| imagen::DEFAULT_API_BASE.into()),
            timeout,
        })),
        ProviderKind::Stability => Ok(Box::new(stability::Stability {
            model,
            api_key: api_key("STABILITY_API_KEY")?,
            api_base: api_base.unwrap_or_else(|| stability::DEFAULT_API_BASE.into()),
            timeout,
        })),
        ProviderKind::Relay => {
            let url = api_base.ok_or_else(|| anyhow!("relay provider needs --api-base (or api_base in config)"))?;
            Ok(Box::new(relay::Relay {
                url,
                api_key: std::env::var("BOMBOM_RELAY_KEY").ok(),
                timeout,
            }))
        }
    }
}

/// Turn a non-2xx response into an error carrying status and body.
pub(crate) fn check_status(provider: &str, status: reqwest::StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(anyhow!("{provider} API error ({status}): {body}"))
    }
}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::cli::{ProviderArgs, ProviderKind};
use crate::provider::default_model;
use crate::translate::MatchMode;
use crate::wire::OutputFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: String,
    pub root: String,
    /// Record files and transaction artifacts, relative to `root`.
    pub store_dir: String,
    pub provider: ProviderKind,
    /// Falls back to the provider's default model when unset.
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub aspect_ratio: String,
    pub output_format: OutputFormat,
    pub timeout_secs: u64,
    pub match_mode: MatchMode,
    /// Drawn at random per generation when unset.
    pub seed: Option<u32>,
    /// JSON `[source, target]` pairs replacing the built-in table.
    pub translation_table: Option<PathBuf>,
    pub save_request: bool,
    pub save_response: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: "2025-10-01".into(),
            root: ".".into(),
            store_dir: ".bombom".into(),
            provider: ProviderKind::Imagen,
            model: None,
            api_base: None,
            aspect_ratio: "1:1".into(),
            output_format: OutputFormat::Png,
            timeout_secs: 120,
            match_mode: MatchMode::Literal,
            seed: None,
            translation_table: None,
            save_request: true,
            save_response: true,
        }
    }
}

impl Config {
    /// Read `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn apply_provider_args(&mut self, args: &ProviderArgs) {
        if let Some(p) = &args.provider {
            if *p != self.provider {
                // A model picked for another provider would not exist there.
                self.model = None;
            }
            self.provider = p.clone();
        }
        if let Some(m) = &args.model {
            self.model = Some(m.clone());
        }
        if let Some(b) = &args.api_base {
            self.api_base = Some(b.clone());
        }
        if let Some(a) = &args.aspect_ratio {
            self.aspect_ratio = a.clone();
        }
        if let Some(f) = args.output_format {
            self.output_format = f;
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        if args.seed.is_some() {
            self.seed = args.seed;
        }
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| default_model(&self.provider).to_string())
    }

    pub fn store_path(&self) -> PathBuf {
        Path::new(&self.root).join(&self.store_dir)
    }
}

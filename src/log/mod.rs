use crate::config::Config;
use crate::order::Generation;
use anyhow::Result;
use fs_err as fs;
use serde_json::{json, to_string_pretty};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: Option<PathBuf>,
    pub response: Option<PathBuf>,
    pub image: PathBuf,
}

fn tx_dir(store: &Path, tx: Uuid) -> PathBuf {
    store.join("tx").join(tx.to_string())
}

/// Persist one generation: request/response JSON (per config flags) and the
/// decoded image, written to `out` when given.
pub fn save_generation(gen: &Generation, cfg: &Config, out: Option<&Path>) -> Result<SavedPaths> {
    let dir = tx_dir(&cfg.store_path(), gen.id);
    fs::create_dir_all(&dir)?;

    let mut request_path = None;
    let mut response_path = None;

    if cfg.save_request {
        let p = dir.join("generate.request.json");
        let body = json!({
            "provider": cfg.provider,
            "model": cfg.model(),
            "original_prompt": gen.prompt.prompt,
            "request": gen.request,
        });
        fs::write(&p, to_string_pretty(&body)?)?;
        request_path = Some(p);
    }

    if cfg.save_response {
        let p = dir.join("generate.response.json");
        // The payload itself lands in the image file.
        let body = json!({
            "mime": gen.image.mime,
            "seed": gen.image.seed,
            "base64_len": gen.image.base64.len(),
        });
        fs::write(&p, to_string_pretty(&body)?)?;
        response_path = Some(p);
    }

    let image = match out {
        Some(p) => p.to_path_buf(),
        None => dir.join(format!("bombom.{}", gen.request.output_format.extension())),
    };
    if let Some(parent) = image.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&image, gen.image.decode()?)?;

    let saved = SavedPaths { dir, request: request_path, response: response_path, image };
    log_saved_paths("generate", &saved);
    Ok(saved)
}

pub fn log_saved_paths(stage: &str, saved: &SavedPaths) {
    tracing::debug!(stage, dir = %saved.dir.display(), "artifacts directory");
    match &saved.request {
        Some(p) => tracing::debug!(stage, path = %p.display(), "request saved"),
        None => tracing::debug!(stage, "request not saved (flag off)"),
    }
    match &saved.response {
        Some(p) => tracing::debug!(stage, path = %p.display(), "response saved"),
        None => tracing::debug!(stage, "response not saved (flag off)"),
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::BombomError;
use crate::prompt::{build_prompt, PromptResult, PromptTemplate};
use crate::provider::ImageProvider;
use crate::selection::Selection;
use crate::store::Store;
use crate::translate::{translate_for_image_api, MatchMode, TranslationTable};
use crate::wire::{GeneratedImage, ImageRequest, OutputFormat};

/// A selection submitted for production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub selection: Selection,
    pub prompt: String,
    pub negative_prompt: String,
    pub translated_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub aspect_ratio: String,
    pub output_format: OutputFormat,
    pub match_mode: MatchMode,
    /// Fixed seed; drawn at random when `None`.
    pub seed: Option<u32>,
    pub debug: bool,
}

impl GenerationSettings {
    pub fn from_config(cfg: &Config, debug: bool) -> Self {
        Self {
            aspect_ratio: cfg.aspect_ratio.clone(),
            output_format: cfg.output_format,
            match_mode: cfg.match_mode,
            seed: cfg.seed,
            debug,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub id: Uuid,
    pub prompt: PromptResult,
    pub request: ImageRequest,
    pub image: GeneratedImage,
}

/// Validate and render. Nothing external is touched when this fails.
pub fn prepare(selection: &Selection, template: &PromptTemplate) -> Result<PromptResult, BombomError> {
    selection.ensure_complete()?;
    Ok(build_prompt(selection, template)?)
}

pub async fn generate(
    provider: &dyn ImageProvider,
    selection: &Selection,
    template: &PromptTemplate,
    table: &TranslationTable,
    settings: &GenerationSettings,
) -> Result<Generation, BombomError> {
    let prompt = prepare(selection, template)?;
    let request = ImageRequest {
        prompt: table.translate_with(&prompt.prompt, settings.match_mode),
        negative_prompt: table.translate_with(&prompt.negative_prompt, settings.match_mode),
        aspect_ratio: settings.aspect_ratio.clone(),
        output_format: settings.output_format,
        seed: settings.seed.unwrap_or_else(|| rand::rng().random_range(0..1_000_000)),
    };

    info!(provider = provider.name(), seed = request.seed, "generating image");
    let image = provider
        .generate(&request, settings.debug)
        .await
        .map_err(|e| BombomError::Provider(format!("{}: {e:#}", provider.name())))?;

    Ok(Generation { id: Uuid::new_v4(), prompt, request, image })
}

pub fn submit(
    store: &Store,
    selection: &Selection,
    template: &PromptTemplate,
    table: &TranslationTable,
    image_path: Option<String>,
) -> Result<Order> {
    let prompt = prepare(selection, template)?;
    let order = Order {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        selection: selection.clone(),
        translated_prompt: translate_for_image_api(&prompt.prompt, table),
        prompt: prompt.prompt,
        negative_prompt: prompt.negative_prompt,
        image_path,
    };
    store.append_order(&order)?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{normalize, RawSelection};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProvider {
        calls: Mutex<Vec<ImageRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl ImageProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn generate(&self, req: &ImageRequest, _debug: bool) -> anyhow::Result<GeneratedImage> {
            self.calls.lock().unwrap().push(req.clone());
            if self.fail {
                anyhow::bail!("quota exceeded");
            }
            Ok(GeneratedImage { base64: "QUJD".into(), mime: "image/png".into(), seed: Some(req.seed) })
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            aspect_ratio: "1:1".into(),
            output_format: OutputFormat::Png,
            match_mode: MatchMode::Literal,
            seed: Some(1234),
            debug: false,
        }
    }

    fn complete() -> Selection {
        let raw: RawSelection = serde_json::from_str(
            r#"{"chocolateType":"milk","base":"nuts","ganache":"caramel","jelly":"none","shellColor":"red"}"#,
        )
        .unwrap();
        normalize(raw).unwrap()
    }

    #[tokio::test]
    async fn sends_translated_prompt() {
        let provider = FakeProvider::default();
        let table = TranslationTable::builtin();
        let gen = generate(&provider, &complete(), &PromptTemplate::default(), &table, &settings())
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].seed, 1234);
        assert!(calls[0].prompt.contains("Milk Chocolate painted in Red."));
        assert!(calls[0].prompt.contains("Crushed Nuts: Up to 10% height. Caramel Ganache: From base to 90% height."));
        assert!(calls[0].prompt.contains("shell painted Red."));
        assert!(gen.prompt.prompt.contains("Chocolate ao Leite"));
        assert_eq!(gen.image.seed, Some(1234));
    }

    #[tokio::test]
    async fn configured_seed_is_sent() {
        let provider = FakeProvider::default();
        let cfg = Config { seed: Some(77), ..Config::default() };
        let settings = GenerationSettings::from_config(&cfg, false);
        generate(&provider, &complete(), &PromptTemplate::default(), &TranslationTable::builtin(), &settings)
            .await
            .unwrap();
        assert_eq!(provider.calls.lock().unwrap()[0].seed, 77);
    }

    #[tokio::test]
    async fn incomplete_selection_never_reaches_provider() {
        let provider = FakeProvider::default();
        let mut sel = complete();
        sel.shell_color = None;
        let err = generate(&provider, &sel, &PromptTemplate::default(), &TranslationTable::builtin(), &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, BombomError::IncompleteSelection { .. }));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_template_never_reaches_provider() {
        let provider = FakeProvider::default();
        let template = PromptTemplate { base_prompt: "{oops".into(), negative_prompt: String::new() };
        let err = generate(&provider, &complete(), &template, &TranslationTable::new(), &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, BombomError::Template(_)));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_wrapped() {
        let provider = FakeProvider { fail: true, ..Default::default() };
        let err = generate(&provider, &complete(), &PromptTemplate::default(), &TranslationTable::builtin(), &settings())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "image provider error: fake: quota exceeded");
    }

    #[test]
    fn submit_records_complete_selection_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let table = TranslationTable::builtin();

        let order = submit(&store, &complete(), &PromptTemplate::default(), &table, None).unwrap();
        assert!(order.translated_prompt.starts_with("Photorealistic artisanal bonbon Milk Chocolate"));
        assert_eq!(store.orders().unwrap(), vec![order]);

        let err = submit(&store, &Selection::default(), &PromptTemplate::default(), &table, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<BombomError>(), Some(BombomError::IncompleteSelection { .. })));
        assert_eq!(store.orders().unwrap().len(), 1);
    }
}

use anyhow::{bail, Context, Result};
use clap::Parser;
use fs_err as fs;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod config;
mod errors;
mod log;
mod order;
mod prompt;
mod provider;
mod selection;
mod store;
mod translate;
mod ux;
mod wire;

use cli::{Command, SelectionArgs, TemplateAction};
use config::Config;
use prompt::PromptTemplate;
use selection::{RawAttribute, RawSelection, Selection};
use store::Store;
use translate::TranslationTable;

fn init_tracing(debug: bool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_selection(args: &SelectionArgs) -> Result<Selection> {
    let raw = match &args.selection {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str::<RawSelection>(&text)
                .with_context(|| format!("invalid selection file {}", path.display()))?
        }
        None => {
            let id = |v: &Option<String>| v.clone().map(RawAttribute::Id);
            RawSelection {
                chocolate_type: id(&args.chocolate),
                base: id(&args.base),
                ganache: id(&args.ganache),
                jelly: id(&args.jelly),
                shell_color: id(&args.color),
            }
        }
    };
    Ok(selection::normalize(raw)?)
}

fn load_table(cfg: &Config) -> Result<TranslationTable> {
    let table = match &cfg.translation_table {
        Some(path) => TranslationTable::load(path)?,
        None => TranslationTable::builtin(),
    };
    if table.is_empty() {
        tracing::warn!("translation table is empty; prompts reach the image API untranslated");
    }
    tracing::debug!(rules = table.len(), "translation table loaded");
    Ok(table)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing(args.debug)?;

    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(root) = &args.root {
        cfg.root = root.clone();
    }

    match args.command {
        Command::Options => ux::show_options(),

        Command::Preview { selection, translate } => {
            let sel = load_selection(&selection)?;
            let store = Store::open(cfg.store_path())?;
            let template = store.require_template()?.template;
            // Incomplete selections still preview; placeholders just render empty.
            let result = prompt::build_prompt(&sel, &template)?;
            let english = if translate {
                let table = load_table(&cfg)?;
                Some(table.translate_with(&result.prompt, cfg.match_mode))
            } else {
                None
            };
            ux::show_selection(&sel);
            ux::show_prompt(&result, english.as_deref());
        }

        Command::Translate { text, match_mode } => {
            let table = load_table(&cfg)?;
            let mode = match_mode.map(Into::into).unwrap_or(cfg.match_mode);
            for issue in table.lint() {
                tracing::warn!(?issue, "translation table ordering issue");
            }
            println!("{}", table.translate_with(&text, mode));
        }

        Command::Generate { selection, provider, out, data_url, yes } => {
            cfg.apply_provider_args(&provider);
            let sel = load_selection(&selection)?;
            let store = Store::open(cfg.store_path())?;
            let template = store.require_template()?.template;
            let table = load_table(&cfg)?;

            let preview = order::prepare(&sel, &template)?;
            ux::show_selection(&sel);
            ux::show_prompt(&preview, Some(table.translate_with(&preview.prompt, cfg.match_mode).as_str()));
            if !yes && !ux::confirm(&format!("Generate with {:?} ({})?", cfg.provider, cfg.model())) {
                println!("Aborted by user.");
                return Ok(());
            }

            let prov = provider::make_provider(cfg.provider.clone(), cfg.model(), cfg.timeout_secs, cfg.api_base.clone())?;
            let settings = order::GenerationSettings::from_config(&cfg, args.debug);
            let gen = order::generate(&*prov, &sel, &template, &table, &settings).await?;
            let saved = log::save_generation(&gen, &cfg, out.as_deref())?;
            info!(id = %gen.id, image = %saved.image.display(), "image generated");
            ux::show_generation(&gen, &saved);
            if data_url {
                println!("{}", gen.image.data_url());
            }
        }

        Command::Submit { selection, image, yes } => {
            let sel = load_selection(&selection)?;
            let store = Store::open(cfg.store_path())?;
            let template = store.require_template()?.template;
            let table = load_table(&cfg)?;

            let preview = order::prepare(&sel, &template)?;
            ux::show_selection(&sel);
            ux::show_prompt(&preview, None);
            if let Some(p) = &image {
                if !p.exists() {
                    bail!("image {} does not exist", p.display());
                }
            }
            if !yes && !ux::confirm("Submit this bonbon for production?") {
                println!("Aborted by user.");
                return Ok(());
            }
            let image_path = image.map(|p| p.display().to_string());
            let order = order::submit(&store, &sel, &template, &table, image_path)?;
            ux::show_order(&order);
        }

        Command::Template { action } => {
            let store = Store::open(cfg.store_path())?;
            match action {
                TemplateAction::Show => ux::show_template(&store.require_template()?),
                TemplateAction::Init => {
                    let record = store.insert_template(PromptTemplate::default())?;
                    ux::show_template(&record);
                }
                TemplateAction::Set { base_prompt, negative_prompt } => {
                    if base_prompt.is_none() && negative_prompt.is_none() {
                        bail!("nothing to set: pass --base-prompt and/or --negative-prompt");
                    }
                    let record = match store.latest_template()? {
                        Some(current) => {
                            let template = PromptTemplate {
                                base_prompt: base_prompt.unwrap_or(current.template.base_prompt),
                                negative_prompt: negative_prompt.unwrap_or(current.template.negative_prompt),
                            };
                            // Reject a broken template before it replaces a working one.
                            prompt::template::parse(&template.base_prompt)?;
                            store.update_template(current.id, template)?
                        }
                        None => {
                            let defaults = PromptTemplate::default();
                            let template = PromptTemplate {
                                base_prompt: base_prompt.unwrap_or(defaults.base_prompt),
                                negative_prompt: negative_prompt.unwrap_or(defaults.negative_prompt),
                            };
                            prompt::template::parse(&template.base_prompt)?;
                            store.insert_template(template)?
                        }
                    };
                    ux::show_template(&record);
                }
            }
        }

        Command::Orders => {
            let store = Store::open(cfg.store_path())?;
            ux::show_orders(&store.orders()?);
        }
    }

    Ok(())
}

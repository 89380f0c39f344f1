use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::translate::MatchMode;
use crate::wire::OutputFormat;

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google", alias = "gemini")]
    Imagen,
    #[value(alias = "sd3")]
    Stability,
    /// A deployed HTTP function speaking `{prompt}` -> `{imageBase64}`.
    Relay,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchModeArg {
    Literal,
    WordBoundary,
}

impl From<MatchModeArg> for MatchMode {
    fn from(m: MatchModeArg) -> Self {
        match m {
            MatchModeArg::Literal => MatchMode::Literal,
            MatchModeArg::WordBoundary => MatchMode::WordBoundary,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bombom_gen", version, about = "Bonbon configurator: prompt preview, image generation and production orders")]
pub struct Args {
    /// TOML config file; flags below override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub root: Option<String>,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the catalog options for every slot.
    Options,
    /// Render the prompt pair for a selection without calling any API.
    Preview {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Also show the English text that would reach the image API.
        #[arg(long, default_value_t = false)]
        translate: bool,
    },
    /// Apply the translation table to arbitrary text.
    Translate {
        text: String,
        #[arg(long, value_enum)]
        match_mode: Option<MatchModeArg>,
    },
    /// Build, translate and send a prompt to the image provider.
    Generate {
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        provider: ProviderArgs,
        /// Where to write the decoded image (defaults to the transaction directory).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the image as a `data:` URL on stdout.
        #[arg(long, default_value_t = false)]
        data_url: bool,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Validate a selection and record it as a production order.
    Submit {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Image produced earlier by `generate`, stored alongside the order.
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Inspect or edit the stored prompt template.
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// List submitted orders.
    Orders,
}

#[derive(Subcommand, Debug)]
pub enum TemplateAction {
    Show,
    /// Store the built-in template as the newest record.
    Init,
    /// Update the newest record in place (or insert one when none exists).
    Set {
        #[arg(long)]
        base_prompt: Option<String>,
        #[arg(long)]
        negative_prompt: Option<String>,
    },
}

#[derive(ClapArgs, Debug, Default)]
pub struct SelectionArgs {
    /// JSON file with the selection (ids or {id,label} objects).
    #[arg(long, conflicts_with_all = ["chocolate", "base", "ganache", "jelly", "color"])]
    pub selection: Option<PathBuf>,
    #[arg(long)]
    pub chocolate: Option<String>,
    #[arg(long)]
    pub base: Option<String>,
    #[arg(long)]
    pub ganache: Option<String>,
    #[arg(long)]
    pub jelly: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct ProviderArgs {
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub api_base: Option<String>,
    #[arg(long)]
    pub aspect_ratio: Option<String>,
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Fixed seed for a reproducible image.
    #[arg(long)]
    pub seed: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_ids() {
        let args = Args::parse_from([
            "bombom_gen", "--debug", "generate", "--chocolate", "milk", "--color", "red", "--provider", "sd3", "--seed", "42", "--yes",
        ]);
        assert!(args.debug);
        match args.command {
            Command::Generate { selection, provider, yes, .. } => {
                assert_eq!(selection.chocolate.as_deref(), Some("milk"));
                assert_eq!(provider.provider, Some(ProviderKind::Stability));
                assert_eq!(provider.seed, Some(42));
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn selection_file_excludes_id_flags() {
        let res = Args::try_parse_from(["bombom_gen", "preview", "--selection", "s.json", "--base", "nuts"]);
        assert!(res.is_err());
    }
}

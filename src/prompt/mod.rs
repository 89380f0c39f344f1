use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::selection::{Selection, Slot, NO_BASE_LABEL};

pub mod template;

use template::{Segment, TemplateError};

/// Rendering directives shared by every selection.
pub const STYLE_DIRECTIVES: &str = "Photorealistic rendering. The bonbon is cut in half, \
showing the interior filling in the same chocolate as the shell. \
Color is applied to the outer shell only.";

/// Connective words removed, in any case, when the optional jelly clause renders empty.
const JELLY_CONNECTIVES: [&str; 2] = ["and", "e"];

fn default_base_prompt() -> &'static str {
r#"Foto realista, bombom artesanal {tipoChocolate} pintado de {pintura}. O bombom está cortado ao meio, mostrando a seção interna que está dividida da seguinte forma, de baixo para cima: {camadas} {casquinha} {estilo} Cenário neutro, iluminação de estúdio, aspecto profissional (produto). Sem letras, sem logos, sem objetos extras."#
}

fn default_negative_prompt() -> &'static str {
    "blurry, low quality, distorted proportions, melted chocolate, cartoon, illustration, \
text, watermark, logo, hands, packaging, multiple bonbons"
}

/// Editable prompt configuration. Field names follow the `prompt_configs` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(alias = "basePrompt")]
    pub base_prompt: String,
    #[serde(alias = "negativePrompt")]
    pub negative_prompt: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            base_prompt: default_base_prompt().to_string(),
            negative_prompt: default_negative_prompt().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResult {
    pub prompt: String,
    pub negative_prompt: String,
}

/// Placeholder names understood by the builder, English first then the
/// Portuguese aliases used by older templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Attribute(Slot),
    Structure,
    Layers,
    Shell,
    Style,
    Description,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        let p = match name {
            "chocolateType" | "tipoChocolate" => Placeholder::Attribute(Slot::ChocolateType),
            "base" => Placeholder::Attribute(Slot::Base),
            "ganache" => Placeholder::Attribute(Slot::Ganache),
            "jelly" | "geleia" => Placeholder::Attribute(Slot::Jelly),
            "shellColor" | "corCasquinha" | "painting" | "pintura" => Placeholder::Attribute(Slot::ShellColor),
            "structure" | "estrutura" => Placeholder::Structure,
            "layers" | "camadas" => Placeholder::Layers,
            "shell" | "casquinha" => Placeholder::Shell,
            "style" | "estilo" => Placeholder::Style,
            "description" | "descricao" => Placeholder::Description,
            _ => return None,
        };
        Some(p)
    }
}

/// Sentence fragments rendered from a selection before template substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragments {
    pub structure: String,
    pub layers: String,
    pub shell: String,
    pub style: &'static str,
}

impl Fragments {
    pub fn description(&self) -> String {
        [self.structure.as_str(), self.shell.as_str(), self.style]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// "a bonbon of {chocolate} with {base}, filled with {ganache}[ and {jelly}]."
/// Each absent attribute drops its own clause.
pub fn structure_sentence(selection: &Selection) -> String {
    let chocolate = selection.label(Slot::ChocolateType);
    let base = selection.label(Slot::Base);
    let ganache = selection.label(Slot::Ganache);
    let jelly = selection.label(Slot::Jelly);

    if chocolate.is_none() && base.is_none() && ganache.is_none() && jelly.is_none() {
        return String::new();
    }

    let mut s = String::from("a bonbon");
    if let Some(c) = chocolate {
        s.push_str(&format!(" of {c}"));
    }
    if let Some(b) = base {
        s.push_str(&format!(" with {b}"));
    }
    match (ganache, jelly) {
        (Some(g), Some(j)) => s.push_str(&format!(", filled with {g} and {j}")),
        (Some(g), None) => s.push_str(&format!(", filled with {g}")),
        (None, Some(j)) => s.push_str(&format!(", filled with {j}")),
        (None, None) => {}
    }
    s.push('.');
    s
}

/// Bottom-to-top cross-section: base up to 10%, ganache up to 90% (80% when a
/// jelly takes the top 20%). Phrased to match the built-in translation table.
pub fn layers(selection: &Selection) -> String {
    let jelly = selection.label(Slot::Jelly);
    let mut parts = Vec::new();
    if let Some(base) = selection.label(Slot::Base).filter(|b| *b != NO_BASE_LABEL) {
        parts.push(format!("{base}: Até 10% de altura."));
    }
    if let Some(ganache) = selection.label(Slot::Ganache) {
        let top = if jelly.is_some() { 80 } else { 90 };
        parts.push(format!("{ganache}: Da base até {top}% de altura."));
    }
    if let Some(jelly) = jelly {
        parts.push(format!("{jelly}: Ocupa os 20% restantes do topo."));
    }
    parts.join(" ")
}

pub fn shell_clause(selection: &Selection) -> String {
    selection
        .label(Slot::ShellColor)
        .map(|color| format!("shell painted {color}."))
        .unwrap_or_default()
}

pub fn fragments(selection: &Selection) -> Fragments {
    Fragments {
        structure: structure_sentence(selection),
        layers: layers(selection),
        shell: shell_clause(selection),
        style: STYLE_DIRECTIVES,
    }
}

/// Drop a connective left hanging before an empty jelly: `X and `, `X, and `,
/// `X And\n`. One separator before the word goes with it, or the whole run
/// back to a list comma. Text without a trailing connective is left as is.
fn trim_dangling_connective(out: &mut String) {
    let body = out.trim_end();
    let Some(word) = JELLY_CONNECTIVES.into_iter().find(|w| {
        body.len() >= w.len() && body.as_bytes()[body.len() - w.len()..].eq_ignore_ascii_case(w.as_bytes())
    }) else {
        return;
    };
    let rest = &body[..body.len() - word.len()];
    let Some(sep) = rest.chars().next_back().filter(|c| c.is_whitespace() || *c == ',') else {
        return;
    };
    let before_comma = rest.trim_end();
    let keep = if let Some(stripped) = before_comma.strip_suffix(',') {
        stripped.len()
    } else {
        rest.len() - sep.len_utf8()
    };
    out.truncate(keep);
}

/// Render `template` for `selection`. Pure: identical inputs give identical output.
///
/// Placeholders without a matching attribute render empty; only a malformed
/// base prompt is an error.
pub fn build_prompt(selection: &Selection, template: &PromptTemplate) -> Result<PromptResult, TemplateError> {
    let segments = template::parse(&template.base_prompt)?;
    let frags = fragments(selection);
    let mut out = String::with_capacity(template.base_prompt.len() + 128);

    for seg in segments {
        match seg {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => match Placeholder::from_name(name) {
                Some(Placeholder::Attribute(slot)) => match selection.label(slot) {
                    Some(label) => out.push_str(label),
                    None if slot == Slot::Jelly => trim_dangling_connective(&mut out),
                    None => {}
                },
                Some(Placeholder::Structure) => out.push_str(&frags.structure),
                Some(Placeholder::Layers) => out.push_str(&frags.layers),
                Some(Placeholder::Shell) => out.push_str(&frags.shell),
                Some(Placeholder::Style) => out.push_str(frags.style),
                Some(Placeholder::Description) => out.push_str(&frags.description()),
                None => warn!(placeholder = name, "unknown placeholder rendered empty"),
            },
        }
    }

    Ok(PromptResult {
        prompt: out,
        negative_prompt: template.negative_prompt.clone(),
    })
}

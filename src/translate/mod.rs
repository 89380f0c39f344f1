use std::path::Path;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::BombomError;

/// Portuguese terms and fixed template phrases, rendered in English before a
/// prompt reaches the image API. Longer terms come before any shorter term
/// they contain.
const PT_EN: &[(&str, &str)] = &[
    ("Chocolate ao Leite", "Milk Chocolate"),
    ("Chocolate Meio Amargo", "Semi Sweet Chocolate"),
    ("Chocolate Branco", "White Chocolate"),
    ("Chocolate 70% Cacau", "70% Cocoa Chocolate"),
    ("Biscoito Triturado", "Crushed Cookies"),
    ("Castanha Triturada", "Crushed Nuts"),
    ("Coco Ralado", "Shredded Coconut"),
    ("Sem Base", "No Base"),
    ("Ganache de Chocolate", "Chocolate Ganache"),
    ("Ganache de Caramelo", "Caramel Ganache"),
    ("Ganache de Frutas Vermelhas", "Red Berries Ganache"),
    ("Ganache de Maracujá", "Passion Fruit Ganache"),
    ("Ganache de Café", "Coffee Ganache"),
    ("Geleia de Morango", "Strawberry Jam"),
    ("Geleia de Framboesa", "Raspberry Jam"),
    ("Geleia de Maracujá", "Passion Fruit Jam"),
    ("Geleia de Damasco", "Apricot Jam"),
    ("Sem Geleia", "No Jam"),
    ("Rosa", "Pink"),
    ("Azul", "Blue"),
    ("Verde", "Green"),
    ("Amarelo", "Yellow"),
    ("Roxo", "Purple"),
    ("Laranja", "Orange"),
    ("Vermelho", "Red"),
    ("Branco", "White"),
    ("Foto realista, bombom artesanal", "Photorealistic artisanal bonbon"),
    ("pintado de", "painted in"),
    (
        "O bombom está cortado ao meio, mostrando a seção interna",
        "The bonbon is cut in half, showing the internal cross-section",
    ),
    (
        "que está dividida da seguinte forma, de baixo para cima",
        "which is divided as follows, from bottom to top",
    ),
    ("Até 10% de altura", "Up to 10% height"),
    ("Da base até 80% de altura", "From base to 80% height"),
    ("Da base até 90% de altura", "From base to 90% height"),
    ("Ocupa os 20% restantes do topo", "Occupies the remaining 20% at the top"),
    (
        "Cenário neutro, iluminação de estúdio, aspecto profissional (produto)",
        "Neutral background, studio lighting, professional product photography",
    ),
    ("Sem letras, sem logos, sem objetos extras", "No text, no logos, no extra objects"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring replacement, every occurrence.
    #[default]
    Literal,
    /// Only occurrences not glued to a letter or digit on either side.
    WordBoundary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    /// `later` contains `earlier`'s source, so it never sees its full term.
    Shadowed { earlier: usize, later: usize },
    /// `rule`'s target contains `later`'s source and will be rewritten again.
    Rematch { rule: usize, later: usize },
}

/// Ordered literal replacements. Declaration order is application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    rules: Vec<Rule>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::from_pairs(PT_EN.iter().copied())
    }

    pub fn from_pairs<S, T>(pairs: impl IntoIterator<Item = (S, T)>) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        let mut table = Self::new();
        for (s, t) in pairs {
            table.push(s, t);
        }
        table
    }

    /// Append a rule. An empty source would match between every character and is skipped.
    pub fn push(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        let source = source.into();
        if source.is_empty() {
            warn!("skipping translation rule with empty source term");
            return self;
        }
        self.rules.push(Rule { source, target: target.into() });
        self
    }

    /// Load a JSON array of `[source, target]` pairs, keeping file order.
    pub fn load(path: &Path) -> Result<Self, BombomError> {
        let text = fs::read_to_string(path).map_err(|e| BombomError::TranslationUnavailable(e.to_string()))?;
        let pairs: Vec<(String, String)> = serde_json::from_str(&text)
            .map_err(|e| BombomError::TranslationUnavailable(format!("{}: {e}", path.display())))?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn lint(&self) -> Vec<TableIssue> {
        let mut issues = Vec::new();
        for (i, rule) in self.rules.iter().enumerate() {
            for (j, later) in self.rules.iter().enumerate().skip(i + 1) {
                if later.source.contains(&rule.source) {
                    issues.push(TableIssue::Shadowed { earlier: i, later: j });
                }
                if rule.target.contains(&later.source) {
                    issues.push(TableIssue::Rematch { rule: i, later: j });
                }
            }
        }
        issues
    }

    pub fn translate(&self, text: &str) -> String {
        self.translate_with(text, MatchMode::Literal)
    }

    pub fn translate_with(&self, text: &str, mode: MatchMode) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            if !out.contains(&rule.source) {
                continue;
            }
            out = match mode {
                MatchMode::Literal => out.replace(&rule.source, &rule.target),
                MatchMode::WordBoundary => replace_bounded(&out, &rule.source, &rule.target),
            };
        }
        out
    }
}

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_alphanumeric())
}

fn replace_bounded(text: &str, source: &str, target: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (at, _) in text.match_indices(source) {
        let end = at + source.len();
        let before = text[..at].chars().next_back();
        let after = text[end..].chars().next();
        let glued = (is_word_char(before) && is_word_char(source.chars().next()))
            || (is_word_char(after) && is_word_char(source.chars().next_back()));
        if glued {
            continue;
        }
        out.push_str(&text[last..at]);
        out.push_str(target);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Prompt text as forwarded to an English-only image API.
pub fn translate_for_image_api(prompt: &str, table: &TranslationTable) -> String {
    let english = table.translate(prompt);
    tracing::debug!(original = prompt, translated = %english, "translated prompt");
    english
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{build_prompt, PromptTemplate};
    use crate::selection::{normalize, RawSelection};

    #[test]
    fn replaces_single_term() {
        let table = TranslationTable::from_pairs([("Vermelho", "Red")]);
        assert_eq!(translate_for_image_api("bombom Vermelho", &table), "bombom Red");
    }

    #[test]
    fn replaces_every_occurrence() {
        let table = TranslationTable::from_pairs([("Azul", "Blue")]);
        assert_eq!(table.translate("Azul, Azul e Azul"), "Blue, Blue e Blue");
    }

    #[test]
    fn empty_table_is_noop() {
        let table = TranslationTable::new();
        assert!(table.is_empty());
        assert_eq!(table.translate("Chocolate ao Leite 70%!"), "Chocolate ao Leite 70%!");
    }

    #[test]
    fn empty_source_is_skipped() {
        let table = TranslationTable::from_pairs([("", "x"), ("Rosa", "Pink")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.translate("ab Rosa"), "ab Pink");
    }

    #[test]
    fn declaration_order_decides_overlaps() {
        let short_first = TranslationTable::from_pairs([("Vermelho", "Red"), ("Vermelho Escuro", "Dark Red")]);
        let long_first = TranslationTable::from_pairs([("Vermelho Escuro", "Dark Red"), ("Vermelho", "Red")]);
        assert_eq!(short_first.translate("Vermelho Escuro"), "Red Escuro");
        assert_eq!(long_first.translate("Vermelho Escuro"), "Dark Red");
        assert_eq!(short_first.lint(), vec![TableIssue::Shadowed { earlier: 0, later: 1 }]);
        assert!(long_first.lint().is_empty());
    }

    #[test]
    fn lint_flags_targets_rewritten_later() {
        let table = TranslationTable::from_pairs([("Rosa", "Roxo claro"), ("Roxo", "Purple")]);
        assert_eq!(table.lint(), vec![TableIssue::Rematch { rule: 0, later: 1 }]);
        assert_eq!(table.translate("Rosa"), "Purple claro");
    }

    #[test]
    fn builtin_table_is_well_ordered() {
        let table = TranslationTable::builtin();
        assert_eq!(table.len(), PT_EN.len());
        assert!(table.lint().is_empty(), "{:?}", table.lint());
    }

    #[test]
    fn builtin_table_leaves_no_source_terms() {
        let table = TranslationTable::builtin();
        let raw: RawSelection = serde_json::from_str(
            r#"{"chocolateType":"white","base":"coconut","ganache":"berries","jelly":"passion","shellColor":"white"}"#,
        )
        .unwrap();
        let sel = normalize(raw).unwrap();
        let prompt = build_prompt(&sel, &PromptTemplate::default()).unwrap().prompt;
        let english = translate_for_image_api(&prompt, &table);
        for rule in table.rules() {
            assert!(!english.contains(&rule.source), "'{}' left in: {english}", rule.source);
        }
        assert!(english.starts_with("Photorealistic artisanal bonbon White Chocolate painted in White."));
    }

    #[test]
    fn unknown_terms_pass_through() {
        let table = TranslationTable::builtin();
        assert_eq!(table.translate("Ruby 42, Dourado."), "Ruby 42, Dourado.");
    }

    #[test]
    fn literal_mode_matches_inside_words() {
        let table = TranslationTable::from_pairs([("Rosa", "Pink")]);
        assert_eq!(table.translate("Rosado"), "Pinkdo");
        assert_eq!(table.translate_with("Rosado", MatchMode::WordBoundary), "Rosado");
        assert_eq!(table.translate_with("Rosa, Rosado (Rosa)", MatchMode::WordBoundary), "Pink, Rosado (Pink)");
    }

    #[test]
    fn word_boundary_mode_handles_phrases_ending_in_punctuation() {
        let table = TranslationTable::from_pairs([("profissional (produto)", "product")]);
        assert_eq!(table.translate_with("aspecto profissional (produto).", MatchMode::WordBoundary), "aspecto product.");
    }

    #[test]
    fn load_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        fs::write(&path, r#"[["Vermelho Escuro","Dark Red"],["Vermelho","Red"]]"#).unwrap();
        let table = TranslationTable::load(&path).unwrap();
        assert_eq!(table.rules()[0].source, "Vermelho Escuro");

        let err = TranslationTable::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, BombomError::TranslationUnavailable(_)));
    }
}

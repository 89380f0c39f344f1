use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BombomError, MissingSlots};

pub mod catalog;

/// Label of the jelly option that means "no jelly at all".
pub const NO_JELLY_LABEL: &str = "Sem Geleia";
pub const NO_JELLY_ID: &str = "none";
/// Base option without a base layer.
pub const NO_BASE_LABEL: &str = "Sem Base";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    ChocolateType,
    Base,
    Ganache,
    Jelly,
    ShellColor,
}

impl Slot {
    pub const ALL: [Slot; 5] = [Slot::ChocolateType, Slot::Base, Slot::Ganache, Slot::Jelly, Slot::ShellColor];

    /// Jelly is the only slot a complete selection may leave empty.
    pub const REQUIRED: [Slot; 4] = [Slot::ChocolateType, Slot::Base, Slot::Ganache, Slot::ShellColor];

    pub fn key(&self) -> &'static str {
        match self {
            Slot::ChocolateType => "chocolateType",
            Slot::Base => "base",
            Slot::Ganache => "ganache",
            Slot::Jelly => "jelly",
            Slot::ShellColor => "shellColor",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Slot::ChocolateType => "Tipo de Chocolate",
            Slot::Base => "Base do Bombom",
            Slot::Ganache => "Ganache",
            Slot::Jelly => "Geleia",
            Slot::ShellColor => "Cor da Casquinha",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub label: String,
}

impl Attribute {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellColor {
    pub id: String,
    pub label: String,
    /// Display swatch only; never rendered into prompt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Canonical product selection. Every slot is either fully present or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chocolate_type: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ganache: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jelly: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_color: Option<ShellColor>,
}

impl Selection {
    pub fn label(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::ChocolateType => self.chocolate_type.as_ref().map(|a| a.label.as_str()),
            Slot::Base => self.base.as_ref().map(|a| a.label.as_str()),
            Slot::Ganache => self.ganache.as_ref().map(|a| a.label.as_str()),
            Slot::Jelly => self.effective_jelly().map(|a| a.label.as_str()),
            Slot::ShellColor => self.shell_color.as_ref().map(|c| c.label.as_str()),
        }
    }

    /// The jelly as it should appear in text: `None` when absent or the "no jelly" sentinel.
    pub fn effective_jelly(&self) -> Option<&Attribute> {
        self.jelly.as_ref().filter(|j| j.label.trim() != NO_JELLY_LABEL)
    }

    pub fn missing(&self) -> Vec<Slot> {
        Slot::REQUIRED
            .into_iter()
            .filter(|slot| self.label(*slot).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Local validation run before any generation or production request.
    pub fn ensure_complete(&self) -> Result<(), BombomError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BombomError::IncompleteSelection { missing: MissingSlots(missing) })
        }
    }
}

/// A slot value as sent by a form or typed on the command line: either a
/// catalog id or a fully labelled option.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawAttribute {
    Id(String),
    Full {
        id: String,
        label: String,
        #[serde(default)]
        color: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSelection {
    #[serde(default, alias = "tipoChocolate")]
    pub chocolate_type: Option<RawAttribute>,
    #[serde(default)]
    pub base: Option<RawAttribute>,
    #[serde(default)]
    pub ganache: Option<RawAttribute>,
    #[serde(default, alias = "geleia")]
    pub jelly: Option<RawAttribute>,
    #[serde(default, alias = "corCasquinha")]
    pub shell_color: Option<RawAttribute>,
}

impl RawSelection {
    fn take(&mut self, slot: Slot) -> Option<RawAttribute> {
        match slot {
            Slot::ChocolateType => self.chocolate_type.take(),
            Slot::Base => self.base.take(),
            Slot::Ganache => self.ganache.take(),
            Slot::Jelly => self.jelly.take(),
            Slot::ShellColor => self.shell_color.take(),
        }
    }
}

struct Resolved {
    id: String,
    label: String,
    color: Option<String>,
}

fn resolve(slot: Slot, raw: RawAttribute) -> Result<Resolved, BombomError> {
    match raw {
        RawAttribute::Id(id) => {
            let id = id.trim();
            if id.is_empty() {
                return Err(BombomError::InvalidSelection(format!("{slot}: empty identifier")));
            }
            let option = catalog::lookup(slot, id).ok_or_else(|| {
                BombomError::InvalidSelection(format!("{slot}: unknown option '{id}'"))
            })?;
            Ok(Resolved {
                id: option.id.to_string(),
                label: option.label.to_string(),
                color: option.color.map(str::to_string),
            })
        }
        RawAttribute::Full { id, label, color } => {
            let (id, label) = (id.trim(), label.trim());
            if id.is_empty() {
                return Err(BombomError::InvalidSelection(format!("{slot}: empty identifier")));
            }
            if label.is_empty() {
                return Err(BombomError::InvalidSelection(format!("{slot}: empty label for '{id}'")));
            }
            let color = color
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .or_else(|| catalog::lookup(slot, id).and_then(|o| o.color.map(str::to_string)));
            Ok(Resolved { id: id.to_string(), label: label.to_string(), color })
        }
    }
}

/// Turn raw form input into a canonical [`Selection`].
pub fn normalize(mut raw: RawSelection) -> Result<Selection, BombomError> {
    let mut selection = Selection::default();
    for slot in Slot::ALL {
        let Some(value) = raw.take(slot) else { continue };
        let r = resolve(slot, value)?;
        match slot {
            Slot::ChocolateType => selection.chocolate_type = Some(Attribute::new(r.id, r.label)),
            Slot::Base => selection.base = Some(Attribute::new(r.id, r.label)),
            Slot::Ganache => selection.ganache = Some(Attribute::new(r.id, r.label)),
            Slot::Jelly => {
                if r.id != NO_JELLY_ID && r.label != NO_JELLY_LABEL {
                    selection.jelly = Some(Attribute::new(r.id, r.label));
                }
            }
            Slot::ShellColor => {
                selection.shell_color = Some(ShellColor { id: r.id, label: r.label, color: r.color })
            }
        }
    }
    tracing::debug!(complete = selection.is_complete(), "normalized selection");
    Ok(selection)
}

use std::fmt;

use thiserror::Error;

use crate::prompt::template::TemplateError;
use crate::selection::Slot;

#[derive(Error, Debug)]
pub enum BombomError {
    #[error("incomplete selection: missing {missing}")] IncompleteSelection { missing: MissingSlots },
    #[error("invalid selection: {0}")] InvalidSelection(String),
    #[error("no prompt template available: {0}")] TemplateUnavailable(String),
    #[error("malformed template: {0}")] Template(#[from] TemplateError),
    #[error("translation table unavailable: {0}")] TranslationUnavailable(String),
    #[error("image provider error: {0}")] Provider(String),
}

/// Required slots absent from a selection, in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSlots(pub Vec<Slot>);

impl fmt::Display for MissingSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.0.iter().map(|s| s.key()).collect();
        f.write_str(&keys.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_selection_lists_missing_keys() {
        let err = BombomError::IncompleteSelection {
            missing: MissingSlots(vec![Slot::Base, Slot::ShellColor]),
        };
        assert_eq!(err.to_string(), "incomplete selection: missing base, shellColor");
    }
}

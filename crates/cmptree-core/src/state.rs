//! Classification of compared entries.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Outcome of comparing one entry pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DiffState {
    /// Present only on the source side.
    New,
    /// Same key on both sides, attributes differ.
    Modify,
    /// Present only on the target side.
    Delete,
    /// Same key on both sides, attributes equal.
    #[strum(serialize = "SAMESAME")]
    SameSame,
}

impl DiffState {
    /// Everything but [`DiffState::SameSame`] counts as a difference.
    pub fn is_difference(&self) -> bool {
        !matches!(self, DiffState::SameSame)
    }

    /// Whether the source-side cursor advances after this classification.
    pub fn consumes_source(&self) -> bool {
        !matches!(self, DiffState::Delete)
    }

    /// Whether the target-side cursor advances after this classification.
    pub fn consumes_target(&self) -> bool {
        !matches!(self, DiffState::New)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DiffState::New.to_string(), "NEW");
        assert_eq!(DiffState::SameSame.to_string(), "SAMESAME");
    }

    #[test]
    fn test_cursor_rules() {
        assert!(DiffState::New.consumes_source());
        assert!(!DiffState::New.consumes_target());
        assert!(DiffState::Delete.consumes_target());
        assert!(!DiffState::Delete.consumes_source());
        assert!(DiffState::Modify.consumes_source() && DiffState::Modify.consumes_target());
    }
}

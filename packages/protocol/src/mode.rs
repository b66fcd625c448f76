use serde::{Deserialize, Serialize};
use std::fmt;

/// How the embedded document may be interacted with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Edit,
    View,
    Comment,
}

impl EditMode {
    /// Only `edit` lets the content surface accept local changes.
    pub fn is_editable(self) -> bool {
        matches!(self, EditMode::Edit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EditMode::Edit => "edit",
            EditMode::View => "view",
            EditMode::Comment => "comment",
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_edit() {
        assert_eq!(EditMode::default(), EditMode::Edit);
        assert!(EditMode::default().is_editable());
    }

    #[test]
    fn test_only_edit_is_editable() {
        assert!(!EditMode::View.is_editable());
        assert!(!EditMode::Comment.is_editable());
    }

    #[test]
    fn test_wire_names() {
        let mode: EditMode = serde_json::from_str("\"comment\"").unwrap();
        assert_eq!(mode, EditMode::Comment);
        assert_eq!(serde_json::to_string(&EditMode::View).unwrap(), "\"view\"");
        assert!(serde_json::from_str::<EditMode>("\"EDIT\"").is_err());
    }
}

//! # Session
//!
//! Which document, in which mode, for which user. Exactly one exists per
//! running editor, owned by the [`DocumentSessionController`].
//!
//! [`DocumentSessionController`]: crate::DocumentSessionController

use songframe_protocol::{DocumentId, EditMode, LaunchContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Current document, if the host or launch URL supplied one
    pub document_id: Option<DocumentId>,

    pub mode: EditMode,

    /// Set once a host-supplied token has been accepted
    pub authenticated: bool,
}

impl Session {
    /// Startup state: edit mode, unauthenticated
    pub fn new(document_id: Option<DocumentId>) -> Self {
        Self {
            document_id,
            mode: EditMode::Edit,
            authenticated: false,
        }
    }

    pub fn from_launch(launch: &LaunchContext) -> Self {
        Self::new(launch.document_id.clone())
    }

    pub fn is_editable(&self) -> bool {
        self.mode.is_editable()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

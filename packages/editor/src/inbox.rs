//! Messages delivered back to the controller
//!
//! Spawned gateway calls, timers and the content surface never touch
//! controller state directly; they post one of these and the owning event
//! loop hands it to [`DocumentSessionController::handle`].
//!
//! [`DocumentSessionController::handle`]: crate::DocumentSessionController::handle

use crate::debounce::FireToken;
use crate::document::DocumentRecord;
use crate::errors::EditorError;
use crate::gateway::AuthSession;
use crate::tree::DocumentTree;
use chrono::{DateTime, Utc};
use songframe_protocol::DocumentId;
use tokio::sync::mpsc;

pub(crate) type InboxSender = mpsc::UnboundedSender<Message>;
pub(crate) type InboxReceiver = mpsc::UnboundedReceiver<Message>;

/// Opaque wake-up for the controller
#[derive(Debug)]
pub struct ControllerMessage(pub(crate) Message);

#[derive(Debug)]
pub(crate) enum Message {
    /// Local change from the surface mounted for `generation`
    Surface {
        generation: u64,
        event: SurfaceEvent,
    },
    NeedAuth {
        generation: u64,
    },
    Loaded {
        generation: u64,
        result: Result<DocumentRecord, EditorError>,
    },
    Authenticated {
        result: Result<AuthSession, EditorError>,
    },
    SaveDue {
        document_id: DocumentId,
        token: FireToken,
    },
    SaveFinished {
        document_id: DocumentId,
        result: Result<DateTime<Utc>, EditorError>,
    },
    Renamed {
        document_id: DocumentId,
        result: Result<(), EditorError>,
    },
}

#[derive(Debug)]
pub(crate) enum SurfaceEvent {
    ContentChanged(DocumentTree),
    TitleEdited(String),
}

pub(crate) fn post(inbox: &InboxSender, message: Message) {
    if inbox.send(message).is_err() {
        tracing::debug!("[Inbox] controller gone, dropping message");
    }
}

//! # Document Session Controller
//!
//! Owns the [`Session`] and the open [`DocumentRecord`], and keeps the
//! content surface, the save scheduler and the host in step with them.
//!
//! ## Event loop
//!
//! ```text
//!  host commands ─┐                           ┌─► ContentSurface
//!                 ├─► controller (sync) ──────┼─► Outbox ──► host
//!  ControllerMessage ◄── spawned gateway calls │
//!        ▲          ◄── debounce timers        └─► SaveScheduler
//!        └───────── ◄── ChangeSink (surface edits)
//! ```
//!
//! Nothing here blocks. Gateway calls run on spawned tasks and report back
//! through the inbox; whoever drives the controller pulls messages with
//! [`recv`] and feeds them to [`handle`]. Results are matched against the
//! state captured when the call started and discarded if it has moved on:
//!
//! - loads carry the load generation; only the latest one commits
//! - change sinks carry the mount generation; a replaced editor is ignored
//! - debounce wake-ups carry a fire token; a re-armed slot ignores old ones
//!
//! [`recv`]: DocumentSessionController::recv
//! [`handle`]: DocumentSessionController::handle

use crate::document::{DocumentRecord, UNTITLED};
use crate::errors::EditorError;
use crate::gateway::PersistenceGateway;
use crate::inbox::{post, ControllerMessage, InboxReceiver, InboxSender, Message, SurfaceEvent};
use crate::outbox::Outbox;
use crate::scheduler::{SaveScheduler, DEFAULT_SAVE_DELAY};
use crate::session::Session;
use crate::surface::{ChangeSink, ContentSurface, MountRequest, Placeholder};
use crate::tree::DocumentTree;
use songframe_protocol::{DocumentId, EditMode, HostEvent, LaunchContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Quiet period before an edit is written
    pub save_delay: Duration,
    /// Title shown for documents without one
    pub untitled_title: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            save_delay: DEFAULT_SAVE_DELAY,
            untitled_title: UNTITLED.to_string(),
        }
    }
}

/// What the surface is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    MissingDocument,
    Loading,
    /// The last load failed
    Empty,
    Ready,
}

pub struct DocumentSessionController {
    config: ControllerConfig,
    gateway: Arc<dyn PersistenceGateway>,
    surface: Box<dyn ContentSurface>,
    outbox: Outbox,
    scheduler: SaveScheduler,

    session: Session,
    record: Option<DocumentRecord>,
    view: ViewState,

    load_generation: u64,
    mount_generation: u64,
    renames_in_flight: usize,

    inbox: InboxSender,
    messages: InboxReceiver,
}

impl DocumentSessionController {
    pub fn new(
        config: ControllerConfig,
        gateway: Arc<dyn PersistenceGateway>,
        surface: Box<dyn ContentSurface>,
        outbox: Outbox,
    ) -> Self {
        let (inbox, messages) = mpsc::unbounded_channel();
        let scheduler = SaveScheduler::new(
            gateway.clone(),
            config.save_delay,
            outbox.clone(),
            inbox.clone(),
        );

        Self {
            config,
            gateway,
            surface,
            outbox,
            scheduler,
            session: Session::default(),
            record: None,
            view: ViewState::MissingDocument,
            load_generation: 0,
            mount_generation: 0,
            renames_in_flight: 0,
            inbox,
            messages,
        }
    }

    /// Adopt the launch document, if any, and start loading it
    pub fn start(&mut self, launch: &LaunchContext) {
        self.session = Session::from_launch(launch);
        match self.session.document_id.clone() {
            Some(document_id) => self.begin_load(document_id),
            None => {
                tracing::info!("[Controller] no document in launch URL, waiting for OPEN_DOC");
                self.show(Placeholder::MissingDocument, ViewState::MissingDocument);
            }
        }
    }

    /// Switch documents
    ///
    /// Re-opening the current document does nothing unless its last load
    /// failed, in which case it is loaded again. `None` closes the current
    /// document. Edits still waiting for their quiet period are written
    /// immediately, under the document they were made in.
    pub fn open_document(&mut self, document_id: Option<DocumentId>) {
        if self.session.document_id == document_id {
            match (document_id, self.view) {
                (Some(document_id), ViewState::Empty) => {
                    tracing::info!("[Controller] retrying load of {}", document_id);
                    self.begin_load(document_id);
                }
                _ => tracing::debug!("[Controller] document unchanged, not reloading"),
            }
            return;
        }

        if let Some(outgoing) = self.session.document_id.take() {
            if self.scheduler.flush(&outgoing) {
                tracing::info!("[Controller] flushed pending edit for {}", outgoing);
            }
        }
        self.session.document_id = document_id.clone();

        match document_id {
            Some(document_id) => self.begin_load(document_id),
            None => {
                // Invalidate whatever load is still running
                self.load_generation += 1;
                self.record = None;
                self.show(Placeholder::MissingDocument, ViewState::MissingDocument);
            }
        }
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.session.mode != mode {
            tracing::info!("[Controller] mode {} -> {}", self.session.mode, mode);
        }
        self.session.mode = mode;
        self.surface.set_editable(mode.is_editable());
        self.check_editability();
    }

    /// Establish a session from a host token; reports AUTH_OK or ERROR
    pub fn authenticate(&mut self, token: String) {
        let gateway = self.gateway.clone();
        let inbox = self.inbox.clone();

        tokio::spawn(async move {
            let result = gateway.set_session(&token).await.map_err(EditorError::auth);
            post(&inbox, Message::Authenticated { result });
        });
    }

    /// Retitle the open document
    ///
    /// The new title is shown at once and never rolled back; a failed update
    /// is only reported. Ignored unless a document is open and editable.
    pub fn rename(&mut self, title: impl Into<String>) -> bool {
        let title = title.into();
        if !self.session.is_editable() {
            tracing::debug!("[Controller] rename ignored in {} mode", self.session.mode);
            return false;
        }
        let Some(record) = self.record.as_mut() else {
            tracing::debug!("[Controller] rename ignored, no document open");
            return false;
        };

        record.title = title.clone();
        let document_id = record.id.clone();
        self.surface.set_title(&title);
        self.renames_in_flight += 1;

        let gateway = self.gateway.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let result = gateway
                .update_title(&document_id, &title)
                .await
                .map_err(EditorError::rename);
            post(&inbox, Message::Renamed { document_id, result });
        });
        true
    }

    /// Append a labelled section; the surface reports it as a normal edit
    pub fn insert_section(&mut self, label: &str) -> bool {
        if self.view != ViewState::Ready || !self.session.is_editable() {
            tracing::debug!("[Controller] section insert ignored");
            return false;
        }
        self.surface.insert_section(label);
        true
    }

    /// Next completion, timer or surface notification to [`handle`](Self::handle)
    pub async fn recv(&mut self) -> Option<ControllerMessage> {
        self.messages.recv().await.map(ControllerMessage)
    }

    pub fn handle(&mut self, message: ControllerMessage) {
        match message.0 {
            Message::Surface { generation, event } => {
                if generation != self.mount_generation {
                    tracing::debug!("[Controller] change from a replaced editor ignored");
                    return;
                }
                match event {
                    SurfaceEvent::ContentChanged(tree) => self.content_changed(tree),
                    SurfaceEvent::TitleEdited(title) => {
                        self.rename(title);
                    }
                }
            }
            Message::NeedAuth { generation } => {
                if generation == self.load_generation {
                    tracing::info!("[Controller] no session, asking host for a token");
                    self.outbox.emit(HostEvent::NeedAuth);
                }
            }
            Message::Loaded { generation, result } => self.finish_load(generation, result),
            Message::Authenticated { result } => match result {
                Ok(session) => {
                    tracing::info!("[Controller] authenticated as {}", session.user_id);
                    let newly_authenticated = !self.session.authenticated;
                    self.session.authenticated = true;
                    self.outbox.emit(HostEvent::AuthOk);
                    self.reload_after_auth(newly_authenticated);
                }
                Err(e) => {
                    tracing::warn!("[Controller] token rejected: {}", e);
                    self.outbox.emit(HostEvent::error(e.to_string()));
                }
            },
            Message::SaveDue { document_id, token } => self.scheduler.fire(&document_id, token),
            Message::SaveFinished { document_id, result } => {
                let saved_at = self.scheduler.finish(&document_id, result);
                if let (Some(saved_at), Some(record)) = (saved_at, self.record.as_mut()) {
                    if record.id == document_id {
                        record.last_saved_at = Some(saved_at);
                    }
                }
            }
            Message::Renamed { document_id, result } => {
                self.renames_in_flight = self.renames_in_flight.saturating_sub(1);
                match result {
                    Ok(()) => tracing::info!("[Controller] renamed {}", document_id),
                    Err(e) => {
                        tracing::warn!("[Controller] rename of {} failed: {}", document_id, e);
                        self.outbox.emit(HostEvent::error(e.to_string()));
                    }
                }
            }
        }
    }

    /// Start every pending write now; returns how many were started
    pub fn flush_pending(&mut self) -> usize {
        self.scheduler.flush_all()
    }

    /// Whether any edit or title is not yet confirmed by the backend
    pub fn has_unsaved_work(&self) -> bool {
        self.scheduler.pending_count() > 0
            || self.scheduler.in_flight() > 0
            || self.renames_in_flight > 0
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn record(&self) -> Option<&DocumentRecord> {
        self.record.as_ref()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn scheduler(&self) -> &SaveScheduler {
        &self.scheduler
    }

    fn begin_load(&mut self, document_id: DocumentId) {
        self.load_generation += 1;
        let generation = self.load_generation;
        tracing::info!("[Controller] loading {}", document_id);

        self.record = None;
        self.show(Placeholder::Loading, ViewState::Loading);

        let gateway = self.gateway.clone();
        let inbox = self.inbox.clone();
        let untitled = self.config.untitled_title.clone();
        tokio::spawn(async move {
            match gateway.current_session().await {
                Ok(Some(_)) => {}
                Ok(None) => post(&inbox, Message::NeedAuth { generation }),
                Err(e) => {
                    tracing::warn!("[Controller] session lookup failed: {}", e);
                    post(&inbox, Message::NeedAuth { generation });
                }
            }

            let result = load(gateway.as_ref(), document_id, &untitled).await;
            post(&inbox, Message::Loaded { generation, result });
        });
    }

    /// A failed load may have been refused for want of a session; try again
    /// now that there is one. Loaded documents are left alone so edits on
    /// screen are never replaced.
    fn reload_after_auth(&mut self, newly_authenticated: bool) {
        if self.view != ViewState::Empty {
            return;
        }
        if let Some(document_id) = self.session.document_id.clone() {
            if newly_authenticated {
                tracing::info!("[Controller] session established, reloading {}", document_id);
            }
            self.begin_load(document_id);
        }
    }

    fn finish_load(&mut self, generation: u64, result: Result<DocumentRecord, EditorError>) {
        if generation != self.load_generation {
            tracing::debug!("[Controller] discarding superseded load");
            return;
        }

        match result {
            Ok(record) => {
                tracing::info!("[Controller] loaded {} ({})", record.id, record.title);
                self.mount_generation += 1;
                self.surface.mount(MountRequest {
                    title: record.title.clone(),
                    initial_content: record.content.clone(),
                    editable: self.session.is_editable(),
                    changes: ChangeSink::new(self.mount_generation, self.inbox.clone()),
                });
                self.view = ViewState::Ready;
                self.outbox.emit(HostEvent::DocLoaded {
                    title: record.title.clone(),
                    last_saved_at: record.last_saved_at,
                });
                self.record = Some(record);
                self.check_editability();
            }
            Err(e) => {
                tracing::error!("[Controller] load failed: {}", e);
                self.record = None;
                self.show(Placeholder::Unavailable, ViewState::Empty);
                self.outbox.emit(HostEvent::error(e.to_string()));
            }
        }
    }

    fn content_changed(&mut self, tree: DocumentTree) {
        if !self.session.is_editable() {
            tracing::debug!("[Controller] edit dropped in {} mode", self.session.mode);
            return;
        }
        let Some(record) = self.record.as_mut() else {
            return;
        };

        record.content = Some(tree.clone());
        self.scheduler.schedule(record.id.clone(), tree);
    }

    fn show(&mut self, placeholder: Placeholder, view: ViewState) {
        // Sinks of the editor being torn down go stale
        self.mount_generation += 1;
        self.surface.show_placeholder(placeholder);
        self.view = view;
    }

    fn check_editability(&self) {
        debug_assert!(
            self.view != ViewState::Ready || self.surface.is_editable() == self.session.is_editable(),
            "surface editability out of step with mode"
        );
    }
}

async fn load(
    gateway: &dyn PersistenceGateway,
    document_id: DocumentId,
    untitled: &str,
) -> Result<DocumentRecord, EditorError> {
    let metadata = gateway
        .document_metadata(&document_id)
        .await
        .map_err(EditorError::load)?;
    let stored = gateway
        .document_content(&document_id)
        .await
        .map_err(EditorError::load)?;

    Ok(DocumentRecord::assemble(document_id, metadata, stored, untitled))
}

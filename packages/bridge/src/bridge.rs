//! # Host Bridge
//!
//! Construct → run → dispose.
//!
//! ```text
//! BridgeHandle ──BridgeInput──► HostBridge::run ──► DocumentSessionController
//!      ▲                             │  ▲                  │
//!      └──────────HostEvent──────────┘  └─ControllerMessage┘
//! ```
//!
//! `run` emits READY once the inbound queue exists, then interleaves host
//! input with the controller's own wake-ups until shutdown. Disposal writes
//! every pending edit and waits for outstanding writes before returning.

use crate::config::BridgeConfig;
use serde_json::Value;
use songframe_editor::{
    ContentSurface, DocumentId, DocumentSessionController, HostEvent, LaunchContext, Outbox,
    PersistenceGateway,
};
use songframe_protocol::HostCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Everything the bridge can be told
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeInput {
    /// Raw message from the host page, validated by the bridge
    Host(Value),
    /// Local toolbar action
    InsertSection(String),
    Shutdown,
}

/// The host's side of a running bridge
pub struct BridgeHandle {
    inputs: mpsc::Sender<BridgeInput>,
    events: mpsc::UnboundedReceiver<HostEvent>,
}

impl BridgeHandle {
    /// Post a host message; false once the bridge has stopped
    pub async fn send(&self, message: Value) -> bool {
        self.input(BridgeInput::Host(message)).await
    }

    pub async fn insert_section(&self, label: &str) -> bool {
        self.input(BridgeInput::InsertSection(label.to_string())).await
    }

    pub async fn shutdown(&self) -> bool {
        self.input(BridgeInput::Shutdown).await
    }

    pub async fn next_event(&mut self) -> Option<HostEvent> {
        self.events.recv().await
    }

    pub fn try_event(&mut self) -> Option<HostEvent> {
        self.events.try_recv().ok()
    }

    /// Split for transports that read and write on separate tasks
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Sender<BridgeInput>,
        mpsc::UnboundedReceiver<HostEvent>,
    ) {
        (self.inputs, self.events)
    }

    async fn input(&self, input: BridgeInput) -> bool {
        self.inputs.send(input).await.is_ok()
    }
}

pub struct HostBridge {
    controller: DocumentSessionController,
    outbox: Outbox,
    inputs: mpsc::Receiver<BridgeInput>,
}

impl HostBridge {
    pub fn new(
        config: &BridgeConfig,
        gateway: Arc<dyn PersistenceGateway>,
        surface: Box<dyn ContentSurface>,
    ) -> (Self, BridgeHandle) {
        let (outbox, events) = Outbox::channel();
        let (inputs_tx, inputs) = mpsc::channel(config.channel_capacity.max(1));
        let controller =
            DocumentSessionController::new(config.controller_config(), gateway, surface, outbox.clone());

        (
            Self {
                controller,
                outbox,
                inputs,
            },
            BridgeHandle {
                inputs: inputs_tx,
                events,
            },
        )
    }

    /// Serve until shut down, then dispose
    pub async fn run(mut self, launch: &LaunchContext) {
        self.controller.start(launch);
        self.outbox.emit(HostEvent::Ready);
        tracing::info!("[HostBridge] ready");

        loop {
            tokio::select! {
                input = self.inputs.recv() => match input {
                    Some(BridgeInput::Host(message)) => self.dispatch(message),
                    Some(BridgeInput::InsertSection(label)) => {
                        self.controller.insert_section(&label);
                    }
                    Some(BridgeInput::Shutdown) | None => break,
                },
                Some(message) = self.controller.recv() => self.controller.handle(message),
            }
        }

        self.dispose().await;
    }

    fn dispatch(&mut self, message: Value) {
        let command = match HostCommand::from_message(&message) {
            Ok(command) => command,
            Err(rejection) => {
                tracing::debug!("[HostBridge] ignoring inbound message: {}", rejection);
                return;
            }
        };
        tracing::debug!("[HostBridge] {}", command.kind());

        match command {
            HostCommand::AuthToken { token } => self.controller.authenticate(token),
            HostCommand::OpenDoc { doc_id } => {
                self.controller.open_document(DocumentId::parse(&doc_id))
            }
            HostCommand::SetMode { mode } => self.controller.set_mode(mode),
        }
    }

    async fn dispose(mut self) {
        tracing::info!("[HostBridge] shutting down");
        loop {
            let flushed = self.controller.flush_pending();
            if flushed > 0 {
                tracing::info!("[HostBridge] flushed {} pending save(s)", flushed);
            }
            if !self.controller.has_unsaved_work() {
                break;
            }
            match self.controller.recv().await {
                Some(message) => self.controller.handle(message),
                None => break,
            }
        }
        tracing::info!("[HostBridge] disposed");
    }
}

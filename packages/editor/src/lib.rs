//! # Songframe Editor
//!
//! Session and sync core of the embeddable songwriting editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ protocol: host commands / host events       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DocumentSessionController           │
//! │  - Session (document, mode, auth)           │
//! │  - Load with last-request-wins              │
//! │  - Optimistic rename                        │
//! │  - SaveScheduler: debounced upserts         │
//! └─────────────────────────────────────────────┘
//!          ↓                         ↓
//! ┌────────────────────┐   ┌────────────────────┐
//! │ ContentSurface     │   │ PersistenceGateway │
//! └────────────────────┘   └────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One owner**: session and document record belong to the controller
//! 2. **Never block**: gateway calls run on tasks and report back as messages
//! 3. **Detect staleness, don't cancel**: results are checked against
//!    generations captured when the work started
//! 4. **Last write wins**: content is upserted whole, never merged
//!
//! ## Usage
//!
//! ```rust,ignore
//! use songframe_editor::{ControllerConfig, DocumentSessionController, HeadlessSurface, MemoryGateway, Outbox};
//!
//! let (outbox, mut events) = Outbox::channel();
//! let (surface, probe) = HeadlessSurface::new();
//! let gateway = Arc::new(MemoryGateway::new().with_document("doc1", "Song"));
//!
//! let mut controller = DocumentSessionController::new(ControllerConfig::default(), gateway, Box::new(surface), outbox);
//! controller.open_document(DocumentId::parse("doc1"));
//!
//! while let Some(message) = controller.recv().await {
//!     controller.handle(message);
//! }
//! ```

mod controller;
mod debounce;
mod document;
mod errors;
mod gateway;
mod headless;
mod inbox;
mod memory;
mod outbox;
mod scheduler;
mod session;
mod surface;

pub mod tree;

pub use controller::{ControllerConfig, DocumentSessionController, ViewState};
pub use debounce::{Armed, Debouncer, FireToken};
pub use document::{DocumentRecord, UNTITLED};
pub use errors::{EditorError, GatewayError};
pub use gateway::{AuthSession, ContentWrite, DocumentMetadata, PersistenceGateway, StoredContent};
pub use headless::{HeadlessSurface, SurfaceProbe};
pub use inbox::ControllerMessage;
pub use memory::{FixtureDocument, Fixtures, MemoryGateway, Operation};
pub use outbox::Outbox;
pub use scheduler::{PendingSave, SaveScheduler, DEFAULT_SAVE_DELAY};
pub use session::Session;
pub use surface::{ChangeSink, ContentSurface, MountRequest, Placeholder};
pub use tree::DocumentTree;

// Re-export protocol types for convenience
pub use songframe_protocol::{DocumentId, EditMode, HostEvent, LaunchContext};

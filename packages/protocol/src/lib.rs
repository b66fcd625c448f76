//! # Songframe Protocol
//!
//! Message contract between the embedded editor and the page hosting it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host page                                   │
//! └─────────────────────────────────────────────┘
//!        │ HostCommand            ▲ HostEvent
//!        ▼                        │
//! ┌─────────────────────────────────────────────┐
//! │ protocol: decode / validate / encode        │
//! │  - {type: string, ...} envelopes only       │
//! │  - unknown or malformed input is ignored    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session controller + save scheduler │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use songframe_protocol::{HostCommand, HostEvent};
//! use serde_json::json;
//!
//! let command = HostCommand::from_message(&json!({ "type": "OPEN_DOC", "docId": "doc1" }));
//! assert!(command.is_ok());
//!
//! let ignored = HostCommand::from_message(&json!("hello"));
//! assert!(ignored.is_err());
//!
//! let wire = serde_json::to_string(&HostEvent::Ready).unwrap();
//! assert_eq!(wire, r#"{"type":"READY"}"#);
//! ```

mod command;
mod event;
mod ids;
mod launch;
mod mode;

pub use command::{HostCommand, Rejection};
pub use event::{timestamp, HostEvent};
pub use ids::DocumentId;
pub use launch::{LaunchContext, LaunchError, DOC_ID_PARAM};
pub use mode::EditMode;

//! # Songframe Bridge
//!
//! Runs a document session controller behind the host message protocol.
//!
//! - [`HostBridge`]: event loop with an explicit construct → run → dispose
//!   lifecycle
//! - [`transport`]: one JSON message per line
//! - [`RestGateway`]: PostgREST/GoTrue persistence
//! - [`BridgeConfig`]: `songframe.config.json`

pub mod bridge;
pub mod config;
pub mod rest_gateway;
pub mod transport;

pub use bridge::{BridgeHandle, BridgeInput, HostBridge};
pub use config::{BackendConfig, BridgeConfig, ConfigError, DEFAULT_CONFIG_NAME};
pub use rest_gateway::{RestError, RestGateway};
pub use transport::{console_action, decode_line, encode_event, ConsoleAction};

//! Line-delimited JSON framing
//!
//! One message per line in both directions. Lines that are not JSON are
//! dropped the same way malformed host messages are: silently, with a debug
//! log.

use serde_json::Value;
use songframe_protocol::HostEvent;

/// Local editing actions typed at the console
///
/// Recognised only on objects without a `type`, so they never collide with
/// host commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    /// `{"edit": "text"}` appends a line to the open document
    Edit(String),
    /// `{"rename": "title"}` edits the title field
    Rename(String),
    /// `{"insertSection": "Chorus"}`
    InsertSection(String),
}

pub fn decode_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("[Transport] ignoring non-JSON line: {}", e);
            None
        }
    }
}

pub fn encode_event(event: &HostEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

pub fn console_action(message: &Value) -> Option<ConsoleAction> {
    let object = message.as_object()?;
    if object.contains_key("type") {
        return None;
    }

    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
    if let Some(text) = text("edit") {
        Some(ConsoleAction::Edit(text))
    } else if let Some(title) = text("rename") {
        Some(ConsoleAction::Rename(title))
    } else {
        text("insertSection").map(ConsoleAction::InsertSection)
    }
}

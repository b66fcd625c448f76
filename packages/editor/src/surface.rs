//! # Content Surface
//!
//! The rich-text widget itself lives outside this crate. The controller
//! drives it through [`ContentSurface`] and hears about local edits through
//! the [`ChangeSink`] handed over at mount time.

use crate::inbox::{post, InboxSender, Message, SurfaceEvent};
use crate::tree::DocumentTree;

/// Static views shown instead of the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// No document id from the launch URL or the host yet
    MissingDocument,
    Loading,
    /// The last load failed
    Unavailable,
}

/// Everything needed to construct the editing widget
#[derive(Debug, Clone)]
pub struct MountRequest {
    pub title: String,
    /// `None` lets the surface show its starter content
    pub initial_content: Option<DocumentTree>,
    pub editable: bool,
    pub changes: ChangeSink,
}

pub trait ContentSurface: Send {
    fn show_placeholder(&mut self, placeholder: Placeholder);

    /// Replace whatever is shown with a fresh editor
    fn mount(&mut self, request: MountRequest);

    fn set_editable(&mut self, editable: bool);

    fn is_editable(&self) -> bool;

    fn set_title(&mut self, title: &str);

    /// Editing convenience: append a labelled section and report the change
    fn insert_section(&mut self, label: &str);
}

/// The surface's `onChange`
///
/// Tied to the mount it was created for; notifications from an editor that
/// has since been replaced are discarded by the controller.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    generation: u64,
    inbox: InboxSender,
}

impl ChangeSink {
    pub(crate) fn new(generation: u64, inbox: InboxSender) -> Self {
        Self { generation, inbox }
    }

    /// The widget's content changed; `tree` is the whole current document
    pub fn content_changed(&self, tree: DocumentTree) {
        self.send(SurfaceEvent::ContentChanged(tree));
    }

    /// The title field changed
    pub fn title_edited(&self, title: impl Into<String>) {
        self.send(SurfaceEvent::TitleEdited(title.into()));
    }

    fn send(&self, event: SurfaceEvent) {
        post(
            &self.inbox,
            Message::Surface {
                generation: self.generation,
                event,
            },
        );
    }
}

//! # Headless Surface
//!
//! A [`ContentSurface`] with no rendering. It keeps the mounted tree in
//! memory and hands out a [`SurfaceProbe`] through which tests, or a console
//! front end, play the part of the person typing.

use crate::surface::{ChangeSink, ContentSurface, MountRequest, Placeholder};
use crate::tree::{self, DocumentTree};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct MountedEditor {
    title: String,
    content: DocumentTree,
    editable: bool,
    changes: ChangeSink,
}

#[derive(Debug, Default)]
struct SurfaceState {
    placeholder: Option<Placeholder>,
    editor: Option<MountedEditor>,
    mounts: usize,
}

type SharedState = Arc<Mutex<SurfaceState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, SurfaceState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: SharedState,
}

impl HeadlessSurface {
    pub fn new() -> (Self, SurfaceProbe) {
        let surface = Self::default();
        let probe = SurfaceProbe {
            state: surface.state.clone(),
        };
        (surface, probe)
    }
}

impl ContentSurface for HeadlessSurface {
    fn show_placeholder(&mut self, placeholder: Placeholder) {
        let mut state = lock(&self.state);
        state.editor = None;
        state.placeholder = Some(placeholder);
    }

    fn mount(&mut self, request: MountRequest) {
        let mut state = lock(&self.state);
        state.placeholder = None;
        state.mounts += 1;
        state.editor = Some(MountedEditor {
            title: request.title,
            content: request.initial_content.unwrap_or_else(tree::starter_document),
            editable: request.editable,
            changes: request.changes,
        });
    }

    fn set_editable(&mut self, editable: bool) {
        if let Some(editor) = lock(&self.state).editor.as_mut() {
            editor.editable = editable;
        }
    }

    fn is_editable(&self) -> bool {
        lock(&self.state)
            .editor
            .as_ref()
            .map(|editor| editor.editable)
            .unwrap_or(false)
    }

    fn set_title(&mut self, title: &str) {
        if let Some(editor) = lock(&self.state).editor.as_mut() {
            editor.title = title.to_string();
        }
    }

    fn insert_section(&mut self, label: &str) {
        let mut state = lock(&self.state);
        match state.editor.as_mut() {
            Some(editor) if editor.editable => {
                tree::insert_section(&mut editor.content, label);
                editor.changes.content_changed(editor.content.clone());
            }
            _ => tracing::debug!("[HeadlessSurface] insert ignored, editor is read-only"),
        }
    }
}

/// Observer and input device for a [`HeadlessSurface`]
#[derive(Debug, Clone)]
pub struct SurfaceProbe {
    state: SharedState,
}

impl SurfaceProbe {
    /// Type into the editor; refused while read-only
    pub fn edit<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut DocumentTree),
    {
        let mut state = lock(&self.state);
        match state.editor.as_mut() {
            Some(editor) if editor.editable => {
                change(&mut editor.content);
                editor.changes.content_changed(editor.content.clone());
                true
            }
            _ => false,
        }
    }

    /// Replace the whole tree as if the user had typed it
    pub fn replace_content(&self, content: DocumentTree) -> bool {
        self.edit(move |tree| *tree = content)
    }

    /// Edit the title field; refused while read-only
    pub fn edit_title(&self, title: &str) -> bool {
        let mut state = lock(&self.state);
        match state.editor.as_mut() {
            Some(editor) if editor.editable => {
                editor.title = title.to_string();
                editor.changes.title_edited(title);
                true
            }
            _ => false,
        }
    }

    /// The mounted editor's change sink
    ///
    /// Holding on to it across a remount simulates a widget that keeps
    /// firing after being torn down.
    pub fn sink(&self) -> Option<ChangeSink> {
        lock(&self.state).editor.as_ref().map(|editor| editor.changes.clone())
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        lock(&self.state).placeholder
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.state).editor.is_some()
    }

    pub fn is_editable(&self) -> bool {
        lock(&self.state)
            .editor
            .as_ref()
            .map(|editor| editor.editable)
            .unwrap_or(false)
    }

    pub fn title(&self) -> Option<String> {
        lock(&self.state).editor.as_ref().map(|editor| editor.title.clone())
    }

    pub fn content(&self) -> Option<DocumentTree> {
        lock(&self.state).editor.as_ref().map(|editor| editor.content.clone())
    }

    /// How many editors have been mounted so far
    pub fn mounts(&self) -> usize {
        lock(&self.state).mounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbox::{InboxReceiver, Message, SurfaceEvent};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn mount(surface: &mut HeadlessSurface, editable: bool) -> InboxReceiver {
        let (inbox, messages) = mpsc::unbounded_channel();
        surface.mount(MountRequest {
            title: "Song".to_string(),
            initial_content: None,
            editable,
            changes: ChangeSink::new(1, inbox),
        });
        messages
    }

    #[test]
    fn test_mount_without_content_shows_starter() {
        let (mut surface, probe) = HeadlessSurface::new();
        surface.show_placeholder(Placeholder::Loading);
        assert_eq!(probe.placeholder(), Some(Placeholder::Loading));

        let _messages = mount(&mut surface, true);
        assert_eq!(probe.placeholder(), None);
        assert_eq!(probe.content(), Some(tree::starter_document()));
        assert_eq!(probe.title().as_deref(), Some("Song"));
        assert_eq!(probe.mounts(), 1);
    }

    #[test]
    fn test_edits_reach_the_sink() {
        let (mut surface, probe) = HeadlessSurface::new();
        let mut messages = mount(&mut surface, true);

        assert!(probe.replace_content(json!({ "type": "doc", "content": [] })));
        match messages.try_recv().unwrap() {
            Message::Surface {
                generation: 1,
                event: SurfaceEvent::ContentChanged(tree),
            } => assert_eq!(tree, json!({ "type": "doc", "content": [] })),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_read_only_refuses_input() {
        let (mut surface, probe) = HeadlessSurface::new();
        let mut messages = mount(&mut surface, false);

        assert!(!probe.replace_content(json!({})));
        assert!(!probe.edit_title("New"));
        surface.insert_section("Chorus");
        assert!(messages.try_recv().is_err());

        surface.set_editable(true);
        assert!(surface.is_editable());
        surface.insert_section("Chorus");
        let headings = tree::headings(&probe.content().unwrap());
        assert_eq!(headings, vec!["Verse 1", "Chorus"]);
        assert!(messages.try_recv().is_ok());
    }

    #[test]
    fn test_placeholder_unmounts_editor() {
        let (mut surface, probe) = HeadlessSurface::new();
        let _messages = mount(&mut surface, true);
        surface.show_placeholder(Placeholder::Unavailable);

        assert!(!probe.is_mounted());
        assert!(!surface.is_editable());
        assert!(probe.sink().is_none());
    }
}

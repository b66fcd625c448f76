//! # Structured Document Trees
//!
//! Content travels as the editing widget's JSON tree:
//!
//! ```text
//! { "type": "doc", "content": [
//!     { "type": "heading", "attrs": { "level": 2 }, "content": [{ "type": "text", "text": "Verse 1" }] },
//!     { "type": "paragraph", "content": [{ "type": "text", "text": "" }] }
//! ] }
//! ```
//!
//! The editor never interprets the tree beyond these helpers; it is stored
//! and persisted as an opaque value.

use serde_json::{json, Value};

/// Hierarchical rich-text content exchanged with the content surface
pub type DocumentTree = Value;

const SECTION_HEADING_LEVEL: u8 = 2;

/// Tree shown for a document that has never been saved
pub fn starter_document() -> DocumentTree {
    let mut doc = empty_document();
    append(&mut doc, section("Verse 1"));
    doc
}

pub fn empty_document() -> DocumentTree {
    json!({ "type": "doc", "content": [] })
}

/// A labelled heading followed by an empty paragraph
pub fn section(label: &str) -> Vec<Value> {
    vec![
        json!({
            "type": "heading",
            "attrs": { "level": SECTION_HEADING_LEVEL },
            "content": [{ "type": "text", "text": label }]
        }),
        json!({ "type": "paragraph", "content": [{ "type": "text", "text": "" }] }),
    ]
}

/// Append a labelled section at the end of the document
pub fn insert_section(tree: &mut DocumentTree, label: &str) {
    append(tree, section(label));
}

/// Append a line of lyrics
pub fn push_paragraph(tree: &mut DocumentTree, text: &str) {
    append(
        tree,
        vec![json!({ "type": "paragraph", "content": [{ "type": "text", "text": text }] })],
    );
}

fn append(tree: &mut DocumentTree, nodes: Vec<Value>) {
    if !tree.get("content").map(Value::is_array).unwrap_or(false) {
        // Anything without a top-level content array is rebuilt as a doc
        *tree = empty_document();
    }
    if let Some(Value::Array(children)) = tree.get_mut("content") {
        children.extend(nodes);
    }
}

/// Text of every heading, in document order
pub fn headings(tree: &DocumentTree) -> Vec<String> {
    tree.get("content")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter(|node| node.get("type").and_then(Value::as_str) == Some("heading"))
                .map(text_of)
                .collect()
        })
        .unwrap_or_default()
}

fn text_of(node: &Value) -> String {
    match node.get("content").and_then(Value::as_array) {
        Some(children) => children
            .iter()
            .filter_map(|child| child.get("text").and_then(Value::as_str))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_document_shape() {
        let doc = starter_document();
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["content"].as_array().unwrap().len(), 2);
        assert_eq!(doc["content"][0]["attrs"]["level"], 2);
        assert_eq!(headings(&doc), vec!["Verse 1"]);
    }

    #[test]
    fn test_insert_section_appends() {
        let mut doc = starter_document();
        insert_section(&mut doc, "Chorus");
        insert_section(&mut doc, "Bridge");
        assert_eq!(headings(&doc), vec!["Verse 1", "Chorus", "Bridge"]);
        assert_eq!(doc["content"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_push_paragraph() {
        let mut doc = empty_document();
        push_paragraph(&mut doc, "down the road");
        assert_eq!(doc["content"][0]["content"][0]["text"], "down the road");
        assert!(headings(&doc).is_empty());
    }

    #[test]
    fn test_insert_into_malformed_tree() {
        let mut doc = json!("not a tree");
        insert_section(&mut doc, "Verse");
        assert_eq!(doc["type"], "doc");
        assert_eq!(headings(&doc), vec!["Verse"]);
    }
}

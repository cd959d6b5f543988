//! Markdown outline of a board.

use crate::board::BoardDocument;
use crate::frameworks::FrameworkSection;
use crate::nodes::{FrameworkNodeData, NodeData, NodeId};
use std::fmt::Write;

/// Render the board as a Markdown outline: frameworks with their filled
/// sections, sticky notes as plain text, images as placeholders, then the
/// connections by node title.
pub fn export_text(doc: &BoardDocument) -> String {
    let mut out = String::from("# Whiteboard analysis\n");

    if doc.nodes.is_empty() {
        out.push_str("\n_The board is empty._\n");
        return out;
    }

    for node in &doc.nodes {
        out.push('\n');
        match &node.data {
            NodeData::Framework(data) => write_framework(&mut out, data),
            NodeData::StickyNote(note) => {
                let _ = writeln!(out, "## Note: {}", node.title());
                let text = note.plain_text();
                if !text.is_empty() {
                    out.push('\n');
                    for line in text.lines() {
                        let _ = writeln!(out, "> {}", line);
                    }
                }
            }
            NodeData::Image(_) => {
                let _ = writeln!(out, "## Image: {}", node.title());
            }
        }
    }

    if !doc.edges.is_empty() {
        out.push_str("\n## Connections\n\n");
        for edge in &doc.edges {
            let title = |id: &NodeId| {
                doc.node(id)
                    .map(|n| n.title())
                    .unwrap_or_else(|| id.to_string())
            };
            let _ = writeln!(out, "- {} -> {}", title(&edge.source), title(&edge.target));
        }
    }

    out
}

fn write_framework(out: &mut String, data: &FrameworkNodeData) {
    let framework = &data.framework;
    let _ = writeln!(out, "## {}", framework.name);
    for section in &framework.sections {
        write_section(out, data, section, 3);
    }
}

fn write_section(out: &mut String, data: &FrameworkNodeData, section: &FrameworkSection, level: usize) {
    let _ = writeln!(out, "\n{} {}\n", "#".repeat(level.min(6)), section.name);
    let lines = data.lines(&section.id);
    if lines.is_empty() {
        out.push_str("_(empty)_\n");
    } else {
        for line in lines {
            let _ = writeln!(out, "- {}", line);
        }
    }
    for child in &section.children {
        write_section(out, data, child, level + 1);
    }
}

//! Event-driven owner of the live board.

use crate::board::{BoardDocument, BoardError, BoardResult};
use crate::camera::Camera;
use crate::edge::Connection;
use crate::hydrate::{self, CommandQueue};
use crate::nodes::{Node, NodeId, NodeSize, Position};

/// A single edit to the board.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    Delete(NodeId),
    UpdateContent {
        node: NodeId,
        section: String,
        lines: Vec<String>,
    },
    ChangeText {
        node: NodeId,
        html: String,
    },
    ChangeColor {
        node: NodeId,
        color: String,
    },
    Move {
        node: NodeId,
        position: Position,
    },
    Resize {
        node: NodeId,
        size: NodeSize,
    },
    Connect(Connection),
    RemoveEdge(String),
}

/// Holds the document, the viewport and a revision counter that every
/// mutation bumps.
#[derive(Debug, Default)]
pub struct BoardStore {
    document: BoardDocument,
    camera: Camera,
    queue: CommandQueue,
    revision: u64,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store over an already loaded document.
    pub fn with_document(document: BoardDocument) -> Self {
        let mut store = Self::new();
        store.replace_document(document);
        store
    }

    pub fn document(&self) -> &BoardDocument {
        &self.document
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Queue that node callbacks push into.
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.document.node(id)
    }

    /// Swap in a freshly loaded document. Does not count as a mutation.
    pub fn replace_document(&mut self, mut document: BoardDocument) {
        hydrate::hydrate_all(&mut document, &self.queue);
        self.document = document;
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    /// Add a node, attaching its callbacks.
    pub fn add_node(&mut self, mut node: Node) -> BoardResult<NodeId> {
        hydrate::hydrate(&mut node, &self.queue);
        let id = node.id.clone();
        self.document.push_undo();
        if let Err(e) = self.document.add_node(node) {
            self.document.discard_undo();
            return Err(e);
        }
        self.bump();
        log::debug!("Added node {}", id);
        Ok(id)
    }

    /// Apply one command. Returns whether the board changed.
    ///
    /// Commands that name a node which no longer exists are ignored.
    pub fn dispatch(&mut self, command: BoardCommand) -> BoardResult<bool> {
        self.document.push_undo();
        let result = self.apply(command);
        match result {
            Ok(true) => {
                self.bump();
                Ok(true)
            }
            Ok(false) => {
                self.document.discard_undo();
                Ok(false)
            }
            Err(BoardError::NodeNotFound(id)) => {
                self.document.discard_undo();
                log::warn!("Ignoring command for missing node {}", id);
                Ok(false)
            }
            Err(e) => {
                self.document.discard_undo();
                Err(e)
            }
        }
    }

    fn apply(&mut self, command: BoardCommand) -> BoardResult<bool> {
        let doc = &mut self.document;
        match command {
            BoardCommand::Delete(id) => match doc.remove_node(&id) {
                Some(_) => Ok(true),
                None => Err(BoardError::NodeNotFound(id)),
            },
            BoardCommand::UpdateContent {
                node,
                section,
                lines,
            } => doc
                .update_section_content(&node, &section, lines)
                .map(|_| true),
            BoardCommand::ChangeText { node, html } => {
                doc.update_sticky(&node, Some(html), None).map(|_| true)
            }
            BoardCommand::ChangeColor { node, color } => {
                doc.update_sticky(&node, None, Some(&color)).map(|_| true)
            }
            BoardCommand::Move { node, position } => doc.move_node(&node, position).map(|_| true),
            BoardCommand::Resize { node, size } => doc.resize_node(&node, size).map(|_| true),
            BoardCommand::Connect(connection) => {
                doc.connect(&connection).map(|id| id.is_some())
            }
            BoardCommand::RemoveEdge(id) => match doc.remove_edge(&id) {
                Some(_) => Ok(true),
                None => Err(BoardError::EdgeNotFound(id)),
            },
        }
    }

    /// Apply every command queued by node callbacks. Returns how many
    /// changed the board. Failing commands are logged and skipped.
    pub fn apply_pending(&mut self) -> usize {
        let mut applied = 0;
        for command in self.queue.drain() {
            match self.dispatch(command) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Board command failed: {}", e),
            }
        }
        applied
    }

    pub fn bring_to_front(&mut self, id: &NodeId) -> bool {
        self.document.push_undo();
        if self.document.bring_to_front(id) {
            self.bump();
            true
        } else {
            self.document.discard_undo();
            false
        }
    }

    /// Remove every node and edge.
    pub fn clear(&mut self) {
        self.document.push_undo();
        self.document.clear();
        self.bump();
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.document.undo();
        if changed {
            hydrate::hydrate_all(&mut self.document, &self.queue);
            self.bump();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.document.redo();
        if changed {
            hydrate::hydrate_all(&mut self.document, &self.queue);
            self.bump();
        }
        changed
    }
}

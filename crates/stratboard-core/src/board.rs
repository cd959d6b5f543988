//! Board document: the persisted node/edge graph.

use crate::edge::{Connection, Edge};
use crate::nodes::{Node, NodeData, NodeId, NodeKind, NodeSize, Position, StickyNoteData};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Board errors.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),
    #[error("Node id already in use: {0}")]
    DuplicateNode(NodeId),
    #[error("Cannot connect node {0} to itself")]
    SelfConnection(NodeId),
    #[error("Node {id} is not a {expected}")]
    WrongNodeKind { id: NodeId, expected: &'static str },
    #[error("Framework {framework} has no section {section}")]
    UnknownSection { framework: String, section: String },
    #[error("Unknown framework: {0}")]
    UnknownFramework(String),
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Invalid board data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// A snapshot of document state for undo/redo.
#[derive(Debug, Clone)]
struct DocumentSnapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// The node/edge graph of one project's board.
///
/// Nodes are kept in paint order (back to front).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(skip)]
    undo_stack: Vec<DocumentSnapshot>,
    #[serde(skip)]
    redo_stack: Vec<DocumentSnapshot>,
}

impl PartialEq for BoardDocument {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

impl BoardDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if let Some(snapshot) = self.undo_stack.pop() {
            let current = self.snapshot();
            self.redo_stack.push(current);
            self.restore(snapshot);
            true
        } else {
            false
        }
    }

    /// Redo the last undone change. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        if let Some(snapshot) = self.redo_stack.pop() {
            let current = self.snapshot();
            self.undo_stack.push(current);
            self.restore(snapshot);
            true
        } else {
            false
        }
    }

    /// Drop the most recent undo state, used when a change turned out to
    /// be a no-op.
    pub(crate) fn discard_undo(&mut self) {
        self.undo_stack.pop();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Add a node on top of the others.
    pub fn add_node(&mut self, node: Node) -> BoardResult<()> {
        if self.contains(&node.id) {
            return Err(BoardError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every edge attached to it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| &n.id == id)?;
        self.edges.retain(|e| !e.touches(id));
        Some(self.nodes.remove(pos))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    fn node_mut_or_err(&mut self, id: &NodeId) -> BoardResult<&mut Node> {
        self.node_mut(id)
            .ok_or_else(|| BoardError::NodeNotFound(id.clone()))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind() == kind)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Connect two nodes. Returns the new edge id, or `None` when an
    /// identical edge already exists.
    pub fn connect(&mut self, connection: &Connection) -> BoardResult<Option<String>> {
        for id in [&connection.source, &connection.target] {
            if !self.contains(id) {
                return Err(BoardError::NodeNotFound(id.clone()));
            }
        }
        if connection.source == connection.target {
            return Err(BoardError::SelfConnection(connection.source.clone()));
        }
        if self.edges.iter().any(|e| e.matches(connection)) {
            return Ok(None);
        }
        let edge = Edge::from_connection(connection);
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(Some(id))
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    pub fn move_node(&mut self, id: &NodeId, position: Position) -> BoardResult<()> {
        self.node_mut_or_err(id)?.position = position;
        Ok(())
    }

    /// Resize a node, clamped to its kind's minimum. Images keep their
    /// aspect ratio (the requested width wins).
    pub fn resize_node(&mut self, id: &NodeId, size: NodeSize) -> BoardResult<NodeSize> {
        let node = self.node_mut_or_err(id)?;
        let kind = node.kind();
        let min = kind.min_size();
        let mut width = size.width;
        let mut height = size.height;
        if kind == NodeKind::Image {
            let current = node.size();
            let aspect = if current.height > 0.0 {
                current.width / current.height
            } else {
                1.0
            };
            height = width / aspect;
            let scale = (min.width / width).max(min.height / height).max(1.0);
            width *= scale;
            height *= scale;
        } else {
            width = width.max(min.width);
            height = height.max(min.height);
        }
        let size = NodeSize::new(width, height);
        node.size = Some(size);
        Ok(size)
    }

    /// Replace the lines of one framework section.
    pub fn update_section_content(
        &mut self,
        id: &NodeId,
        section_id: &str,
        lines: Vec<String>,
    ) -> BoardResult<()> {
        let node = self.node_mut_or_err(id)?;
        match &mut node.data {
            NodeData::Framework(data) => data.set_section(section_id, lines),
            _ => Err(BoardError::WrongNodeKind {
                id: id.clone(),
                expected: "framework node",
            }),
        }
    }

    /// Merge text and/or colour into a sticky note.
    pub fn update_sticky(
        &mut self,
        id: &NodeId,
        text: Option<String>,
        color: Option<&str>,
    ) -> BoardResult<()> {
        let color = match color {
            Some(c) => Some(
                StickyNoteData::resolve_color(c)
                    .ok_or_else(|| BoardError::InvalidColor(c.to_string()))?,
            ),
            None => None,
        };
        let node = self.node_mut_or_err(id)?;
        match &mut node.data {
            NodeData::StickyNote(note) => {
                if let Some(text) = text {
                    note.text = text;
                }
                if let Some(color) = color {
                    note.color = color;
                }
                Ok(())
            }
            _ => Err(BoardError::WrongNodeKind {
                id: id.clone(),
                expected: "sticky note",
            }),
        }
    }

    /// Move a node to the top of the paint order.
    pub fn bring_to_front(&mut self, id: &NodeId) -> bool {
        match self.nodes.iter().position(|n| &n.id == id) {
            Some(pos) => {
                let node = self.nodes.remove(pos);
                self.nodes.push(node);
                true
            }
            None => false,
        }
    }

    /// Move a node to the bottom of the paint order.
    pub fn send_to_back(&mut self, id: &NodeId) -> bool {
        match self.nodes.iter().position(|n| &n.id == id) {
            Some(pos) => {
                let node = self.nodes.remove(pos);
                self.nodes.insert(0, node);
                true
            }
            None => false,
        }
    }

    /// Remove all nodes and edges.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Bounding box of all nodes.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(Node::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    /// Nodes under a point, front to back.
    pub fn nodes_at_point(&self, point: Point, tolerance: f64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .rev()
            .filter(|n| n.hit_test(point, tolerance))
            .map(|n| n.id.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Drop duplicate nodes and any edge `connect` would have refused: a
    /// missing endpoint, a self-loop, or a repeat of an earlier edge's id or
    /// endpoints. Returns how many entries were removed.
    pub fn sanitize(&mut self) -> usize {
        let before = self.nodes.len() + self.edges.len();

        let mut seen = HashSet::new();
        self.nodes.retain(|n| {
            let fresh = seen.insert(n.id.clone());
            if !fresh {
                log::warn!("Dropping duplicate node {}", n.id);
            }
            fresh
        });

        let ids: HashSet<NodeId> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let mut seen_edges = HashSet::new();
        let mut seen_links = HashSet::new();
        self.edges.retain(|e| {
            if !ids.contains(&e.source) || !ids.contains(&e.target) {
                log::warn!("Dropping dangling edge {}", e.id);
                return false;
            }
            if e.source == e.target {
                log::warn!("Dropping self-loop edge {}", e.id);
                return false;
            }
            let link = (e.source.clone(), e.source_handle, e.target.clone(), e.target_handle);
            if !seen_edges.insert(e.id.clone()) || !seen_links.insert(link) {
                log::warn!("Dropping duplicate edge {}", e.id);
                return false;
            }
            true
        });

        before - (self.nodes.len() + self.edges.len())
    }

    /// Serialize the board to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a board from JSON, repairing broken references.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut doc: Self = serde_json::from_str(json)?;
        doc.sanitize();
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frameworks::Catalog;
    use crate::nodes::{Anchor, ImageFormat, ImageNodeData};

    fn note(id: &str, x: f64, y: f64) -> Node {
        Node::sticky_note(Position::new(x, y)).with_id(id)
    }

    fn swot(id: &str) -> Node {
        let framework = Catalog::builtin().get("swot").unwrap().clone();
        Node::framework(framework, Position::new(0.0, 0.0)).with_id(id)
    }

    #[test]
    fn test_document_creation() {
        let doc = BoardDocument::new();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_add_node() {
        let mut doc = BoardDocument::new();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.node(&"a".into()).is_some());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut doc = BoardDocument::new();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        assert!(matches!(
            doc.add_node(note("a", 5.0, 5.0)),
            Err(BoardError::DuplicateNode(_))
        ));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut doc = BoardDocument::new();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        doc.add_node(note("b", 300.0, 0.0)).unwrap();
        doc.add_node(note("c", 600.0, 0.0)).unwrap();
        doc.connect(&Connection::new("a", "b")).unwrap();
        doc.connect(&Connection::new("b", "c")).unwrap();
        doc.connect(&Connection::new("a", "c")).unwrap();

        let removed = doc.remove_node(&"b".into());
        assert!(removed.is_some());
        assert_eq!(doc.edges.len(), 1);
        assert_eq!(doc.edges[0].id, "xy-edge__a-c");
    }

    #[test]
    fn test_connect_rules() {
        let mut doc = BoardDocument::new();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        doc.add_node(note("b", 300.0, 0.0)).unwrap();

        let conn = Connection::new("a", "b").with_handles(Some(Anchor::Right), Some(Anchor::Left));
        assert_eq!(doc.connect(&conn).unwrap().as_deref(), Some("xy-edge__aright-bleft"));
        assert_eq!(doc.connect(&conn).unwrap(), None);
        assert_eq!(doc.edges.len(), 1);

        assert!(matches!(
            doc.connect(&Connection::new("a", "a")),
            Err(BoardError::SelfConnection(_))
        ));
        assert!(matches!(
            doc.connect(&Connection::new("a", "zzz")),
            Err(BoardError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut doc = BoardDocument::new();
        doc.add_node(swot("f")).unwrap();
        let size = doc.resize_node(&"f".into(), NodeSize::new(100.0, 900.0)).unwrap();
        assert_eq!(size, NodeSize::new(500.0, 900.0));
    }

    #[test]
    fn test_resize_image_keeps_aspect() {
        let mut doc = BoardDocument::new();
        let image = ImageNodeData::from_bytes(&[0x89, 0x50, 0x4E, 0x47], ImageFormat::Png);
        doc.add_node(Node::image(image, Position::default()).with_id("i")).unwrap();

        let size = doc.resize_node(&"i".into(), NodeSize::new(600.0, 10.0)).unwrap();
        assert_eq!(size, NodeSize::new(600.0, 400.0));

        let size = doc.resize_node(&"i".into(), NodeSize::new(30.0, 30.0)).unwrap();
        assert!((size.height - 100.0).abs() < 1e-9);
        assert!((size.width - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_update_section_content() {
        let mut doc = BoardDocument::new();
        doc.add_node(swot("f")).unwrap();
        doc.add_node(note("n", 0.0, 0.0)).unwrap();

        doc.update_section_content(&"f".into(), "strengths", vec!["Brand".into()])
            .unwrap();
        match &doc.node(&"f".into()).unwrap().data {
            NodeData::Framework(data) => assert_eq!(data.lines("strengths"), ["Brand"]),
            other => panic!("unexpected node data {:?}", other),
        }

        assert!(matches!(
            doc.update_section_content(&"n".into(), "strengths", vec![]),
            Err(BoardError::WrongNodeKind { .. })
        ));
    }

    #[test]
    fn test_update_sticky() {
        let mut doc = BoardDocument::new();
        doc.add_node(note("n", 0.0, 0.0)).unwrap();
        doc.update_sticky(&"n".into(), Some("<b>Idea</b>".into()), Some("blue"))
            .unwrap();
        match &doc.node(&"n".into()).unwrap().data {
            NodeData::StickyNote(s) => {
                assert_eq!(s.text, "<b>Idea</b>");
                assert_eq!(s.color, "#bfdbfe");
            }
            other => panic!("unexpected node data {:?}", other),
        }
        assert!(matches!(
            doc.update_sticky(&"n".into(), None, Some("nope")),
            Err(BoardError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_paint_order() {
        let mut doc = BoardDocument::new();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        doc.add_node(note("b", 50.0, 50.0)).unwrap();

        let hits = doc.nodes_at_point(Point::new(100.0, 100.0), 0.0);
        assert_eq!(hits, vec![NodeId::from("b"), NodeId::from("a")]);

        doc.bring_to_front(&"a".into());
        let hits = doc.nodes_at_point(Point::new(100.0, 100.0), 0.0);
        assert_eq!(hits[0], NodeId::from("a"));

        doc.send_to_back(&"a".into());
        assert_eq!(doc.nodes[0].id, NodeId::from("a"));
    }

    #[test]
    fn test_nodes_of_kind() {
        let mut doc = BoardDocument::new();
        doc.add_node(swot("f")).unwrap();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        doc.add_node(note("b", 0.0, 0.0)).unwrap();
        assert_eq!(doc.nodes_of_kind(NodeKind::StickyNote).count(), 2);
        assert_eq!(doc.nodes_of_kind(NodeKind::Image).count(), 0);
    }

    #[test]
    fn test_bounds() {
        let mut doc = BoardDocument::new();
        assert!(doc.bounds().is_none());
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        doc.add_node(note("b", 100.0, 500.0)).unwrap();
        assert_eq!(doc.bounds(), Some(Rect::new(0.0, 0.0, 356.0, 680.0)));
    }

    #[test]
    fn test_json_roundtrip_preserves_content() {
        let mut doc = BoardDocument::new();
        doc.add_node(swot("f")).unwrap();
        doc.add_node(note("n", 600.0, 0.0)).unwrap();
        doc.update_section_content(&"f".into(), "threats", vec!["Rivals".into()])
            .unwrap();
        doc.connect(&Connection::new("f", "n")).unwrap();

        let json = doc.to_json().unwrap();
        let loaded = BoardDocument::from_json(&json).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_from_json_drops_dangling_edges() {
        let json = r##"{
            "nodes": [
                {"id": "a", "type": "stickyNote", "position": {"x": 0, "y": 0},
                 "data": {"text": "", "color": "#fef08a"}}
            ],
            "edges": [
                {"id": "e1", "source": "a", "target": "gone"}
            ]
        }"##;
        let doc = BoardDocument::from_json(json).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn test_from_json_drops_self_loops_and_repeated_links() {
        let json = r##"{
            "nodes": [
                {"id": "a", "type": "stickyNote", "position": {"x": 0, "y": 0},
                 "data": {"text": "", "color": "#fef08a"}},
                {"id": "b", "type": "stickyNote", "position": {"x": 300, "y": 0},
                 "data": {"text": "", "color": "#fef08a"}}
            ],
            "edges": [
                {"id": "self", "source": "a", "target": "a"},
                {"id": "e1", "source": "a", "target": "b"},
                {"id": "e2", "source": "a", "target": "b"}
            ]
        }"##;
        let mut doc = BoardDocument::from_json(json).unwrap();
        let ids: Vec<&str> = doc.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1"]);
        assert_eq!(doc.connect(&Connection::new("a", "b")).unwrap(), None);
    }

    #[test]
    fn test_from_json_missing_fields() {
        let doc = BoardDocument::from_json("{}").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_undo_add_node() {
        let mut doc = BoardDocument::new();
        doc.push_undo();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        assert!(doc.can_undo());

        assert!(doc.undo());
        assert!(doc.is_empty());
        assert!(doc.can_redo());

        assert!(doc.redo());
        assert!(doc.node(&"a".into()).is_some());
    }

    #[test]
    fn test_undo_clears_redo() {
        let mut doc = BoardDocument::new();
        doc.push_undo();
        doc.add_node(note("a", 0.0, 0.0)).unwrap();
        assert!(doc.undo());
        assert!(doc.can_redo());

        doc.push_undo();
        doc.add_node(note("b", 0.0, 0.0)).unwrap();
        assert!(!doc.can_redo());
    }

    #[test]
    fn test_undo_history_is_bounded() {
        let mut doc = BoardDocument::new();
        for i in 0..(MAX_UNDO_HISTORY + 10) {
            doc.push_undo();
            doc.add_node(note(&format!("n{}", i), 0.0, 0.0)).unwrap();
        }
        let mut undone = 0;
        while doc.undo() {
            undone += 1;
        }
        assert_eq!(undone, MAX_UNDO_HISTORY);
        assert_eq!(doc.len(), 10);
    }
}

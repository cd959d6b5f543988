//! Connectors between node anchors.

use crate::nodes::{Anchor, NodeId};
use serde::{Deserialize, Serialize};

/// Stroke and arrowhead colour for new edges.
pub const EDGE_COLOR: &str = "#71717a";

/// Path style of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Smoothstep,
    Step,
    Straight,
    #[serde(rename = "default")]
    Bezier,
}

/// Arrowhead drawn at an edge end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Arrow,
    ArrowClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Default for EdgeMarker {
    fn default() -> Self {
        Self {
            kind: MarkerKind::ArrowClosed,
            color: Some(EDGE_COLOR.to_string()),
        }
    }
}

/// A request to connect two nodes, as produced by dragging from one anchor
/// to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: Option<Anchor>,
    pub target_handle: Option<Anchor>,
}

impl Connection {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_handles(mut self, source: Option<Anchor>, target: Option<Anchor>) -> Self {
        self.source_handle = source;
        self.target_handle = target;
        self
    }

    /// Deterministic id for the edge this connection creates.
    pub fn edge_id(&self) -> String {
        format!(
            "xy-edge__{}{}-{}{}",
            self.source,
            self.source_handle.map(|a| a.as_str()).unwrap_or(""),
            self.target,
            self.target_handle.map(|a| a.as_str()).unwrap_or(""),
        )
    }
}

/// A visual connector. Carries no meaning beyond display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Anchor>,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<EdgeMarker>,
}

impl Edge {
    pub fn from_connection(connection: &Connection) -> Self {
        Self {
            id: connection.edge_id(),
            source: connection.source.clone(),
            target: connection.target.clone(),
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            kind: EdgeKind::default(),
            marker_end: Some(EdgeMarker::default()),
        }
    }

    /// Whether this edge joins the same anchors as a connection.
    pub fn matches(&self, connection: &Connection) -> bool {
        self.source == connection.source
            && self.target == connection.target
            && self.source_handle == connection.source_handle
            && self.target_handle == connection.target_handle
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id() {
        let conn = Connection::new("a", "b").with_handles(Some(Anchor::Right), Some(Anchor::Left));
        assert_eq!(conn.edge_id(), "xy-edge__aright-bleft");
        assert_eq!(Connection::new("a", "b").edge_id(), "xy-edge__a-b");
    }

    #[test]
    fn test_edge_json() {
        let conn = Connection::new("a", "b").with_handles(Some(Anchor::Bottom), None);
        let edge = Edge::from_connection(&conn);
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["sourceHandle"], "bottom");
        assert!(value.get("targetHandle").is_none());
        assert_eq!(value["type"], "smoothstep");
        assert_eq!(value["markerEnd"]["type"], "arrowclosed");
    }

    #[test]
    fn test_parse_minimal_edge() {
        let json = r#"{"id":"e1","source":"a","target":"b","sourceHandle":null,"targetHandle":"top"}"#;
        let edge: Edge = serde_json::from_str(json).unwrap();
        assert_eq!(edge.source_handle, None);
        assert_eq!(edge.target_handle, Some(Anchor::Top));
        assert_eq!(edge.kind, EdgeKind::Smoothstep);
        assert!(edge.touches(&NodeId::from("a")));
    }
}

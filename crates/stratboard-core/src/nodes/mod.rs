//! Node definitions for the board.

mod color;
mod framework;
mod image;
mod sticky;

pub use color::SerializableColor;
pub use framework::{FrameworkNodeData, SectionContent, lines_from_text};
pub use image::{ImageFormat, ImageNodeData};
pub use sticky::{DEFAULT_STICKY_COLOR, STICKY_PALETTE, StickyNoteData};

use crate::frameworks::Framework;
use crate::hydrate::NodeCallbacks;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Minimap colour for framework nodes.
pub const FRAMEWORK_NODE_COLOR: &str = "#10b981";
/// Minimap colour for image nodes.
pub const IMAGE_NODE_COLOR: &str = "#3b82f6";

/// Unique identifier for nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Position in flow (world) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Position {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Position> for Point {
    fn from(p: Position) -> Self {
        Point::new(p.x, p.y)
    }
}

/// Explicit node dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
}

impl NodeSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Connection point on a node's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
}

impl Anchor {
    pub const ALL: [Anchor; 4] = [Anchor::Top, Anchor::Right, Anchor::Bottom, Anchor::Left];

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::Right => "right",
            Anchor::Bottom => "bottom",
            Anchor::Left => "left",
        }
    }
}

impl std::str::FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Anchor::Top),
            "right" => Ok(Anchor::Right),
            "bottom" => Ok(Anchor::Bottom),
            "left" => Ok(Anchor::Left),
            other => Err(format!("unknown anchor '{}'", other)),
        }
    }
}

/// Node type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Framework,
    StickyNote,
    Image,
}

impl NodeKind {
    /// The type string used in saved boards and drag payloads.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Framework => "frameworkNode",
            NodeKind::StickyNote => "stickyNote",
            NodeKind::Image => "imageNode",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "frameworkNode" => Some(NodeKind::Framework),
            "stickyNote" => Some(NodeKind::StickyNote),
            "imageNode" => Some(NodeKind::Image),
            _ => None,
        }
    }

    /// Size given to freshly created nodes.
    pub fn default_size(&self) -> NodeSize {
        match self {
            NodeKind::Framework => NodeSize::new(500.0, 400.0),
            NodeKind::StickyNote => NodeSize::new(256.0, 180.0),
            NodeKind::Image => NodeSize::new(300.0, 200.0),
        }
    }

    /// Smallest size a resize may produce.
    pub fn min_size(&self) -> NodeSize {
        match self {
            NodeKind::Framework => NodeSize::new(500.0, 400.0),
            NodeKind::StickyNote => NodeSize::new(256.0, 180.0),
            NodeKind::Image => NodeSize::new(100.0, 100.0),
        }
    }
}

/// Typed node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum NodeData {
    #[serde(rename = "frameworkNode")]
    Framework(FrameworkNodeData),
    #[serde(rename = "stickyNote")]
    StickyNote(StickyNoteData),
    #[serde(rename = "imageNode")]
    Image(ImageNodeData),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Framework(_) => NodeKind::Framework,
            NodeData::StickyNote(_) => NodeKind::StickyNote,
            NodeData::Image(_) => NodeKind::Image,
        }
    }
}

/// A positioned, typed element on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    #[serde(flatten)]
    pub data: NodeData,
    /// Explicit size; `None` means the kind's default size.
    #[serde(default, rename = "style", skip_serializing_if = "Option::is_none")]
    pub size: Option<NodeSize>,
    #[serde(skip)]
    pub(crate) callbacks: NodeCallbacks,
}

impl Node {
    pub fn new(data: NodeData, position: Position) -> Self {
        Self {
            id: NodeId::new(),
            position,
            data,
            size: None,
            callbacks: NodeCallbacks::default(),
        }
    }

    pub fn framework(framework: Framework, position: Position) -> Self {
        Self::new(NodeData::Framework(FrameworkNodeData::new(framework)), position)
    }

    pub fn sticky_note(position: Position) -> Self {
        Self::new(NodeData::StickyNote(StickyNoteData::default()), position)
    }

    pub fn image(image: ImageNodeData, position: Position) -> Self {
        let mut node = Self::new(NodeData::Image(image), position);
        node.size = Some(NodeKind::Image.default_size());
        node
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_size(mut self, size: NodeSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Effective size (explicit or default).
    pub fn size(&self) -> NodeSize {
        self.size.unwrap_or_else(|| self.kind().default_size())
    }

    /// Bounding box in flow coordinates.
    pub fn bounds(&self) -> Rect {
        let size = self.size();
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + size.width,
            self.position.y + size.height,
        )
    }

    /// Check if a point (in flow coordinates) lies on this node.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    /// Flow-space coordinates of a connection anchor.
    pub fn anchor_point(&self, anchor: Anchor) -> Point {
        let b = self.bounds();
        let c = b.center();
        match anchor {
            Anchor::Top => Point::new(c.x, b.y0),
            Anchor::Right => Point::new(b.x1, c.y),
            Anchor::Bottom => Point::new(c.x, b.y1),
            Anchor::Left => Point::new(b.x0, c.y),
        }
    }

    /// The anchor closest to a point, used when an edge names no handle.
    pub fn nearest_anchor(&self, point: Point) -> Anchor {
        let mut best = Anchor::Top;
        let mut best_dist = f64::INFINITY;
        for anchor in Anchor::ALL {
            let d = self.anchor_point(anchor).distance(point);
            if d < best_dist {
                best = anchor;
                best_dist = d;
            }
        }
        best
    }

    /// Human-readable title.
    pub fn title(&self) -> String {
        match &self.data {
            NodeData::Framework(f) => f.framework.name.clone(),
            NodeData::StickyNote(s) => match &s.label {
                Some(label) if !label.trim().is_empty() => label.clone(),
                _ => {
                    let text = s.plain_text();
                    let first = text.lines().next().unwrap_or("").trim();
                    if first.is_empty() {
                        "Sticky note".to_string()
                    } else {
                        first.chars().take(40).collect()
                    }
                }
            },
            NodeData::Image(i) => i.alt.clone().unwrap_or_else(|| "Pasted Image".to_string()),
        }
    }

    /// Colour used for overview renderings.
    pub fn minimap_color(&self) -> SerializableColor {
        let hex = match &self.data {
            NodeData::Framework(_) => FRAMEWORK_NODE_COLOR,
            NodeData::StickyNote(s) => s.color.as_str(),
            NodeData::Image(_) => IMAGE_NODE_COLOR,
        };
        SerializableColor::from_hex(hex).unwrap_or_else(SerializableColor::white)
    }

    /// Behaviour attached by the hydration pass.
    pub fn callbacks(&self) -> &NodeCallbacks {
        &self.callbacks
    }

    pub fn is_hydrated(&self) -> bool {
        self.callbacks.is_attached()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.position == other.position
            && self.data == other.data
            && self.size == other.size
    }
}

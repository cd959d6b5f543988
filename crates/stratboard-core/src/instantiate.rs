//! Turning drops, pastes and toolbar clicks into new nodes.

use crate::board::{BoardError, BoardResult};
use crate::camera::Camera;
use crate::frameworks::{Catalog, Framework};
use crate::nodes::{ImageFormat, ImageNodeData, Node, NodeKind, NodeSize, Position};
use kurbo::{Point, Size};

/// Drag data slot holding the node type.
pub const DRAG_TYPE_FORMAT: &str = "application/reactflow/type";
/// Drag data slot holding the framework id.
pub const DRAG_FRAMEWORK_FORMAT: &str = "application/reactflow/frameworkId";

/// Screen point used by the "add note" toolbar button.
pub const ADD_NOTE_SCREEN_POINT: Point = Point::new(500.0, 300.0);
/// Where the first node of a project created from a framework goes.
pub const INITIAL_FRAMEWORK_POSITION: Position = Position { x: 100.0, y: 100.0 };

/// Data carried by a drag from the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPayload {
    pub node_type: String,
    pub framework_id: Option<String>,
}

impl DropPayload {
    pub fn framework(id: impl Into<String>) -> Self {
        Self {
            node_type: NodeKind::Framework.type_name().to_string(),
            framework_id: Some(id.into()),
        }
    }

    pub fn sticky_note() -> Self {
        Self {
            node_type: NodeKind::StickyNote.type_name().to_string(),
            framework_id: None,
        }
    }

    /// Build a payload from drag data slots, as `(format, value)` pairs.
    /// Returns `None` when no node type is present.
    pub fn from_drag_data<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<Self> {
        let mut node_type = None;
        let mut framework_id = None;
        for (format, value) in entries {
            match format {
                DRAG_TYPE_FORMAT if !value.is_empty() => node_type = Some(value.to_string()),
                DRAG_FRAMEWORK_FORMAT if !value.is_empty() => {
                    framework_id = Some(value.to_string())
                }
                _ => {}
            }
        }
        Some(Self {
            node_type: node_type?,
            framework_id,
        })
    }
}

/// One entry of a paste event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ClipboardItem {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.contains("image")
    }
}

/// Create the node a drop at `screen_point` describes.
pub fn drop_node(
    payload: &DropPayload,
    screen_point: Point,
    camera: &Camera,
    catalog: &Catalog,
) -> BoardResult<Node> {
    let position = Position::from(camera.screen_to_world(screen_point));
    match NodeKind::from_type_name(&payload.node_type) {
        Some(NodeKind::Framework) => {
            let id = payload.framework_id.as_deref().unwrap_or_default();
            let framework = catalog
                .get(id)
                .ok_or_else(|| BoardError::UnknownFramework(id.to_string()))?;
            Ok(framework_node_at(framework, position))
        }
        Some(NodeKind::StickyNote) => Ok(Node::sticky_note(position)),
        _ => Err(BoardError::UnknownNodeType(payload.node_type.clone())),
    }
}

/// Create an image node from the first image in a paste, its top-left
/// corner at the centre of the viewport. Returns `None` when the paste holds
/// no image. Unrecognised `image/*` data keeps its declared MIME type.
pub fn paste_image(items: &[ClipboardItem], camera: &Camera, viewport: Size) -> Option<Node> {
    let item = items.iter().find(|item| item.is_image())?;
    let data = match ImageFormat::from_magic_bytes(&item.data)
        .or_else(|| ImageFormat::from_mime(&item.mime_type))
    {
        Some(format) => ImageNodeData::from_bytes(&item.data, format),
        None => ImageNodeData::with_mime(&item.data, &item.mime_type.trim().to_ascii_lowercase()),
    };
    let position = Position::from(camera.visible_center(viewport));
    log::debug!("Pasting {} image ({} bytes)", item.mime_type, item.data.len());
    Some(Node::image(data, position).with_size(NodeKind::Image.default_size()))
}

/// Node created by the "add note" button.
pub fn add_sticky_note(camera: &Camera) -> Node {
    Node::sticky_note(camera.screen_to_world(ADD_NOTE_SCREEN_POINT).into())
}

/// A framework node at a flow position, with empty content.
pub fn framework_node_at(framework: &Framework, position: Position) -> Node {
    Node::framework(framework.clone(), position)
        .with_size(NodeKind::Framework.default_size())
}

/// Size an image node should take to show `width`×`height` pixels without
/// distortion, fitted into the default box.
pub fn fitted_image_size(width: u32, height: u32) -> NodeSize {
    let default = NodeKind::Image.default_size();
    if width == 0 || height == 0 {
        return default;
    }
    let aspect = width as f64 / height as f64;
    if aspect >= default.width / default.height {
        NodeSize::new(default.width, default.width / aspect)
    } else {
        NodeSize::new(default.height * aspect, default.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeData;
    use kurbo::Vec2;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_drop_framework() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(-100.0, 0.0);
        camera.zoom = 2.0;
        let node = drop_node(
            &DropPayload::framework("swot"),
            Point::new(300.0, 200.0),
            &camera,
            Catalog::builtin(),
        )
        .unwrap();
        assert_eq!(node.position, Position::new(200.0, 100.0));
        match &node.data {
            NodeData::Framework(data) => {
                assert_eq!(data.framework.id, "swot");
                assert!(data.content.is_empty());
            }
            other => panic!("unexpected node data {:?}", other),
        }
    }

    #[test]
    fn test_drop_unknown_framework() {
        let result = drop_node(
            &DropPayload::framework("nope"),
            Point::ZERO,
            &Camera::new(),
            Catalog::builtin(),
        );
        assert!(matches!(result, Err(BoardError::UnknownFramework(_))));
    }

    #[test]
    fn test_drop_sticky_and_unknown_type() {
        let node = drop_node(
            &DropPayload::sticky_note(),
            Point::new(10.0, 20.0),
            &Camera::new(),
            Catalog::builtin(),
        )
        .unwrap();
        match &node.data {
            NodeData::StickyNote(note) => {
                assert!(note.text.is_empty());
                assert_eq!(note.color, "#fef08a");
            }
            other => panic!("unexpected node data {:?}", other),
        }

        let payload = DropPayload {
            node_type: "imageNode".into(),
            framework_id: None,
        };
        assert!(matches!(
            drop_node(&payload, Point::ZERO, &Camera::new(), Catalog::builtin()),
            Err(BoardError::UnknownNodeType(_))
        ));
    }

    #[test]
    fn test_payload_from_drag_data() {
        let payload = DropPayload::from_drag_data([
            (DRAG_TYPE_FORMAT, "frameworkNode"),
            (DRAG_FRAMEWORK_FORMAT, "bcg"),
            ("text/plain", "ignored"),
        ])
        .unwrap();
        assert_eq!(payload, DropPayload::framework("bcg"));
        assert!(DropPayload::from_drag_data([("text/plain", "x")]).is_none());
    }

    #[test]
    fn test_paste_image_at_viewport_centre() {
        let items = vec![
            ClipboardItem::new("text/plain", b"hello".to_vec()),
            ClipboardItem::new("image/png", PNG_MAGIC.to_vec()),
        ];
        let node = paste_image(&items, &Camera::new(), Size::new(1000.0, 800.0)).unwrap();
        assert_eq!(node.position, Position::new(500.0, 400.0));
        assert_eq!(node.size(), NodeSize::new(300.0, 200.0));
        match &node.data {
            NodeData::Image(image) => assert!(image.src.starts_with("data:image/png;base64,")),
            other => panic!("unexpected node data {:?}", other),
        }
    }

    #[test]
    fn test_paste_unrecognised_image_type() {
        let items = vec![ClipboardItem::new("image/bmp", b"BM\x36\0\0\0".to_vec())];
        let node = paste_image(&items, &Camera::new(), Size::new(1000.0, 800.0)).unwrap();
        match &node.data {
            NodeData::Image(image) => {
                assert!(image.src.starts_with("data:image/bmp;base64,"));
                assert_eq!(image.decode().unwrap().0, "image/bmp");
            }
            other => panic!("unexpected node data {:?}", other),
        }
    }

    #[test]
    fn test_paste_without_image() {
        let items = vec![ClipboardItem::new("text/html", b"<b>x</b>".to_vec())];
        assert!(paste_image(&items, &Camera::new(), Size::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_add_sticky_note_position() {
        let mut camera = Camera::new();
        camera.zoom = 0.5;
        let node = add_sticky_note(&camera);
        assert_eq!(node.position, Position::new(1000.0, 600.0));
    }

    #[test]
    fn test_fitted_image_size() {
        assert_eq!(fitted_image_size(600, 200), NodeSize::new(300.0, 100.0));
        assert_eq!(fitted_image_size(100, 200), NodeSize::new(100.0, 200.0));
        assert_eq!(fitted_image_size(0, 0), NodeSize::new(300.0, 200.0));
    }
}

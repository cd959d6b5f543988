//! Image and text export of a board.

mod raster;
mod text;

pub use raster::Canvas;
pub use text::export_text;

use crate::board::BoardDocument;
use crate::camera::Camera;
use crate::edge::{EDGE_COLOR, Edge};
use crate::nodes::{
    FrameworkNodeData, IMAGE_NODE_COLOR, Node, NodeData, NodeId, SerializableColor,
};
use kurbo::{Point, Rect, Size, Vec2};
use thiserror::Error;

/// Background colour of exported images.
pub const EXPORT_BACKGROUND: &str = "#09090b";
/// File name used when exporting the whole board.
pub const DEFAULT_EXPORT_FILENAME: &str = "whiteboard-analysis.png";
/// Largest width or height of an exported image, in pixels.
pub const MAX_EXPORT_DIMENSION: u32 = 8192;

const CARD_COLOR: &str = "#18181b";
const BORDER_COLOR: &str = "#3f3f46";
const HEADER_HEIGHT: f64 = 40.0;
const CONTENT_PADDING: f64 = 12.0;
const TEXT_LINE_HEIGHT: f64 = 14.0;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: the board is empty")]
    EmptyBoard,
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Export region is empty")]
    EmptyRegion,
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Part of the board to rasterise.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportRegion {
    /// Bounds of every node, plus padding on each side.
    Board { padding: f64 },
    /// What a viewport of the given size currently shows.
    Visible { camera: Camera, viewport: Size },
    /// One node's bounds.
    Node(NodeId),
}

impl Default for ExportRegion {
    fn default() -> Self {
        ExportRegion::Board { padding: 40.0 }
    }
}

/// Raster export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Pixels per flow unit.
    pub scale: f64,
    pub background: SerializableColor,
    pub max_dimension: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: color(EXPORT_BACKGROUND),
            max_dimension: MAX_EXPORT_DIMENSION,
        }
    }
}

fn color(hex: &str) -> SerializableColor {
    SerializableColor::from_hex(hex).unwrap_or_else(SerializableColor::white)
}

/// Suggested file name for an export.
pub fn export_filename(doc: &BoardDocument, region: &ExportRegion) -> String {
    if let ExportRegion::Node(id) = region {
        if let Some(NodeData::Framework(data)) = doc.node(id).map(|n| &n.data) {
            return data.framework.export_filename("png");
        }
    }
    DEFAULT_EXPORT_FILENAME.to_string()
}

/// Flow-space rectangle covered by a region and the base pixel scale.
fn resolve_region(doc: &BoardDocument, region: &ExportRegion) -> ExportResult<(Rect, f64)> {
    let (rect, scale) = match region {
        ExportRegion::Board { padding } => {
            let bounds = doc.bounds().ok_or(ExportError::EmptyBoard)?;
            (bounds.inflate(*padding, *padding), 1.0)
        }
        ExportRegion::Visible { camera, viewport } => (camera.visible_rect(*viewport), camera.zoom),
        ExportRegion::Node(id) => {
            let node = doc
                .node(id)
                .ok_or_else(|| ExportError::NodeNotFound(id.clone()))?;
            (node.bounds(), 1.0)
        }
    };
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Err(ExportError::EmptyRegion);
    }
    Ok((rect, scale))
}

/// Maps flow coordinates to export pixels.
#[derive(Debug, Clone, Copy)]
struct Projection {
    origin: Point,
    scale: f64,
}

impl Projection {
    fn point(&self, p: Point) -> Point {
        Point::new((p.x - self.origin.x) * self.scale, (p.y - self.origin.y) * self.scale)
    }

    fn rect(&self, r: Rect) -> Rect {
        Rect::from_points(self.point(r.origin()), self.point(Point::new(r.x1, r.y1)))
    }
}

/// Rasterise part of the board into an RGBA canvas.
pub fn render(doc: &BoardDocument, region: &ExportRegion, options: &ExportOptions) -> ExportResult<Canvas> {
    let (rect, base_scale) = resolve_region(doc, region)?;
    let mut scale = base_scale * options.scale;
    let max = options.max_dimension.max(1) as f64;
    let largest = rect.width().max(rect.height()) * scale;
    if largest > max {
        log::warn!("Export of {:.0}px exceeds {}px, scaling down", largest, max);
        scale *= max / largest;
    }
    let width = ((rect.width() * scale).round() as u32).clamp(1, options.max_dimension.max(1));
    let height = ((rect.height() * scale).round() as u32).clamp(1, options.max_dimension.max(1));

    let projection = Projection {
        origin: rect.origin(),
        scale,
    };
    let mut canvas = Canvas::new(width, height, options.background);

    let only = match region {
        ExportRegion::Node(id) => Some(id),
        _ => None,
    };

    if only.is_none() {
        for edge in &doc.edges {
            draw_edge(&mut canvas, doc, edge, projection);
        }
    }
    for node in &doc.nodes {
        if only.is_some_and(|id| id != &node.id) {
            continue;
        }
        if node.bounds().intersect(rect).is_zero_area() {
            continue;
        }
        draw_node(&mut canvas, node, projection);
    }

    log::debug!("Rendered export {}x{} at scale {:.2}", width, height, scale);
    Ok(canvas)
}

/// Rasterise part of the board and encode it as PNG.
pub fn render_png(doc: &BoardDocument, region: &ExportRegion, options: &ExportOptions) -> ExportResult<Vec<u8>> {
    let canvas = render(doc, region, options)?;
    encode_png(canvas.pixels(), canvas.width(), canvas.height())
}

/// Encode RGBA pixel data to PNG bytes.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> ExportResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        writer
            .write_image_data(rgba_data)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }
    Ok(png_data)
}

fn draw_edge(canvas: &mut Canvas, doc: &BoardDocument, edge: &Edge, projection: Projection) {
    let (Some(source), Some(target)) = (doc.node(&edge.source), doc.node(&edge.target)) else {
        return;
    };
    let from_anchor = edge
        .source_handle
        .unwrap_or_else(|| source.nearest_anchor(target.bounds().center()));
    let to_anchor = edge
        .target_handle
        .unwrap_or_else(|| target.nearest_anchor(source.bounds().center()));
    let from = projection.point(source.anchor_point(from_anchor));
    let to = projection.point(target.anchor_point(to_anchor));

    let stroke = color(
        edge.marker_end
            .as_ref()
            .and_then(|m| m.color.as_deref())
            .unwrap_or(EDGE_COLOR),
    );
    let width = (2.0 * projection.scale).max(1.0);
    canvas.draw_line(from, to, width, stroke);

    let dir = to - from;
    let len = dir.hypot();
    if edge.marker_end.is_some() && len > f64::EPSILON {
        let unit = dir / len;
        let normal = Vec2::new(-unit.y, unit.x);
        let size = (10.0 * projection.scale).max(4.0);
        let base = to - unit * size;
        canvas.fill_triangle(to, base + normal * (size / 2.0), base - normal * (size / 2.0), stroke);
    }
}

fn draw_node(canvas: &mut Canvas, node: &Node, projection: Projection) {
    let rect = projection.rect(node.bounds());
    let border = (projection.scale).max(1.0);
    match &node.data {
        NodeData::Framework(data) => draw_framework(canvas, data, node, rect, projection.scale),
        NodeData::StickyNote(note) => {
            canvas.fill_rect(rect, node.minimap_color());
            let ink = if note.is_dark() {
                color("#f4f4f5")
            } else {
                color("#27272a")
            };
            let lines: Vec<String> = note.plain_text().lines().map(str::to_string).collect();
            draw_text_bars(canvas, &lines, rect.inset(-CONTENT_PADDING * projection.scale), projection.scale, ink);
        }
        NodeData::Image(image) => {
            let decoded = image
                .decode()
                .ok()
                .and_then(|(_, bytes)| ::image::load_from_memory(&bytes).ok());
            match decoded {
                Some(decoded) => canvas.draw_image(&decoded.to_rgba8(), rect),
                None => {
                    log::warn!("Could not decode image node {}, drawing placeholder", node.id);
                    canvas.fill_rect(rect, color(IMAGE_NODE_COLOR));
                }
            }
        }
    }
    canvas.stroke_rect(rect, border, color(BORDER_COLOR));
}

fn draw_framework(canvas: &mut Canvas, data: &FrameworkNodeData, node: &Node, rect: Rect, scale: f64) {
    canvas.fill_rect(rect, color(CARD_COLOR));
    let header = Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + HEADER_HEIGHT * scale);
    canvas.fill_rect(header, node.minimap_color());

    let sections = &data.framework.sections;
    if sections.is_empty() {
        return;
    }
    let body = Rect::new(rect.x0, header.y1, rect.x1, rect.y1);
    let cols = (sections.len() as f64).sqrt().ceil() as usize;
    let rows = sections.len().div_ceil(cols);
    let cell_w = body.width() / cols as f64;
    let cell_h = body.height() / rows as f64;
    let grid = color(BORDER_COLOR);
    let ink = color("#a1a1aa");

    for (i, section) in sections.iter().enumerate() {
        let (row, col) = (i / cols, i % cols);
        let cell = Rect::new(
            body.x0 + col as f64 * cell_w,
            body.y0 + row as f64 * cell_h,
            body.x0 + (col + 1) as f64 * cell_w,
            body.y0 + (row + 1) as f64 * cell_h,
        );
        canvas.stroke_rect(cell, scale.max(1.0), grid);
        let lines = data.lines_within(section);
        draw_text_bars(canvas, &lines, cell.inset(-CONTENT_PADDING * scale), scale, ink);
    }
}

/// Stand-in for text: one bar per line, its length following the line's
/// character count.
fn draw_text_bars(canvas: &mut Canvas, lines: &[String], area: Rect, scale: f64, ink: SerializableColor) {
    if area.width() <= 0.0 || area.height() <= 0.0 {
        return;
    }
    let line_height = TEXT_LINE_HEIGHT * scale;
    let bar_height = (line_height * 0.5).max(1.0);
    let char_width = 6.0 * scale;
    for (i, line) in lines.iter().enumerate() {
        let y = area.y0 + i as f64 * line_height;
        if y + bar_height > area.y1 {
            break;
        }
        let len = (line.chars().count() as f64 * char_width).min(area.width());
        canvas.fill_rect(Rect::new(area.x0, y, area.x0 + len, y + bar_height), ink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Connection;
    use crate::frameworks::Catalog;
    use crate::nodes::{ImageFormat, ImageNodeData, Position};

    fn board() -> BoardDocument {
        let mut doc = BoardDocument::new();
        let swot = Catalog::builtin().get("swot").unwrap().clone();
        doc.add_node(Node::framework(swot, Position::new(0.0, 0.0)).with_id("f"))
            .unwrap();
        doc.add_node(Node::sticky_note(Position::new(600.0, 0.0)).with_id("s"))
            .unwrap();
        doc.connect(&Connection::new("f", "s")).unwrap();
        doc
    }

    fn tiny_png() -> Vec<u8> {
        let pixels = [255u8, 0, 0, 255].repeat(4);
        encode_png(&pixels, 2, 2).unwrap()
    }

    #[test]
    fn test_board_region_size() {
        let doc = board();
        let canvas = render(&doc, &ExportRegion::Board { padding: 10.0 }, &ExportOptions::default()).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (876, 420));
        assert_eq!(canvas.pixel(0, 0), Some([9, 9, 11, 255]));
        // Framework header bar
        assert_eq!(canvas.pixel(20, 20), Some([0x10, 0xb9, 0x81, 255]));
        // Sticky note body, clear of the text area
        assert_eq!(canvas.pixel(800, 180), Some([0xfe, 0xf0, 0x8a, 255]));
    }

    #[test]
    fn test_empty_board_errors() {
        let result = render_png(&BoardDocument::new(), &ExportRegion::default(), &ExportOptions::default());
        assert!(matches!(result, Err(ExportError::EmptyBoard)));
    }

    #[test]
    fn test_node_region_and_filename() {
        let doc = board();
        let region = ExportRegion::Node("f".into());
        let canvas = render(&doc, &region, &ExportOptions::default()).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (500, 400));
        assert_eq!(export_filename(&doc, &region), "swot-analysis.png");
        assert_eq!(export_filename(&doc, &ExportRegion::default()), "whiteboard-analysis.png");
        assert_eq!(
            export_filename(&doc, &ExportRegion::Node("s".into())),
            "whiteboard-analysis.png"
        );
        assert!(matches!(
            render(&doc, &ExportRegion::Node("zzz".into()), &ExportOptions::default()),
            Err(ExportError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_visible_region_uses_zoom() {
        let doc = board();
        let mut camera = Camera::new();
        camera.zoom = 2.0;
        let region = ExportRegion::Visible {
            camera,
            viewport: Size::new(400.0, 300.0),
        };
        let canvas = render(&doc, &region, &ExportOptions::default()).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (400, 300));
    }

    #[test]
    fn test_large_export_is_scaled_down() {
        let doc = board();
        let options = ExportOptions {
            scale: 100.0,
            max_dimension: 1000,
            ..Default::default()
        };
        let canvas = render(&doc, &ExportRegion::Board { padding: 0.0 }, &options).unwrap();
        assert_eq!(canvas.width(), 1000);
        assert!(canvas.height() <= 1000);
    }

    #[test]
    fn test_png_output_decodes() {
        let mut doc = board();
        let image = ImageNodeData::from_bytes(&tiny_png(), ImageFormat::Png);
        doc.add_node(Node::image(image, Position::new(0.0, 500.0)).with_id("i"))
            .unwrap();

        let bytes = render_png(&doc, &ExportRegion::Board { padding: 0.0 }, &ExportOptions::default()).unwrap();
        let decoded = ::image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (856, 700));
        // Pasted image pixels are scaled into the node box
        assert_eq!(decoded.get_pixel(150, 600).0, [255, 0, 0, 255]);
    }
}

//! Minimal RGBA pixel canvas used for PNG export.

use crate::nodes::SerializableColor;
use image::RgbaImage;
use kurbo::{Point, Rect};

/// An RGBA8 pixel buffer.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// A canvas filled with one colour.
    pub fn new(width: u32, height: u32, background: SerializableColor) -> Self {
        let rgba = background.to_rgba();
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Source-over blend of one pixel. Out-of-bounds writes are dropped.
    fn blend(&mut self, x: i64, y: i64, [r, g, b, a]: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 || a == 0 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        if a == 255 {
            self.pixels[i..i + 4].copy_from_slice(&[r, g, b, 255]);
            return;
        }
        let alpha = a as u32;
        let inv = 255 - alpha;
        for (offset, src) in [r, g, b].into_iter().enumerate() {
            let dst = self.pixels[i + offset] as u32;
            self.pixels[i + offset] = ((src as u32 * alpha + dst * inv) / 255) as u8;
        }
        let dst_a = self.pixels[i + 3] as u32;
        self.pixels[i + 3] = (alpha + dst_a * inv / 255).min(255) as u8;
    }

    /// Pixel range covered by a rectangle, clipped to the canvas.
    fn span(&self, rect: Rect) -> Option<(i64, i64, i64, i64)> {
        let x0 = rect.x0.round().max(0.0) as i64;
        let y0 = rect.y0.round().max(0.0) as i64;
        let x1 = rect.x1.round().min(self.width as f64) as i64;
        let y1 = rect.y1.round().min(self.height as f64) as i64;
        if x0 >= x1 || y0 >= y1 {
            None
        } else {
            Some((x0, y0, x1, y1))
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: SerializableColor) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else {
            return;
        };
        let rgba = color.to_rgba();
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, rgba);
            }
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f64, color: SerializableColor) {
        let w = width.max(1.0);
        self.fill_rect(Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + w), color);
        self.fill_rect(Rect::new(rect.x0, rect.y1 - w, rect.x1, rect.y1), color);
        self.fill_rect(Rect::new(rect.x0, rect.y0, rect.x0 + w, rect.y1), color);
        self.fill_rect(Rect::new(rect.x1 - w, rect.y0, rect.x1, rect.y1), color);
    }

    /// Draw a line segment with square pen of the given width.
    pub fn draw_line(&mut self, from: Point, to: Point, width: f64, color: SerializableColor) {
        let rgba = color.to_rgba();
        let half = (width.max(1.0) / 2.0).floor() as i64;
        let steps = (to - from).hypot().ceil().max(1.0) as usize;
        let mut last = None;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let p = from.lerp(to, t);
            let (cx, cy) = (p.x.round() as i64, p.y.round() as i64);
            if last == Some((cx, cy)) {
                continue;
            }
            last = Some((cx, cy));
            for dy in -half..=half {
                for dx in -half..=half {
                    self.blend(cx + dx, cy + dy, rgba);
                }
            }
        }
    }

    /// Fill a triangle using edge functions.
    pub fn fill_triangle(&mut self, a: Point, b: Point, c: Point, color: SerializableColor) {
        let bounds = Rect::from_points(a, b).union_pt(c);
        let Some((x0, y0, x1, y1)) = self.span(bounds.inflate(1.0, 1.0)) else {
            return;
        };
        let rgba = color.to_rgba();
        let edge = |p: Point, q: Point, r: Point| (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
        let area = edge(a, b, c);
        if area.abs() < f64::EPSILON {
            return;
        }
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.blend(x, y, rgba);
                }
            }
        }
    }

    /// Scale an image into `rect` and composite it.
    pub fn draw_image(&mut self, image: &RgbaImage, rect: Rect) {
        let Some((x0, y0, x1, y1)) = self.span(rect) else {
            return;
        };
        let target_w = (rect.width().round() as u32).max(1);
        let target_h = (rect.height().round() as u32).max(1);
        let scaled = image::imageops::resize(
            image,
            target_w,
            target_h,
            image::imageops::FilterType::Triangle,
        );
        let origin_x = rect.x0.round() as i64;
        let origin_y = rect.y0.round() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                let sx = (x - origin_x).clamp(0, target_w as i64 - 1) as u32;
                let sy = (y - origin_y).clamp(0, target_h as i64 - 1) as u32;
                self.blend(x, y, scaled.get_pixel(sx, sy).0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> SerializableColor {
        SerializableColor::from_hex(s).unwrap()
    }

    #[test]
    fn test_background_and_fill() {
        let mut canvas = Canvas::new(10, 10, hex("#09090b"));
        assert_eq!(canvas.pixel(0, 0), Some([9, 9, 11, 255]));

        canvas.fill_rect(Rect::new(2.0, 2.0, 5.0, 5.0), hex("#ff0000"));
        assert_eq!(canvas.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(4, 4), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(5, 5), Some([9, 9, 11, 255]));
        assert_eq!(canvas.pixel(10, 0), None);
    }

    #[test]
    fn test_fill_clips_to_canvas() {
        let mut canvas = Canvas::new(4, 4, hex("#000000"));
        canvas.fill_rect(Rect::new(-10.0, -10.0, 100.0, 100.0), hex("#ffffff"));
        assert!(canvas.pixels().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_alpha_blend() {
        let mut canvas = Canvas::new(1, 1, hex("#000000"));
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), hex("#ffffff80"));
        let [r, g, b, a] = canvas.pixel(0, 0).unwrap();
        assert_eq!((r, g, b, a), (128, 128, 128, 255));
    }

    #[test]
    fn test_line_and_triangle() {
        let mut canvas = Canvas::new(20, 20, hex("#000000"));
        canvas.draw_line(Point::new(0.0, 10.0), Point::new(19.0, 10.0), 1.0, hex("#00ff00"));
        assert_eq!(canvas.pixel(7, 10), Some([0, 255, 0, 255]));
        assert_eq!(canvas.pixel(7, 12), Some([0, 0, 0, 255]));

        canvas.fill_triangle(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            hex("#0000ff"),
        );
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(9, 9), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_draw_image_scales() {
        let mut canvas = Canvas::new(8, 8, hex("#000000"));
        let image = RgbaImage::from_pixel(2, 2, image::Rgba([200, 10, 10, 255]));
        canvas.draw_image(&image, Rect::new(0.0, 0.0, 4.0, 4.0));
        assert_eq!(canvas.pixel(3, 3), Some([200, 10, 10, 255]));
        assert_eq!(canvas.pixel(5, 5), Some([0, 0, 0, 255]));
    }
}

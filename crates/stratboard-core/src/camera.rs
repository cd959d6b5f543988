//! Board viewport: where drops, pastes and "visible" exports land in flow
//! coordinates.

use kurbo::{Point, Rect, Size, Vec2};

/// Zoom range the board's "fit view" stays within.
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;

/// Screen position of the flow origin plus a zoom factor.
///
/// A flow point `p` appears on screen at `offset + p * zoom`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flow coordinates of a point in the viewport.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        ((screen_point.to_vec2() - self.offset) / self.zoom).to_point()
    }

    /// Zoom and pan so `bounds` fills the viewport less `padding` on each
    /// side, centred. An empty board resets to the origin at 100%.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            *self = Self::default();
            return;
        }

        let room_w = (viewport.width - padding * 2.0).max(1.0);
        let room_h = (viewport.height - padding * 2.0).max(1.0);
        self.zoom = (room_w / bounds.width())
            .min(room_h / bounds.height())
            .clamp(MIN_ZOOM, MAX_ZOOM);

        let target = bounds.center().to_vec2() * self.zoom;
        self.offset = Vec2::new(viewport.width / 2.0, viewport.height / 2.0) - target;
    }

    /// The flow-space rectangle covered by a viewport of the given size.
    pub fn visible_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Flow-space point at the centre of the viewport.
    pub fn visible_center(&self, viewport: Size) -> Point {
        self.screen_to_world(Point::new(viewport.width / 2.0, viewport.height / 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let camera = Camera {
            offset: Vec2::new(50.0, 100.0),
            zoom: 2.0,
        };
        let world = camera.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers() {
        let mut camera = Camera::new();
        let bounds = Rect::new(0.0, 0.0, 1000.0, 500.0);
        let viewport = Size::new(1000.0, 800.0);
        camera.fit_to_bounds(bounds, viewport, 100.0);
        assert!((camera.zoom - 0.8).abs() < 1e-9);
        let center = camera.visible_center(viewport);
        assert!((center.x - 500.0).abs() < 1e-9);
        assert!((center.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_bounds_clamps_zoom() {
        let viewport = Size::new(1000.0, 800.0);
        let mut camera = Camera::new();
        camera.fit_to_bounds(Rect::new(0.0, 0.0, 10.0, 10.0), viewport, 0.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
        camera.fit_to_bounds(Rect::new(0.0, 0.0, 100_000.0, 100.0), viewport, 0.0);
        assert_eq!(camera.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_fit_empty_bounds_resets() {
        let mut camera = Camera {
            offset: Vec2::new(10.0, 10.0),
            zoom: 1.7,
        };
        camera.fit_to_bounds(Rect::ZERO, Size::new(800.0, 600.0), 50.0);
        assert_eq!(camera, Camera::new());
    }

    #[test]
    fn test_visible_rect() {
        let camera = Camera {
            offset: Vec2::new(-100.0, -50.0),
            zoom: 1.0,
        };
        let rect = camera.visible_rect(Size::new(800.0, 600.0));
        assert_eq!(rect, Rect::new(100.0, 50.0, 900.0, 650.0));
    }
}

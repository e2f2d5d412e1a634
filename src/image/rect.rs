use std::fmt;

use nalgebra::{Point2, Rotation2, Vector2};

/// An axis-aligned rectangle in pixel coordinates.
///
/// Coordinates are floating-point, so a [`Rect`] can describe sub-pixel positions and sizes.
/// Rectangles are allowed to have zero height and/or width.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect {
    center: Point2<f32>,
    size: Vector2<f32>,
}

impl Rect {
    /// Creates a rectangle extending outwards from a center point.
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            center: Point2::new(x_center, y_center),
            size: Vector2::new(width, height),
        }
    }

    /// Creates a rectangle extending downwards and right from a point.
    pub fn from_top_left(top_left_x: f32, top_left_y: f32, width: f32, height: f32) -> Self {
        Self::from_center(
            top_left_x + width / 2.0,
            top_left_y + height / 2.0,
            width,
            height,
        )
    }

    /// Returns the X coordinate of the left side of the rectangle.
    #[inline]
    pub fn x(&self) -> f32 {
        self.center.x - self.size.x / 2.0
    }

    /// Returns the Y coordinate of the top side of the rectangle.
    #[inline]
    pub fn y(&self) -> f32 {
        self.center.y - self.size.y / 2.0
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        self.center
    }

    #[inline]
    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    /// Returns the rectangle's corners in clockwise order, starting at the top left corner (with
    /// Y pointing down).
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let (x, y) = (self.x(), self.y());
        let (w, h) = (self.width(), self.height());
        [
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ]
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rect @ ({},{})/{}x{}",
            self.x(),
            self.y(),
            self.width(),
            self.height()
        )
    }
}

/// A [`Rect`], rotated around its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    rect: Rect,
    degrees: f32,
}

impl RotatedRect {
    /// Creates a new rotated rectangle.
    ///
    /// `degrees` is applied with the usual rotation matrix directly in image coordinates. Since
    /// image coordinates have Y pointing down, a positive angle rotates the rectangle clockwise on
    /// screen.
    #[inline]
    pub fn new(rect: Rect, degrees: f32) -> Self {
        Self { rect, degrees }
    }

    /// Returns the rotation in degrees.
    #[inline]
    pub fn rotation_degrees(&self) -> f32 {
        self.degrees
    }

    /// Returns the rotation in radians.
    pub fn rotation_radians(&self) -> f32 {
        self.degrees.to_radians()
    }

    /// Returns a reference to the underlying non-rotated rectangle.
    #[inline]
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    #[inline]
    pub fn center(&self) -> Point2<f32> {
        self.rect.center()
    }

    /// Returns the rotated rectangle's corners.
    ///
    /// The order is: bottom-left, top-left, top-right, bottom-right, as seen from the non-rotated
    /// rect. Consecutive corners (wrapping around) are connected by an edge of the rectangle.
    pub fn rotated_corners(&self) -> [Point2<f32>; 4] {
        let half = self.rect.size() / 2.0;
        let rot = Rotation2::new(self.rotation_radians());
        [
            Vector2::new(-half.x, half.y),
            Vector2::new(-half.x, -half.y),
            Vector2::new(half.x, -half.y),
            Vector2::new(half.x, half.y),
        ]
        .map(|offset| self.rect.center() + rot * offset)
    }
}

impl From<Rect> for RotatedRect {
    #[inline]
    fn from(rect: Rect) -> Self {
        Self::new(rect, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn top_left_and_center_agree() {
        let a = Rect::from_top_left(80.0, 90.0, 40.0, 20.0);
        let b = Rect::from_center(100.0, 100.0, 40.0, 20.0);
        assert_eq!(a, b);
        assert_eq!(a.x(), 80.0);
        assert_eq!(a.y(), 90.0);
    }

    #[test]
    fn corners() {
        let rect = Rect::from_top_left(1.0, 2.0, 3.0, 4.0);
        assert_eq!(
            rect.corners(),
            [
                Point2::new(1.0, 2.0),
                Point2::new(4.0, 2.0),
                Point2::new(4.0, 6.0),
                Point2::new(1.0, 6.0),
            ]
        );
    }

    #[test]
    fn unrotated_corners() {
        let rect = RotatedRect::from(Rect::from_center(100.0, 100.0, 40.0, 20.0));
        let [bl, tl, tr, br] = rect.rotated_corners();
        assert_relative_eq!(bl, Point2::new(80.0, 110.0));
        assert_relative_eq!(tl, Point2::new(80.0, 90.0));
        assert_relative_eq!(tr, Point2::new(120.0, 90.0));
        assert_relative_eq!(br, Point2::new(120.0, 110.0));
    }

    #[test]
    fn quarter_turn_swaps_extents() {
        let rect = RotatedRect::new(Rect::from_center(0.0, 0.0, 40.0, 20.0), 90.0);
        let [bl, tl, tr, br] = rect.rotated_corners();
        // With Y pointing down, +90° moves the bottom-left corner to the top-left on screen.
        assert_relative_eq!(bl, Point2::new(-10.0, -20.0), epsilon = 1e-4);
        assert_relative_eq!(tl, Point2::new(10.0, -20.0), epsilon = 1e-4);
        assert_relative_eq!(tr, Point2::new(10.0, 20.0), epsilon = 1e-4);
        assert_relative_eq!(br, Point2::new(-10.0, 20.0), epsilon = 1e-4);
    }
}

//! Drawing primitives.
//!
//! Each function returns a guard that draws the shape when dropped. The guard can be used to
//! customize the shape before that happens:
//!
//! ```
//! # use handview::image::{draw, Color, Image};
//! let mut image = Image::new(32, 32);
//! draw::line(&mut image, 0, 0, 31, 31)
//!     .color(Color::GREEN)
//!     .stroke_width(2);
//! ```
//!
//! Shapes that lie partially or completely outside of the image are clipped.

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
};

use crate::image::{Color, Image};

/// Guard returned by [`line`][line()]; draws the line when dropped and allows customization.
pub struct DrawLine<'a> {
    image: &'a mut Image,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
    color: Color,
    stroke_width: u32,
}

impl<'a> DrawLine<'a> {
    /// Sets the line's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the line's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl<'a> Drop for DrawLine<'a> {
    fn drop(&mut self) {
        // embedded-graphics overflows on lines reaching far outside of the target, so the line is
        // cut down to the image area (plus the stroke) first.
        let margin = i64::from(self.stroke_width) + 1;
        let bounds = ClipRect {
            min_x: -margin,
            min_y: -margin,
            max_x: i64::from(self.image.width()) - 1 + margin,
            max_y: i64::from(self.image.height()) - 1 + margin,
        };
        let Some((start, end)) = bounds.clip_line(
            Point::new(self.start_x, self.start_y),
            Point::new(self.end_x, self.end_y),
        ) else {
            return;
        };

        match Line::new(start, end)
            .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
            .draw(&mut Target(self.image))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`disc`]; draws the filled circle when dropped and allows customization.
pub struct DrawDisc<'a> {
    image: &'a mut Image,
    x: i32,
    y: i32,
    radius: u32,
    color: Color,
}

impl<'a> DrawDisc<'a> {
    /// Sets the disc's fill color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the disc's radius, in pixels.
    ///
    /// A radius of 0 results in a single pixel getting drawn.
    pub fn radius(&mut self, radius: u32) -> &mut Self {
        self.radius = radius;
        self
    }
}

impl<'a> Drop for DrawDisc<'a> {
    fn drop(&mut self) {
        let r = i64::from(self.radius);
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        if x + r < 0
            || y + r < 0
            || x - r >= i64::from(self.image.width())
            || y - r >= i64::from(self.image.height())
        {
            return;
        }

        // A diameter of `2r + 1` keeps the disc centered on the pixel at `(x, y)`.
        match Circle::with_center(Point::new(self.x, self.y), self.radius * 2 + 1)
            .into_styled(PrimitiveStyle::with_fill(self.color))
            .draw(&mut Target(self.image))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Draws a line onto an image.
pub fn line(
    image: &mut Image,
    start_x: i32,
    start_y: i32,
    end_x: i32,
    end_y: i32,
) -> DrawLine<'_> {
    DrawLine {
        image,
        start_x,
        start_y,
        end_x,
        end_y,
        color: Color::from_rgb8(0, 0, 255),
        stroke_width: 1,
    }
}

/// Draws a filled circle centered at `(x, y)` onto an image.
pub fn disc(image: &mut Image, x: i32, y: i32) -> DrawDisc<'_> {
    DrawDisc {
        image,
        x,
        y,
        radius: 2,
        color: Color::RED,
    }
}

/// Inclusive clipping rectangle, in pixels.
struct ClipRect {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl ClipRect {
    /// Clips the line segment from `start` to `end` to this rectangle (Liang-Barsky).
    ///
    /// Returns `None` if no part of the segment lies inside. Endpoints that are already inside are
    /// returned unchanged.
    fn clip_line(&self, start: Point, end: Point) -> Option<(Point, Point)> {
        let (x0, y0) = (f64::from(start.x), f64::from(start.y));
        let (dx, dy) = (f64::from(end.x) - x0, f64::from(end.y) - y0);

        let mut t0 = 0.0f64;
        let mut t1 = 1.0f64;
        for (p, q) in [
            (-dx, x0 - self.min_x as f64),
            (dx, self.max_x as f64 - x0),
            (-dy, y0 - self.min_y as f64),
            (dy, self.max_y as f64 - y0),
        ] {
            if p == 0.0 {
                // Parallel to this edge.
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return None;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return None;
                    }
                    t1 = t1.min(r);
                }
            }
        }

        let at = |t: f64| {
            let x = (x0 + t * dx).round() as i64;
            let y = (y0 + t * dy).round() as i64;
            Point::new(
                x.clamp(self.min_x, self.max_x) as i32,
                y.clamp(self.min_y, self.max_y) as i32,
            )
        };
        let start = if t0 > 0.0 { at(t0) } else { start };
        let end = if t1 < 1.0 { at(t1) } else { end };
        Some((start, end))
    }
}

struct Target<'a>(&'a mut Image);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        let (width, height) = (self.0.width(), self.0.height());

        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size { width, height },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = embedded_graphics::Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && (point.x as u32) < self.0.width()
                && point.y >= 0
                && (point.y as u32) < self.0.height()
            {
                self.0.set(point.x as u32, point.y as u32, color);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECT: ClipRect = ClipRect {
        min_x: -2,
        min_y: -2,
        max_x: 101,
        max_y: 51,
    };

    #[test]
    fn inside_is_unchanged() {
        let (a, b) = (Point::new(3, 4), Point::new(90, 50));
        assert_eq!(RECT.clip_line(a, b), Some((a, b)));
    }

    #[test]
    fn outside_is_dropped() {
        assert_eq!(RECT.clip_line(Point::new(-10, 5), Point::new(-3, 40)), None);
        assert_eq!(RECT.clip_line(Point::new(0, 60), Point::new(100, 60)), None);
        assert_eq!(
            RECT.clip_line(Point::new(i32::MIN, i32::MIN), Point::new(-5, -5)),
            None
        );
    }

    #[test]
    fn crossing_is_cut_at_the_edges() {
        assert_eq!(
            RECT.clip_line(Point::new(10, 20), Point::new(10_000_000, 20)),
            Some((Point::new(10, 20), Point::new(101, 20)))
        );
        assert_eq!(
            RECT.clip_line(Point::new(i32::MIN, 7), Point::new(i32::MAX, 7)),
            Some((Point::new(-2, 7), Point::new(101, 7)))
        );
        assert_eq!(
            RECT.clip_line(Point::new(50, -1000), Point::new(50, 1000)),
            Some((Point::new(50, -2), Point::new(50, 51)))
        );
    }

    #[test]
    fn diagonal_keeps_its_slope() {
        let (a, b) = RECT
            .clip_line(Point::new(-100, -100), Point::new(200, 200))
            .unwrap();
        assert_eq!(a, Point::new(-2, -2));
        assert_eq!(b, Point::new(51, 51));
    }
}

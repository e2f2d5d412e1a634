//! Oriented hand bounding boxes.

use crate::image::{Rect, RotatedRect};

/// A rotated rectangle in normalized image coordinates, describing the region a hand occupies.
///
/// The center and size are fractions of the image width and height, like
/// [`NormalizedPoint`][super::NormalizedPoint]. The rotation is in radians and rotates the box
/// around its center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientedBox {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
}

impl OrientedBox {
    pub fn new(x_center: f32, y_center: f32, width: f32, height: f32, rotation: f32) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
            rotation,
        }
    }

    /// Scales this box to pixel coordinates in an image of size `width x height`.
    ///
    /// The rotation is carried over as-is (converted to degrees). It is not corrected for the
    /// Y axis pointing down in image coordinates.
    pub fn to_pixels(&self, width: u32, height: u32) -> RotatedRect {
        let (w, h) = (width as f32, height as f32);
        let rect = Rect::from_center(
            w * self.x_center,
            h * self.y_center,
            w * self.width,
            h * self.height,
        );
        RotatedRect::new(rect, self.rotation.to_degrees())
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn to_pixels() {
        let rect = OrientedBox::new(0.5, 0.5, 0.2, 0.1, 0.0).to_pixels(200, 200);
        assert_relative_eq!(rect.center().x, 100.0);
        assert_relative_eq!(rect.center().y, 100.0);
        assert_relative_eq!(rect.rect().width(), 40.0);
        assert_relative_eq!(rect.rect().height(), 20.0);
        assert_eq!(rect.rotation_degrees(), 0.0);
    }

    #[test]
    fn non_square_image() {
        let rect = OrientedBox::new(0.25, 0.5, 0.5, 0.5, 0.0).to_pixels(640, 480);
        assert_relative_eq!(rect.center().x, 160.0);
        assert_relative_eq!(rect.center().y, 240.0);
        assert_relative_eq!(rect.rect().width(), 320.0);
        assert_relative_eq!(rect.rect().height(), 240.0);
    }

    #[test]
    fn rotation_in_degrees() {
        let rect = OrientedBox::new(0.5, 0.5, 0.2, 0.1, FRAC_PI_2).to_pixels(200, 200);
        assert_relative_eq!(rect.rotation_degrees(), 90.0);

        let rect = OrientedBox::new(0.5, 0.5, 0.2, 0.1, -PI).to_pixels(200, 200);
        assert_relative_eq!(rect.rotation_degrees(), -180.0);
    }
}

//! Visualization of hand tracking results.
//!
//! Tracking results use normalized coordinates. The functions in this module scale them to the
//! size of the [`Canvas`] they draw on:
//!
//! - Landmark positions are scaled and then *truncated* to integer pixel coordinates.
//! - Bounding boxes are scaled, rotated, and their corners are *rounded* to the nearest pixel.
//!
//! Nothing is clamped: results outside of the frame are drawn (and clipped) where they land.

use itertools::Itertools;

use crate::hand::{OrientedBox, Skeleton};
use crate::image::{draw, Color, Image, Resolution};

/// Color of the lines connecting hand landmarks.
pub const BONE_COLOR: Color = Color::GREEN;
/// Stroke width of the lines connecting hand landmarks.
pub const BONE_WIDTH: u32 = 2;
/// Color of the dots drawn at each hand landmark.
pub const LANDMARK_COLOR: Color = Color::RED;
/// Radius of the dots drawn at each hand landmark.
pub const LANDMARK_RADIUS: u32 = 4;
/// Color of hand bounding boxes.
pub const BOX_COLOR: Color = Color::BLUE;
/// Stroke width of hand bounding boxes.
pub const BOX_WIDTH: u32 = 2;

/// A surface that overlays can be drawn on.
///
/// This is implemented for [`Image`]; other implementations can be used to inspect or redirect
/// the drawing operations.
pub trait Canvas {
    /// Returns the size of the canvas, in pixels.
    fn resolution(&self) -> Resolution;

    /// Draws a straight line between two pixel positions.
    fn line(&mut self, start: (i32, i32), end: (i32, i32), color: Color, width: u32);

    /// Draws a filled circle centered on a pixel position.
    fn disc(&mut self, center: (i32, i32), radius: u32, color: Color);
}

impl Canvas for Image {
    fn resolution(&self) -> Resolution {
        Image::resolution(self)
    }

    fn line(&mut self, start: (i32, i32), end: (i32, i32), color: Color, width: u32) {
        draw::line(self, start.0, start.1, end.0, end.1)
            .color(color)
            .stroke_width(width);
    }

    fn disc(&mut self, center: (i32, i32), radius: u32, color: Color) {
        draw::disc(self, center.0, center.1)
            .radius(radius)
            .color(color);
    }
}

/// Draws hand skeletons: every bone as a green line, then every landmark as a red dot on top.
///
/// Skeletons are drawn in the order they are given.
pub fn draw_skeletons<C: Canvas + ?Sized>(canvas: &mut C, skeletons: &[Skeleton]) {
    let res = canvas.resolution();
    let (w, h) = (res.width(), res.height());

    for skeleton in skeletons {
        for (a, b) in skeleton.bones() {
            canvas.line(a.to_pixel(w, h), b.to_pixel(w, h), BONE_COLOR, BONE_WIDTH);
        }

        for landmark in skeleton.landmarks() {
            canvas.disc(landmark.to_pixel(w, h), LANDMARK_RADIUS, LANDMARK_COLOR);
        }
    }
}

/// Draws the outlines of oriented hand bounding boxes in blue.
pub fn draw_boxes<C: Canvas + ?Sized>(canvas: &mut C, boxes: &[OrientedBox]) {
    let res = canvas.resolution();

    for bbox in boxes {
        let rect = bbox.to_pixels(res.width(), res.height());
        let corners = rect
            .rotated_corners()
            .map(|p| (p.x.round() as i32, p.y.round() as i32));
        for (start, end) in corners.into_iter().circular_tuple_windows().take(4) {
            canvas.line(start, end, BOX_COLOR, BOX_WIDTH);
        }
    }
}

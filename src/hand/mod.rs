//! Hand tracking results.
//!
//! The tracking graph reports, per frame, one [`Skeleton`] and one [`OrientedBox`] for every hand
//! it tracks. Both use normalized coordinates, so they have to be scaled to the frame's resolution
//! before they can be drawn.

mod landmark;
mod rect;

pub use landmark::*;
pub use rect::*;

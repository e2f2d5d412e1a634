//! Live hand tracking overlay.
//!
//! Frames captured from a V4L2 webcam are fed through a prebuilt MediaPipe hand tracking graph,
//! and the resulting hand skeletons and bounding boxes are drawn on top of the frame and shown in
//! a window.
//!
//! # Environment Variables
//!
//! * `HANDVIEW_WEBCAM_NAME`: Forces the device to use for [`Webcam`]s created without an explicit
//!   device name. If unset, the first device that supports a compatible image format will be used.
//! * `HANDVIEW_JPEG_BACKEND`: Configures the JPEG decoder used for webcam frames. Allowed values
//!   are `zune-jpeg` (the default) and `jpeg-decoder`.
//! * `RUST_LOG`: Overrides the log levels set by [`init_logger!`].
//!
//! # Features
//!
//! * `mediapipe`: links against `libmediapipe` and enables [`engine::open`]. Without it, the
//!   program can be built and tested, but not run.
//!
//! [`Webcam`]: video::webcam::Webcam

use log::LevelFilter;

pub mod args;
pub mod engine;
pub mod gui;
pub mod hand;
pub mod image;
pub mod overlay;
pub mod termination;
pub mod timer;
pub mod video;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .filter(Some("wgpu"), LevelFilter::Warn)
        .filter(Some("naga"), LevelFilter::Warn)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and handview will log at *debug* level, `wgpu` and `naga` at *warn* level.
/// `RUST_LOG` is applied on top of that.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}

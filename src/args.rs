//! Command line interface.

use std::{ffi::OsString, path::PathBuf, process};

use clap::{error::ErrorKind, Parser};

use crate::{
    engine::{GraphConfig, HandTrackingOptions},
    image::Resolution,
    video::webcam::{ParamPreference, WebcamOptions},
};

/// Shows live hand tracking results on top of the webcam image.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Directory containing the compiled hand tracking graph and its models.
    #[arg(value_name = "RESOURCE_DIR")]
    pub resource_dir: PathBuf,

    /// Maximum number of hands to track.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(i32).range(1..))]
    pub num_hands: i32,

    /// Landmark model to use (0: lite, 1: full).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i32).range(0..=1))]
    pub model_complexity: i32,

    /// Minimum confidence score of palm detections.
    #[arg(long, default_value_t = 0.6)]
    pub min_detection_score: f32,

    /// Hand presence threshold below which landmarks are discarded.
    #[arg(long, default_value_t = 0.2)]
    pub landmark_threshold: f64,

    /// Run palm detection on every frame instead of following hands found in the previous one.
    #[arg(long)]
    pub no_prev_landmarks: bool,

    /// Name of the webcam to open (overrides `HANDVIEW_WEBCAM_NAME`).
    #[arg(long, value_name = "NAME")]
    pub camera: Option<String>,

    /// Desired webcam frame rate.
    #[arg(long, value_name = "N")]
    pub fps: Option<u32>,

    /// Desired webcam resolution, like `1280x720`.
    #[arg(long, value_name = "WxH")]
    pub resolution: Option<Resolution>,

    /// Give up resolution before frame rate when the webcam cannot deliver both.
    #[arg(long)]
    pub prefer_fps: bool,

    /// Draw tracking results on an empty canvas instead of the camera image.
    #[arg(long)]
    pub blank: bool,
}

impl Args {
    /// Parses the process arguments, exiting on `--help`, `--version` or invalid usage.
    pub fn parse_or_exit() -> Self {
        Self::parse_from_or_exit(std::env::args_os())
    }

    /// Parses `args`, exiting on `--help`, `--version` or invalid usage.
    ///
    /// Help and version output exit with code 0, usage errors with code 1.
    pub fn parse_from_or_exit<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(args) => args,
            Err(e) => {
                e.print().ok();
                process::exit(exit_code(&e));
            }
        }
    }

    pub fn hand_tracking_options(&self) -> HandTrackingOptions {
        HandTrackingOptions::default()
            .num_hands(self.num_hands)
            .model_complexity(self.model_complexity)
            .min_detection_score(self.min_detection_score)
            .landmark_threshold(self.landmark_threshold)
            .use_prev_landmarks(!self.no_prev_landmarks)
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig::hand_tracking(&self.resource_dir, &self.hand_tracking_options())
    }

    pub fn webcam_options(&self) -> WebcamOptions {
        let mut options = WebcamOptions::default();
        if let Some(name) = &self.camera {
            options = options.name(name);
        }
        if let Some(fps) = self.fps {
            options = options.fps(fps);
        }
        if let Some(resolution) = self.resolution {
            options = options.resolution(resolution);
        }
        if self.prefer_fps {
            options = options.prefer(ParamPreference::Framerate);
        }
        options
    }
}

fn exit_code(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

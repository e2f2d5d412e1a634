//! Hand tracking through an external graph execution engine.
//!
//! The engine itself is a black box: it is configured once from a [`GraphConfig`], receives one
//! frame at a time via [`Engine::process`], and delivers its results through named output streams
//! that can be polled.
//!
//! [`HandTracker`] drives an [`Engine`] through one frame of the hand tracking graph and collects
//! the results into a [`HandFrame`].
//!
//! The only engine implementation is the MediaPipe C API, which is only available when the
//! `mediapipe` feature is enabled.

mod config;
#[cfg(feature = "mediapipe")]
mod mediapipe;

use anyhow::Context;

use crate::{
    hand::{OrientedBox, Skeleton},
    image::Image,
    overlay::{self, Canvas},
    timer::Timer,
};

pub use config::*;
#[cfg(feature = "mediapipe")]
pub use mediapipe::MediaPipe;

/// Output stream of the hand tracking graph carrying the landmarks of every tracked hand.
pub const LANDMARKS_STREAM: &str = "multi_hand_landmarks";

/// Output stream of the hand tracking graph carrying the oriented bounding box of every hand.
pub const RECTS_STREAM: &str = "hand_rects";

/// Interface to a running graph.
///
/// All methods block until the engine has completed the request.
pub trait Engine {
    /// Submits a frame to the graph's input stream.
    fn process(&mut self, image: &Image) -> anyhow::Result<()>;

    /// Waits until the graph has finished processing every submitted frame.
    fn wait_until_idle(&mut self) -> anyhow::Result<()>;

    /// Returns the number of packets waiting in an output stream.
    fn queue_size(&mut self, stream: &str) -> anyhow::Result<usize>;

    /// Takes the next packet of hand landmarks from an output stream.
    ///
    /// Returns `None` when the engine has no packet to hand out.
    fn poll_landmarks(&mut self, stream: &str) -> anyhow::Result<Option<Vec<Skeleton>>>;

    /// Takes the next packet of oriented boxes from an output stream.
    ///
    /// Returns `None` when the engine has no packet to hand out.
    fn poll_rects(&mut self, stream: &str) -> anyhow::Result<Option<Vec<OrientedBox>>>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn process(&mut self, image: &Image) -> anyhow::Result<()> {
        (**self).process(image)
    }

    fn wait_until_idle(&mut self) -> anyhow::Result<()> {
        (**self).wait_until_idle()
    }

    fn queue_size(&mut self, stream: &str) -> anyhow::Result<usize> {
        (**self).queue_size(stream)
    }

    fn poll_landmarks(&mut self, stream: &str) -> anyhow::Result<Option<Vec<Skeleton>>> {
        (**self).poll_landmarks(stream)
    }

    fn poll_rects(&mut self, stream: &str) -> anyhow::Result<Option<Vec<OrientedBox>>> {
        (**self).poll_rects(stream)
    }
}

/// Instantiates and starts the graph described by `config` with the MediaPipe engine.
///
/// The graph's [`LANDMARKS_STREAM`] and [`RECTS_STREAM`] outputs are made available for polling.
#[cfg(feature = "mediapipe")]
pub fn open(config: &GraphConfig) -> anyhow::Result<Box<dyn Engine>> {
    let engine = MediaPipe::start(config, &[LANDMARKS_STREAM, RECTS_STREAM])?;
    Ok(Box::new(engine))
}

/// Instantiates and starts the graph described by `config`.
///
/// This build has no engine, so this always returns an error (after validating `config`).
#[cfg(not(feature = "mediapipe"))]
pub fn open(config: &GraphConfig) -> anyhow::Result<Box<dyn Engine>> {
    config.check()?;
    anyhow::bail!(
        "no inference engine available: handview was built without the `mediapipe` feature"
    )
}

/// Results of running the hand tracking graph on a single frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandFrame {
    pub skeletons: Vec<Skeleton>,
    pub boxes: Vec<OrientedBox>,
}

impl HandFrame {
    /// Returns whether no hand was found in the frame.
    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty() && self.boxes.is_empty()
    }

    /// Draws all skeletons, then all bounding boxes onto `canvas`.
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        overlay::draw_skeletons(canvas, &self.skeletons);
        overlay::draw_boxes(canvas, &self.boxes);
    }
}

/// Runs frames through the hand tracking graph, one at a time.
pub struct HandTracker<E> {
    engine: E,
    t_process: Timer,
    t_wait: Timer,
    t_poll: Timer,
}

impl<E: Engine> HandTracker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            t_process: Timer::new("process"),
            t_wait: Timer::new("wait"),
            t_poll: Timer::new("poll"),
        }
    }

    /// Submits `image`, waits for the graph to finish processing it and collects the results.
    ///
    /// An output stream is only polled when it has packets queued, so a frame without hands
    /// yields an empty [`HandFrame`].
    pub fn track(&mut self, image: &Image) -> anyhow::Result<HandFrame> {
        self.t_process
            .time(|| self.engine.process(image))
            .context("failed to submit frame to the graph")?;
        self.t_wait
            .time(|| self.engine.wait_until_idle())
            .context("failed to wait for the graph to become idle")?;

        let _guard = self.t_poll.start();
        let mut frame = HandFrame::default();
        if self.engine.queue_size(LANDMARKS_STREAM)? > 0 {
            frame.skeletons = self
                .engine
                .poll_landmarks(LANDMARKS_STREAM)
                .with_context(|| format!("failed to poll `{LANDMARKS_STREAM}`"))?
                .unwrap_or_default();
        }
        if self.engine.queue_size(RECTS_STREAM)? > 0 {
            frame.boxes = self
                .engine
                .poll_rects(RECTS_STREAM)
                .with_context(|| format!("failed to poll `{RECTS_STREAM}`"))?
                .unwrap_or_default();
        }

        Ok(frame)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns profiling timers for the engine stages.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_process, &self.t_wait, &self.t_poll].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::bail;

    use super::*;
    use crate::hand::NormalizedPoint;
    use crate::image::Color;

    /// Replays canned results and records every call it receives.
    #[derive(Default)]
    struct Scripted {
        calls: Vec<String>,
        landmarks: VecDeque<Vec<Skeleton>>,
        rects: VecDeque<Vec<OrientedBox>>,
        fail_process: bool,
        fail_wait: bool,
    }

    impl Engine for Scripted {
        fn process(&mut self, image: &Image) -> anyhow::Result<()> {
            self.calls.push(format!("process {:?}", image.resolution()));
            if self.fail_process {
                bail!("[MediaPipe] process failed");
            }
            Ok(())
        }

        fn wait_until_idle(&mut self) -> anyhow::Result<()> {
            self.calls.push("wait".into());
            if self.fail_wait {
                bail!("[MediaPipe] wait failed");
            }
            Ok(())
        }

        fn queue_size(&mut self, stream: &str) -> anyhow::Result<usize> {
            self.calls.push(format!("size {stream}"));
            Ok(match stream {
                LANDMARKS_STREAM => self.landmarks.len(),
                RECTS_STREAM => self.rects.len(),
                _ => bail!("unknown stream `{stream}`"),
            })
        }

        fn poll_landmarks(&mut self, stream: &str) -> anyhow::Result<Option<Vec<Skeleton>>> {
            self.calls.push(format!("poll {stream}"));
            Ok(self.landmarks.pop_front())
        }

        fn poll_rects(&mut self, stream: &str) -> anyhow::Result<Option<Vec<OrientedBox>>> {
            self.calls.push(format!("poll {stream}"));
            Ok(self.rects.pop_front())
        }
    }

    fn hand() -> Skeleton {
        Skeleton::splat(NormalizedPoint::new(0.5, 0.5))
    }

    fn hand_box() -> OrientedBox {
        OrientedBox::new(0.5, 0.5, 0.2, 0.1, 0.0)
    }

    #[test]
    fn empty_queues_are_not_polled() {
        let mut tracker = HandTracker::new(Scripted::default());
        let frame = tracker.track(&Image::new(4, 3)).unwrap();

        assert!(frame.is_empty());
        assert_eq!(
            tracker.engine().calls,
            [
                "process 4x3",
                "wait",
                "size multi_hand_landmarks",
                "size hand_rects",
            ]
        );
    }

    #[test]
    fn collects_both_streams() {
        let mut tracker = HandTracker::new(Scripted {
            landmarks: [vec![hand(), hand()]].into(),
            rects: [vec![hand_box()]].into(),
            ..Scripted::default()
        });
        let frame = tracker.track(&Image::new(4, 3)).unwrap();

        assert_eq!(frame.skeletons, [hand(), hand()]);
        assert_eq!(frame.boxes, [hand_box()]);
        assert_eq!(
            tracker.engine().calls,
            [
                "process 4x3",
                "wait",
                "size multi_hand_landmarks",
                "poll multi_hand_landmarks",
                "size hand_rects",
                "poll hand_rects",
            ]
        );

        // Queues are drained now.
        let frame = tracker.track(&Image::new(4, 3)).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn only_landmarks_queued() {
        let mut tracker = HandTracker::new(Scripted {
            landmarks: [vec![hand()]].into(),
            ..Scripted::default()
        });
        let frame = tracker.track(&Image::new(4, 3)).unwrap();

        assert_eq!(frame.skeletons.len(), 1);
        assert!(frame.boxes.is_empty());
    }

    #[test]
    fn process_failure_stops_frame() {
        let mut tracker = HandTracker::new(Scripted {
            fail_process: true,
            ..Scripted::default()
        });
        let err = tracker.track(&Image::new(4, 3)).unwrap_err();

        assert_eq!(err.to_string(), "failed to submit frame to the graph");
        assert!(format!("{err:#}").contains("[MediaPipe] process failed"));
        assert_eq!(tracker.engine().calls, ["process 4x3"]);
    }

    #[test]
    fn wait_failure_stops_frame() {
        let mut tracker = HandTracker::new(Scripted {
            fail_wait: true,
            landmarks: [vec![hand()]].into(),
            ..Scripted::default()
        });
        tracker.track(&Image::new(4, 3)).unwrap_err();
        assert_eq!(tracker.engine().calls, ["process 4x3", "wait"]);
    }

    #[test]
    fn boxed_engine() {
        let engine: Box<dyn Engine> = Box::new(Scripted {
            rects: [vec![hand_box()]].into(),
            ..Scripted::default()
        });
        let mut tracker = HandTracker::new(engine);
        let frame = tracker.track(&Image::new(4, 3)).unwrap();
        assert_eq!(frame.boxes, [hand_box()]);
    }

    #[test]
    fn timers() {
        let tracker = HandTracker::new(Scripted::default());
        let names = tracker.timers().map(|t| t.name()).collect::<Vec<_>>();
        assert_eq!(names, ["process", "wait", "poll"]);
    }

    #[test]
    fn draw_frame() {
        let frame = HandFrame {
            skeletons: vec![hand()],
            boxes: vec![hand_box()],
        };
        let mut image = Image::new(200, 200);
        frame.draw(&mut image);

        assert_eq!(image.get(100, 100), Color::RED);
        assert_eq!(image.get(80, 100), Color::BLUE);
        assert_eq!(image.get(0, 0), Color::NULL);
    }

    #[cfg(not(feature = "mediapipe"))]
    #[test]
    fn open_without_engine() {
        let config = GraphConfig::new(env!("CARGO_MANIFEST_DIR"), "Cargo.toml", "image");
        let err = open(&config).err().unwrap().to_string();
        assert!(err.contains("`mediapipe` feature"), "{err}");

        let config = GraphConfig::hand_tracking("/does/not/exist", &Default::default());
        let err = open(&config).err().unwrap().to_string();
        assert!(err.contains("resource directory"), "{err}");
    }
}

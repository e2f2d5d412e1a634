//! V4L2 webcam access.
//!
//! Only V4L2 `VIDEO_CAPTURE` devices yielding JFIF JPEG or Motion JPEG frames are supported.

use std::{cmp::Reverse, env};

use anyhow::bail;
use linuxvideo::{
    format::{FrameIntervals, FrameSizes, PixFormat, PixelFormat},
    stream::ReadStream,
    BufType, CapabilityFlags, Device, Fract,
};

use crate::image::{Image, Resolution};
use crate::timer::Timer;

/// Environment variable that forces the device to open when none is named explicitly.
pub const ENV_VAR_WEBCAM_NAME: &str = "HANDVIEW_WEBCAM_NAME";

/// Indicates whether to prefer a higher resolution or frame rate.
///
/// By default, [`ParamPreference::Resolution`] is used, selecting the maximum resolution at the
/// desired frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamPreference {
    /// Prefer increased resolution over higher frame rates.
    #[default]
    Resolution,
    /// Prefer higher frame rate over higher image resolution.
    Framerate,
}

#[derive(Debug, Default, Clone, Copy)]
struct FramePrefs {
    resolution: Option<Resolution>,
    fps: Option<u32>,
    pref: ParamPreference,
}

/// Format negotiation options.
#[derive(Debug, Default)]
pub struct WebcamOptions {
    name: Option<String>,
    frame: FramePrefs,
}

impl WebcamOptions {
    /// Sets the name of the webcam device to open.
    ///
    /// If no webcam with the given name can be found, opening the webcam will result in an error.
    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the desired image resolution.
    ///
    /// A lower resolution might be selected if the webcam cannot deliver the desired resolution.
    #[inline]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.frame.resolution = Some(resolution);
        self
    }

    /// Sets the desired frame rate.
    ///
    /// A lower frame rate might be selected if the webcam cannot deliver the desired frame rate.
    #[inline]
    pub fn fps(mut self, fps: u32) -> Self {
        self.frame.fps = Some(fps);
        self
    }

    /// Selects whether to prefer a higher resolution or frame rate.
    ///
    /// When the camera cannot deliver the desired frame rate and resolution, this controls which
    /// constraint is given up first.
    #[inline]
    pub fn prefer(mut self, pref: ParamPreference) -> Self {
        self.frame.pref = pref;
        self
    }
}

#[derive(Clone, Copy)]
struct FrameFormat {
    resolution: Resolution,
    frame_interval: Fract,
}

fn negotiate_format(device: &Device, prefs: FramePrefs) -> anyhow::Result<(PixFormat, Fract)> {
    let mut pixel_format = None;
    for format in device.formats(BufType::VIDEO_CAPTURE) {
        let format = format?;
        let fourcc = format.pixel_format();
        if fourcc == PixelFormat::JPEG || fourcc == PixelFormat::MJPG {
            pixel_format = Some(fourcc);
            break;
        }
    }

    let Some(pixel_format) = pixel_format else {
        bail!("no supported pixel format found");
    };

    let mut formats = Vec::new();
    match device.frame_sizes(pixel_format)? {
        FrameSizes::Discrete(sizes) => {
            for size in sizes {
                let intervals =
                    match device.frame_intervals(pixel_format, size.width(), size.height())? {
                        FrameIntervals::Discrete(intervals) => intervals,
                        FrameIntervals::Stepwise(_) | FrameIntervals::Continuous(_) => {
                            bail!("stepwise or continuous frame rates are not supported")
                        }
                    };
                for rate in intervals {
                    formats.push(FrameFormat {
                        resolution: Resolution::new(size.width(), size.height()),
                        frame_interval: *rate.fract(),
                    });
                }
            }
        }
        FrameSizes::Stepwise(_) | FrameSizes::Continuous(_) => {
            bail!("stepwise or continuous resolutions are not supported");
        }
    }

    let Some(fmt) = select_format(&formats, prefs) else {
        bail!("failed to negotiate a webcam format");
    };
    Ok((
        PixFormat::new(
            fmt.resolution.width(),
            fmt.resolution.height(),
            pixel_format,
        ),
        fmt.frame_interval,
    ))
}

/// Picks the best of `formats`, dropping constraints from `prefs` until one is eligible.
///
/// The constraint that is *not* preferred is dropped first.
fn select_format(formats: &[FrameFormat], mut prefs: FramePrefs) -> Option<FrameFormat> {
    loop {
        if let Some(fmt) = select_format_step(formats, prefs) {
            return Some(fmt);
        }

        log::debug!("failed to negotiate format with prefs {:?}", prefs);
        match prefs.pref {
            ParamPreference::Resolution => {
                if prefs.fps.take().is_none() && prefs.resolution.take().is_none() {
                    return None;
                }
            }
            ParamPreference::Framerate => {
                if prefs.resolution.take().is_none() && prefs.fps.take().is_none() {
                    return None;
                }
            }
        }
        log::debug!("retrying with new prefs {:?}", prefs);
    }
}

fn select_format_step(formats: &[FrameFormat], prefs: FramePrefs) -> Option<FrameFormat> {
    let mut eligible = formats
        .iter()
        .filter(|fmt| {
            prefs.resolution.map_or(true, |res| {
                fmt.resolution.width() >= res.width() && fmt.resolution.height() >= res.height()
            }) && prefs.fps.map_or(true, |fps| {
                (1.0 / fmt.frame_interval.as_f32()).round() >= fps as f32
            })
        })
        .copied()
        .collect::<Vec<_>>();
    match prefs.pref {
        ParamPreference::Resolution => {
            eligible.sort_by_key(|fmt| (fmt.resolution.num_pixels(), Reverse(fmt.frame_interval)))
        }
        ParamPreference::Framerate => {
            eligible.sort_by_key(|fmt| (Reverse(fmt.frame_interval), fmt.resolution.num_pixels()))
        }
    }
    eligible.last().copied()
}

/// A webcam yielding a stream of [`Image`]s.
pub struct Webcam {
    stream: ReadStream,
    resolution: Resolution,
    t_dequeue: Timer,
    t_decode: Timer,
}

impl Webcam {
    /// Opens the first supported webcam found.
    ///
    /// The device named in [`WebcamOptions::name`] (or, failing that, in the
    /// `HANDVIEW_WEBCAM_NAME` environment variable) is opened instead, if set.
    ///
    /// This function can block for a significant amount of time while the webcam initializes (on
    /// the order of hundreds of milliseconds).
    pub fn open(options: WebcamOptions) -> anyhow::Result<Self> {
        let name = options.name.clone().or_else(|| env::var(ENV_VAR_WEBCAM_NAME).ok());
        if let Some(name) = &name {
            log::debug!("looking for webcam '{name}'");
        }

        for res in linuxvideo::list()? {
            match res {
                Ok(dev) => match Self::open_impl(dev, name.as_deref(), options.frame) {
                    Ok(Some(webcam)) => return Ok(webcam),
                    Ok(None) => {}
                    Err(e) => {
                        log::debug!("{}", e);
                    }
                },
                Err(e) => {
                    log::warn!("{}", e);
                }
            }
        }

        match name {
            Some(name) => bail!("webcam '{name}' not found"),
            None => bail!("no supported webcam device found"),
        }
    }

    fn open_impl(
        dev: Device,
        name: Option<&str>,
        prefs: FramePrefs,
    ) -> anyhow::Result<Option<Self>> {
        let caps = dev.capabilities()?;
        if let Some(name) = name {
            if caps.card() != name {
                return Ok(None);
            }
        }

        let cap_flags = caps.device_capabilities();
        let path = dev.path()?;
        log::debug!(
            "device {} ({}) capabilities: {:?}",
            caps.card(),
            path.display(),
            cap_flags,
        );

        if !cap_flags.contains(CapabilityFlags::VIDEO_CAPTURE) {
            return Ok(None);
        }

        let (pixfmt, fract) = negotiate_format(&dev, prefs)?;

        let capture = dev.video_capture(pixfmt)?;

        let format = capture.format();
        let resolution = Resolution::new(format.width(), format.height());

        let actual = capture.set_frame_interval(fract)?;

        log::info!(
            "opened {} ({}), {} @ {:.1}Hz",
            caps.card(),
            path.display(),
            resolution,
            1.0 / actual.as_f32(),
        );

        let stream = capture.into_stream()?;

        Ok(Some(Self {
            stream,
            resolution,
            t_dequeue: Timer::new("dequeue"),
            t_decode: Timer::new("decode"),
        }))
    }

    /// Returns the size of the frames this webcam produces.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Reads the next frame from the camera.
    ///
    /// If no frame is available, this method will block until one is. An error means that the
    /// stream has ended; corrupted frames are replaced by a blank image instead.
    pub fn read(&mut self) -> anyhow::Result<Image> {
        let dequeue_guard = self.t_dequeue.start();
        let resolution = self.resolution;
        let t_decode = &self.t_decode;
        self.stream
            .dequeue(|buf| {
                drop(dequeue_guard);
                let image = match t_decode.time(|| Image::decode_jpeg(&buf)) {
                    Ok(image) => image,
                    Err(e) => {
                        // Even good webcams produce the occasional corrupted MJPG frame. Skipping
                        // it would cause a latency spike, so hand back a blank image.
                        log::error!("webcam decode error: {}", e);
                        Image::new(resolution.width(), resolution.height())
                    }
                };
                Ok(image)
            })
            .map_err(Into::into)
    }

    /// Returns profiling timers for webcam access and decoding.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_dequeue, &self.t_decode].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(width: u32, height: u32, fps: u32) -> FrameFormat {
        FrameFormat {
            resolution: Resolution::new(width, height),
            frame_interval: Fract::new(1, fps),
        }
    }

    fn formats() -> Vec<FrameFormat> {
        vec![
            fmt(640, 480, 30),
            fmt(640, 480, 60),
            fmt(1280, 720, 30),
            fmt(1920, 1080, 15),
        ]
    }

    fn prefs(resolution: Option<Resolution>, fps: Option<u32>, pref: ParamPreference) -> FramePrefs {
        FramePrefs {
            resolution,
            fps,
            pref,
        }
    }

    /// Runs format selection and returns the chosen resolution and frame rate.
    fn select(formats: &[FrameFormat], prefs: FramePrefs) -> Option<(Resolution, u32)> {
        select_format(formats, prefs).map(|fmt| {
            let fps = (1.0 / fmt.frame_interval.as_f32()).round() as u32;
            (fmt.resolution, fps)
        })
    }

    #[test]
    fn no_constraints() {
        let formats = formats();
        assert_eq!(
            select(&formats, prefs(None, None, ParamPreference::Resolution)),
            Some((Resolution::new(1920, 1080), 15))
        );
        assert_eq!(
            select(&formats, prefs(None, None, ParamPreference::Framerate)),
            Some((Resolution::new(640, 480), 60))
        );
    }

    #[test]
    fn max_resolution_at_fps() {
        let formats = formats();
        assert_eq!(
            select(&formats, prefs(None, Some(30), ParamPreference::Resolution)),
            Some((Resolution::new(1280, 720), 30))
        );
    }

    #[test]
    fn max_fps_at_resolution() {
        let formats = formats();
        assert_eq!(
            select(
                &formats,
                prefs(Some(Resolution::RES_720P), None, ParamPreference::Framerate)
            ),
            Some((Resolution::new(1280, 720), 30))
        );
    }

    #[test]
    fn drops_fps_first() {
        let formats = formats();
        assert_eq!(
            select(
                &formats,
                prefs(Some(Resolution::RES_1080P), Some(30), ParamPreference::Resolution)
            ),
            Some((Resolution::new(1920, 1080), 15))
        );
    }

    #[test]
    fn drops_resolution_first() {
        let formats = formats();
        assert_eq!(
            select(
                &formats,
                prefs(Some(Resolution::RES_1080P), Some(30), ParamPreference::Framerate)
            ),
            Some((Resolution::new(640, 480), 60))
        );
    }

    #[test]
    fn nothing_available() {
        assert_eq!(
            select(&[], prefs(None, Some(30), ParamPreference::Resolution)),
            None
        );
    }

    #[test]
    fn options_feed_selection() {
        let options = WebcamOptions::default()
            .resolution(Resolution::RES_1080P)
            .fps(30)
            .prefer(ParamPreference::Framerate);
        assert_eq!(options.name, None);
        assert_eq!(
            select(&formats(), options.frame),
            Some((Resolution::new(640, 480), 60))
        );

        let options = WebcamOptions::default().name("cam").resolution(Resolution::RES_1080P);
        assert_eq!(options.name.as_deref(), Some("cam"));
        assert_eq!(options.frame.pref, ParamPreference::Resolution);
        assert_eq!(
            select(&formats(), options.frame),
            Some((Resolution::new(1920, 1080), 15))
        );
    }
}

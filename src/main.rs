use std::time::Duration;

use anyhow::Context;
use handview::{
    args::Args,
    engine::{self, HandTracker},
    gui,
    image::{Color, Image},
    timer::{FpsCounter, Timer},
    video::webcam::Webcam,
};

const WINDOW_TITLE: &str = "MediaPipe";

fn main() {
    let args = Args::parse_or_exit();
    handview::init_logger!();

    gui::run(move || run(args));
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut webcam = Webcam::open(args.webcam_options()).context("failed to open webcam")?;

    let config = args.graph_config();
    let engine = engine::open(&config).context("failed to start hand tracking")?;
    let mut tracker = HandTracker::new(engine);

    let mut canvas = Image::new(webcam.resolution().width(), webcam.resolution().height());
    let mut fps = FpsCounter::new("hand tracking");
    let t_draw = Timer::new("draw");

    loop {
        let image = match webcam.read() {
            Ok(image) => image,
            Err(e) => {
                log::info!("capture stream ended: {e}");
                break;
            }
        };

        let hands = tracker.track(&image)?;

        t_draw.time(|| {
            if args.blank {
                if canvas.resolution() != image.resolution() {
                    canvas = Image::new(image.width(), image.height());
                }
                canvas.clear(Color::BLACK);
            } else {
                canvas = image;
            }
            hands.draw(&mut canvas);
        });

        gui::show_image(WINDOW_TITLE, &canvas)?;

        fps.tick_with(
            webcam
                .timers()
                .chain(tracker.timers())
                .chain([&t_draw]),
        );

        if let Some(key) = gui::wait_key(Duration::from_millis(1))? {
            if key.is_quit() {
                log::debug!("{key:?} pressed, exiting");
                break;
            }
        }
    }

    Ok(())
}

//! Performance measurement tools.

use std::{
    cell::Cell,
    fmt::{self, Arguments},
    time::{Duration, Instant},
};

/// Smoothing factor of the exponential moving average used by [`Timer`].
const EMA_ALPHA: f32 = 0.3;

/// A timer that can measure and average the time an operation takes.
///
/// Collected timings are averaged and reset when the timer is displayed using `{}`
/// ([`std::fmt::Display`]).
pub struct Timer {
    name: &'static str,
    stats: Cell<Stats>,
}

#[derive(Clone, Copy, Default)]
struct Stats {
    /// The current average time, in seconds. `None` until the first measurement.
    avg: Option<f32>,
    /// The number of time measurements that contributed to the current `avg`.
    count: usize,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stats: Cell::new(Stats::default()),
        }
    }

    /// Returns the name this timer was created with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&self, timee: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        timee()
    }

    /// Starts timing an operation using a drop guard.
    ///
    /// When the returned [`TimerGuard`] is dropped, the time between the call to `start` and the
    /// drop is measured and recorded.
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn record(&self, duration: Duration) {
        let secs = duration.as_secs_f32();
        let mut stats = self.stats.get();
        stats.avg = Some(match stats.avg {
            Some(avg) => avg + EMA_ALPHA * (secs - avg),
            None => secs,
        });
        stats.count += 1;
        self.stats.set(stats);
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats.take();
        let avg_ms = stats.avg.unwrap_or(0.0) * 1000.0;
        let len = stats.count;

        write!(f, "{}: {len}x{avg_ms:.01}ms", self.name)
    }
}

/// Guard returned by [`Timer::start`]. Stops timing the operation when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Logs frames per second with optional extra data.
pub struct FpsCounter {
    name: String,
    frames: u32,
    start: Instant,
}

impl FpsCounter {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            start: Instant::now(),
        }
    }

    /// Advances the frame counter by 1 and logs FPS and `extra` data if one second has passed.
    ///
    /// `extra` is only evaluated when something is logged.
    pub fn tick_with<D: fmt::Display, I: IntoIterator<Item = D>>(&mut self, extra: I) {
        struct DisplayExtra<D: fmt::Display, I: Iterator<Item = D>>(Cell<Option<I>>);

        impl<D: fmt::Display, I: Iterator<Item = D>> fmt::Display for DisplayExtra<D, I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let Some(mut iter) = self.0.take() else {
                    return Ok(());
                };
                if let Some(item) = iter.next() {
                    write!(f, " ({item}")?;
                    for item in iter {
                        write!(f, ", {item}")?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
        }

        self.tick_impl(format_args!(
            "{}",
            DisplayExtra(Cell::new(Some(extra.into_iter())))
        ));
    }

    fn tick_impl(&mut self, args: Arguments<'_>) {
        self.frames += 1;
        if self.start.elapsed() > Duration::from_secs(1) {
            log::debug!("{}: {} FPS{}", self.name, self.frames, args);

            self.frames = 0;
            self.start = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_resets() {
        let timer = Timer::new("work");
        timer.time(|| ());
        timer.record(Duration::from_millis(10));
        let text = timer.to_string();
        assert!(text.starts_with("work: 2x"), "{text}");
        assert_eq!(timer.to_string(), "work: 0x0.0ms");
    }

    #[test]
    fn first_measurement_is_the_average() {
        let timer = Timer::new("t");
        timer.record(Duration::from_millis(20));
        assert_eq!(timer.to_string(), "t: 1x20.0ms");
    }

    #[test]
    fn time_returns_value() {
        let timer = Timer::new("t");
        assert_eq!(timer.time(|| 42), 42);
        assert_eq!(timer.name(), "t");
    }
}

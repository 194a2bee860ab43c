//! Pause/resume stopwatch, grounded directly in
//! `examples/original_source/src/search/utils/stopwatch.{h,cc}`. The trick
//! (`continueTime` shifting the start point forward by the paused interval)
//! is what keeps equivalence-class rebuild time off the search budget
//! (spec.md §4.4/§5).

use std::time::{Duration, Instant};

pub struct Stopwatch {
    start: Instant,
    stopped_at: Option<Instant>,
    paused: Duration,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            stopped_at: None,
            paused: Duration::ZERO,
        }
    }

    /// restart both the clock and the paused-time counter.
    pub fn reset(&mut self) {
        self.start = Instant::now();
        self.stopped_at = None;
        self.paused = Duration::ZERO;
    }

    /// mark "now" as the moment a pause begins.
    pub fn save(&mut self) {
        self.stopped_at = Some(Instant::now());
    }

    /// end the pause: excise the elapsed-since-`save` interval from future
    /// readings by shifting `start` forward, the same arithmetic as
    /// `Stopwatch::continueTime` in the original.
    pub fn resume(&mut self) {
        if let Some(stopped_at) = self.stopped_at.take() {
            let elapsed = Instant::now().saturating_duration_since(stopped_at);
            self.start += elapsed;
            self.paused += elapsed;
        }
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.start)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// observability counter: total time excised by save/resume pairs this
    /// round (spec.md §4.4).
    pub fn paused_time(&self) -> Duration {
        self.paused
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn pause_excises_elapsed_time() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(5));
        sw.save();
        sleep(Duration::from_millis(20));
        sw.resume();
        let elapsed = sw.elapsed_secs();
        assert!(elapsed < 0.015, "elapsed {elapsed} should exclude the pause");
        assert!(sw.paused_time() >= Duration::from_millis(15));
    }
}

//! Cancellable step-by-step playback.
//!
//! Demos animate their results one step at a time with a fixed delay in
//! between. The liveness flag is checked before every step and again after
//! every delay, so a stop request (pause, reset, closing the demo) halts the
//! sequence without touching state afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::PlaybackConfig;

/// Source of the delay between steps.
pub trait Ticker {
    fn wait(&mut self, delay: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTicker;

impl Ticker for ThreadTicker {
    fn wait(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

impl<F: FnMut(Duration)> Ticker for F {
    fn wait(&mut self, delay: Duration) {
        self(delay)
    }
}

/// Shared liveness flag of a playback.
#[derive(Debug, Clone, Default)]
pub struct PlaybackHandle {
    playing: Arc<AtomicBool>,
}

impl PlaybackHandle {
    /// Requests the playback to stop at its next check.
    pub fn stop(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn arm(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished { steps: usize },
    Cancelled { completed: usize },
}

impl PlaybackOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Playback {
    handle: PlaybackHandle,
    delay: Duration,
}

impl Default for Playback {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

impl Playback {
    pub fn new(delay: Duration) -> Self {
        Self {
            handle: PlaybackHandle::default(),
            delay,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(Duration::from_millis(config.step_delay_ms))
    }

    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }

    /// Runs `step(i)` for `i` in `0..total`, waiting between steps.
    ///
    /// Starting a run re-arms the flag. No delay follows the last step.
    pub fn run(
        &self,
        total: usize,
        ticker: &mut impl Ticker,
        mut step: impl FnMut(usize),
    ) -> PlaybackOutcome {
        self.handle.arm();
        for i in 0..total {
            if !self.handle.is_playing() {
                debug!(completed = i, total, "playback cancelled");
                return PlaybackOutcome::Cancelled { completed: i };
            }
            step(i);
            if i + 1 < total {
                ticker.wait(self.delay);
                if !self.handle.is_playing() {
                    debug!(completed = i + 1, total, "playback cancelled");
                    return PlaybackOutcome::Cancelled { completed: i + 1 };
                }
            }
        }
        self.handle.stop();
        PlaybackOutcome::Finished { steps: total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_every_step() {
        let playback = Playback::new(Duration::from_millis(5));
        let mut waits = 0;
        let mut ticker = |_: Duration| waits += 1;
        let mut seen = Vec::new();
        let outcome = playback.run(4, &mut ticker, |i| seen.push(i));
        assert_eq!(outcome, PlaybackOutcome::Finished { steps: 4 });
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(waits, 3);
        assert!(!playback.is_playing());
    }

    #[test]
    fn test_stop_during_delay_halts_before_next_step() {
        let playback = Playback::new(Duration::ZERO);
        let handle = playback.handle();
        let mut waits = 0;
        let mut ticker = |_: Duration| {
            waits += 1;
            if waits == 2 {
                handle.stop();
            }
        };
        let mut seen = Vec::new();
        let outcome = playback.run(5, &mut ticker, |i| seen.push(i));
        assert_eq!(outcome, PlaybackOutcome::Cancelled { completed: 2 });
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_stop_inside_step() {
        let playback = Playback::new(Duration::ZERO);
        let handle = playback.handle();
        let outcome = playback.run(3, &mut |_: Duration| {}, |_| handle.stop());
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_zero_steps_finish_immediately() {
        let playback = Playback::default();
        let outcome = playback.run(0, &mut ThreadTicker, |_| unreachable!());
        assert_eq!(outcome, PlaybackOutcome::Finished { steps: 0 });
    }
}

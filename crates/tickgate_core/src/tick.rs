//! # Simulation Tick Loop
//!
//! Fixed-timestep pacing for the simulation thread (20Hz by default).
//!
//! ## Design
//!
//! Each tick the host must:
//! - Drain the execution bridge first
//! - Advance the simulation afterwards
//! - Sleep until the next tick is due, never spin on a client

use std::time::{Duration, Instant};

/// Default simulation rate in ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Fixed-timestep tick loop controller.
///
/// Keeps a consistent tick rate regardless of per-tick processing time.
pub struct TickLoop {
    /// Target tick duration.
    tick_duration: Duration,
    /// Time of last poll.
    last_tick: Instant,
    /// Accumulated time not yet consumed by ticks.
    accumulator: Duration,
    /// Total ticks executed.
    tick_count: u64,
    /// Timing statistics.
    stats: TickStats,
}

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickStats {
    /// Minimum tick duration observed.
    pub min_tick_us: u64,
    /// Maximum tick duration observed.
    pub max_tick_us: u64,
    /// Average tick duration (rolling).
    pub avg_tick_us: u64,
    /// Ticks that took longer than their budget.
    pub late_ticks: u64,
    /// Total ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn fresh(tick_duration: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: micros(tick_duration),
            late_ticks: 0,
            total_ticks: 0,
        }
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl TickLoop {
    /// Creates a tick loop running `tick_rate` times per second.
    ///
    /// A rate of zero is clamped to one tick per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));

        Self {
            tick_duration,
            last_tick: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::fresh(tick_duration),
        }
    }

    /// Returns true if it's time to execute a tick.
    ///
    /// Call this in a loop until it returns false.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_tick);
        self.last_tick = now;

        self.accumulator >= self.tick_duration
    }

    /// Marks the start of a tick and returns the tick number.
    pub fn begin_tick(&mut self) -> (u64, Instant) {
        self.accumulator = self.accumulator.saturating_sub(self.tick_duration);
        self.tick_count += 1;
        (self.tick_count, Instant::now())
    }

    /// Marks the end of a tick and records its duration.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        let duration_us = micros(duration);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(duration_us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(duration_us);
        self.stats.avg_tick_us = (self.stats.avg_tick_us * 15 + duration_us) / 16;

        if duration > self.tick_duration {
            self.stats.late_ticks += 1;
        }
    }

    /// Sleeps until the next tick is due, at most `cap`.
    ///
    /// The cap lets the host notice a shutdown request quickly at low tick rates.
    pub fn wait_for_next_tick(&self, cap: Duration) {
        let elapsed = self.last_tick.elapsed() + self.accumulator;
        if elapsed < self.tick_duration {
            std::thread::sleep((self.tick_duration - elapsed).min(cap));
        }
    }

    /// Returns the current tick count.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns tick statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Returns the target tick duration.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.tick_duration);
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_loop_creation() {
        let tick_loop = TickLoop::default();
        assert_eq!(tick_loop.tick_count(), 0);
        assert_eq!(tick_loop.tick_duration(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        assert_eq!(TickLoop::new(0).tick_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_tick_execution() {
        let mut tick_loop = TickLoop::new(1000);

        std::thread::sleep(Duration::from_millis(5));
        assert!(tick_loop.should_tick());

        let (tick, start) = tick_loop.begin_tick();
        tick_loop.end_tick(start);

        assert_eq!(tick, 1);
        assert_eq!(tick_loop.tick_count(), 1);
    }

    #[test]
    fn test_stats_tracking() {
        let mut tick_loop = TickLoop::new(1000);

        for _ in 0..10 {
            std::thread::sleep(Duration::from_micros(1100));
            while tick_loop.should_tick() {
                let (_, start) = tick_loop.begin_tick();
                std::thread::sleep(Duration::from_micros(50));
                tick_loop.end_tick(start);
            }
        }

        let stats = tick_loop.stats();
        assert!(stats.total_ticks > 0);
        assert!(stats.min_tick_us > 0);
        assert!(stats.min_tick_us <= stats.max_tick_us);
    }
}

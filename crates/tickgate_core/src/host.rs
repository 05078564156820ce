//! # Simulation Host
//!
//! Owns the simulation value on a dedicated OS thread named `simulation`.
//!
//! ```text
//! loop (fixed rate):
//!   1. runner.run_pending(&mut world)   // bridge work, FIFO
//!   2. world.tick(n)                     // may dispatch events
//!   3. sleep until the next tick
//! ```
//!
//! Shutting down joins the thread and drops the bridge receiver. Anything
//! still queued is discarded and its callers see `Unavailable`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info};

use crate::bridge::{self, BridgeRunner, ExecutionBridge};
use crate::config::SimulationConfig;
use crate::error::HostResult;
use crate::tick::TickLoop;

/// Longest the host sleeps before re-checking the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// A simulation the host can drive.
pub trait Simulated: Send + 'static {
    /// Advances the simulation by one tick.
    fn tick(&mut self, tick: u64);
}

/// Handle to a running simulation thread.
pub struct HostHandle<W> {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread: Mutex<Option<JoinHandle<W>>>,
}

/// Spawns simulation threads.
pub struct SimulationHost;

impl SimulationHost {
    /// Moves `world` onto a new simulation thread and starts ticking it.
    ///
    /// # Errors
    ///
    /// [`HostError::Spawn`](crate::error::HostError::Spawn) if the OS
    /// refuses to create the thread.
    pub fn spawn<W: Simulated>(
        world: W,
        config: &SimulationConfig,
    ) -> HostResult<(ExecutionBridge<W>, HostHandle<W>)> {
        let (bridge, runner) = bridge::channel(config.max_work_per_tick);
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let tick_rate = config.tick_rate;

        let thread = std::thread::Builder::new().name("simulation".into()).spawn({
            let running = Arc::clone(&running);
            let ticks = Arc::clone(&ticks);
            move || run_loop(world, runner, tick_rate, &running, &ticks)
        })?;

        info!(tick_rate, max_work_per_tick = config.max_work_per_tick, "simulation host started");

        Ok((
            bridge,
            HostHandle {
                running,
                ticks,
                thread: Mutex::new(Some(thread)),
            },
        ))
    }
}

fn run_loop<W: Simulated>(
    mut world: W,
    mut runner: BridgeRunner<W>,
    tick_rate: u32,
    running: &AtomicBool,
    ticks: &AtomicU64,
) -> W {
    let mut tick_loop = TickLoop::new(tick_rate);

    while running.load(Ordering::Acquire) {
        while tick_loop.should_tick() {
            let (tick, start) = tick_loop.begin_tick();
            runner.run_pending(&mut world);
            world.tick(tick);
            tick_loop.end_tick(start);
            ticks.store(tick, Ordering::Release);

            if !running.load(Ordering::Acquire) {
                break;
            }
        }
        tick_loop.wait_for_next_tick(SHUTDOWN_POLL);
    }

    let stats = tick_loop.stats();
    info!(
        ticks = tick_loop.tick_count(),
        late_ticks = stats.late_ticks,
        avg_tick_us = stats.avg_tick_us,
        discarded = runner.pending(),
        "simulation host stopped"
    );
    drop(runner);
    world
}

impl<W> HostHandle<W> {
    /// True until [`shutdown`](Self::shutdown) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of the last completed tick.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Stops the simulation thread and waits for it.
    ///
    /// Returns the simulation value on the first call, `None` afterwards or
    /// if the thread panicked.
    pub fn shutdown(&self) -> Option<W> {
        self.running.store(false, Ordering::Release);
        let thread = self.thread.lock().take()?;
        match thread.join() {
            Ok(world) => Some(world),
            Err(_) => {
                error!("simulation thread panicked");
                None
            }
        }
    }
}

impl<W> Drop for HostHandle<W> {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[derive(Default)]
    struct Ticker {
        ticks: u64,
        log: Vec<&'static str>,
    }

    impl Simulated for Ticker {
        fn tick(&mut self, tick: u64) {
            self.ticks = tick;
        }
    }

    fn fast() -> SimulationConfig {
        SimulationConfig {
            tick_rate: 200,
            max_work_per_tick: 0,
        }
    }

    #[test]
    fn test_host_runs_work_and_ticks() {
        let (bridge, host) = SimulationHost::spawn(Ticker::default(), &fast()).unwrap();

        let seen = bridge
            .call_blocking(|w: &mut Ticker| {
                w.log.push("hello");
                w.log.len()
            })
            .unwrap();
        assert_eq!(seen, 1);

        std::thread::sleep(Duration::from_millis(30));
        assert!(host.ticks() > 0);

        let world = host.shutdown().unwrap();
        assert_eq!(world.log, vec!["hello"]);
        assert!(world.ticks > 0);
        assert!(host.shutdown().is_none());
    }

    #[test]
    fn test_calls_after_shutdown_are_unavailable() {
        let (bridge, host) = SimulationHost::spawn(Ticker::default(), &fast()).unwrap();
        host.shutdown();

        assert!(!host.is_running());
        assert_eq!(bridge.call_blocking(|w: &mut Ticker| w.ticks), Err(BridgeError::Unavailable));
    }
}

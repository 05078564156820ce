//! # Execution Bridge
//!
//! Marshals work from any thread onto the single simulation thread.
//!
//! ```text
//!  caller tasks / threads                 simulation thread
//! ┌──────────────────────┐   FIFO    ┌──────────────────────────┐
//! │ submit / call / ...  │ ────────► │ BridgeRunner::run_pending│
//! └──────────────────────┘  channel  │   (once per tick)        │
//!            ▲                       └────────────┬─────────────┘
//!            │        oneshot reply               │
//!            └────────────────────────────────────┘
//! ```
//!
//! ## Modes
//!
//! - **Fire-and-forget**: enqueue and return the acceptance outcome.
//! - **Blocking**: the caller waits for the typed result.
//! - **Blocking with output**: as blocking, with an [`OutputCapture`]
//!   threaded through the work; the captured text comes back stripped of
//!   formatting codes.
//!
//! A blocking caller that gives up (its future is dropped) marks the item
//! abandoned. Abandoned items are skipped if they have not started yet.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tokio::sync::oneshot;
use tracing::{trace, warn};

use crate::error::{BridgeError, BridgeResult};
use crate::output::OutputCapture;

/// How the submitting side waits for a work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Enqueue only.
    FireAndForget,
    /// Wait for the result.
    Blocking,
    /// Wait for the result plus captured output.
    BlockingWithOutput,
}

/// Outcome of running one job.
enum JobOutcome {
    Completed,
    Panicked(String),
}

/// Type-erased unit of simulation-thread work.
trait Job<W>: Send {
    /// True when nobody is waiting for the result any more.
    fn is_abandoned(&self) -> bool;

    /// Runs the work against the simulation state.
    fn run(self: Box<Self>, world: &mut W) -> JobOutcome;
}

/// A unit of work plus its execution mode, queued for the simulation thread.
pub struct WorkItem<W> {
    mode: ExecutionMode,
    job: Box<dyn Job<W>>,
}

impl<W> WorkItem<W> {
    /// Execution mode the item was submitted with.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// True if the caller stopped waiting before the item ran.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.job.is_abandoned()
    }
}

impl<W> std::fmt::Debug for WorkItem<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem")
            .field("mode", &self.mode)
            .field("abandoned", &self.is_abandoned())
            .finish_non_exhaustive()
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

struct Detached<F> {
    work: F,
}

impl<W, F> Job<W> for Detached<F>
where
    F: FnOnce(&mut W) + Send,
{
    fn is_abandoned(&self) -> bool {
        false
    }

    fn run(self: Box<Self>, world: &mut W) -> JobOutcome {
        let work = self.work;
        match catch_unwind(AssertUnwindSafe(|| work(world))) {
            Ok(()) => JobOutcome::Completed,
            Err(payload) => JobOutcome::Panicked(panic_message(payload.as_ref())),
        }
    }
}

struct Pending<F, T> {
    work: F,
    reply: oneshot::Sender<BridgeResult<T>>,
}

impl<W, F, T> Job<W> for Pending<F, T>
where
    F: FnOnce(&mut W) -> T + Send,
    T: Send,
{
    fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }

    fn run(self: Box<Self>, world: &mut W) -> JobOutcome {
        let Self { work, reply } = *self;
        let (result, outcome) = match catch_unwind(AssertUnwindSafe(|| work(world))) {
            Ok(value) => (Ok(value), JobOutcome::Completed),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                (Err(BridgeError::Panicked(msg.clone())), JobOutcome::Panicked(msg))
            }
        };
        // The caller may have left while the work ran.
        let _ = reply.send(result);
        outcome
    }
}

struct PendingWithOutput<F, T> {
    work: F,
    reply: oneshot::Sender<BridgeResult<(T, String)>>,
}

impl<W, F, T> Job<W> for PendingWithOutput<F, T>
where
    F: FnOnce(&mut W, &mut OutputCapture) -> T + Send,
    T: Send,
{
    fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }

    fn run(self: Box<Self>, world: &mut W) -> JobOutcome {
        let Self { work, reply } = *self;
        let mut capture = OutputCapture::new();
        let (result, outcome) = match catch_unwind(AssertUnwindSafe(|| work(world, &mut capture))) {
            Ok(value) => (Ok((value, capture.into_stripped())), JobOutcome::Completed),
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                (Err(BridgeError::Panicked(msg.clone())), JobOutcome::Panicked(msg))
            }
        };
        let _ = reply.send(result);
        outcome
    }
}

/// Bridge counters.
#[derive(Debug, Default)]
pub struct BridgeStats {
    submitted: AtomicU64,
    executed: AtomicU64,
    skipped: AtomicU64,
    panicked: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStatsSnapshot {
    /// Items accepted by the channel.
    pub submitted: u64,
    /// Items run on the simulation thread (panicked ones included).
    pub executed: u64,
    /// Abandoned items skipped before they started.
    pub skipped: u64,
    /// Items whose work panicked.
    pub panicked: u64,
}

impl BridgeStats {
    /// Takes a snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> BridgeStatsSnapshot {
        BridgeStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Submitting side of the bridge. Cheap to clone, usable from any thread.
pub struct ExecutionBridge<W> {
    tx: Sender<WorkItem<W>>,
    stats: Arc<BridgeStats>,
}

impl<W> Clone for ExecutionBridge<W> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<W: 'static> ExecutionBridge<W> {
    fn enqueue(&self, mode: ExecutionMode, job: Box<dyn Job<W>>) -> BridgeResult<()> {
        self.tx
            .send(WorkItem { mode, job })
            .map_err(|_| BridgeError::Unavailable)?;
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        trace!(?mode, "work item enqueued");
        Ok(())
    }

    /// Enqueues work without waiting for it.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Unavailable`] if the simulation thread is gone.
    pub fn submit<F>(&self, work: F) -> BridgeResult<()>
    where
        F: FnOnce(&mut W) + Send + 'static,
    {
        self.enqueue(ExecutionMode::FireAndForget, Box::new(Detached { work }))
    }

    /// Runs work on the simulation thread and awaits its result.
    ///
    /// Dropping the returned future before the work starts cancels it.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Unavailable`] if the simulation thread is gone or stops
    /// before running the item, [`BridgeError::Panicked`] if the work panics.
    pub async fn call<T, F>(&self, work: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut W) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.enqueue(ExecutionMode::Blocking, Box::new(Pending { work, reply }))?;
        rx.await.unwrap_or(Err(BridgeError::Unavailable))
    }

    /// Like [`call`](Self::call) but blocks the current OS thread.
    ///
    /// Must not be used from inside an async runtime.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    pub fn call_blocking<T, F>(&self, work: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut W) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.enqueue(ExecutionMode::Blocking, Box::new(Pending { work, reply }))?;
        rx.blocking_recv().unwrap_or(Err(BridgeError::Unavailable))
    }

    /// Runs work with an output capture and awaits `(result, stripped output)`.
    ///
    /// # Errors
    ///
    /// Same as [`call`](Self::call).
    pub async fn call_with_output<T, F>(&self, work: F) -> BridgeResult<(T, String)>
    where
        F: FnOnce(&mut W, &mut OutputCapture) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.enqueue(
            ExecutionMode::BlockingWithOutput,
            Box::new(PendingWithOutput { work, reply }),
        )?;
        rx.await.unwrap_or(Err(BridgeError::Unavailable))
    }

    /// Bridge counters.
    #[must_use]
    pub fn stats(&self) -> BridgeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of items accepted but not yet taken by the runner.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.tx.len()
    }
}

/// Simulation-thread side of the bridge.
pub struct BridgeRunner<W> {
    rx: Receiver<WorkItem<W>>,
    max_work_per_tick: usize,
    stats: Arc<BridgeStats>,
}

impl<W> BridgeRunner<W> {
    /// Runs queued items in FIFO order, at most `max_work_per_tick` of them.
    ///
    /// Returns the number of items executed. Abandoned items are skipped;
    /// panics are contained and logged.
    pub fn run_pending(&mut self, world: &mut W) -> usize {
        let budget = if self.max_work_per_tick == 0 {
            usize::MAX
        } else {
            self.max_work_per_tick
        };

        let mut taken = 0;
        let mut executed = 0;
        while taken < budget {
            let item = match self.rx.try_recv() {
                Ok(item) => item,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            taken += 1;

            if item.is_abandoned() {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                trace!(mode = ?item.mode, "skipping abandoned work item");
                continue;
            }

            let mode = item.mode;
            if let JobOutcome::Panicked(msg) = item.job.run(world) {
                self.stats.panicked.fetch_add(1, Ordering::Relaxed);
                warn!(?mode, panic = %msg, "work item panicked on the simulation thread");
            }
            self.stats.executed.fetch_add(1, Ordering::Relaxed);
            executed += 1;
        }
        executed
    }

    /// Number of items waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> BridgeStatsSnapshot {
        self.stats.snapshot()
    }
}

/// Creates a connected bridge pair.
///
/// `max_work_per_tick` of zero means no per-tick limit.
#[must_use]
pub fn channel<W>(max_work_per_tick: usize) -> (ExecutionBridge<W>, BridgeRunner<W>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let stats = Arc::new(BridgeStats::default());
    (
        ExecutionBridge {
            tx,
            stats: Arc::clone(&stats),
        },
        BridgeRunner {
            rx,
            max_work_per_tick,
            stats,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        log: Vec<u32>,
    }

    #[test]
    fn test_fire_and_forget_runs_in_order() {
        let (bridge, mut runner) = channel::<Counter>(0);
        for i in 1..=5 {
            bridge.submit(move |w: &mut Counter| w.log.push(i)).unwrap();
        }

        let mut world = Counter::default();
        assert_eq!(runner.run_pending(&mut world), 5);
        assert_eq!(world.log, vec![1, 2, 3, 4, 5]);
        assert_eq!(bridge.stats().submitted, 5);
        assert_eq!(bridge.stats().executed, 5);
    }

    #[test]
    fn test_budget_limits_items_per_tick() {
        let (bridge, mut runner) = channel::<Counter>(2);
        for i in 0..5 {
            bridge.submit(move |w: &mut Counter| w.log.push(i)).unwrap();
        }

        assert_eq!(bridge.queued(), 5);

        let mut world = Counter::default();
        assert_eq!(runner.run_pending(&mut world), 2);
        assert_eq!(runner.pending(), 3);
        assert_eq!(runner.run_pending(&mut world), 2);
        assert_eq!(runner.run_pending(&mut world), 1);
        assert_eq!(world.log, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_submit_after_runner_dropped_is_unavailable() {
        let (bridge, runner) = channel::<Counter>(0);
        drop(runner);

        assert_eq!(
            bridge.submit(|w: &mut Counter| w.log.push(1)),
            Err(BridgeError::Unavailable)
        );
    }

    #[test]
    fn test_fire_and_forget_panic_is_contained() {
        let (bridge, mut runner) = channel::<Counter>(0);
        bridge.submit(|_: &mut Counter| panic!("boom")).unwrap();
        bridge.submit(|w: &mut Counter| w.log.push(7)).unwrap();

        let mut world = Counter::default();
        assert_eq!(runner.run_pending(&mut world), 2);
        assert_eq!(world.log, vec![7]);
        assert_eq!(runner.stats().panicked, 1);
    }

    #[test]
    fn test_call_blocking_from_thread() {
        let (bridge, mut runner) = channel::<Counter>(0);

        let caller = std::thread::spawn(move || {
            bridge.call_blocking(|w: &mut Counter| {
                w.log.push(42);
                w.log.len()
            })
        });

        let mut world = Counter::default();
        while !caller.is_finished() {
            runner.run_pending(&mut world);
            std::thread::yield_now();
        }

        assert_eq!(caller.join().unwrap(), Ok(1));
        assert_eq!(world.log, vec![42]);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(5_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}

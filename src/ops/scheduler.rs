//! Per-resource operation scheduler.
//!
//! Operations queue per [`ResourceKey`]. A driver thread polls the queues and
//! starts at most one waiting operation per key per pass, and only once the
//! key's previous operation has completed. Keys are visited round-robin.
//! Bodies run on a rayon pool sized to the concurrency cap. The driver exits
//! when nothing is queued or running and the next [`Scheduler::submit`]
//! starts a new one.

use parking_lot::{Condvar, Mutex, MutexGuard};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

use super::{Operation, OperationHandle, ResourceKey};
use crate::util::{Error, Result};

/// Default cap on operations running at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;
/// Default driver poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Default)]
struct State {
    queues: HashMap<ResourceKey, VecDeque<Operation>>,
    /// Keys with waiting work, in dispatch order.
    rotation: VecDeque<ResourceKey>,
    in_flight: HashMap<ResourceKey, OperationHandle>,
    running: bool,
}

impl State {
    fn push(&mut self, op: Operation) {
        let queue = self.queues.entry(op.key().clone()).or_default();
        if queue.is_empty() {
            self.rotation.push_back(op.key().clone());
        }
        queue.push_back(op);
    }

    /// Reap completed work, pick the next batch and prune drained keys.
    ///
    /// One lap over `rotation`. Visited keys go to the back, so keys skipped
    /// once the cap is reached are first in line on the next pass.
    fn take_ready(&mut self, cap: usize) -> Vec<Operation> {
        self.in_flight.retain(|_, handle| !handle.is_completed());
        let mut live = self.in_flight.len();
        let mut ready = Vec::new();

        for _ in 0..self.rotation.len() {
            if live >= cap {
                break;
            }
            let Some(key) = self.rotation.pop_front() else {
                break;
            };
            if !self.in_flight.contains_key(&key) {
                if let Some(op) = self.queues.get_mut(&key).and_then(VecDeque::pop_front) {
                    op.mark_started();
                    self.in_flight.insert(key.clone(), op.handle());
                    live += 1;
                    ready.push(op);
                }
            }
            if self.queues.get(&key).is_some_and(|q| !q.is_empty()) {
                self.rotation.push_back(key);
            } else {
                self.queues.remove(&key);
            }
        }
        ready
    }

    fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.queues.values().all(VecDeque::is_empty)
    }

    fn waiting(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

struct Inner {
    state: Mutex<State>,
    /// Wakes the driver early on submit or completion.
    wake: Condvar,
    /// Signalled when the driver exits.
    idle: Condvar,
    pool: ThreadPool,
    max_concurrency: usize,
    poll_interval: Duration,
}

/// Runs operations with per-key mutual exclusion and a global cap.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create a scheduler. A zero `max_concurrency` is treated as one.
    pub fn new(max_concurrency: usize, poll_interval: Duration) -> Result<Self> {
        let max_concurrency = max_concurrency.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_concurrency)
            .thread_name(|i| format!("saveload-worker-{i}"))
            .build()
            .map_err(|e| Error::other(format!("failed to build worker pool: {e}")))?;
        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                wake: Condvar::new(),
                idle: Condvar::new(),
                pool,
                max_concurrency,
                poll_interval,
            }),
        })
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }

    /// Queue an operation behind any earlier ones with the same key.
    pub fn submit(&self, op: Operation) -> Result<OperationHandle> {
        let handle = op.handle();
        let mut state = self.inner.state.lock();

        if !state.running {
            let inner = Arc::clone(&self.inner);
            thread::Builder::new()
                .name("saveload-scheduler".into())
                .spawn(move || drive(inner))?;
            state.running = true;
        }

        debug!(key = %op.key(), kind = %op.kind(), "operation queued");
        state.push(op);
        drop(state);
        self.inner.wake.notify_one();
        Ok(handle)
    }

    /// Whether the driver thread is alive.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Operations queued but not yet started.
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().waiting()
    }

    /// Block until every submitted operation has completed and the driver
    /// has exited.
    pub fn wait_idle(&self) {
        let mut state = self.inner.state.lock();
        while state.running {
            self.inner.idle.wait(&mut state);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle) with a timeout. Returns true if idle.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.inner.state.lock();
        if state.running {
            self.inner
                .idle
                .wait_while_for(&mut state, |s| s.running, timeout);
        }
        !state.running
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("max_concurrency", &self.inner.max_concurrency)
            .field("poll_interval", &self.inner.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Driver loop. Holds the state lock only between passes.
fn drive(inner: Arc<Inner>) {
    debug!("scheduler loop started");
    let mut state = inner.state.lock();
    loop {
        let ready = state.take_ready(inner.max_concurrency);

        if state.is_idle() {
            state.running = false;
            drop(state);
            inner.idle.notify_all();
            debug!("scheduler loop exited");
            return;
        }

        if !ready.is_empty() {
            trace!(started = ready.len(), waiting = state.waiting(), "scheduler pass");
            MutexGuard::unlocked(&mut state, || {
                for op in ready {
                    let job_inner = Arc::clone(&inner);
                    inner.pool.spawn(move || {
                        // Failures are logged and recorded on the handle.
                        let _ = op.run();
                        job_inner.wake.notify_one();
                    });
                }
            });
        }

        inner.wake.wait_for(&mut state, inner.poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{OperationKind, OperationStatus};
    use crate::strategy::SaveFormat;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(name: &str) -> ResourceKey {
        ResourceKey::new("/saves", name, SaveFormat::Custom)
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(4, Duration::from_millis(1)).unwrap()
    }

    #[test]
    fn test_runs_and_goes_idle() {
        let s = scheduler();
        let count = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..5)
            .map(|i| {
                let count = Arc::clone(&count);
                s.submit(Operation::new(OperationKind::Save, key(&i.to_string()), move || {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
                .unwrap()
            })
            .collect();
        assert!(s.wait_idle_timeout(Duration::from_secs(10)));
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert!(handles.iter().all(OperationHandle::is_completed));
        assert!(!s.is_running());
        assert_eq!(s.waiting(), 0);
    }

    #[test]
    fn test_failed_operation_does_not_stall_key() {
        let s = scheduler();
        let first = s
            .submit(Operation::new(OperationKind::Save, key("a"), || {
                Err(Error::other("disk full"))
            }))
            .unwrap();
        let second = s
            .submit(Operation::new(OperationKind::Load, key("a"), || Ok(())))
            .unwrap();
        assert!(second.wait_timeout(Duration::from_secs(10)));
        assert!(first.is_completed());
        assert_eq!(first.error().as_deref(), Some("disk full"));
        assert_eq!(second.error(), None);
    }

    #[test]
    fn test_panicking_operation_does_not_stall_key() {
        let s = scheduler();
        s.submit(Operation::new(OperationKind::Save, key("p"), || panic!("oops")))
            .unwrap();
        let after = s
            .submit(Operation::new(OperationKind::Save, key("p"), || Ok(())))
            .unwrap();
        assert!(after.wait_timeout(Duration::from_secs(10)));
        assert_eq!(after.status(), OperationStatus::Completed);
    }

    fn noop(name: &str) -> Operation {
        Operation::new(OperationKind::Save, key(name), || Ok(()))
    }

    #[test]
    fn test_keys_take_turns_at_the_cap() {
        let mut state = State::default();
        for name in ["a", "a", "a", "b", "b", "b", "c"] {
            state.push(noop(name));
        }

        let mut order = Vec::new();
        loop {
            let ready = state.take_ready(1);
            if ready.is_empty() {
                break;
            }
            assert_eq!(ready.len(), 1);
            for op in ready {
                order.push(op.key().file_name.clone());
                op.run().unwrap();
            }
        }
        assert_eq!(order, ["a", "b", "c", "a", "b", "a", "b"]);
        assert!(state.is_idle());
        assert!(state.queues.is_empty());
        assert!(state.rotation.is_empty());
    }

    #[test]
    fn test_busy_key_is_skipped_not_dropped() {
        let mut state = State::default();
        state.push(noop("a"));
        state.push(noop("a"));
        state.push(noop("b"));

        let first = state.take_ready(4);
        assert_eq!(first.len(), 2);
        // "a" is still in flight, so its second op waits.
        assert!(state.take_ready(4).is_empty());
        assert_eq!(state.waiting(), 1);

        for op in first {
            op.run().unwrap();
        }
        let next = state.take_ready(4);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].key().file_name, "a");
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let s = Scheduler::new(0, DEFAULT_POLL_INTERVAL).unwrap();
        assert_eq!(s.max_concurrency(), 1);
    }
}

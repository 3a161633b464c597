//! A unit of save or load work and the handle used to observe it.

use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::strategy::SaveFormat;
use crate::util::{Error, Result};

/// Lifecycle of an operation. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Save,
    Load,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Save => "save",
            Self::Load => "load",
        })
    }
}

/// Identifies one save slot: directory, file name and format.
///
/// Two operations with equal keys never run at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub dir: PathBuf,
    pub file_name: String,
    pub format: SaveFormat,
}

impl ResourceKey {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>, format: SaveFormat) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
            format,
        }
    }

    /// Full path of the save file, extension included.
    pub fn path(&self) -> PathBuf {
        self.dir
            .join(format!("{}{}", self.file_name, self.format.extension()))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

#[derive(Debug)]
struct State {
    status: OperationStatus,
    error: Option<String>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    done: Condvar,
}

type Body = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Scheduled work. The body owns everything it needs, callbacks included.
pub struct Operation {
    kind: OperationKind,
    key: ResourceKey,
    body: Body,
    shared: Arc<Shared>,
}

impl Operation {
    pub fn new<F>(kind: OperationKind, key: ResourceKey, body: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            kind,
            key,
            body: Box::new(body),
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    status: OperationStatus::NotStarted,
                    error: None,
                }),
                done: Condvar::new(),
            }),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn status(&self) -> OperationStatus {
        self.shared.state.lock().status
    }

    pub fn handle(&self) -> OperationHandle {
        OperationHandle {
            kind: self.kind,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Move from `NotStarted` to `InProgress`. Returns false if already started.
    pub(crate) fn mark_started(&self) -> bool {
        let mut state = self.shared.state.lock();
        if state.status != OperationStatus::NotStarted {
            return false;
        }
        state.status = OperationStatus::InProgress;
        true
    }

    /// Run the body on the current thread.
    ///
    /// Failures and panics are logged, recorded on the handle and returned;
    /// the operation is `Completed` afterwards either way.
    pub fn run(self) -> Result<()> {
        self.mark_started();
        let Operation {
            kind,
            key,
            body,
            shared,
        } = self;

        let started = Instant::now();
        let result = match catch_unwind(AssertUnwindSafe(body)) {
            Ok(result) => result,
            Err(payload) => Err(Error::other(format!(
                "{kind} operation panicked: {}",
                panic_message(payload.as_ref())
            ))),
        };

        match &result {
            Ok(()) => debug!(%key, %kind, elapsed = ?started.elapsed(), "operation completed"),
            Err(e) => error!(%key, %kind, error = %e, "operation failed"),
        }

        let mut state = shared.state.lock();
        state.status = OperationStatus::Completed;
        state.error = result.as_ref().err().map(ToString::to_string);
        drop(state);
        shared.done.notify_all();
        result
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Observes an operation after it has been handed off.
#[derive(Debug, Clone)]
pub struct OperationHandle {
    kind: OperationKind,
    shared: Arc<Shared>,
}

impl OperationHandle {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn status(&self) -> OperationStatus {
        self.shared.state.lock().status
    }

    pub fn is_completed(&self) -> bool {
        self.status() == OperationStatus::Completed
    }

    /// Failure message, if the operation completed with an error.
    pub fn error(&self) -> Option<String> {
        self.shared.state.lock().error.clone()
    }

    /// Block until the operation completes.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock();
        while state.status != OperationStatus::Completed {
            self.shared.done.wait(&mut state);
        }
    }

    /// Block until the operation completes or `timeout` passes.
    /// Returns true if it completed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.status != OperationStatus::Completed {
            if self.shared.done.wait_until(&mut state, deadline).timed_out() {
                return state.status == OperationStatus::Completed;
            }
        }
        true
    }
}

//! Owner execution context.
//!
//! A record view's state and its field views belong to one execution
//! context (typically the UI thread). Anything arriving from elsewhere, such
//! as a change notification delivered by a bus dispatcher, must go through
//! [`OwnerContext::invoke`] before touching that state.

use crate::{ViewError, ViewResult};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Configuration for a spawned owner context.
#[derive(Debug, Clone)]
pub struct OwnerConfig {
    /// Name of the owner thread.
    pub thread_name: String,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            thread_name: "rowsync-owner".to_string(),
        }
    }
}

enum Mode {
    /// Every caller is the owner.
    Inline,
    /// One dedicated thread drains a FIFO task queue.
    Queue {
        thread: ThreadId,
        tx: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    },
}

/// Handle to the execution context that owns a record view.
#[derive(Clone)]
pub struct OwnerContext {
    mode: Arc<Mode>,
}

/// Join handle of a spawned owner thread.
pub struct OwnerThread {
    handle: JoinHandle<()>,
}

impl OwnerThread {
    /// Waits for the owner thread to finish. It finishes after
    /// [`OwnerContext::close`] once the queue is drained.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl OwnerContext {
    /// A context where every thread counts as the owner and tasks run
    /// immediately on the caller. For single-threaded hosts and tests.
    pub fn inline() -> Self {
        Self {
            mode: Arc::new(Mode::Inline),
        }
    }

    /// Starts a dedicated owner thread.
    pub fn spawn(config: OwnerConfig) -> std::io::Result<(Self, OwnerThread)> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        let name = config.thread_name.clone();
        let handle = thread::Builder::new()
            .name(config.thread_name)
            .spawn(move || {
                while let Some(task) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        warn!(context = %name, "owner task panicked");
                    }
                }
                debug!(context = %name, "owner context stopped");
            })?;
        let ctx = Self {
            mode: Arc::new(Mode::Queue {
                thread: handle.thread().id(),
                tx: Mutex::new(Some(tx)),
            }),
        };
        Ok((ctx, OwnerThread { handle }))
    }

    /// Returns `true` if the calling thread is the owner.
    pub fn is_owner(&self) -> bool {
        match &*self.mode {
            Mode::Inline => true,
            Mode::Queue { thread, .. } => thread::current().id() == *thread,
        }
    }

    /// Runs `task` on the owner: immediately if already there, otherwise
    /// after every task queued before it.
    pub fn invoke(&self, task: impl FnOnce() + Send + 'static) -> ViewResult<()> {
        match &*self.mode {
            Mode::Inline => {
                task();
                Ok(())
            }
            Mode::Queue { thread, .. } if thread::current().id() == *thread => {
                task();
                Ok(())
            }
            Mode::Queue { tx, .. } => {
                let guard = tx.lock().unwrap_or_else(PoisonError::into_inner);
                let sender = guard.as_ref().ok_or(ViewError::ContextClosed)?;
                sender
                    .send(Box::new(task))
                    .map_err(|_| ViewError::ContextClosed)
            }
        }
    }

    /// Runs `f` on the owner and returns a receiver for its result.
    pub fn call<R, F>(&self, f: F) -> ViewResult<oneshot::Receiver<R>>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.invoke(move || {
            let _ = tx.send(f());
        })?;
        Ok(rx)
    }

    /// Runs `f` on the owner and blocks until it returns.
    ///
    /// Must not be called from inside an async task.
    pub fn call_blocking<R, F>(&self, f: F) -> ViewResult<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_owner() {
            return Ok(f());
        }
        self.call(f)?
            .blocking_recv()
            .map_err(|_| ViewError::TaskAborted)
    }

    /// Stops accepting tasks. Already queued tasks still run.
    pub fn close(&self) {
        if let Mode::Queue { tx, .. } = &*self.mode {
            tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
    }
}

impl fmt::Debug for OwnerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.mode {
            Mode::Inline => f.write_str("OwnerContext::Inline"),
            Mode::Queue { thread, .. } => f
                .debug_struct("OwnerContext")
                .field("thread", thread)
                .finish(),
        }
    }
}

//! Execution contexts: where completion callbacks run.
//!
//! [`DataTransferService`](crate::transfer::DataTransferService) routes every
//! completion through an [`ExecutionContext`], so synchronous delivery in
//! tests and asynchronous delivery in applications share one contract.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use courier_net::context::{ExecutionContext, MainQueue};
//!
//! let queue = Arc::new(MainQueue::new());
//! queue.execute(Box::new(|| println!("runs on the thread that drains the queue")));
//!
//! assert_eq!(queue.run_pending(), 1);
//! ```

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tokio::runtime::Handle;

/// A unit of work handed to a context.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Runs a piece of work exactly once, on whatever thread the context designates.
pub trait ExecutionContext: Send + Sync {
    /// Schedule `work`.
    fn execute(&self, work: Work);
}

/// Deliver `work` through `context`, or inline when there is none.
pub(crate) fn deliver(context: Option<&dyn ExecutionContext>, work: impl FnOnce() + Send + 'static) {
    match context {
        Some(context) => context.execute(Box::new(work)),
        None => work(),
    }
}

/// Runs work inline on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl ExecutionContext for Immediate {
    fn execute(&self, work: Work) {
        work();
    }
}

/// Spawns work onto a tokio runtime.
///
/// Work dropped unrun because its runtime shut down runs inline on the
/// dropping thread instead.
#[derive(Clone, Debug, Default)]
pub struct TokioContext {
    handle: Option<Handle>,
}

impl TokioContext {
    /// Spawn onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Spawn onto the runtime current at each `execute`, or the shared one
    /// outside a runtime.
    pub fn current() -> Self {
        Self { handle: None }
    }
}

impl ExecutionContext for TokioContext {
    fn execute(&self, work: Work) {
        let handle = self.handle.clone().unwrap_or_else(crate::runtime::handle);
        let work = RunOnDrop(Some(work));
        handle.spawn(async move { drop(work) });
    }
}

/// Runs its work when dropped, exactly once.
struct RunOnDrop(Option<Work>);

impl Drop for RunOnDrop {
    fn drop(&mut self) {
        if let Some(work) = self.0.take() {
            work();
        }
    }
}

/// Spawns work onto a rayon thread pool.
#[derive(Clone, Debug, Default)]
pub struct ThreadPoolContext {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl ThreadPoolContext {
    /// Use rayon's global pool.
    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Use a dedicated pool.
    pub fn with_pool(pool: Arc<rayon::ThreadPool>) -> Self {
        Self { pool: Some(pool) }
    }
}

impl ExecutionContext for ThreadPoolContext {
    fn execute(&self, work: Work) {
        match &self.pool {
            Some(pool) => pool.spawn(work),
            None => rayon::spawn(work),
        }
    }
}

/// A queue drained by one owning thread, such as a UI event loop.
///
/// Work posted from any thread runs only when the owner calls
/// [`run_pending`](Self::run_pending) or [`run_next`](Self::run_next).
/// Work still queued when the queue is dropped never runs.
#[derive(Debug)]
pub struct MainQueue {
    sender: Sender<Work>,
    receiver: Receiver<Work>,
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Run everything queued so far on the calling thread.
    ///
    /// Returns the number of items run.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while let Ok(work) = self.receiver.try_recv() {
            work();
            count += 1;
        }
        count
    }

    /// Wait up to `timeout` for one item and run it.
    ///
    /// Returns `true` if an item ran.
    pub fn run_next(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(work) => {
                work();
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl ExecutionContext for MainQueue {
    fn execute(&self, work: Work) {
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.sender.send(work);
    }
}

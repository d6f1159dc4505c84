//! Runtime selection for async work.
//!
//! The production transport and [`TokioContext`](crate::context::TokioContext)
//! need a tokio runtime. When the caller is already inside one its handle is
//! used; otherwise a small shared runtime is created on first use and lives
//! for the rest of the process.

use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};

static SHARED: OnceLock<Runtime> = OnceLock::new();

fn shared() -> &'static Runtime {
    SHARED.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("courier-net")
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// The current runtime's handle, falling back to the shared runtime.
///
/// Resolve this at the point of use; a handle kept past its runtime's
/// shutdown drops everything spawned on it.
pub fn handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| shared().handle().clone())
}

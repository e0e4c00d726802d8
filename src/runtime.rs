//! Runtime abstraction layer for async operations
//!
//! Background work (the push-feed pump) is spawned through an [`AsyncSpawner`]
//! so hosts can supply their own executor. Tokio is the default when the
//! `tokio-runtime` feature is enabled.

use crate::{MapError, Result};
use futures::Future;
use std::pin::Pin;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxFuture) -> Result<Box<dyn AsyncHandle>>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

/// Spawn a future on the installed runtime
pub fn spawn<F>(future: F) -> Result<Box<dyn AsyncHandle>>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::trace!("spawning background task");
    runtime()?.spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::runtime::Handle;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner. Spawns onto the runtime of the calling
        /// context, so it must be used from inside one.
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxFuture) -> Result<Box<dyn AsyncHandle>> {
                let handle = Handle::try_current()
                    .map_err(|e| MapError::Runtime(e.to_string()))?
                    .spawn(future);
                Ok(Box::new(TokioHandle(handle)))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }
}

/// Global runtime instance
static RUNTIME: once_cell::sync::OnceCell<Box<dyn AsyncSpawner>> = once_cell::sync::OnceCell::new();

/// Install a spawner. Only the first call takes effect; returns `false` if
/// a spawner was already installed.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) -> bool {
    RUNTIME.set(spawner).is_ok()
}

/// Get the global runtime spawner
pub fn runtime() -> Result<&'static dyn AsyncSpawner> {
    #[cfg(feature = "tokio-runtime")]
    {
        Ok(RUNTIME
            .get_or_init(|| Box::new(spawners::tokio_impl::TokioSpawner))
            .as_ref())
    }

    #[cfg(not(feature = "tokio-runtime"))]
    {
        RUNTIME.get().map(|s| s.as_ref()).ok_or_else(|| {
            MapError::Runtime(
                "no async runtime installed; enable 'tokio-runtime' or call init_runtime".to_string(),
            )
        })
    }
}

use crate::errors::DatabaseError;
use std::any::Any;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Spawns an OS thread with a name, so scans and collectors show up in panics
/// and debuggers.
pub(crate) fn named_spawn<F, T>(name: String, f: F) -> Result<JoinHandle<T>, DatabaseError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(thread::Builder::new().name(name).spawn(f)?)
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `f`, turning a panic into [`DatabaseError::ThreadPanic`].
pub(crate) fn catch_unwind<R, F: FnOnce() -> R>(f: F) -> Result<R, DatabaseError> {
    panic::catch_unwind(panic::AssertUnwindSafe(f))
        .map_err(|payload| DatabaseError::ThreadPanic(panic_message(payload)))
}

/// Stops one query. Workers poll it between rows.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn check(&self) -> Result<(), DatabaseError> {
        if self.is_cancelled() {
            return Err(DatabaseError::Cancelled);
        }
        Ok(())
    }
}

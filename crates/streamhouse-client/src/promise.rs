//! Single-Assignment Promise
//!
//! The completion primitive of schema binding. One task writes the outcome
//! exactly once; any number of waiters poll for it, await it, or block a
//! plain thread on it.
//!
//! ```text
//! Promise<T> ──complete(v)──▶ watch::Sender<Option<T>>
//!                                   │
//!                 ┌─────────────────┼─────────────────┐
//!                 ▼                 ▼                 ▼
//!          PromiseFuture      PromiseFuture      PromiseFuture
//!           try_get()          .await            wait_blocking()
//! ```
//!
//! A second `complete` is rejected and hands the value back; the first value
//! is never overwritten. Dropping the promise without completing it wakes all
//! waiters with `BrokenPromise`.

use futures::future::BoxFuture;
use std::future::IntoFuture;
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

/// The promise was dropped before a value was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("promise dropped without a value")]
pub struct BrokenPromise;

/// Write side of a single-assignment value
#[derive(Debug)]
pub struct Promise<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> Promise<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// A reader of this promise's value; may be called any number of times
    pub fn future(&self) -> PromiseFuture<T> {
        PromiseFuture {
            rx: self.tx.subscribe(),
        }
    }

    /// Write the value
    ///
    /// Returns the value back if the promise was already completed.
    pub fn complete(&self, value: T) -> Result<(), T> {
        let mut value = Some(value);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = value.take();
            true
        });

        match value {
            None => Ok(()),
            Some(rejected) => {
                warn!("Promise already completed, rejecting second completion");
                Err(rejected)
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of a single-assignment value
#[derive(Debug)]
pub struct PromiseFuture<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T> Clone for PromiseFuture<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T: Clone> PromiseFuture<T> {
    /// The value if it has been written, without waiting
    pub fn try_get(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    pub fn is_completed(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait for the value
    pub async fn wait(&self) -> Result<T, BrokenPromise> {
        let mut rx = self.rx.clone();
        let slot = rx.wait_for(Option::is_some).await.map_err(|_| BrokenPromise)?;
        slot.clone().ok_or(BrokenPromise)
    }

    /// Block the current thread until the value is written
    ///
    /// Must not be called from a runtime worker thread: the task that
    /// completes the promise may need that thread to make progress.
    pub fn wait_blocking(&self) -> Result<T, BrokenPromise> {
        futures::executor::block_on(self.wait())
    }
}

impl<T> IntoFuture for PromiseFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T, BrokenPromise>;
    type IntoFuture = BoxFuture<'static, Result<T, BrokenPromise>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

//! Background task registry
//!
//! Owns the initialization and channel-listener tasks of one manager
//! instance. Shutting down (explicitly or by dropping the registry) aborts
//! every task it spawned.

use parking_lot::Mutex;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub(crate) struct TaskRegistry {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn `fut`, dropping it at shutdown. No-op once shut down.
    pub(crate) fn spawn_cancellable<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            return;
        }
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                () = fut => {}
            }
        });
        let mut handles = self.handles.lock();
        handles.retain(|handle| !handle.is_finished());
        handles.push(handle);
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        for handle in self.handles.lock().drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

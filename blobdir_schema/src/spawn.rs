//! Task spawning for entry fan-out.

use std::future::Future;

use tokio::sync::oneshot;

/// Spawns an async task on the current runtime.
pub fn spawn_task<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future);
}

/// Spawns `future` and returns a one-slot receiver for its output.
///
/// The task runs to completion even if the receiver is dropped; its
/// output is then discarded.
pub fn spawn_reporting<F, T>(future: F) -> oneshot::Receiver<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    spawn_task(async move {
        let _ = tx.send(future.await);
    });
    rx
}

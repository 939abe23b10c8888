//! Matlib reactive stores and the background task queue.
//!
//! A [`ResourceStore`] holds an atomically swappable collection snapshot
//! plus a loading flag; refreshes replace the snapshot wholesale rather
//! than mutating instances in place. The [`TaskQueue`] serializes
//! background work strictly in FIFO order, decoupled from the UI action
//! that triggered it.

#![forbid(unsafe_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use matlib_client::{Resource, ResourceClient};
use matlib_core::Collection;
use metrics::counter;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Snapshot store for one resource type.
///
/// Readers take the current snapshot and may subscribe to the epoch
/// counter bumped on every replacement. Concurrent refreshes race
/// freely: the last `replace` wins, with no version check.
pub struct ResourceStore<M> {
    snapshot: ArcSwap<Collection<M>>,
    loading: AtomicBool,
    epoch: watch::Sender<u64>,
}

impl<M> Default for ResourceStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ResourceStore<M> {
    pub fn new() -> Self {
        let (epoch, _) = watch::channel(0u64);
        Self {
            snapshot: ArcSwap::from_pointee(Collection::default()),
            loading: AtomicBool::new(false),
            epoch,
        }
    }

    pub fn snapshot(&self) -> Arc<Collection<M>> {
        self.snapshot.load_full()
    }

    /// Swap in a new snapshot wholesale and bump the epoch.
    pub fn replace(&self, next: Collection<M>) {
        self.snapshot.store(Arc::new(next));
        self.epoch.send_modify(|epoch| *epoch += 1);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Relaxed)
    }

    pub fn set_loading(&self, value: bool) {
        self.loading.store(value, Ordering::Relaxed);
    }

    pub fn epoch(&self) -> u64 {
        *self.epoch.borrow()
    }

    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.epoch.subscribe()
    }
}

type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

struct Task {
    id: String,
    fut: TaskFuture,
}

/// Serialized FIFO task runner.
///
/// One worker drains tasks strictly in order, awaiting each to
/// completion before the next starts. A failure is logged with the task
/// id and never blocks the rest of the queue. No priority, cancellation,
/// dedup, or retry. Dropping the queue lets the worker finish what is
/// enqueued and exit.
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    /// Construct the queue and spawn its worker on the current runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();
        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                debug!(task = %task.id, "background task started");
                match task.fut.await {
                    Ok(()) => debug!(task = %task.id, "background task finished"),
                    Err(err) => {
                        counter!("background_task_failures_total", 1u64);
                        warn!(task = %task.id, error = %err, "background task failed");
                    }
                }
                counter!("background_tasks_total", 1u64);
            }
            debug!("task queue closed; worker exiting");
        });
        Self { tx }
    }

    pub fn enqueue(
        &self,
        id: impl Into<String>,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) {
        let task = Task { id: id.into(), fut: Box::pin(fut) };
        if self.tx.send(task).is_err() {
            warn!("task queue worker is gone; dropping task");
        }
    }
}

/// Enqueue a wholesale refresh of a store from the server: fetch the
/// collection out-of-band, toggle the loading flag around the call, and
/// replace the snapshot on success. Failures are logged by the queue.
pub fn enqueue_refresh<M>(
    queue: &TaskQueue,
    client: Arc<ResourceClient>,
    store: Arc<ResourceStore<M>>,
    title: impl Into<String>,
) where
    M: Resource,
{
    let title = title.into();
    queue.enqueue(format!("refresh-{title}"), async move {
        store.set_loading(true);
        let result = client.fetch_all::<M>().await;
        store.set_loading(false);
        match result {
            Ok(collection) => {
                store.replace(collection);
                Ok(())
            }
            Err(err) => {
                Err(anyhow::Error::new(err).context(format!("refreshing {title}")))
            }
        }
    });
}

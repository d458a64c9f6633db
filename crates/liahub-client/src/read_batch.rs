//! Debounced batch accumulator.
//!
//! Coalesces many small idempotent acknowledgements triggered by rapid UI
//! interaction into fewer network calls without losing any id: ids
//! accumulate while activity continues, and a quiet window after the last
//! activity flushes the whole batch in one call. The timer resets on every
//! new id; a flush that has started is not cancellable.
//!
//! This is a standalone primitive: it knows nothing about notifications or
//! any particular endpoint. The flush callback owns the network call.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::debug;

enum BatchMessage {
    Add(Vec<String>),
}

/// Handle to a running debounced batch task. Dropping the handle shuts the
/// task down after any in-progress flush completes.
#[derive(Clone)]
pub struct DebouncedBatch {
    tx: mpsc::Sender<BatchMessage>,
}

impl DebouncedBatch {
    /// Spawn the accumulator task. `flush` is invoked with the deduplicated
    /// batch once `quiet` elapses with no new activity.
    pub fn spawn<F, Fut>(quiet: Duration, mut flush: F) -> Self
    where
        F: FnMut(Vec<String>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<BatchMessage>(64);

        tokio::spawn(async move {
            let mut pending: Vec<String> = Vec::new();

            loop {
                if pending.is_empty() {
                    // Nothing buffered: just wait for activity.
                    match rx.recv().await {
                        Some(BatchMessage::Add(ids)) => merge(&mut pending, ids),
                        None => break,
                    }
                    continue;
                }

                // Buffered ids: flush after a quiet window, resetting the
                // window whenever new ids arrive.
                tokio::select! {
                    message = rx.recv() => {
                        match message {
                            Some(BatchMessage::Add(ids)) => merge(&mut pending, ids),
                            None => {
                                // Sender gone: flush what we have and stop.
                                flush(std::mem::take(&mut pending)).await;
                                break;
                            }
                        }
                    }
                    () = sleep(quiet) => {
                        let batch = std::mem::take(&mut pending);
                        debug!(count = batch.len(), "Flushing batch");
                        flush(batch).await;
                    }
                }
            }

            debug!("Batch task terminated");
        });

        Self { tx }
    }

    /// Add ids to the pending batch, restarting the quiet window.
    pub async fn add(&self, ids: Vec<String>) {
        if ids.is_empty() {
            return;
        }
        let _ = self.tx.send(BatchMessage::Add(ids)).await;
    }
}

fn merge(pending: &mut Vec<String>, ids: Vec<String>) {
    for id in ids {
        if !pending.contains(&id) {
            pending.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collector() -> (Arc<Mutex<Vec<Vec<String>>>>, DebouncedBatch) {
        let flushes: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = flushes.clone();
        let batch = DebouncedBatch::spawn(Duration::from_secs(2), move |ids| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(ids);
            }
        });
        (flushes, batch)
    }

    #[tokio::test(start_paused = true)]
    async fn flushes_the_accumulated_set_after_the_quiet_window() {
        let (flushes, batch) = collector();

        batch.add(vec!["n1".into()]).await;
        batch.add(vec!["n2".into(), "n1".into()]).await;

        tokio::time::sleep(Duration::from_secs(3)).await;

        let flushed = flushes.lock().unwrap().clone();
        assert_eq!(flushed, vec![vec!["n1".to_string(), "n2".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_quiet_window() {
        let (flushes, batch) = collector();

        batch.add(vec!["n1".into()]).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        // New activity inside the window: no flush yet.
        batch.add(vec!["n2".into()]).await;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(flushes.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(flushes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_second_burst_flushes_separately() {
        let (flushes, batch) = collector();

        batch.add(vec!["n1".into()]).await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        batch.add(vec!["n2".into()]).await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let flushed = flushes.lock().unwrap().clone();
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed[0], vec!["n1".to_string()]);
        assert_eq!(flushed[1], vec!["n2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_adds_are_ignored() {
        let (flushes, batch) = collector();

        batch.add(Vec::new()).await;
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert!(flushes.lock().unwrap().is_empty());
    }
}

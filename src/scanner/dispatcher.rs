//! Fixed worker pool over the wordlist.
//!
//! N workers share one atomic cursor into the path list: "take the next
//! index or exit". Every path is probed exactly once regardless of worker
//! count, and a failed probe never takes its worker out of the loop —
//! the classifier swallows transport errors internally. Completion means
//! all workers have joined, so no probe is still in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::scanner::probe::Classifier;
use crate::Hit;

/// Distributes candidate paths across a bounded pool of workers and
/// collects hits thread-safely.
pub struct Dispatcher {
    worker_count: usize,
}

impl Dispatcher {
    /// Create a dispatcher with the given worker count (minimum 1).
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }

    /// Drain the path list through the classifier.
    ///
    /// Hits come back in append order, which is unrelated to wordlist
    /// order. Workers beyond the number of paths find no work and exit.
    pub async fn run(&self, classifier: Arc<Classifier>, paths: Vec<String>) -> Vec<Hit> {
        if paths.is_empty() {
            return Vec::new();
        }

        let workers = self.worker_count.min(paths.len());
        let paths = Arc::new(paths);
        let cursor = Arc::new(AtomicUsize::new(0));
        let hits: Arc<Mutex<Vec<Hit>>> = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let classifier = Arc::clone(&classifier);
            let paths = Arc::clone(&paths);
            let cursor = Arc::clone(&cursor);
            let hits = Arc::clone(&hits);

            handles.push(tokio::spawn(async move {
                loop {
                    let idx = cursor.fetch_add(1, Ordering::SeqCst);
                    if idx >= paths.len() {
                        break;
                    }
                    if let Some(hit) = classifier.probe_path(&paths[idx]).await {
                        hits.lock().await.push(hit);
                    }
                }
                tracing::debug!(worker_id, "worker drained the queue");
            }));
        }

        for handle in handles {
            // A panicked worker loses only its in-flight path; the cursor
            // has already moved on for the others.
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "scan worker panicked");
            }
        }

        match Arc::try_unwrap(hits) {
            Ok(mutex) => mutex.into_inner(),
            // Unreachable once all workers joined, but stay total.
            Err(shared) => shared.lock().await.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_count_floor() {
        assert_eq!(Dispatcher::new(0).worker_count, 1);
        assert_eq!(Dispatcher::new(7).worker_count, 7);
    }
}

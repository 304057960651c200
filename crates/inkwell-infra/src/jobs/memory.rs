//! In-memory task queue backed by a bounded channel and a fixed worker pool.
//!
//! Tasks are lost on shutdown. Failed tasks are logged and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use inkwell_core::ports::{QueueStats, Task, TaskOutcome, TaskQueue, TaskQueueError};

#[derive(Debug, Clone)]
pub struct TaskQueueConfig {
    /// Channel capacity. Submissions beyond it are rejected, never awaited.
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
}

impl Default for TaskQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            workers: 4,
        }
    }
}

#[derive(Default)]
struct TaskStats {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

pub struct InMemoryTaskQueue {
    stats: Arc<TaskStats>,
    config: TaskQueueConfig,
    sender: mpsc::Sender<Task>,
    receiver: Arc<Mutex<mpsc::Receiver<Task>>>,
}

impl InMemoryTaskQueue {
    pub fn new(config: TaskQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(1));

        Self {
            stats: Arc::new(TaskStats::default()),
            config,
            sender: tx,
            receiver: Arc::new(Mutex::new(rx)),
        }
    }

    /// Spawn the worker pool. Each worker pulls tasks until the queue is dropped.
    pub fn start_workers<F>(&self, handler: F) -> Vec<JoinHandle<()>>
    where
        F: Fn(Task) -> BoxFuture<'static, TaskOutcome> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);

        (0..self.config.workers.max(1))
            .map(|worker_id| {
                let handler = handler.clone();
                let receiver = self.receiver.clone();
                let stats = self.stats.clone();

                tokio::spawn(async move {
                    tracing::debug!(worker = worker_id, "Task worker started");

                    loop {
                        let task = {
                            let mut rx = receiver.lock().await;
                            rx.recv().await
                        };
                        let Some(task) = task else {
                            break;
                        };

                        stats.pending.fetch_sub(1, Ordering::Relaxed);
                        stats.processing.fetch_add(1, Ordering::Relaxed);

                        let kind = task.kind();
                        let outcome = handler(task).await;

                        stats.processing.fetch_sub(1, Ordering::Relaxed);
                        match outcome {
                            TaskOutcome::Done => {
                                stats.completed.fetch_add(1, Ordering::Relaxed);
                                tracing::debug!(worker = worker_id, task = kind, "Task completed");
                            }
                            TaskOutcome::Failed(reason) => {
                                stats.failed.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!(
                                    worker = worker_id,
                                    task = kind,
                                    reason = %reason,
                                    "Task failed, dropping"
                                );
                            }
                        }
                    }

                    tracing::debug!(worker = worker_id, "Task worker shutting down");
                })
            })
            .collect()
    }
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new(TaskQueueConfig::default())
    }
}

impl TaskQueue for InMemoryTaskQueue {
    fn submit(&self, task: Task) -> Result<(), TaskQueueError> {
        // Count before sending so a fast worker never decrements below zero.
        self.stats.pending.fetch_add(1, Ordering::Relaxed);

        self.sender.try_send(task).map_err(|e| {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            match e {
                mpsc::error::TrySendError::Full(_) => TaskQueueError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => TaskQueueError::Closed,
            }
        })
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::FutureExt;
    use inkwell_core::domain::PostView;
    use uuid::Uuid;

    use super::*;

    fn view_task() -> Task {
        Task::RecordView(PostView::new(Uuid::new_v4(), "10.0.0.1", "test"))
    }

    async fn wait_for(queue: &InMemoryTaskQueue, done: usize) -> QueueStats {
        for _ in 0..100 {
            let stats = queue.stats();
            if stats.completed + stats.failed >= done {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        queue.stats()
    }

    #[tokio::test]
    async fn test_submit_without_workers_fills_up() {
        let queue = InMemoryTaskQueue::new(TaskQueueConfig {
            max_size: 2,
            workers: 1,
        });

        queue.submit(view_task()).unwrap();
        queue.submit(view_task()).unwrap();
        assert!(matches!(
            queue.submit(view_task()),
            Err(TaskQueueError::QueueFull)
        ));
        assert_eq!(queue.stats().pending, 2);
    }

    #[tokio::test]
    async fn test_workers_record_outcomes_without_retry() {
        let queue = InMemoryTaskQueue::new(TaskQueueConfig {
            max_size: 16,
            workers: 2,
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        queue.start_workers(move |_task| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 2 == 0 {
                    TaskOutcome::Done
                } else {
                    TaskOutcome::Failed("boom".to_string())
                }
            }
            .boxed()
        });

        for _ in 0..4 {
            queue.submit(view_task()).unwrap();
        }

        let stats = wait_for(&queue, 4).await;
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.pending, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}

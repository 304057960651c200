//! Background task port - fire-and-forget work handed off by request handlers.

use crate::domain::PostView;

/// A unit of background work.
#[derive(Debug, Clone)]
pub enum Task {
    /// Persist a view record and bump the post's view counter.
    RecordView(PostView),
}

impl Task {
    pub fn kind(&self) -> &'static str {
        match self {
            Task::RecordView(_) => "record_view",
        }
    }
}

/// Result of running a task. Failed tasks are logged and dropped, never retried.
#[derive(Debug)]
pub enum TaskOutcome {
    Done,
    Failed(String),
}

/// Task queue trait - the submitter never observes the outcome.
pub trait TaskQueue: Send + Sync {
    /// Hand a task to the pool without waiting.
    fn submit(&self, task: Task) -> Result<(), TaskQueueError>;

    fn stats(&self) -> QueueStats;
}

/// Queue statistics.
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Task queue errors.
#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    #[error("Queue is full")]
    QueueFull,

    #[error("Queue is closed")]
    Closed,
}

//! Background task execution.

mod memory;

pub use memory::{InMemoryTaskQueue, TaskQueueConfig};

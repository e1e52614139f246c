//! Bounded queues between the attribute-write handler and the packet worker.
//!
//! Two queues, for two different things: [`CommandPipeline`] holds already-decoded commands
//! awaiting dispatch, while [`StringPipeline`] holds pending keyboard-typing jobs, which drain
//! one character at a time and so need their own bound independent of how fast commands arrive.

use heapless::spsc::Queue;
use heapless::String;

use crate::error::CoreError;
use crate::wire::Command;
use crate::{COMMAND_QUEUE_CAPACITY, MAX_QUEUE_STRING_LEN, STRING_QUEUE_CAPACITY};

// `heapless::spsc::Queue<T, N>` can hold at most `N - 1` elements, so each backing store below is
// sized one larger than the logical capacity it advertises.
const COMMAND_BACKING_LEN: usize = COMMAND_QUEUE_CAPACITY + 1;
const STRING_BACKING_LEN: usize = STRING_QUEUE_CAPACITY + 1;

/// FIFO of decoded commands awaiting the packet worker, bounded at
/// [`COMMAND_QUEUE_CAPACITY`].
pub struct CommandPipeline {
    queue: Queue<Command, COMMAND_BACKING_LEN>,
}

impl CommandPipeline {
    /// Creates an empty pipeline.
    pub const fn new() -> Self {
        CommandPipeline {
            queue: Queue::new(),
        }
    }

    /// Enqueues a command, or returns [`CoreError::QueueFull`] if the pipeline is at capacity.
    pub fn push(&mut self, command: Command) -> Result<(), CoreError> {
        self.queue.enqueue(command).map_err(|_| CoreError::QueueFull)
    }

    /// Dequeues the oldest command, if any, preserving arrival order.
    pub fn pop(&mut self) -> Option<Command> {
        self.queue.dequeue()
    }

    /// Number of commands currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pipeline has no commands queued.
    pub fn is_empty(&self) -> bool {
        self.queue.len() == 0
    }

    /// Whether the pipeline is at [`COMMAND_QUEUE_CAPACITY`].
    pub fn is_full(&self) -> bool {
        self.queue.len() >= COMMAND_QUEUE_CAPACITY
    }
}

impl Default for CommandPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// FIFO of pending typing jobs awaiting the keyboard typist, bounded at
/// [`STRING_QUEUE_CAPACITY`], each job at most [`MAX_QUEUE_STRING_LEN`] bytes.
pub struct StringPipeline {
    queue: Queue<String<MAX_QUEUE_STRING_LEN>, STRING_BACKING_LEN>,
}

impl StringPipeline {
    /// Creates an empty pipeline.
    pub const fn new() -> Self {
        StringPipeline {
            queue: Queue::new(),
        }
    }

    /// Enqueues a typing job, copying `text` into the queue.
    ///
    /// Fails with [`CoreError::Decode`] if `text` exceeds [`MAX_QUEUE_STRING_LEN`], or
    /// [`CoreError::QueueFull`] if the pipeline is at capacity.
    pub fn push(&mut self, text: &str) -> Result<(), CoreError> {
        let mut owned = String::new();
        owned.push_str(text).map_err(|_| CoreError::Decode)?;
        self.queue.enqueue(owned).map_err(|_| CoreError::QueueFull)
    }

    /// Dequeues the oldest typing job, if any.
    pub fn pop(&mut self) -> Option<String<MAX_QUEUE_STRING_LEN>> {
        self.queue.dequeue()
    }

    /// Number of typing jobs currently queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the pipeline has no typing jobs queued.
    pub fn is_empty(&self) -> bool {
        self.queue.len() == 0
    }
}

impl Default for StringPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_dequeue_in_fifo_order() {
        let mut pipeline = CommandPipeline::new();
        pipeline.push(Command::SystemControl(1)).unwrap();
        pipeline.push(Command::SystemControl(2)).unwrap();

        match pipeline.pop() {
            Some(Command::SystemControl(1)) => {}
            other => panic!("expected first-pushed command first, got {other:?}"),
        }
        match pipeline.pop() {
            Some(Command::SystemControl(2)) => {}
            other => panic!("expected second-pushed command next, got {other:?}"),
        }
        assert!(pipeline.is_empty());
    }

    #[test]
    fn commands_reject_past_capacity() {
        let mut pipeline = CommandPipeline::new();
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            pipeline.push(Command::SystemControl(1)).unwrap();
        }
        assert!(pipeline.is_full());
        assert_eq!(
            pipeline.push(Command::SystemControl(1)),
            Err(CoreError::QueueFull)
        );
    }

    #[test]
    fn string_pipeline_rejects_oversized_job() {
        let mut pipeline = StringPipeline::new();
        let too_long = "x".repeat(MAX_QUEUE_STRING_LEN + 1);
        assert_eq!(pipeline.push(&too_long), Err(CoreError::Decode));
    }

    #[test]
    fn string_pipeline_round_trips_fifo() {
        let mut pipeline = StringPipeline::new();
        pipeline.push("first").unwrap();
        pipeline.push("second").unwrap();
        assert_eq!(pipeline.pop().unwrap().as_str(), "first");
        assert_eq!(pipeline.pop().unwrap().as_str(), "second");
    }
}

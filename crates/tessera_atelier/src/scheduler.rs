//! Host scheduling primitives.

use std::cell::RefCell;
use std::collections::VecDeque;

/// A callback handed to the host.
pub type Task = Box<dyn FnOnce()>;

/// Runs callbacks at a later point chosen by the host.
pub trait HostScheduler {
    /// Schedule a task to run later, after the current call stack.
    fn schedule(&self, task: Task);
}

/// FIFO task queue drained explicitly by its owner.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the tasks queued right now. Tasks they schedule wait for the next
    /// call.
    pub fn run_pending(&self) -> usize {
        let count = self.len();
        for _ in 0..count {
            let task = self.tasks.borrow_mut().pop_front();
            if let Some(task) = task {
                task();
            }
        }
        count
    }

    /// Run tasks until the queue stays empty.
    pub fn run_until_idle(&self) -> usize {
        let mut count = 0;
        loop {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    count += 1;
                }
                None => return count,
            }
        }
    }
}

impl HostScheduler for TaskQueue {
    fn schedule(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

/// Drops every request; the owner flushes the updater by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualScheduler;

impl HostScheduler for ManualScheduler {
    fn schedule(&self, _task: Task) {}
}

//! # Scheduler
//! One pass of the cooperative main loop.
//!
//! The power state machine settles before any task runs, so every task sees
//! the power mode of the current tick.

use crate::power::{PowerControl, PowerMode};
use core::cell::RefCell;

/// A module polled once per main loop pass
pub trait Task {
    /// Do this tick's work without blocking
    fn run_task(&mut self);
}

/// Ordered list of tasks run after the power state machine
pub struct Scheduler<'a, const N: usize> {
    /// Power state machine
    power: &'a RefCell<dyn PowerControl + 'a>,
    /// Tasks in run order
    tasks: [&'a RefCell<dyn Task + 'a>; N],
}

impl<'a, const N: usize> Scheduler<'a, N> {
    /// Create a scheduler over a fixed task list
    pub const fn new(power: &'a RefCell<dyn PowerControl + 'a>, tasks: [&'a RefCell<dyn Task + 'a>; N]) -> Self {
        Self { power, tasks }
    }

    /// Run one pass: feed the watchdog, settle the power mode, run the tasks.
    /// Returns the power mode the tasks ran under.
    pub fn tick(&self) -> PowerMode {
        let mode = {
            let mut power = self.power.borrow_mut();
            power.feed_watchdog();
            power.detect_power_state()
        };

        for task in &self.tasks {
            task.borrow_mut().run_task();
        }
        mode
    }
}

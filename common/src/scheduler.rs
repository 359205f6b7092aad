//! Periodic task multiplexer.
//!
//! Turns one fixed-rate tick into up to [`MAX_TASKS`] independently clocked
//! software timers. A task registered with divisor `d` fires on every `d`-th
//! call to [`Scheduler::advance`], i.e. at `TICK_RATE_HZ / d`.
//!
//! # Dispatch Model
//!
//! - Single-threaded and run-to-completion: `advance` invokes every due task
//!   synchronously before returning.
//! - Tasks fire in registration order within a tick, so tasks sharing a
//!   divisor always observe each other's effects in the same order.
//! - Tasks are never removed. The table only grows, up to its capacity.
//!
//! The caller must not call `advance` re-entrantly (e.g. from a task). The
//! `&mut self` receiver enforces this for safe code.
//!
//! # Tasks and Context
//!
//! Tasks receive a `&mut C` context on every run instead of reaching for
//! globals. Any type implementing [`Task<C>`] can be scheduled; plain
//! `fn(&mut C)` pointers implement it out of the box.

use core::fmt;

use heapless::Vec;

use crate::config::MAX_TASKS;

// =============================================================================
// Errors
// =============================================================================

/// Registration failures.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SchedulerError {
    /// The task table is full.
    CapacityExceeded,
    /// A divisor of zero would never fire.
    InvalidDivisor,
}

impl fmt::Display for SchedulerError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::CapacityExceeded => f.write_str("task table full"),
            Self::InvalidDivisor => f.write_str("divisor must be non-zero"),
        }
    }
}

// =============================================================================
// Task Abstraction
// =============================================================================

/// A periodic unit of work run against a shared context.
pub trait Task<C: ?Sized> {
    /// Run once. Must return within one tick period.
    fn run(
        &mut self,
        ctx: &mut C,
    );
}

impl<C: ?Sized> Task<C> for fn(&mut C) {
    fn run(
        &mut self,
        ctx: &mut C,
    ) {
        (*self)(ctx);
    }
}

/// Handle to a registered task (its slot index).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TaskHandle(usize);

impl TaskHandle {
    /// Slot index, which is also the dispatch position within a tick.
    #[inline]
    pub const fn index(self) -> usize { self.0 }
}

struct Slot<T> {
    task: T,
    divisor: u16,
    elapsed: u16,
    runs: u32,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Fixed-capacity table of periodic tasks.
pub struct Scheduler<T, const N: usize = MAX_TASKS> {
    slots: Vec<Slot<T>, N>,
    ticks: u32,
}

impl<T, const N: usize> Scheduler<T, N> {
    /// Create an empty scheduler.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            ticks: 0,
        }
    }

    /// Register `task` to fire every `divisor` ticks.
    ///
    /// The task first fires on the `divisor`-th `advance` after registration.
    /// A failed registration leaves the table untouched.
    pub fn register(
        &mut self,
        task: T,
        divisor: u16,
    ) -> Result<TaskHandle, SchedulerError> {
        if divisor == 0 {
            return Err(SchedulerError::InvalidDivisor);
        }
        let index = self.slots.len();
        self.slots
            .push(Slot {
                task,
                divisor,
                elapsed: 0,
                runs: 0,
            })
            .map_err(|_| SchedulerError::CapacityExceeded)?;
        Ok(TaskHandle(index))
    }

    /// Process one tick, running every task whose period just elapsed.
    pub fn advance<C: ?Sized>(
        &mut self,
        ctx: &mut C,
    ) where
        T: Task<C>,
    {
        self.ticks = self.ticks.wrapping_add(1);
        for slot in &mut self.slots {
            slot.elapsed += 1;
            if slot.elapsed == slot.divisor {
                slot.elapsed = 0;
                slot.runs = slot.runs.wrapping_add(1);
                slot.task.run(ctx);
            }
        }
    }

    /// Number of registered tasks.
    #[inline]
    pub fn len(&self) -> usize { self.slots.len() }

    /// Check if no task is registered.
    #[inline]
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    /// Check if another registration would fail with `CapacityExceeded`.
    #[inline]
    pub fn is_full(&self) -> bool { self.slots.is_full() }

    /// Total ticks advanced since creation (wrapping).
    #[inline]
    pub const fn ticks(&self) -> u32 { self.ticks }

    /// How many times the task behind `handle` has fired (wrapping).
    pub fn runs(
        &self,
        handle: TaskHandle,
    ) -> Option<u32> {
        self.slots.get(handle.0).map(|slot| slot.runs)
    }

    /// Divisor the task behind `handle` was registered with.
    pub fn divisor(
        &self,
        handle: TaskHandle,
    ) -> Option<u16> {
        self.slots.get(handle.0).map(|slot| slot.divisor)
    }
}

impl<T, const N: usize> Default for Scheduler<T, N> {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Tests
// =============================================================================

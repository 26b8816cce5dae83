//! Bounded FIFO backed by a mutex and two condition variables.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

use super::{Queue, State};

struct Inner<V> {
    buffer: VecDeque<V>,
    enabled: bool,
}

/// A bounded FIFO queue with blocking `push`/`pop`.
///
/// `push` suspends the caller on `not_full` until space frees up or the
/// queue is disabled; `pop` suspends on `not_empty` until a value arrives
/// or the queue is disabled. [`BlockingQueue::stop`] broadcasts both
/// condition variables so every waiter re-checks its predicate exactly
/// once, matching the wake-on-disable contract every [`Queue`]
/// implementation shares.
pub struct BlockingQueue<V> {
    capacity: usize,
    state: Mutex<Inner<V>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<V> BlockingQueue<V> {
    /// Create a new blocking queue with the given fixed capacity.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            state: Mutex::new(Inner {
                buffer: VecDeque::with_capacity(capacity),
                enabled: true,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        })
    }
}

impl<V: Send> Queue<V> for BlockingQueue<V> {
    fn pop(&self) -> Option<V> {
        let mut guard = self.state.lock();
        self.not_empty
            .wait_while(&mut guard, |inner| inner.buffer.is_empty() && inner.enabled);

        let value = guard.buffer.pop_front();
        drop(guard);

        if value.is_some() {
            self.not_full.notify_one();
        }

        value
    }

    fn push(&self, value: V) -> State {
        let mut guard = self.state.lock();
        self.not_full.wait_while(&mut guard, |inner| {
            inner.buffer.len() >= self.capacity && inner.enabled
        });

        if !guard.enabled {
            return State::QueueDisabled;
        }

        guard.buffer.push_back(value);
        drop(guard);

        self.not_empty.notify_one();
        State::Ok
    }

    fn try_push(&self, value: V) -> State {
        let mut guard = self.state.lock();

        if !guard.enabled {
            return State::QueueDisabled;
        }

        if guard.buffer.len() >= self.capacity {
            return State::QueueFull;
        }

        guard.buffer.push_back(value);
        drop(guard);

        self.not_empty.notify_one();
        State::Ok
    }

    fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    fn max_size(&self) -> usize {
        self.capacity
    }

    fn enabled(&self) -> bool {
        self.state.lock().enabled
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    fn stop(&self) {
        self.state.lock().enabled = false;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

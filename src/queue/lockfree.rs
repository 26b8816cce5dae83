//! Bounded lock-free MPMC queue.
//!
//! This is a Vyukov-style slot ring buffer: every slot carries its own
//! sequence counter so multiple producers and multiple consumers can
//! race on the same buffer without a separate free-list or a lock.
//! `Pop` is never allowed to block, so a consumer driving one of these
//! must poll; see the MPSC worker loop in [`crate::manager::mpsc`] for
//! the yield strategy that makes that affordable.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

use crate::error::Error;

use super::{Queue, State};

struct Slot<V> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<V>>,
}

/// A bounded lock-free queue supporting multiple concurrent producers and
/// multiple concurrent consumers.
///
/// Unlike the C++ lineage this is ported from (`boost::lockfree::queue`,
/// which copies elements through the ring), this implementation moves
/// values through `MaybeUninit` slots, so `V` only needs to be `Send` —
/// see the "V: Copy question" Open Question in DESIGN.md.
pub struct LockFreeQueue<V> {
    buffer: Box<[Slot<V>]>,
    capacity: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
    enabled: AtomicBool,
}

unsafe impl<V: Send> Send for LockFreeQueue<V> {}
unsafe impl<V: Send> Sync for LockFreeQueue<V> {}

impl<V> LockFreeQueue<V> {
    /// Create a new lock-free queue with exactly `capacity` slots.
    ///
    /// Slot lookup uses a modulo rather than a bitmask, so unlike the
    /// `boost::lockfree::queue`-based original this does not require
    /// `capacity` to be a power of two — `LockFreeQueue::new(3)` holds
    /// exactly 3 values, matching the blocking queue's capacity contract.
    ///
    /// # Errors
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }

        let buffer: Vec<Slot<V>> = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Ok(Self {
            buffer: buffer.into_boxed_slice(),
            capacity,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            enabled: AtomicBool::new(true),
        })
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn try_push_value(&self, value: V) -> Result<(), V> {
        let mut tail = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[tail % self.capacity];
            let sequence = slot.sequence.load(Ordering::Acquire);
            let diff = sequence as isize - tail as isize;

            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*slot.value.get()).write(value) };
                        slot.sequence.store(tail.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => tail = current,
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                tail = self.tail.load(Ordering::Relaxed);
            }
        }
    }
}

impl<V: Send> Queue<V> for LockFreeQueue<V> {
    fn pop(&self) -> Option<V> {
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[head % self.capacity];
            let sequence = slot.sequence.load(Ordering::Acquire);
            let diff = sequence as isize - (head.wrapping_add(1)) as isize;

            if diff == 0 {
                match self.head.compare_exchange_weak(
                    head,
                    head.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let value = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.sequence
                            .store(head.wrapping_add(self.capacity()), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => head = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                head = self.head.load(Ordering::Relaxed);
            }
        }
    }

    fn push(&self, value: V) -> State {
        // The queue never blocks; push and try_push share semantics.
        self.try_push(value)
    }

    fn try_push(&self, value: V) -> State {
        if !self.enabled.load(Ordering::Acquire) {
            return State::QueueDisabled;
        }

        match self.try_push_value(value) {
            Ok(()) => State::Ok,
            Err(_) => State::QueueFull,
        }
    }

    fn is_empty(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let slot = &self.buffer[head % self.capacity];
        slot.sequence.load(Ordering::Acquire) != head.wrapping_add(1)
    }

    fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head)
    }

    fn max_size(&self) -> usize {
        self.capacity()
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn stop(&self) {
        // Non-blocking queue: there are no waiters to wake, only the flag
        // to flip. A spinning consumer must observe it on its own.
        self.enabled.store(false, Ordering::Release);
    }
}

impl<V> Drop for LockFreeQueue<V> {
    fn drop(&mut self) {
        while Queue::pop(self).is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn basic_push_pop_order() {
        let q: LockFreeQueue<i32> = LockFreeQueue::new(4).unwrap();
        assert_eq!(q.try_push(1), State::Ok);
        assert_eq!(q.try_push(2), State::Ok);
        assert_eq!(q.try_push(3), State::Ok);

        assert_eq!(q.try_push(4), State::QueueFull);

        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn non_power_of_two_capacity_is_preserved() {
        let q: LockFreeQueue<i32> = LockFreeQueue::new(3).unwrap();
        assert_eq!(q.max_size(), 3);

        assert_eq!(q.try_push(1), State::Ok);
        assert_eq!(q.try_push(2), State::Ok);
        assert_eq!(q.try_push(3), State::Ok);
        assert_eq!(q.try_push(4), State::QueueFull);

        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }

    #[test]
    fn disabled_rejects_push() {
        let q: LockFreeQueue<i32> = LockFreeQueue::new(4).unwrap();
        q.stop();
        assert_eq!(q.try_push(1), State::QueueDisabled);
    }

    #[test]
    fn stop_is_idempotent() {
        let q: LockFreeQueue<i32> = LockFreeQueue::new(4).unwrap();
        q.stop();
        q.stop();
        assert!(!q.enabled());
    }

    #[test]
    fn mpmc_threaded_conserves_all_values() {
        let queue: Arc<LockFreeQueue<i32>> = Arc::new(LockFreeQueue::new(1024).unwrap());

        let producers: Vec<_> = (0..4)
            .map(|t| {
                let q = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..1000 {
                        let value = t * 1000 + i;
                        while q.try_push(value) != State::Ok {
                            std::hint::spin_loop();
                        }
                    }
                })
            })
            .collect();

        for p in producers {
            p.join().unwrap();
        }

        let mut received = Vec::new();
        while received.len() < 4000 {
            if let Some(v) = queue.pop() {
                received.push(v);
            }
        }

        received.sort_unstable();
        let expected: Vec<i32> = (0..4000).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = LockFreeQueue::<i32>::new(0).unwrap_err();
        assert!(matches!(err, Error::InvalidCapacity(0)));
    }
}

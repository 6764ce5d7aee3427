//! Bounded lock-free MPMC queue used as the transport between loggers and
//! the backend worker.
//!
//! This is the classic Vyukov design: a power-of-two ring of slots, each
//! carrying its own sequence number. The sequence encodes whether the slot
//! currently holds data or free space, so producers and consumers coordinate
//! through one acquire/release pair per slot instead of a shared lock.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

struct Slot<T> {
    /// Writable when `sequence == enqueue_pos`, readable when
    /// `sequence == dequeue_pos + 1`.
    sequence: AtomicUsize,
    item: UnsafeCell<MaybeUninit<T>>,
}

/// A fixed-capacity multi-producer multi-consumer queue.
///
/// `try_push` and `try_pop` never block; a full or empty queue is a normal
/// outcome, not an error. Capacity is rounded up to the next power of two
/// (minimum 1).
pub struct RingQueue<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    enqueue_pos: CachePadded<AtomicUsize>,
    dequeue_pos: CachePadded<AtomicUsize>,
}

// The UnsafeCell payload is only ever accessed by the thread that won the
// slot's sequence handshake.
unsafe impl<T: Send> Send for RingQueue<T> {}
unsafe impl<T: Send> Sync for RingQueue<T> {}

impl<T> RingQueue<T> {
    pub fn with_capacity(requested: usize) -> Self {
        let capacity = requested.max(1).next_power_of_two();

        let buffer: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                item: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            buffer,
            mask: capacity - 1,
            enqueue_pos: CachePadded::new(AtomicUsize::new(0)),
            dequeue_pos: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Attempt to enqueue an item, returning it back if the queue is full.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);

        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                // Slot is free; claim this position.
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        unsafe { (*slot.item.get()).write(item) };
                        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(item);
            } else {
                // Another producer claimed this slot first.
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Attempt to dequeue an item, returning `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);

        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos.wrapping_add(1) as isize;

            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        let item = unsafe { (*slot.item.get()).assume_init_read() };
                        slot.sequence
                            .store(pos.wrapping_add(self.capacity()), Ordering::Release);
                        return Some(item);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// Approximate number of queued items. Advisory under concurrency.
    pub fn size_approx(&self) -> usize {
        let enq = self.enqueue_pos.load(Ordering::Relaxed);
        let deq = self.dequeue_pos.load(Ordering::Relaxed);
        enq.wrapping_sub(deq)
    }

    /// Advisory emptiness check.
    pub fn is_empty(&self) -> bool {
        let enq = self.enqueue_pos.load(Ordering::Relaxed);
        let deq = self.dequeue_pos.load(Ordering::Relaxed);
        enq == deq
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

impl<T> Drop for RingQueue<T> {
    fn drop(&mut self) {
        // Release any items still sitting between the two positions.
        let enq = self.enqueue_pos.load(Ordering::Relaxed);
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        while pos != enq {
            let slot = &self.buffer[pos & self.mask];
            unsafe { (*slot.item.get()).assume_init_drop() };
            pos = pos.wrapping_add(1);
        }
    }
}

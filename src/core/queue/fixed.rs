use std::collections::VecDeque;

use crossbeam_queue::ArrayQueue;

use crate::core::queue::BoundedStorage;

/// Fixed-capacity ring buffer; never grows past the capacity it was built with.
#[derive(Debug)]
pub struct FixedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> FixedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
}

impl<T: Send> BoundedStorage<T> for FixedQueue<T> {
    #[inline]
    fn try_push(&mut self, item: T) -> Result<(), T> {
        if self.items.len() >= self.capacity {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    #[inline]
    fn try_pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    #[inline]
    fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

/// Lock-free array queue as storage. The monitor still serialises access, but
/// this keeps the element buffer preallocated in a single slab.
impl<T: Send> BoundedStorage<T> for ArrayQueue<T> {
    #[inline]
    fn try_push(&mut self, item: T) -> Result<(), T> {
        self.push(item)
    }

    #[inline]
    fn try_pop(&mut self) -> Option<T> {
        self.pop()
    }

    #[inline]
    fn len(&self) -> usize {
        ArrayQueue::len(self)
    }

    #[inline]
    fn capacity(&self) -> usize {
        ArrayQueue::capacity(self)
    }

    fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

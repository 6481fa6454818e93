use std::collections::VecDeque;

/// Fixed-capacity ordered buffer that evicts its oldest entry on overflow.
///
/// Entries can be inserted newest-first (result lists) or newest-last
/// (activity log); in both cases the entry that falls off is the oldest one.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedView<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedView<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts at the front; evicts from the back. Returns the evicted entry.
    pub fn push_newest_first(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        self.items.push_front(item);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// Inserts at the back; evicts from the front. Returns the evicted entry.
    pub fn push_newest_last(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Clone> BoundedView<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

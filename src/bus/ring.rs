//! Fixed-capacity sliding window over the most recent entries.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
    dropped: u64,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append to the back, evicting from the front once the log is full.
    /// Returns the evicted entry, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            self.dropped += 1;
            return Some(item);
        }
        let evicted = if self.entries.len() == self.capacity {
            self.dropped += 1;
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(item);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn front(&self) -> Option<&T> {
        self.entries.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.entries.back()
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// The newest `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_everything_below_capacity() {
        let mut log = BoundedLog::new(4);
        for i in 0..3 {
            assert_eq!(log.push(i), None);
        }
        assert_eq!(log.to_vec(), vec![0, 1, 2]);
        assert_eq!(log.dropped(), 0);
    }

    #[test]
    fn evicts_exactly_one_from_the_front_per_overflowing_push() {
        let mut log = BoundedLog::new(3);
        for i in 0..3 {
            log.push(i);
        }
        assert_eq!(log.push(3), Some(0));
        assert_eq!(log.push(4), Some(1));
        assert_eq!(log.len(), 3);
        assert_eq!(log.to_vec(), vec![2, 3, 4]);
        assert_eq!(log.front(), Some(&2));
        assert_eq!(log.back(), Some(&4));
        assert_eq!(log.dropped(), 2);
    }

    #[test]
    fn window_matches_last_n_for_long_runs() {
        let mut log = BoundedLog::new(1000);
        for i in 0..2500u32 {
            log.push(i);
            assert!(log.len() <= 1000);
        }
        let expected: Vec<u32> = (1500..2500).collect();
        assert_eq!(log.to_vec(), expected);
        assert_eq!(log.dropped(), 1500);
    }

    #[test]
    fn tail_returns_newest_in_order() {
        let mut log = BoundedLog::new(5);
        for i in 0..5 {
            log.push(i);
        }
        assert_eq!(log.tail(2), vec![3, 4]);
        assert_eq!(log.tail(10), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_capacity_never_holds_anything() {
        let mut log = BoundedLog::new(0);
        assert_eq!(log.push("a"), Some("a"));
        assert!(log.is_empty());
        assert_eq!(log.dropped(), 1);
    }
}

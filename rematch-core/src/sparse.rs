//! Sparse sets of instruction indices
//!
//! Insertion, membership and clearing are all O(1), and members iterate in
//! insertion order, which the executors rely on for match priority.

#[derive(Debug, Clone, Default)]
pub(crate) struct SparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
}

impl SparseSet {
    pub fn new(capacity: usize) -> Self {
        SparseSet {
            dense: Vec::with_capacity(capacity),
            sparse: vec![0; capacity],
        }
    }

    /// Grow the set so it can hold values below `capacity`, and empty it.
    pub fn reset(&mut self, capacity: usize) {
        self.dense.clear();
        if self.sparse.len() < capacity {
            self.sparse.resize(capacity, 0);
        }
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn contains(&self, value: usize) -> bool {
        match self.sparse.get(value) {
            Some(&i) => i < self.dense.len() && self.dense[i] == value,
            None => false,
        }
    }

    /// Insert `value`, returning false if it was already present.
    pub fn insert(&mut self, value: usize) -> bool {
        if self.contains(value) {
            return false;
        }
        self.sparse[value] = self.dense.len();
        self.dense.push(value);
        true
    }

    /// The value inserted `i`-th.
    pub fn get(&self, i: usize) -> Option<usize> {
        self.dense.get(i).copied()
    }

    pub fn clear(&mut self) {
        self.dense.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_order() {
        let mut set = SparseSet::new(8);
        assert!(set.insert(5));
        assert!(set.insert(2));
        assert!(!set.insert(5));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0), Some(5));
        assert_eq!(set.get(1), Some(2));
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert!(!set.contains(100));
    }

    #[test]
    fn test_clear_is_logical() {
        let mut set = SparseSet::new(4);
        set.insert(1);
        set.insert(3);
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(1));
        assert!(set.insert(3));
        assert_eq!(set.get(0), Some(3));
    }

    #[test]
    fn test_reset_grows() {
        let mut set = SparseSet::default();
        set.reset(10);
        assert!(set.insert(9));
        assert!(set.contains(9));
    }
}

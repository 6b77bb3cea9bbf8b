//! Sparse integer set with O(1) membership over a bounded id range.

/// A set of non-negative integers below a fixed capacity.
///
/// Backed by the classic dense/sparse array pair: `add`, `remove`,
/// `contains`, `clear` and `len` are all O(1), iteration walks the dense
/// array in insertion order. Out-of-range adds and absent removes are
/// no-ops.
#[derive(Debug, Clone)]
pub struct SparseSet {
    dense: Vec<usize>,
    sparse: Vec<usize>,
    len: usize,
}

impl SparseSet {
    /// Creates a set accepting values in `0..=max_value`.
    pub fn new(max_value: usize) -> Self {
        let cap = max_value + 1;
        Self {
            dense: vec![0; cap],
            sparse: vec![0; cap],
            len: 0,
        }
    }

    pub fn add(&mut self, value: usize) {
        if value < self.dense.len() && !self.contains(value) {
            self.dense[self.len] = value;
            self.sparse[value] = self.len;
            self.len += 1;
        }
    }

    pub fn remove(&mut self, value: usize) {
        if self.contains(value) {
            let last = self.dense[self.len - 1];
            self.dense[self.sparse[value]] = last;
            self.sparse[last] = self.sparse[value];
            self.len -= 1;
        }
    }

    pub fn contains(&self, value: usize) -> bool {
        if value >= self.dense.len() {
            return false;
        }
        let slot = self.sparse[value];
        slot < self.len && self.dense[slot] == value
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.dense[..self.len].iter().copied()
    }
}

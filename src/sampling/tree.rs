/// a complete binary sum tree over K weighted leaves, flattened
/// into a single array. leaf k lives at `alloc - 1 + k` where alloc
/// is K rounded up to a power of two; padding leaves carry weight
/// zero and are never returned by `sample`. every internal node is
/// the sum of its two children, so the root is the total weight.
///
/// the tree is value-semantic: `Clone` copies the whole array,
/// which is what the snapshot machinery relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct SumTree {
    values: Vec<f64>,
    leaves: usize,
    alloc: usize,
}

impl SumTree {
    pub fn new(leaves: usize) -> Self {
        assert!(leaves >= 1, "a sum tree needs at least one leaf");
        let alloc = leaves.next_power_of_two();
        Self {
            values: vec![0.; 2 * alloc - 1],
            leaves,
            alloc,
        }
    }
    pub fn leaves(&self) -> usize {
        self.leaves
    }
    /// total weight across all leaves. this is the instantaneous
    /// global event rate when leaves hold group propensity sums.
    pub fn total(&self) -> f64 {
        self.values[0]
    }
    pub fn leaf(&self, k: usize) -> f64 {
        self.values[self.alloc - 1 + k]
    }
    /// add a (possibly negative) delta to leaf k and to every
    /// ancestor up to the root. O(log K). callers guarantee the
    /// logical value never goes negative; tiny round-off below
    /// zero is tolerated, not clamped.
    pub fn add(&mut self, k: usize, delta: f64) {
        debug_assert!(k < self.leaves, "leaf index {} out of {}", k, self.leaves);
        let mut i = self.alloc - 1 + k;
        self.values[i] += delta;
        while i > 0 {
            i = (i - 1) / 2;
            self.values[i] += delta;
        }
    }
    /// forget every weight. O(K); reset paths only, never the
    /// event path.
    pub fn reset(&mut self) {
        self.values.fill(0.);
    }
    /// walk from the root towards the leaf whose cumulative prefix
    /// covers `r * total`, routing left on ties. returns None when
    /// the tree holds no weight (the caller should have checked for
    /// absorption, but an empty tree must not sample).
    pub fn sample(&self, r: f64) -> Option<usize> {
        let total = self.total();
        if total <= 0. {
            return None;
        }
        let target = r * total;
        let mut cumulative = 0.;
        let mut i = 0;
        while i < self.alloc - 1 {
            let left = 2 * i + 1;
            if target <= cumulative + self.values[left] {
                i = left;
            } else {
                cumulative += self.values[left];
                i = left + 1;
            }
        }
        // round-off on the rightmost boundary could land on a
        // zero-weight padding leaf; keep the index addressable
        Some((i - (self.alloc - 1)).min(self.leaves - 1))
    }
}

//! Integer bucket priority queue driving the grid searches.

use hexmap_core::CellIndex;

/// Priority queue over small non-negative integer priorities.
///
/// Every priority owns a bucket holding an intrusive singly linked list of
/// cells. Enqueueing pushes onto the head of the bucket, dequeueing scans
/// forward from the lowest priority that may still hold a cell, and lowering a
/// priority unlinks the cell from its old bucket by walking it. Cells with
/// equal priority leave the queue most recent first.
///
/// A cell may be queued at most once at a time. The bucket array grows to the
/// largest priority ever queued, so callers keep priorities bounded.
#[derive(Clone, Debug)]
pub struct BucketQueue {
    buckets: Vec<Option<CellIndex>>,
    links: Vec<Option<CellIndex>>,
    len: usize,
    minimum: usize,
}

impl Default for BucketQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: Vec::new(),
            links: Vec::new(),
            len: 0,
            minimum: usize::MAX,
        }
    }

    /// Number of queued cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a cell with the given priority.
    pub fn enqueue(&mut self, cell: CellIndex, priority: usize) {
        self.len += 1;
        self.link(cell, priority);
    }

    /// Removes and returns a cell with the lowest priority.
    pub fn dequeue(&mut self) -> Option<CellIndex> {
        if self.len == 0 {
            return None;
        }

        while self.minimum < self.buckets.len() {
            if let Some(cell) = self.buckets[self.minimum] {
                self.buckets[self.minimum] = self.links[cell.index()];
                self.len -= 1;
                return Some(cell);
            }
            self.minimum += 1;
        }

        None
    }

    /// Moves a queued cell from `old_priority` to `new_priority`.
    ///
    /// The cell must currently be queued with `old_priority`.
    pub fn change(&mut self, cell: CellIndex, old_priority: usize, new_priority: usize) {
        let unlinked = self.unlink(cell, old_priority);
        debug_assert!(
            unlinked,
            "cell {} is not queued with priority {old_priority}",
            cell.get()
        );
        self.link(cell, new_priority);
    }

    /// Empties the queue.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
        self.minimum = usize::MAX;
    }

    fn link(&mut self, cell: CellIndex, priority: usize) {
        if priority < self.minimum {
            self.minimum = priority;
        }
        if priority >= self.buckets.len() {
            self.buckets.resize(priority + 1, None);
        }
        if cell.index() >= self.links.len() {
            self.links.resize(cell.index() + 1, None);
        }

        self.links[cell.index()] = self.buckets[priority];
        self.buckets[priority] = Some(cell);
    }

    fn unlink(&mut self, cell: CellIndex, priority: usize) -> bool {
        let Some(mut current) = self.buckets.get(priority).copied().flatten() else {
            return false;
        };

        if current == cell {
            self.buckets[priority] = self.links[cell.index()];
            return true;
        }

        while let Some(next) = self.links[current.index()] {
            if next == cell {
                self.links[current.index()] = self.links[cell.index()];
                return true;
            }
            current = next;
        }

        false
    }
}

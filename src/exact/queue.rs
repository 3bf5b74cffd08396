//! Binary min-heap over search states.
//!
//! Ordered by [`SearchState::priority`]. States are immutable once queued, so
//! there is no decrease-key: a better state is simply pushed as a new entry.

use super::state::SearchState;

#[derive(Debug, Default)]
pub struct StateHeap {
    tree: Vec<SearchState>,
}

impl StateHeap {
    pub fn new() -> Self {
        StateHeap { tree: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn peek(&self) -> Option<&SearchState> {
        self.tree.first()
    }

    /// Push a state, sifting it up while it beats its parent. O(log n).
    pub fn insert(&mut self, state: SearchState) {
        self.tree.push(state);
        let mut index = self.tree.len() - 1;
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.tree[parent].priority() > self.tree[index].priority() {
                self.tree.swap(parent, index);
                index = parent;
            } else {
                break;
            }
        }
    }

    /// Remove and return the lowest-priority state. O(log n).
    pub fn delete_min(&mut self) -> Option<SearchState> {
        if self.tree.is_empty() {
            return None;
        }
        let root = self.tree.swap_remove(0);
        self.sift_down(0);
        Some(root)
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.tree.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            if left >= len {
                break;
            }

            let node = self.tree[index].priority();
            let left_p = self.tree[left].priority();

            if right >= len {
                if node > left_p {
                    self.tree.swap(index, left);
                    index = left;
                    continue;
                }
                break;
            }

            let right_p = self.tree[right].priority();
            let child = if node == left_p && node == right_p {
                None
            } else if node > right_p && left_p >= right_p {
                Some(right)
            } else if node > left_p {
                Some(left)
            } else {
                None
            };

            match child {
                Some(c) => {
                    self.tree.swap(index, c);
                    index = c;
                }
                None => break,
            }
        }
    }

    /// Heap order holds at every node.
    pub fn is_heap(&self) -> bool {
        (1..self.tree.len()).all(|i| self.tree[i].priority() >= self.tree[(i - 1) / 2].priority())
    }
}

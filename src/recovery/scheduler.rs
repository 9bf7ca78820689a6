use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Dependency-count scheduler over images, used to order restore.
///
/// Node `i` becomes ready once every node in `deps[i]` is done. When several nodes are ready the
/// smallest index is returned first, so the order is deterministic.
pub(crate) struct RestoreScheduler {
    indeg: Vec<u32>,
    dependents: Vec<SmallVec<[u32; 4]>>,
    ready: BinaryHeap<Reverse<u32>>,
    remaining: usize,
}

impl RestoreScheduler {
    pub(crate) fn new(deps: &[SmallVec<[u32; 4]>]) -> Self {
        let n = deps.len();
        let mut indeg = vec![0u32; n];
        let mut dependents = vec![SmallVec::<[u32; 4]>::new(); n];

        for (node, node_deps) in deps.iter().enumerate() {
            for &d in node_deps {
                dependents[d as usize].push(node as u32);
                indeg[node] = indeg[node].saturating_add(1);
            }
        }

        let mut ready = BinaryHeap::new();
        for (i, &deg) in indeg.iter().enumerate() {
            if deg == 0 {
                ready.push(Reverse(i as u32));
            }
        }

        Self {
            indeg,
            dependents,
            ready,
            remaining: n,
        }
    }

    /// Nodes not yet marked done. Non-zero once `pop_ready` is exhausted means a cycle.
    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }

    pub(crate) fn pop_ready(&mut self) -> Option<u32> {
        let Reverse(id) = self.ready.pop()?;
        Some(id)
    }

    pub(crate) fn mark_done(&mut self, done: u32) {
        self.remaining = self.remaining.saturating_sub(1);
        for &dep in &self.dependents[done as usize] {
            let d = &mut self.indeg[dep as usize];
            *d = d.saturating_sub(1);
            if *d == 0 {
                self.ready.push(Reverse(dep));
            }
        }
    }

    /// Drain the scheduler: topological order first, then any nodes stuck on a cycle.
    pub(crate) fn into_order(mut self) -> (Vec<u32>, Vec<u32>) {
        let mut order = Vec::with_capacity(self.indeg.len());
        let mut done = vec![false; self.indeg.len()];
        while let Some(next) = self.pop_ready() {
            order.push(next);
            done[next as usize] = true;
            self.mark_done(next);
        }
        let cyclic = if self.remaining() == 0 {
            Vec::new()
        } else {
            (0..done.len() as u32).filter(|&i| !done[i as usize]).collect()
        };
        (order, cyclic)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/recovery/scheduler.rs"]
mod tests;

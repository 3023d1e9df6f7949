// Cycle Search over the Wait-For Graph
use super::graph::WaitForGraph;
use super::types::{Cycle, TransactionId};
use ahash::AHashSet;

/// Bounds for simple-cycle enumeration.
///
/// Enumerating simple cycles is exponential on pathological graphs, so both
/// dimensions are capped. Hitting a cap yields a partial result, never an
/// error: the cycles found so far are returned and the search stops.
#[derive(Debug, Clone, Copy)]
pub struct CycleLimits {
    /// Maximum number of cycles reported per query.
    pub max_cycles: usize,
    /// Maximum number of transactions on a reported cycle; longer cycles
    /// are not explored.
    pub max_depth: usize,
}

impl Default for CycleLimits {
    fn default() -> Self {
        CycleLimits {
            max_cycles: 64,
            max_depth: 256,
        }
    }
}

impl WaitForGraph {
    /// Returns true iff a directed path of length >= 1 leads from `start`
    /// back to itself, i.e. `start` sits on some wait-for cycle.
    ///
    /// Iterative DFS with a visited set, short-circuiting the instant the
    /// traversal reaches `start` again. Unknown or isolated ids are
    /// trivially false. O(V+E) over the current graph; this runs on every
    /// lock conflict, so no recursion and no allocation beyond the visited
    /// set and work stack.
    pub fn exist_cycle_from(&self, start: TransactionId) -> bool {
        let mut visited = AHashSet::new();
        let mut stack: Vec<TransactionId> = self.successors(start).collect();

        while let Some(node) = stack.pop() {
            if node == start {
                return true;
            }
            if visited.insert(node) {
                stack.extend(self.successors(node));
            }
        }
        false
    }

    /// Appends every distinct simple cycle through `start` to `out` and
    /// returns how many were appended by this call, subject to the graph's
    /// `CycleLimits`.
    ///
    /// DFS tracking the current path: a successor equal to `start` records
    /// the accumulated path as one cycle; a successor already on the path
    /// closes a different cycle (reported when the search starts from that
    /// node instead) and is pruned. Convergent paths into the same blocker
    /// each produce their own cycle. Unknown ids yield 0 with `out`
    /// untouched.
    pub fn find_cycles_from(&self, start: TransactionId, out: &mut Vec<Cycle>) -> usize {
        let limits = self.limits();
        if limits.max_cycles == 0 || limits.max_depth == 0 {
            return 0;
        }

        let mut found = 0;
        let mut path = vec![start];
        let mut on_path = AHashSet::new();
        on_path.insert(start);
        self.cycle_dfs(start, start, &mut path, &mut on_path, limits, &mut found, out);
        found
    }

    #[allow(clippy::too_many_arguments)]
    fn cycle_dfs(
        &self,
        node: TransactionId,
        start: TransactionId,
        path: &mut Vec<TransactionId>,
        on_path: &mut AHashSet<TransactionId>,
        limits: CycleLimits,
        found: &mut usize,
        out: &mut Vec<Cycle>,
    ) {
        for next in self.successors(node) {
            if *found >= limits.max_cycles {
                return;
            }
            if next == start {
                out.push(Cycle::new(path.clone()));
                *found += 1;
                continue;
            }
            if on_path.contains(&next) || path.len() >= limits.max_depth {
                continue;
            }

            path.push(next);
            on_path.insert(next);
            self.cycle_dfs(next, start, path, on_path, limits, found, out);
            on_path.remove(&next);
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(edges: &[(u64, u64)]) -> WaitForGraph {
        let mut graph = WaitForGraph::new();
        for &(waiter, blocker) in edges {
            graph.add_edge(TransactionId(waiter), TransactionId(blocker));
        }
        graph
    }

    #[test]
    fn test_single_edge_has_no_cycle() {
        let graph = graph_with(&[(1, 2)]);
        assert!(!graph.exist_cycle_from(TransactionId(1)));
        assert!(!graph.exist_cycle_from(TransactionId(2)));
    }

    #[test]
    fn test_two_cycle_found_once() {
        let graph = graph_with(&[(1, 2), (2, 1)]);
        assert!(graph.exist_cycle_from(TransactionId(1)));
        assert!(graph.exist_cycle_from(TransactionId(2)));

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 1);
        assert_eq!(
            cycles[0].members(),
            &[TransactionId(1), TransactionId(2)]
        );
    }

    #[test]
    fn test_three_cycle_in_traversal_order() {
        let graph = graph_with(&[(1, 2), (2, 3), (3, 1)]);
        for id in 1..=3 {
            assert!(graph.exist_cycle_from(TransactionId(id)));
        }

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 1);
        assert_eq!(
            cycles[0].members(),
            &[TransactionId(1), TransactionId(2), TransactionId(3)]
        );
    }

    #[test]
    fn test_tail_into_cycle_is_not_on_it() {
        // 1 waits into the 2 <-> 3 cycle but is not itself on a cycle.
        let graph = graph_with(&[(1, 2), (2, 3), (3, 2)]);
        assert!(!graph.exist_cycle_from(TransactionId(1)));
        assert!(graph.exist_cycle_from(TransactionId(2)));

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 0);
        assert!(cycles.is_empty());
    }

    #[test]
    fn test_diamond_yields_two_distinct_cycles() {
        // 1 -> 2 -> 4 -> 1 and 1 -> 3 -> 4 -> 1 converge on 4.
        let graph = graph_with(&[(1, 2), (1, 3), (2, 4), (3, 4), (4, 1)]);

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 2);

        let mut paths: Vec<Vec<u64>> = cycles
            .iter()
            .map(|c| c.members().iter().map(|t| t.as_u64()).collect())
            .collect();
        paths.sort();
        assert_eq!(paths, vec![vec![1, 2, 4], vec![1, 3, 4]]);
    }

    #[test]
    fn test_disjoint_cycles_stay_separate() {
        let graph = graph_with(&[(1, 2), (2, 1), (10, 11), (11, 10)]);

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 1);
        assert!(cycles[0].contains(TransactionId(1)));
        assert!(cycles[0].contains(TransactionId(2)));
        assert!(!cycles[0].contains(TransactionId(10)));
        assert!(!cycles[0].contains(TransactionId(11)));
    }

    #[test]
    fn test_max_cycles_truncates_to_partial_result() {
        let mut graph = WaitForGraph::with_limits(CycleLimits {
            max_cycles: 1,
            max_depth: 256,
        });
        graph.add_edge(TransactionId(1), TransactionId(2));
        graph.add_edge(TransactionId(1), TransactionId(3));
        graph.add_edge(TransactionId(2), TransactionId(1));
        graph.add_edge(TransactionId(3), TransactionId(1));

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 1);
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn test_max_depth_prunes_long_cycles_only() {
        // A 2-cycle and a 4-cycle through the same node.
        let mut graph = WaitForGraph::with_limits(CycleLimits {
            max_cycles: 64,
            max_depth: 2,
        });
        graph.add_edge(TransactionId(1), TransactionId(2));
        graph.add_edge(TransactionId(2), TransactionId(1));
        graph.add_edge(TransactionId(1), TransactionId(3));
        graph.add_edge(TransactionId(3), TransactionId(4));
        graph.add_edge(TransactionId(4), TransactionId(1));

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 1);
        assert_eq!(cycles[0].members(), &[TransactionId(1), TransactionId(2)]);
    }

    #[test]
    fn test_count_is_per_call_and_appends() {
        let graph = graph_with(&[(1, 2), (2, 1)]);

        let mut cycles = Vec::new();
        assert_eq!(graph.find_cycles_from(TransactionId(1), &mut cycles), 1);
        assert_eq!(graph.find_cycles_from(TransactionId(2), &mut cycles), 1);
        assert_eq!(cycles.len(), 2);
    }
}

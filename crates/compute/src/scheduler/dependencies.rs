//! Sub-graph dependency structure and levels.
//!
//! ```text
//! A -> B  iff  some edge u -> v has sub_graph(u) = A, sub_graph(v) = B, A != B
//! level[S] = 1                                  (no predecessor)
//! level[S] = 1 + max(level[P] for P -> S)       (otherwise)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use amsla_core::{AmslaError, Result, SubGraphId};
use amsla_graph::DependencyGraph;

use super::types::SubGraphEntry;

/// Induced dependency graph between sub-graphs.
#[derive(Debug, Clone, Default)]
pub struct SubGraphDependencies {
    successors: BTreeMap<SubGraphId, BTreeSet<SubGraphId>>,
    predecessor_count: BTreeMap<SubGraphId, usize>,
}

impl SubGraphDependencies {
    /// Collect cross-sub-graph edges. Fails with `NotPartitioned` when any
    /// node lacks a sub-graph.
    pub fn from_graph(graph: &DependencyGraph) -> Result<Self> {
        if !graph.check_full_assignment() {
            return Err(AmslaError::NotPartitioned {
                unassigned: graph.unassigned_nodes(),
            });
        }

        let mut deps = Self::default();
        for sub_graph in graph.list_of_sub_graphs() {
            deps.successors.entry(sub_graph).or_default();
            deps.predecessor_count.entry(sub_graph).or_insert(0);
        }

        for edge in graph.edges().iter().filter(|e| !e.is_loop()) {
            let (Some(from), Some(to)) = (graph.sub_graph(edge.source), graph.sub_graph(edge.target))
            else {
                continue;
            };
            if from != to && deps.successors.entry(from).or_default().insert(to) {
                *deps.predecessor_count.entry(to).or_insert(0) += 1;
            }
        }
        Ok(deps)
    }

    pub fn successors(&self, sub_graph: SubGraphId) -> impl Iterator<Item = SubGraphId> + '_ {
        self.successors
            .get(&sub_graph)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Level of every sub-graph, by a Kahn traversal taking the smallest
    /// ready id first.
    pub fn topological_levels(&self) -> Result<BTreeMap<SubGraphId, u32>> {
        let mut remaining = self.predecessor_count.clone();
        let mut levels: BTreeMap<SubGraphId, u32> = BTreeMap::new();
        let mut ready: BTreeSet<SubGraphId> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut processed = 0;

        while let Some(current) = ready.pop_first() {
            let level = *levels.entry(current).or_insert(1);
            processed += 1;

            for next in self.successors(current) {
                let next_level = levels.entry(next).or_insert(1);
                *next_level = (*next_level).max(level + 1);

                if let Some(count) = remaining.get_mut(&next) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if processed < self.len() {
            // Whatever still waits on a predecessor is on or behind a cycle.
            let stuck: Vec<SubGraphId> = remaining
                .into_iter()
                .filter(|&(_, count)| count > 0)
                .map(|(id, _)| id)
                .collect();
            return Err(AmslaError::NonDagDependencies { sub_graphs: stuck });
        }
        Ok(levels)
    }

    /// Schedule table rows: successors and level per sub-graph.
    pub fn entries(&self) -> Result<BTreeMap<SubGraphId, SubGraphEntry>> {
        let levels = self.topological_levels()?;
        Ok(self
            .successors
            .iter()
            .map(|(&id, next)| {
                let entry = SubGraphEntry {
                    to_sub_graph_ids: next.iter().copied().collect(),
                    level: levels.get(&id).copied().unwrap_or(1),
                };
                (id, entry)
            })
            .collect())
    }
}

/// Successors and level of every sub-graph of a partitioned graph.
pub fn find_sub_graph_levels(graph: &DependencyGraph) -> Result<BTreeMap<SubGraphId, SubGraphEntry>> {
    SubGraphDependencies::from_graph(graph)?.entries()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpartitioned_graph_is_rejected() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3)]).unwrap();
        g.set_sub_graph_of_node(&[1], &[1]).unwrap();
        assert_eq!(
            find_sub_graph_levels(&g).unwrap_err(),
            AmslaError::NotPartitioned { unassigned: vec![2, 3] }
        );
    }

    #[test]
    fn diamond_levels() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4), (4, 4)]).unwrap();
        g.set_sub_graph_of_node(&[1, 2, 3, 4], &[1, 2, 3, 4]).unwrap();

        let table = find_sub_graph_levels(&g).unwrap();
        assert_eq!(table[&1].to_sub_graph_ids, vec![2, 3]);
        assert_eq!(table[&4].to_sub_graph_ids, Vec::<SubGraphId>::new());
        let levels: Vec<u32> = table.values().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 2, 3]);
    }

    #[test]
    fn level_follows_longest_path() {
        // 1 -> 2 -> 3 and the shortcut 1 -> 3.
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3), (1, 3)]).unwrap();
        g.set_sub_graph_of_node(&[1, 2, 3], &[10, 20, 30]).unwrap();
        let table = find_sub_graph_levels(&g).unwrap();
        assert_eq!(table[&30].level, 3);
    }

    #[test]
    fn same_sub_graph_edges_are_ignored() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3), (3, 4)]).unwrap();
        g.set_sub_graph_of_node(&[1, 2, 3, 4], &[1, 1, 2, 2]).unwrap();
        let deps = SubGraphDependencies::from_graph(&g).unwrap();
        assert_eq!(deps.successors(1).collect::<Vec<_>>(), vec![2]);
        assert_eq!(deps.successors(2).count(), 0);
    }

    #[test]
    fn cyclic_sub_graphs_are_rejected() {
        // Acyclic node graph, but the assignment makes 1 <-> 2 mutually dependent.
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3), (3, 4)]).unwrap();
        g.set_sub_graph_of_node(&[1, 2, 3, 4], &[1, 2, 1, 3]).unwrap();
        assert_eq!(
            find_sub_graph_levels(&g).unwrap_err(),
            AmslaError::NonDagDependencies { sub_graphs: vec![1, 2, 3] }
        );
    }

    #[test]
    fn levels_of_a_fan_in() {
        // 1 and 2 both feed 3, 3 feeds 4; 5 stands alone.
        let mut g = DependencyGraph::from_edges(&[(1, 3), (2, 3), (3, 4), (5, 5)]).unwrap();
        g.set_sub_graph_of_node(&[1, 2, 3, 4, 5], &[1, 2, 3, 4, 5]).unwrap();
        let levels = SubGraphDependencies::from_graph(&g)
            .unwrap()
            .topological_levels()
            .unwrap();
        let expected: BTreeMap<SubGraphId, u32> = [(1, 1), (2, 1), (3, 2), (4, 3), (5, 1)].into();
        assert_eq!(levels, expected);
    }

    #[test]
    fn empty_graph_has_no_levels() {
        let g = DependencyGraph::from_edges(&[]).unwrap();
        assert!(find_sub_graph_levels(&g).unwrap().is_empty());
    }
}

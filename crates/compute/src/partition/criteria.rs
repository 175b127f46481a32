use std::cmp::Ordering;
use std::fmt;

use amsla_core::NodeId;
use amsla_graph::DependencyGraph;
use serde::{Deserialize, Serialize};

/// Order in which the balanced partitioner visits roots and ready children.
/// Degrees count non-loop edges only. Ties always fall back to ascending
/// node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    DescendingOutDegree,
    AscendingOutDegree,
    DescendingInDegree,
    AscendingInDegree,
    DescendingNodeIndex,
    AscendingNodeIndex,
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortCriterion::DescendingOutDegree => write!(f, "descending out-degree"),
            SortCriterion::AscendingOutDegree => write!(f, "ascending out-degree"),
            SortCriterion::DescendingInDegree => write!(f, "descending in-degree"),
            SortCriterion::AscendingInDegree => write!(f, "ascending in-degree"),
            SortCriterion::DescendingNodeIndex => write!(f, "descending node index"),
            SortCriterion::AscendingNodeIndex => write!(f, "ascending node index"),
        }
    }
}

impl SortCriterion {
    pub fn compare(&self, graph: &DependencyGraph, a: NodeId, b: NodeId) -> Ordering {
        let primary = match self {
            SortCriterion::DescendingOutDegree => graph.out_degree(b).cmp(&graph.out_degree(a)),
            SortCriterion::AscendingOutDegree => graph.out_degree(a).cmp(&graph.out_degree(b)),
            SortCriterion::DescendingInDegree => graph.in_degree(b).cmp(&graph.in_degree(a)),
            SortCriterion::AscendingInDegree => graph.in_degree(a).cmp(&graph.in_degree(b)),
            SortCriterion::DescendingNodeIndex => b.cmp(&a),
            SortCriterion::AscendingNodeIndex => a.cmp(&b),
        };
        primary.then(a.cmp(&b))
    }

    pub fn sort(&self, graph: &DependencyGraph, nodes: &mut [NodeId]) {
        nodes.sort_by(|&a, &b| self.compare(graph, a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1 -> {2, 3, 4}, 2 -> 4, 5 isolated with a loop
    fn fan() -> DependencyGraph {
        DependencyGraph::from_edges(&[(1, 2), (1, 3), (1, 4), (2, 4), (5, 5)]).unwrap()
    }

    fn sorted(criterion: SortCriterion) -> Vec<NodeId> {
        let g = fan();
        let mut nodes = g.list_of_nodes();
        criterion.sort(&g, &mut nodes);
        nodes
    }

    #[test]
    fn out_degree_orders() {
        assert_eq!(sorted(SortCriterion::DescendingOutDegree), vec![1, 2, 3, 4, 5]);
        assert_eq!(sorted(SortCriterion::AscendingOutDegree), vec![3, 4, 5, 2, 1]);
    }

    #[test]
    fn in_degree_orders() {
        assert_eq!(sorted(SortCriterion::DescendingInDegree), vec![4, 2, 3, 1, 5]);
        assert_eq!(sorted(SortCriterion::AscendingInDegree), vec![1, 5, 2, 3, 4]);
    }

    #[test]
    fn index_orders() {
        assert_eq!(sorted(SortCriterion::DescendingNodeIndex), vec![5, 4, 3, 2, 1]);
        assert_eq!(sorted(SortCriterion::AscendingNodeIndex), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&SortCriterion::DescendingOutDegree).unwrap();
        assert_eq!(json, "\"descending_out_degree\"");
        assert_eq!(SortCriterion::DescendingOutDegree.to_string(), "descending out-degree");
    }
}

use amsla_core::config::AlgorithmKind;
use amsla_core::{AmslaError, Result, SubGraphId};
use amsla_graph::DependencyGraph;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ready_children, PartitionReport, Partitioner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartitionState {
    Idle,
    Assigning,
    Done,
    Failed,
}

/// One sub-graph per dependency layer: sub-graph 1 holds the roots, sub-graph
/// `k + 1` holds every node whose last parent landed in sub-graph `k`.
///
/// Layers are unbounded in size.
#[derive(Debug, Clone)]
pub struct LevelSetPartitioner {
    state: PartitionState,
    /// Accepted for interface parity with the balanced partitioner; unused.
    capacity: Option<usize>,
}

impl Default for LevelSetPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelSetPartitioner {
    pub fn new() -> Self {
        Self {
            state: PartitionState::Idle,
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        warn!(
            "Level-set partitioning ignores the sub-graph capacity ({}); layers are sized by dependency depth",
            capacity
        );
        Self {
            state: PartitionState::Idle,
            capacity: Some(capacity),
        }
    }

    pub fn state(&self) -> PartitionState {
        self.state
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Assign layers until the frontier runs dry. Returns the number of layers.
    fn assign_layers(&self, graph: &mut DependencyGraph) -> Result<usize> {
        let mut frontier = graph.list_of_roots();
        let mut sub_graph: SubGraphId = 1;

        while !frontier.is_empty() {
            let ids = vec![sub_graph; frontier.len()];
            graph.set_sub_graph_of_node(&frontier, &ids)?;
            debug!("Layer {}: {} node(s)", sub_graph, frontier.len());

            frontier = ready_children(graph, &frontier);
            sub_graph += 1;
        }

        if !graph.check_full_assignment() {
            return Err(AmslaError::PartitioningFailed {
                tentatives: 1,
                unassigned: graph.unassigned_nodes(),
            });
        }
        Ok(sub_graph as usize - 1)
    }
}

impl Partitioner for LevelSetPartitioner {
    fn name(&self) -> &str {
        "level_set"
    }

    fn partition(&mut self, graph: &mut DependencyGraph) -> Result<PartitionReport> {
        graph.reset_all_assignments();
        self.state = PartitionState::Assigning;

        match self.assign_layers(graph) {
            Ok(layers) => {
                self.state = PartitionState::Done;
                info!(
                    "Level-set partition: {} nodes in {} layers",
                    graph.num_nodes(),
                    layers
                );
                Ok(PartitionReport {
                    algorithm: AlgorithmKind::LevelSet,
                    success: true,
                    num_sub_graphs: layers,
                    balanced: None,
                })
            }
            Err(e) => {
                self.state = PartitionState::Failed;
                warn!("Level-set partition failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use amsla_core::NodeId;

    use super::*;

    #[test]
    fn diamond_layers() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();
        let mut p = LevelSetPartitioner::new();
        assert_eq!(p.state(), PartitionState::Idle);

        let report = p.partition(&mut g).unwrap();
        assert!(report.success);
        assert_eq!(report.num_sub_graphs, 3);
        assert_eq!(p.state(), PartitionState::Done);
        assert_eq!(
            g.sub_graph_of_node(&[1, 2, 3, 4]).unwrap(),
            vec![Some(1), Some(2), Some(2), Some(3)]
        );
    }

    #[test]
    fn layer_is_longest_path_depth() {
        // 1 -> 2 -> 3, plus the shortcut 1 -> 3: node 3 waits for node 2.
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3), (1, 3)]).unwrap();
        LevelSetPartitioner::new().partition(&mut g).unwrap();
        assert_eq!(g.sub_graph_of_node(&[1, 2, 3]).unwrap(), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn isolated_node_is_one_layer() {
        let mut g = DependencyGraph::from_edges(&[(5, 5)]).unwrap();
        assert_eq!(g.list_of_roots(), vec![5]);
        assert!(g.children_of_node(&[5]).unwrap()[0].is_empty());

        let report = LevelSetPartitioner::new().partition(&mut g).unwrap();
        assert_eq!(report.num_sub_graphs, 1);
        assert_eq!(g.sub_graph_of_node(&[5]).unwrap(), vec![Some(1)]);
    }

    #[test]
    fn capacity_is_ignored() {
        let pairs: Vec<(NodeId, NodeId)> = (2..=10).map(|i| (1, i)).collect();
        let mut g = DependencyGraph::from_edges(&pairs).unwrap();
        let mut p = LevelSetPartitioner::with_capacity(2);
        assert_eq!(p.capacity(), Some(2));

        p.partition(&mut g).unwrap();
        assert_eq!(g.nodes_of_sub_graph(2).len(), 9);
    }

    #[test]
    fn repartition_resets_previous_run() {
        let mut g = DependencyGraph::from_edges(&[(1, 2)]).unwrap();
        g.set_sub_graph_of_node(&[1, 2], &[7, 7]).unwrap();
        LevelSetPartitioner::new().partition(&mut g).unwrap();
        assert_eq!(g.list_of_sub_graphs(), vec![1, 2]);
    }

    #[test]
    fn cycle_fails() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3), (3, 2)]).unwrap();
        let mut p = LevelSetPartitioner::new();
        let err = p.partition(&mut g).unwrap_err();
        assert_eq!(
            err,
            AmslaError::PartitioningFailed {
                tentatives: 1,
                unassigned: vec![2, 3]
            }
        );
        assert_eq!(p.state(), PartitionState::Failed);
    }

    #[test]
    fn acyclic_inputs_always_fully_assign() {
        // Lower-triangular pattern: j -> i whenever (i + j) % 3 == 0 and j < i.
        let mut pairs = Vec::new();
        for i in 1..=40u32 {
            pairs.push((i, i));
            for j in 1..i {
                if (i + j) % 3 == 0 {
                    pairs.push((j, i));
                }
            }
        }
        let mut g = DependencyGraph::from_edges(&pairs).unwrap();
        LevelSetPartitioner::new().partition(&mut g).unwrap();
        assert!(g.check_full_assignment());

        // Every non-loop edge points strictly forward in layers.
        for e in g.edges().iter().filter(|e| !e.is_loop()) {
            assert!(g.sub_graph(e.source) < g.sub_graph(e.target));
        }
    }
}

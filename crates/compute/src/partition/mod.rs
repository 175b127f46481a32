//! Node partitioning into sub-graphs.
//!
//! Both partitioners walk the graph in causal order: a node is only ever
//! assigned once every one of its parents holds a sub-graph. The walk itself
//! is therefore a topological traversal, and a graph that cannot be fully
//! walked has a cycle.

pub mod balanced;
pub mod capacity;
pub mod criteria;
pub mod level_set;

use std::collections::BTreeSet;
use std::fmt;

use amsla_core::config::{AlgorithmKind, PartitionConfig};
use amsla_core::{NodeId, Result};
use amsla_graph::DependencyGraph;
use serde::Serialize;

pub use balanced::{BalancedPartitioner, Tentative};
pub use capacity::{MergedComponent, SubGraphCapacityMap, SubGraphSlot};
pub use criteria::SortCriterion;
pub use level_set::{LevelSetPartitioner, PartitionState};

/// Something that writes a sub-graph id onto every node of a graph.
pub trait Partitioner {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Reset the graph's assignments, then assign every node.
    fn partition(&mut self, graph: &mut DependencyGraph) -> Result<PartitionReport>;
}

/// `roots / sub_graphs`, kept exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RootDensity {
    pub roots: usize,
    pub sub_graphs: usize,
}

impl RootDensity {
    pub fn as_f64(&self) -> f64 {
        if self.sub_graphs == 0 {
            0.0
        } else {
            self.roots as f64 / self.sub_graphs as f64
        }
    }
}

impl fmt::Display for RootDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.roots, self.sub_graphs)
    }
}

/// What the balanced partitioner did to succeed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedOutcome {
    /// Tentatives consumed, including the successful one.
    pub tentatives: usize,
    pub criterion: SortCriterion,
    /// Density parameter of the successful tentative.
    pub density: f64,
    /// Roots assigned per sub-graph produced.
    pub root_density: RootDensity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionReport {
    pub algorithm: AlgorithmKind,
    pub success: bool,
    /// Distinct sub-graphs holding at least one node.
    pub num_sub_graphs: usize,
    pub balanced: Option<BalancedOutcome>,
}

/// Partitioner chosen at configuration time.
#[derive(Debug, Clone)]
pub enum PartitionStrategy {
    LevelSet(LevelSetPartitioner),
    Balanced(BalancedPartitioner),
}

impl PartitionStrategy {
    pub fn from_config(config: &PartitionConfig) -> Result<Self> {
        config.validate()?;
        match config.algorithm {
            AlgorithmKind::LevelSet => Ok(PartitionStrategy::LevelSet(
                LevelSetPartitioner::with_capacity(config.max_sub_graph_size),
            )),
            AlgorithmKind::Balanced => {
                let mut partitioner = BalancedPartitioner::new(config.max_sub_graph_size)?;
                if let Some(densities) = &config.densities {
                    partitioner = partitioner.with_tentatives(balanced::tentatives_for(densities))?;
                }
                Ok(PartitionStrategy::Balanced(partitioner))
            }
        }
    }

    pub fn algorithm(&self) -> AlgorithmKind {
        match self {
            PartitionStrategy::LevelSet(_) => AlgorithmKind::LevelSet,
            PartitionStrategy::Balanced(_) => AlgorithmKind::Balanced,
        }
    }
}

impl Partitioner for PartitionStrategy {
    fn name(&self) -> &str {
        match self {
            PartitionStrategy::LevelSet(p) => p.name(),
            PartitionStrategy::Balanced(p) => p.name(),
        }
    }

    fn partition(&mut self, graph: &mut DependencyGraph) -> Result<PartitionReport> {
        match self {
            PartitionStrategy::LevelSet(p) => p.partition(graph),
            PartitionStrategy::Balanced(p) => p.partition(graph),
        }
    }
}

/// Unassigned children of `frontier` whose parents are all assigned,
/// deduplicated and ascending.
pub(crate) fn ready_children(graph: &DependencyGraph, frontier: &[NodeId]) -> Vec<NodeId> {
    frontier
        .iter()
        .flat_map(|&n| graph.children(n))
        .filter(|&c| !graph.is_assigned(c) && graph.parents_assigned(c))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use amsla_core::AmslaError;

    use super::*;

    #[test]
    fn ready_children_waits_for_all_parents() {
        let mut g = DependencyGraph::from_edges(&[(1, 3), (2, 3), (1, 4), (1, 5), (4, 5)]).unwrap();
        g.set_sub_graph_of_node(&[1], &[1]).unwrap();
        assert_eq!(ready_children(&g, &[1]), vec![4]);

        g.set_sub_graph_of_node(&[2, 4], &[1, 1]).unwrap();
        assert_eq!(ready_children(&g, &[2, 4]), vec![3, 5]);
    }

    #[test]
    fn root_density_ratio() {
        let d = RootDensity { roots: 1, sub_graphs: 4 };
        assert_eq!(d.as_f64(), 0.25);
        assert_eq!(d.to_string(), "1/4");
        assert_eq!(RootDensity { roots: 0, sub_graphs: 0 }.as_f64(), 0.0);
    }

    #[test]
    fn strategy_from_config() {
        let mut config = PartitionConfig::default();
        config.algorithm = AlgorithmKind::LevelSet;
        let strategy = PartitionStrategy::from_config(&config).unwrap();
        assert_eq!(strategy.algorithm(), AlgorithmKind::LevelSet);

        config.algorithm = AlgorithmKind::Balanced;
        config.densities = Some(vec![0.5]);
        let strategy = PartitionStrategy::from_config(&config).unwrap();
        match strategy {
            PartitionStrategy::Balanced(p) => {
                assert_eq!(p.max_size(), 64);
                assert_eq!(p.tentatives().len(), 6);
                assert!(p.tentatives().iter().all(|t| t.density == 0.5));
            }
            other => panic!("expected balanced, got {:?}", other.algorithm()),
        }
    }

    #[test]
    fn strategy_rejects_zero_capacity() {
        let mut config = PartitionConfig::default();
        config.max_sub_graph_size = 0;
        assert!(matches!(
            PartitionStrategy::from_config(&config),
            Err(AmslaError::InvalidInput(_))
        ));
    }

    #[test]
    fn strategy_dispatches() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();
        let mut strategy = PartitionStrategy::LevelSet(LevelSetPartitioner::new());
        let report = strategy.partition(&mut g).unwrap();
        assert_eq!(strategy.name(), "level_set");
        assert!(report.success);
        assert_eq!(report.num_sub_graphs, 3);
    }
}

use std::time::Instant;

use amsla_core::{PlanConfig, Result};
use amsla_graph::DependencyGraph;
use serde::Serialize;
use tracing::info;

use crate::partition::{PartitionReport, PartitionStrategy, Partitioner};
use crate::scheduler::{SubGraphSchedule, SubGraphScheduler};

/// Partition report plus schedule for one graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub partition: PartitionReport,
    pub schedule: SubGraphSchedule,
}

/// Runs partitioning then scheduling on a graph.
#[derive(Debug, Clone)]
pub struct PlanEngine {
    strategy: PartitionStrategy,
    scheduler: SubGraphScheduler,
}

impl PlanEngine {
    pub fn new(strategy: PartitionStrategy) -> Self {
        Self {
            strategy,
            scheduler: SubGraphScheduler::new(),
        }
    }

    pub fn from_config(config: &PlanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(PartitionStrategy::from_config(&config.partition)?))
    }

    pub fn strategy(&self) -> &PartitionStrategy {
        &self.strategy
    }

    /// Partition `graph` in place, then schedule it.
    pub fn run(&mut self, graph: &mut DependencyGraph) -> Result<ExecutionPlan> {
        let start = Instant::now();
        let stats = graph.stats();
        info!(
            "Planning {} nodes / {} edges with {} partitioner...",
            stats.node_count,
            stats.edge_count,
            self.strategy.name()
        );

        let partition_start = Instant::now();
        let partition = self.strategy.partition(graph)?;
        info!(
            "  Partition done in {:.3}s: {} sub-graph(s)",
            partition_start.elapsed().as_secs_f64(),
            partition.num_sub_graphs
        );

        let schedule_start = Instant::now();
        let schedule = self.scheduler.schedule(graph)?;
        info!(
            "  Schedule done in {:.3}s: {} level(s), {} time slot(s)",
            schedule_start.elapsed().as_secs_f64(),
            schedule.num_levels,
            schedule.num_time_slots
        );

        info!("Plan complete in {:.3}s", start.elapsed().as_secs_f64());
        Ok(ExecutionPlan {
            partition,
            schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use amsla_core::config::{AlgorithmKind, PartitionConfig};
    use amsla_core::AmslaError;

    use super::*;

    #[test]
    fn runs_both_phases() {
        let config = PlanConfig {
            profile: String::new(),
            partition: PartitionConfig {
                algorithm: AlgorithmKind::LevelSet,
                ..PartitionConfig::default()
            },
        };
        let mut engine = PlanEngine::from_config(&config).unwrap();
        let mut g = DependencyGraph::from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();

        let plan = engine.run(&mut g).unwrap();
        assert_eq!(plan.partition.algorithm, AlgorithmKind::LevelSet);
        assert_eq!(plan.schedule.num_levels, 3);
        assert!(g.edges().iter().all(|e| e.time_slot.is_some()));
    }

    #[test]
    fn partition_failure_skips_schedule() {
        let mut engine = PlanEngine::from_config(&PlanConfig::default()).unwrap();
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 1)]).unwrap();
        assert!(matches!(
            engine.run(&mut g),
            Err(AmslaError::PartitioningFailed { .. })
        ));
        assert!(g.edges().iter().all(|e| e.time_slot.is_none()));
    }
}

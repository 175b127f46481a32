pub mod engine;
pub mod partition;
pub mod scheduler;

pub use engine::{ExecutionPlan, PlanEngine};
pub use partition::{
    BalancedPartitioner, LevelSetPartitioner, PartitionReport, PartitionStrategy, Partitioner,
    RootDensity, SortCriterion, SubGraphCapacityMap, Tentative,
};
pub use scheduler::{find_sub_graph_levels, SubGraphEntry, SubGraphSchedule, SubGraphScheduler};

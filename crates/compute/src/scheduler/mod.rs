//! Sub-graph dependency levels and edge time slots.
//!
//! Input is a fully partitioned graph. Sub-graphs are levelled by their
//! longest dependency chain, then every edge gets a time slot such that
//! edges sharing a slot can be dispatched concurrently.

pub mod dependencies;
mod slots;
pub mod types;

use amsla_core::Result;
use amsla_graph::DependencyGraph;
use tracing::{info, warn};

pub use dependencies::{find_sub_graph_levels, SubGraphDependencies};
pub use types::{LevelSlots, SubGraphEntry, SubGraphSchedule};

#[derive(Debug, Clone, Copy, Default)]
pub struct SubGraphScheduler;

impl SubGraphScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Level the sub-graphs and write time slots onto every edge and node.
    ///
    /// Fails with `NotPartitioned` if any node lacks a sub-graph and with
    /// `NonDagDependencies` if the sub-graphs (or the nodes inside one)
    /// cannot be ordered. On failure no time slot is left set.
    pub fn schedule(&self, graph: &mut DependencyGraph) -> Result<SubGraphSchedule> {
        let entries = find_sub_graph_levels(graph)?;

        let (levels, num_time_slots) = match slots::assign_time_slots(graph, &entries) {
            Ok(result) => result,
            Err(e) => {
                graph.reset_time_slots();
                warn!("Scheduling failed: {}", e);
                return Err(e);
            }
        };

        let num_levels = levels.len() as u32;
        info!(
            "Scheduled {} sub-graphs: {} level(s), {} time slot(s)",
            entries.len(),
            num_levels,
            num_time_slots
        );
        Ok(SubGraphSchedule {
            entries,
            levels,
            num_levels,
            num_time_slots,
        })
    }
}

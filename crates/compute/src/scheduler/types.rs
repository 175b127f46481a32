use std::collections::BTreeMap;

use amsla_core::{SubGraphId, TimeSlot};
use serde::Serialize;

/// One row of the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubGraphEntry {
    /// Direct successors, ascending.
    pub to_sub_graph_ids: Vec<SubGraphId>,
    /// 1 for sub-graphs with no predecessor, else 1 + the deepest predecessor.
    pub level: u32,
}

/// Time slots issued while processing one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSlots {
    pub level: u32,
    pub sub_graphs: Vec<SubGraphId>,
    /// `None` when the level has no edges to schedule.
    pub first_slot: Option<TimeSlot>,
    pub last_slot: Option<TimeSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubGraphSchedule {
    pub entries: BTreeMap<SubGraphId, SubGraphEntry>,
    pub levels: Vec<LevelSlots>,
    pub num_levels: u32,
    pub num_time_slots: TimeSlot,
}

impl SubGraphSchedule {
    pub fn level_of(&self, sub_graph: SubGraphId) -> Option<u32> {
        self.entries.get(&sub_graph).map(|e| e.level)
    }

    pub fn successors_of(&self, sub_graph: SubGraphId) -> Option<&[SubGraphId]> {
        self.entries
            .get(&sub_graph)
            .map(|e| e.to_sub_graph_ids.as_slice())
    }

    pub fn sub_graphs_at_level(&self, level: u32) -> Vec<SubGraphId> {
        self.entries
            .iter()
            .filter(|(_, e)| e.level == level)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Schedule table for export, keyed by sub-graph id.
    pub fn to_json(&self) -> serde_json::Value {
        let table: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(id, e)| {
                (
                    id.to_string(),
                    serde_json::json!({
                        "to_sub_graph_ids": e.to_sub_graph_ids,
                        "level": e.level,
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "sub_graphs": table,
            "num_levels": self.num_levels,
            "num_time_slots": self.num_time_slots,
        })
    }
}

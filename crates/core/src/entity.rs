/// Row/column index of the source matrix. Always 1-based.
pub type NodeId = u32;

/// Position of an edge in the graph's (source, target)-sorted edge list.
pub type EdgeId = usize;

pub type ComponentId = u32;
pub type MergedComponentId = u32;

/// Partition cell id. Unassigned nodes hold `None`, never a reserved value.
pub type SubGraphId = u32;

/// Synchronization step. Slot 1 is the first step that does any work.
pub type TimeSlot = u32;

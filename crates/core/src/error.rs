use thiserror::Error;

use crate::entity::{ComponentId, EdgeId, MergedComponentId, NodeId, SubGraphId};

pub type Result<T> = std::result::Result<T, AmslaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AmslaError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Component not found: {0}")]
    UnknownComponent(ComponentId),

    #[error("Sub-graph not found: {0}")]
    UnknownSubGraph(SubGraphId),

    #[error("Merged component not found: {0}")]
    UnknownMergedComponent(MergedComponentId),

    #[error("Edge {id} out of range ({edge_count} edges)")]
    UnknownEdge { id: EdgeId, edge_count: usize },

    #[error("Connected components have not been computed")]
    ComponentsNotComputed,

    #[error("Node {node} assigned to both sub-graph {first} and {second} in one call")]
    AmbiguousAssignment {
        node: NodeId,
        first: SubGraphId,
        second: SubGraphId,
    },

    #[error("No room for sub-graph {requested} in merged component {merged_component}")]
    CapacityExhausted {
        requested: SubGraphId,
        merged_component: MergedComponentId,
    },

    #[error("Partitioning failed after {tentatives} tentative(s): {} node(s) unassigned", .unassigned.len())]
    PartitioningFailed {
        tentatives: usize,
        unassigned: Vec<NodeId>,
    },

    #[error("Graph is not fully partitioned: {} node(s) unassigned", .unassigned.len())]
    NotPartitioned { unassigned: Vec<NodeId> },

    #[error("Sub-graph dependencies are not a DAG: {sub_graphs:?} cannot be ordered")]
    NonDagDependencies { sub_graphs: Vec<SubGraphId> },
}

impl AmslaError {
    /// Whether the balanced partitioner may recover from this error by
    /// moving on to its next tentative.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AmslaError::CapacityExhausted { .. })
    }
}

//! Batch adjacency queries.
//!
//! Every batch query returns one entry per input id, in input order.
//! Repeated ids produce repeated entries.

use std::collections::HashMap;

use amsla_core::{EdgeId, NodeId, Result};

use crate::store::DependencyGraph;

impl DependencyGraph {
    /// All node ids, ascending.
    pub fn list_of_nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Nodes with no parents. Loop edges don't count as parents.
    pub fn list_of_roots(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .copied()
            .filter(|id| self.in_degree(*id) == 0)
            .collect()
    }

    pub fn parents_of_node(&self, ids: &[NodeId]) -> Result<Vec<Vec<NodeId>>> {
        self.map_edges(ids, &self.incoming, |e| self.edges[e].source)
    }

    pub fn children_of_node(&self, ids: &[NodeId]) -> Result<Vec<Vec<NodeId>>> {
        self.map_edges(ids, &self.outgoing, |e| self.edges[e].target)
    }

    pub fn entering_edges_of_node(&self, ids: &[NodeId]) -> Result<Vec<Vec<EdgeId>>> {
        self.map_edges(ids, &self.incoming, |e| e)
    }

    pub fn exiting_edges_of_node(&self, ids: &[NodeId]) -> Result<Vec<Vec<EdgeId>>> {
        self.map_edges(ids, &self.outgoing, |e| e)
    }

    pub fn loop_edges_of_node(&self, ids: &[NodeId]) -> Result<Vec<Vec<EdgeId>>> {
        self.map_edges(ids, &self.loops, |e| e)
    }

    /// Number of non-loop edges entering `id` (0 for unknown ids).
    pub fn in_degree(&self, id: NodeId) -> usize {
        self.incoming.get(&id).map_or(0, |v| v.len())
    }

    /// Number of non-loop edges leaving `id` (0 for unknown ids).
    pub fn out_degree(&self, id: NodeId) -> usize {
        self.outgoing.get(&id).map_or(0, |v| v.len())
    }

    // Single-node views used on hot paths by the partitioners; they skip the
    // per-call allocation of the batch API and assume `id` exists.

    pub(crate) fn incoming_of(&self, id: NodeId) -> &[EdgeId] {
        self.incoming.get(&id).map_or(&[], |v| v.as_slice())
    }

    pub(crate) fn outgoing_of(&self, id: NodeId) -> &[EdgeId] {
        self.outgoing.get(&id).map_or(&[], |v| v.as_slice())
    }

    pub(crate) fn loops_of(&self, id: NodeId) -> &[EdgeId] {
        self.loops.get(&id).map_or(&[], |v| v.as_slice())
    }

    /// Parents of a single node, in source order.
    pub fn parents(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming_of(id).iter().map(move |&e| self.edges[e].source)
    }

    /// Children of a single node, in target order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing_of(id).iter().map(move |&e| self.edges[e].target)
    }

    /// Loop edges of a single node.
    pub fn loops(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.loops_of(id).iter().copied()
    }

    /// Non-loop edges entering a single node.
    pub fn entering(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.incoming_of(id).iter().copied()
    }

    /// Non-loop edges leaving a single node.
    pub fn exiting(&self, id: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.outgoing_of(id).iter().copied()
    }

    fn map_edges<T>(
        &self,
        ids: &[NodeId],
        index: &HashMap<NodeId, Vec<EdgeId>>,
        f: impl Fn(EdgeId) -> T,
    ) -> Result<Vec<Vec<T>>> {
        ids.iter()
            .map(|&id| {
                self.node(id)?;
                Ok(index
                    .get(&id)
                    .map(|edges| edges.iter().map(|&e| f(e)).collect())
                    .unwrap_or_default())
            })
            .collect()
    }
}

//! Scheduling attributes: sub-graph of each node, time slot of each node and
//! edge. None of these touch topology, so cached components stay valid.

use std::collections::{BTreeSet, HashMap};

use amsla_core::{AmslaError, EdgeId, NodeId, Result, SubGraphId, TimeSlot};

use crate::store::DependencyGraph;

impl DependencyGraph {
    /// Assign `node_ids[i]` to `sub_graph_ids[i]`.
    ///
    /// The whole call is validated before anything is written: an unknown
    /// node, mismatched lengths, or the same node listed twice with different
    /// sub-graphs leaves the graph untouched.
    pub fn set_sub_graph_of_node(
        &mut self,
        node_ids: &[NodeId],
        sub_graph_ids: &[SubGraphId],
    ) -> Result<()> {
        if node_ids.len() != sub_graph_ids.len() {
            return Err(AmslaError::InvalidInput(format!(
                "{} node ids but {} sub-graph ids",
                node_ids.len(),
                sub_graph_ids.len()
            )));
        }

        let mut seen: HashMap<NodeId, SubGraphId> = HashMap::with_capacity(node_ids.len());
        for (&node, &sub_graph) in node_ids.iter().zip(sub_graph_ids) {
            self.node(node)?;
            if let Some(&first) = seen.get(&node) {
                if first != sub_graph {
                    return Err(AmslaError::AmbiguousAssignment {
                        node,
                        first,
                        second: sub_graph,
                    });
                }
            }
            seen.insert(node, sub_graph);
        }

        for (node, sub_graph) in seen {
            self.node_mut(node)?.sub_graph = Some(sub_graph);
        }
        Ok(())
    }

    pub fn sub_graph_of_node(&self, ids: &[NodeId]) -> Result<Vec<Option<SubGraphId>>> {
        ids.iter()
            .map(|&id| self.node(id).map(|n| n.sub_graph))
            .collect()
    }

    /// Sub-graph of a single node; `None` for unassigned or unknown nodes.
    pub fn sub_graph(&self, id: NodeId) -> Option<SubGraphId> {
        self.nodes.get(&id).and_then(|n| n.sub_graph)
    }

    pub fn is_assigned(&self, id: NodeId) -> bool {
        self.sub_graph(id).is_some()
    }

    /// Distinct sub-graph ids currently held by any node, ascending.
    pub fn list_of_sub_graphs(&self) -> Vec<SubGraphId> {
        self.nodes
            .values()
            .filter_map(|n| n.sub_graph)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Nodes currently assigned to `sub_graph`, ascending.
    pub fn nodes_of_sub_graph(&self, sub_graph: SubGraphId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.sub_graph == Some(sub_graph))
            .map(|n| n.id)
            .collect()
    }

    pub fn unassigned_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.sub_graph.is_none())
            .map(|n| n.id)
            .collect()
    }

    /// Whether every node holds a sub-graph.
    pub fn check_full_assignment(&self) -> bool {
        self.nodes.values().all(|n| n.sub_graph.is_some())
    }

    /// Whether every parent of `id` holds a sub-graph.
    pub fn parents_assigned(&self, id: NodeId) -> bool {
        self.parents(id).all(|p| self.is_assigned(p))
    }

    pub fn reset_sub_graphs(&mut self) {
        for node in self.nodes.values_mut() {
            node.sub_graph = None;
        }
    }

    fn unknown_edge(&self, id: EdgeId) -> AmslaError {
        AmslaError::UnknownEdge {
            id,
            edge_count: self.edges.len(),
        }
    }

    pub fn set_time_slot_of_edge(&mut self, id: EdgeId, slot: TimeSlot) -> Result<()> {
        let err = self.unknown_edge(id);
        let edge = self.edges.get_mut(id).ok_or(err)?;
        edge.time_slot = Some(slot);
        Ok(())
    }

    pub fn time_slot_of_edge(&self, ids: &[EdgeId]) -> Result<Vec<Option<TimeSlot>>> {
        ids.iter()
            .map(|&id| {
                self.edge(id)
                    .map(|e| e.time_slot)
                    .ok_or_else(|| self.unknown_edge(id))
            })
            .collect()
    }

    pub fn set_time_slot_of_node(&mut self, id: NodeId, slot: TimeSlot) -> Result<()> {
        self.node_mut(id)?.time_slot = Some(slot);
        Ok(())
    }

    pub fn time_slot_of_node(&self, ids: &[NodeId]) -> Result<Vec<Option<TimeSlot>>> {
        ids.iter()
            .map(|&id| self.node(id).map(|n| n.time_slot))
            .collect()
    }

    pub fn reset_time_slots(&mut self) {
        for node in self.nodes.values_mut() {
            node.time_slot = None;
        }
        for edge in &mut self.edges {
            edge.time_slot = None;
        }
    }

    /// Clear sub-graphs and time slots. Run before every partitioning attempt.
    pub fn reset_all_assignments(&mut self) {
        self.reset_sub_graphs();
        self.reset_time_slots();
    }
}

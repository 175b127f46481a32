use std::collections::{BTreeMap, HashMap};

use amsla_core::{AmslaError, EdgeId, NodeId, Result, SubGraphId, TimeSlot, TripletMatrix};
use serde::Serialize;
use tracing::debug;

use crate::components::ComponentIndex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub sub_graph: Option<SubGraphId>,
    pub time_slot: Option<TimeSlot>,
}

/// Directed dependency `source -> target`. The target cannot be finalized
/// before the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub time_slot: Option<TimeSlot>,
}

impl Edge {
    /// Diagonal entry. Carries no cross-node dependency.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub loop_count: usize,
    pub root_count: usize,
    pub assigned_count: usize,
}

/// Sparse matrix viewed as a dependency graph.
///
/// Topology is fixed at construction. Only the scheduling attributes
/// (sub-graph of each node, time slot of each node and edge) change
/// afterwards. Edges are stored sorted by `(source, target)`, so every
/// adjacency list below comes out in that order too.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) edges: Vec<Edge>,
    /// Non-loop edges leaving each node.
    pub(crate) outgoing: HashMap<NodeId, Vec<EdgeId>>,
    /// Non-loop edges entering each node.
    pub(crate) incoming: HashMap<NodeId, Vec<EdgeId>>,
    pub(crate) loops: HashMap<NodeId, Vec<EdgeId>>,
    pub(crate) components: Option<ComponentIndex>,
}

impl DependencyGraph {
    /// Build from validated triplets. Entry `(row, column)` becomes the edge
    /// `row -> column`; repeated entries fold into one edge with summed weight.
    pub fn from_triplets(triplets: &TripletMatrix) -> Self {
        let mut folded: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
        for (row, column, value) in triplets.entries() {
            *folded.entry((row, column)).or_insert(0.0) += value;
        }

        let mut nodes = BTreeMap::new();
        let mut edges = Vec::with_capacity(folded.len());
        let mut outgoing: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
        let mut incoming: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
        let mut loops: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();

        for ((source, target), weight) in folded {
            for id in [source, target] {
                nodes.entry(id).or_insert(Node {
                    id,
                    sub_graph: None,
                    time_slot: None,
                });
            }

            let id = edges.len();
            edges.push(Edge {
                id,
                source,
                target,
                weight,
                time_slot: None,
            });

            if source == target {
                loops.entry(source).or_default().push(id);
            } else {
                outgoing.entry(source).or_default().push(id);
                incoming.entry(target).or_default().push(id);
            }
        }

        let graph = Self {
            nodes,
            edges,
            outgoing,
            incoming,
            loops,
            components: None,
        };
        debug!(
            "Built dependency graph: {} nodes, {} edges ({} loops)",
            graph.num_nodes(),
            graph.num_edges(),
            graph.loops.values().map(Vec::len).sum::<usize>()
        );
        graph
    }

    /// Unit-weight graph from `(source, target)` pairs.
    pub fn from_edges(pairs: &[(NodeId, NodeId)]) -> Result<Self> {
        Ok(Self::from_triplets(&TripletMatrix::from_pairs(pairs)?))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(AmslaError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(AmslaError::UnknownNode(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            loop_count: self.loops.values().map(Vec::len).sum(),
            root_count: self.list_of_roots().len(),
            assigned_count: self.nodes.values().filter(|n| n.sub_graph.is_some()).count(),
        }
    }
}

use std::collections::HashMap;

use amsla_core::{AmslaError, ComponentId, NodeId, Result};
use serde::Serialize;
use tracing::debug;

use crate::store::DependencyGraph;

/// Weakly connected component: nodes joined when edges are read as undirected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub id: ComponentId,
    pub size: usize,
    /// Members, ascending.
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct ComponentIndex {
    components: Vec<Component>,
    of_node: HashMap<NodeId, ComponentId>,
}

/// Union-Find (disjoint set) with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression, iterative so long chains can't blow the stack.
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

impl DependencyGraph {
    /// Compute weakly connected components. Ids are 1-based, numbered by each
    /// component's smallest node. Topology never changes after construction,
    /// so a second call returns the cached result.
    pub fn compute_components(&mut self) -> &[Component] {
        if self.components.is_none() {
            self.components = Some(self.build_component_index());
        }
        self.list_of_components()
    }

    /// Components computed so far; empty until `compute_components` runs.
    pub fn list_of_components(&self) -> &[Component] {
        self.components
            .as_ref()
            .map_or(&[], |index| index.components.as_slice())
    }

    pub fn component(&self, id: ComponentId) -> Result<&Component> {
        self.list_of_components()
            .get((id as usize).wrapping_sub(1))
            .ok_or(AmslaError::UnknownComponent(id))
    }

    pub fn component_of_node(&self, ids: &[NodeId]) -> Result<Vec<ComponentId>> {
        let index = self
            .components
            .as_ref()
            .ok_or(AmslaError::ComponentsNotComputed)?;
        ids.iter()
            .map(|&id| {
                index
                    .of_node
                    .get(&id)
                    .copied()
                    .ok_or(AmslaError::UnknownNode(id))
            })
            .collect()
    }

    /// Nodes of each component that have no parents, ascending.
    pub fn roots_of_component(&self, ids: &[ComponentId]) -> Result<Vec<Vec<NodeId>>> {
        ids.iter()
            .map(|&id| {
                let component = self.component(id)?;
                Ok(component
                    .nodes
                    .iter()
                    .copied()
                    .filter(|&n| self.in_degree(n) == 0)
                    .collect())
            })
            .collect()
    }

    fn build_component_index(&self) -> ComponentIndex {
        let node_ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        let id_to_idx: HashMap<NodeId, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        let mut uf = UnionFind::new(node_ids.len());
        for edge in self.edges.iter().filter(|e| !e.is_loop()) {
            uf.union(id_to_idx[&edge.source], id_to_idx[&edge.target]);
        }

        // Nodes are visited in ascending order, so the first time a root shows
        // up is at its component's smallest node.
        let mut root_to_component: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Component> = Vec::new();
        let mut of_node = HashMap::with_capacity(node_ids.len());

        for (i, &node) in node_ids.iter().enumerate() {
            let root = uf.find(i);
            let slot = *root_to_component.entry(root).or_insert_with(|| {
                components.push(Component {
                    id: components.len() as ComponentId + 1,
                    size: 0,
                    nodes: Vec::new(),
                });
                components.len() - 1
            });
            let component = &mut components[slot];
            component.size += 1;
            component.nodes.push(node);
            of_node.insert(node, component.id);
        }

        debug!(
            "Computed {} connected components over {} nodes",
            components.len(),
            node_ids.len()
        );
        ComponentIndex {
            components,
            of_node,
        }
    }
}

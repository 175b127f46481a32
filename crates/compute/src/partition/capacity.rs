use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use amsla_core::{AmslaError, ComponentId, MergedComponentId, Result, SubGraphId};
use serde::Serialize;
use tracing::debug;

/// One or more connected components packed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedComponent {
    pub id: MergedComponentId,
    pub component_ids: Vec<ComponentId>,
    /// Total node count across `component_ids`.
    pub size: usize,
    /// Sub-graphs allotted to this merged component, ascending and contiguous.
    pub sub_graphs: Vec<SubGraphId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubGraphSlot {
    pub id: SubGraphId,
    pub merged_component: MergedComponentId,
    pub capacity: usize,
    pub occupancy: usize,
}

impl SubGraphSlot {
    pub fn is_full(&self) -> bool {
        self.occupancy >= self.capacity
    }
}

/// Capacity-bounded sub-graph slots laid over merged components.
///
/// Components at or above `max_size` stand alone; smaller ones are packed
/// first-fit-decreasing so that fragmented graphs don't produce a sub-graph
/// per tiny component. A merged component of size `S` gets
/// `ceil(S / max_size)` slots.
#[derive(Debug, Clone)]
pub struct SubGraphCapacityMap {
    max_size: usize,
    merged: Vec<MergedComponent>,
    slots: Vec<SubGraphSlot>,
    merged_of_component: HashMap<ComponentId, MergedComponentId>,
}

impl SubGraphCapacityMap {
    pub fn new(
        component_ids: &[ComponentId],
        component_sizes: &[usize],
        max_size: usize,
    ) -> Result<Self> {
        if max_size == 0 {
            return Err(AmslaError::InvalidInput(
                "sub-graph capacity must be positive".into(),
            ));
        }
        if component_ids.len() != component_sizes.len() {
            return Err(AmslaError::InvalidInput(format!(
                "{} component ids but {} component sizes",
                component_ids.len(),
                component_sizes.len()
            )));
        }
        let mut seen = HashSet::with_capacity(component_ids.len());
        for (&id, &size) in component_ids.iter().zip(component_sizes) {
            if !seen.insert(id) {
                return Err(AmslaError::InvalidInput(format!(
                    "component {} listed more than once",
                    id
                )));
            }
            if size == 0 {
                return Err(AmslaError::InvalidInput(format!("component {} is empty", id)));
            }
        }

        let groups = merge_components(component_ids, component_sizes, max_size);

        let mut merged = Vec::with_capacity(groups.len());
        let mut slots = Vec::new();
        let mut merged_of_component = HashMap::with_capacity(component_ids.len());

        for (i, (members, size)) in groups.into_iter().enumerate() {
            let id = i as MergedComponentId + 1;
            let count = size.div_ceil(max_size);
            let first = slots.len() as SubGraphId + 1;
            let sub_graphs: Vec<SubGraphId> = (first..first + count as SubGraphId).collect();

            for &sg in &sub_graphs {
                slots.push(SubGraphSlot {
                    id: sg,
                    merged_component: id,
                    capacity: max_size,
                    occupancy: 0,
                });
            }
            for &c in &members {
                merged_of_component.insert(c, id);
            }
            merged.push(MergedComponent {
                id,
                component_ids: members,
                size,
                sub_graphs,
            });
        }

        debug!(
            "Capacity map: {} components -> {} merged components -> {} sub-graphs (max size {})",
            component_ids.len(),
            merged.len(),
            slots.len(),
            max_size
        );

        Ok(Self {
            max_size,
            merged,
            slots,
            merged_of_component,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn list_of_sub_graphs(&self) -> Vec<SubGraphId> {
        self.slots.iter().map(|s| s.id).collect()
    }

    pub fn list_of_merged_components(&self) -> &[MergedComponent] {
        &self.merged
    }

    fn slot(&self, id: SubGraphId) -> Result<&SubGraphSlot> {
        self.slots
            .get((id as usize).wrapping_sub(1))
            .ok_or(AmslaError::UnknownSubGraph(id))
    }

    pub fn size_of_sub_graph(&self, ids: &[SubGraphId]) -> Result<Vec<usize>> {
        ids.iter().map(|&id| self.slot(id).map(|s| s.occupancy)).collect()
    }

    pub fn capacity_of_sub_graph(&self, ids: &[SubGraphId]) -> Result<Vec<usize>> {
        ids.iter().map(|&id| self.slot(id).map(|s| s.capacity)).collect()
    }

    pub fn merged_component_of_sub_graph(
        &self,
        ids: &[SubGraphId],
    ) -> Result<Vec<MergedComponentId>> {
        ids.iter()
            .map(|&id| self.slot(id).map(|s| s.merged_component))
            .collect()
    }

    pub fn merged_component_of_component(
        &self,
        ids: &[ComponentId],
    ) -> Result<Vec<MergedComponentId>> {
        ids.iter()
            .map(|&id| {
                self.merged_of_component
                    .get(&id)
                    .copied()
                    .ok_or(AmslaError::UnknownComponent(id))
            })
            .collect()
    }

    pub fn sub_graphs_of_merged_component(&self, id: MergedComponentId) -> Result<&[SubGraphId]> {
        self.merged
            .get((id as usize).wrapping_sub(1))
            .map(|m| m.sub_graphs.as_slice())
            .ok_or(AmslaError::UnknownMergedComponent(id))
    }

    /// Lowest non-full sub-graph with id `>= id` in the same merged component.
    pub fn next_non_full_sub_graph(&self, id: SubGraphId) -> Result<Option<SubGraphId>> {
        let merged_component = self.slot(id)?.merged_component;
        Ok(self.slots[id as usize - 1..]
            .iter()
            .take_while(|s| s.merged_component == merged_component)
            .find(|s| !s.is_full())
            .map(|s| s.id))
    }

    /// Place one element per requested sub-graph and return where each one
    /// actually went, in request order.
    ///
    /// A full sub-graph spills into the next non-full one of its merged
    /// component. Requests are served in ascending sub-graph order so spill
    /// doesn't depend on how the caller ordered them. If any request cannot be
    /// placed the call fails with `CapacityExhausted` and nothing is added.
    pub fn add_element_to_sub_graph(&mut self, ids: &[SubGraphId]) -> Result<Vec<SubGraphId>> {
        for &id in ids {
            self.slot(id)?;
        }

        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by_key(|&i| ids[i]);

        let mut placed = vec![0; ids.len()];
        let mut applied: Vec<SubGraphId> = Vec::with_capacity(ids.len());

        for i in order {
            match self.next_non_full_sub_graph(ids[i])? {
                Some(target) => {
                    self.slots[target as usize - 1].occupancy += 1;
                    placed[i] = target;
                    applied.push(target);
                }
                None => {
                    for sg in applied {
                        self.slots[sg as usize - 1].occupancy -= 1;
                    }
                    let merged_component = self.slot(ids[i])?.merged_component;
                    return Err(AmslaError::CapacityExhausted {
                        requested: ids[i],
                        merged_component,
                    });
                }
            }
        }
        Ok(placed)
    }

    /// Zero every occupancy; the merge and slot layout is kept.
    pub fn reset_sub_graphs(&mut self) {
        for slot in &mut self.slots {
            slot.occupancy = 0;
        }
    }

    pub fn total_capacity(&self) -> usize {
        self.slots.iter().map(|s| s.capacity).sum()
    }

    pub fn total_occupancy(&self) -> usize {
        self.slots.iter().map(|s| s.occupancy).sum()
    }
}

/// Group components into merged components: oversized ones alone (input
/// order), then first-fit-decreasing over the rest.
fn merge_components(
    ids: &[ComponentId],
    sizes: &[usize],
    max_size: usize,
) -> Vec<(Vec<ComponentId>, usize)> {
    let mut groups: Vec<(Vec<ComponentId>, usize)> = ids
        .iter()
        .zip(sizes)
        .filter(|(_, &size)| size >= max_size)
        .map(|(&id, &size)| (vec![id], size))
        .collect();

    let mut small: Vec<(ComponentId, usize)> = ids
        .iter()
        .zip(sizes)
        .filter(|(_, &size)| size < max_size)
        .map(|(&id, &size)| (id, size))
        .collect();
    small.sort_by_key(|&(id, size)| (Reverse(size), id));

    let mut taken = vec![false; small.len()];
    for i in 0..small.len() {
        if taken[i] {
            continue;
        }
        taken[i] = true;
        let mut members = vec![small[i].0];
        let mut total = small[i].1;

        for j in i + 1..small.len() {
            if !taken[j] && total + small[j].1 <= max_size {
                taken[j] = true;
                members.push(small[j].0);
                total += small[j].1;
            }
        }
        groups.push((members, total));
    }
    groups
}

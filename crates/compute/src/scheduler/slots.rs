//! Edge time slots, issued in waves.
//!
//! Levels are walked in ascending order and every edge is scheduled with the
//! level of its target. Within a level, a non-loop edge `u -> v` is ready once
//! `u` is final; the loop on `v` is ready once every other edge entering `v`
//! holds a slot; `v` is final once its loop does too. All edges ready at the
//! same time share one slot, so no edge in a slot feeds another edge in it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use amsla_core::{AmslaError, EdgeId, NodeId, Result, SubGraphId, TimeSlot};
use amsla_graph::DependencyGraph;
use tracing::debug;

use super::types::{LevelSlots, SubGraphEntry};

fn endpoints(graph: &DependencyGraph, id: EdgeId) -> Result<(NodeId, NodeId)> {
    graph
        .edge(id)
        .map(|e| (e.source, e.target))
        .ok_or(AmslaError::UnknownEdge {
            id,
            edge_count: graph.num_edges(),
        })
}

fn is_final(graph: &DependencyGraph, id: NodeId) -> Result<bool> {
    Ok(graph.node(id)?.time_slot.is_some())
}

/// Mark `node` final at `slot` and queue its exiting edges into the current
/// level.
fn finalize(
    graph: &mut DependencyGraph,
    node: NodeId,
    slot: TimeSlot,
    pending: &HashMap<NodeId, usize>,
    next: &mut Vec<EdgeId>,
) -> Result<()> {
    if is_final(graph, node)? {
        return Ok(());
    }
    graph.set_time_slot_of_node(node, slot)?;
    for e in graph.exiting(node) {
        let (_, target) = endpoints(graph, e)?;
        if pending.contains_key(&target) {
            next.push(e);
        }
    }
    Ok(())
}

/// Slot every edge and node of a partitioned graph. Returns the slot range of
/// each level and the number of slots issued.
pub(crate) fn assign_time_slots(
    graph: &mut DependencyGraph,
    entries: &BTreeMap<SubGraphId, SubGraphEntry>,
) -> Result<(Vec<LevelSlots>, TimeSlot)> {
    graph.reset_time_slots();

    let num_levels = entries.values().map(|e| e.level).max().unwrap_or(0) as usize;
    let mut nodes_by_level: Vec<Vec<NodeId>> = vec![Vec::new(); num_levels];
    let mut sub_graphs_by_level: Vec<Vec<SubGraphId>> = vec![Vec::new(); num_levels];

    for (&id, entry) in entries {
        sub_graphs_by_level[entry.level as usize - 1].push(id);
    }
    for node in graph.nodes() {
        let level = node
            .sub_graph
            .and_then(|sg| entries.get(&sg))
            .map(|e| e.level)
            .ok_or_else(|| AmslaError::NotPartitioned {
                unassigned: vec![node.id],
            })?;
        nodes_by_level[level as usize - 1].push(node.id);
    }

    let mut slot: TimeSlot = 0;
    let mut levels = Vec::with_capacity(num_levels);

    for (idx, nodes) in nodes_by_level.iter().enumerate() {
        let offset = slot;
        // Non-loop edges entering each node of this level still without a slot.
        let mut pending: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());
        let mut wave: Vec<EdgeId> = Vec::new();

        for &v in nodes {
            let entering = graph.in_degree(v);
            pending.insert(v, entering);
            if entering == 0 {
                let loops: Vec<EdgeId> = graph.loops(v).collect();
                if loops.is_empty() {
                    graph.set_time_slot_of_node(v, offset)?;
                } else {
                    wave.extend(loops);
                }
            }
        }
        for &v in nodes {
            for e in graph.entering(v) {
                let (source, _) = endpoints(graph, e)?;
                if is_final(graph, source)? {
                    wave.push(e);
                }
            }
        }

        let mut first_slot = None;
        let mut last_slot = None;

        while !wave.is_empty() {
            slot += 1;
            if first_slot.is_none() {
                first_slot = Some(slot);
            }
            last_slot = Some(slot);

            for &e in &wave {
                graph.set_time_slot_of_edge(e, slot)?;
            }

            let mut next = Vec::new();
            for &e in &wave {
                let (source, target) = endpoints(graph, e)?;
                if source == target {
                    finalize(graph, target, slot, &pending, &mut next)?;
                    continue;
                }
                let remaining = pending.get_mut(&target).ok_or_else(|| {
                    AmslaError::InvalidInput(format!("edge {} scheduled outside its level", e))
                })?;
                *remaining -= 1;
                if *remaining == 0 {
                    let loops: Vec<EdgeId> = graph.loops(target).collect();
                    if loops.is_empty() {
                        finalize(graph, target, slot, &pending, &mut next)?;
                    } else {
                        next.extend(loops);
                    }
                }
            }
            wave = next;
        }

        let mut stalled: BTreeSet<SubGraphId> = BTreeSet::new();
        for &v in nodes {
            if !is_final(graph, v)? {
                stalled.extend(graph.sub_graph(v));
            }
        }
        if !stalled.is_empty() {
            return Err(AmslaError::NonDagDependencies {
                sub_graphs: stalled.into_iter().collect(),
            });
        }

        debug!(
            "Level {}: {} node(s), slots {:?}..={:?}",
            idx + 1,
            nodes.len(),
            first_slot,
            last_slot
        );
        levels.push(LevelSlots {
            level: idx as u32 + 1,
            sub_graphs: std::mem::take(&mut sub_graphs_by_level[idx]),
            first_slot,
            last_slot,
        });
    }

    Ok((levels, slot))
}

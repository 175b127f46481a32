use amsla_core::config::{check_density, AlgorithmKind};
use amsla_core::{AmslaError, ComponentId, NodeId, Result, SubGraphId};
use amsla_graph::DependencyGraph;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::capacity::SubGraphCapacityMap;
use super::criteria::SortCriterion;
use super::{ready_children, BalancedOutcome, PartitionReport, Partitioner, RootDensity};

/// One (sort criterion, root density) attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tentative {
    pub criterion: SortCriterion,
    /// Fraction of a merged component's sub-graphs that receive roots.
    pub density: f64,
}

pub const DEFAULT_DENSITIES: [f64; 3] = [1.0, 0.5, 0.25];

pub const DEFAULT_CRITERIA: [SortCriterion; 6] = [
    SortCriterion::AscendingNodeIndex,
    SortCriterion::DescendingInDegree,
    SortCriterion::DescendingOutDegree,
    SortCriterion::AscendingOutDegree,
    SortCriterion::AscendingInDegree,
    SortCriterion::DescendingNodeIndex,
];

/// Every (criterion, density) pair once: pass `round` pairs criterion `k`
/// with `densities[(k + round) % n]`.
pub fn tentatives_for(densities: &[f64]) -> Vec<Tentative> {
    let n = densities.len();
    (0..n)
        .flat_map(|round| {
            DEFAULT_CRITERIA
                .iter()
                .enumerate()
                .map(move |(k, &criterion)| Tentative {
                    criterion,
                    density: densities[(k + round) % n],
                })
        })
        .collect()
}

pub fn default_tentatives() -> Vec<Tentative> {
    tentatives_for(&DEFAULT_DENSITIES)
}

/// How many of `count` sub-graphs receive roots at `density`. At least one.
fn selected_count(count: usize, density: f64) -> usize {
    ((count as f64 * density).round() as usize).clamp(1, count.max(1))
}

/// Roots and allotted sub-graphs of one merged component.
struct RootPlan {
    roots: Vec<NodeId>,
    sub_graphs: Vec<SubGraphId>,
}

/// TASSL: capacity-bounded partitioning over merged connected components.
///
/// Roots of each merged component are spread round-robin over a prefix of its
/// sub-graphs; every other node joins the highest sub-graph among its
/// parents, spilling upward when that one is full. When a tentative leaves
/// nodes unplaced the next (criterion, density) pair is tried from scratch.
#[derive(Debug, Clone)]
pub struct BalancedPartitioner {
    max_size: usize,
    tentatives: Vec<Tentative>,
}

impl BalancedPartitioner {
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(AmslaError::InvalidInput(
                "max sub-graph size must be a positive integer".into(),
            ));
        }
        Ok(Self {
            max_size,
            tentatives: default_tentatives(),
        })
    }

    /// Replace the ordered candidate list.
    pub fn with_tentatives(mut self, tentatives: Vec<Tentative>) -> Result<Self> {
        if tentatives.is_empty() {
            return Err(AmslaError::InvalidInput(
                "at least one tentative is required".into(),
            ));
        }
        for t in &tentatives {
            check_density(t.density)?;
        }
        self.tentatives = tentatives;
        Ok(self)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn tentatives(&self) -> &[Tentative] {
        &self.tentatives
    }

    fn root_plans(graph: &DependencyGraph, map: &SubGraphCapacityMap) -> Result<Vec<RootPlan>> {
        map.list_of_merged_components()
            .iter()
            .map(|merged| {
                let roots: Vec<NodeId> = graph
                    .roots_of_component(&merged.component_ids)?
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(RootPlan {
                    roots,
                    sub_graphs: merged.sub_graphs.clone(),
                })
            })
            .collect()
    }

    /// Run one tentative. Returns the number of roots placed; the caller
    /// checks whether the assignment is complete.
    fn run_tentative(
        graph: &mut DependencyGraph,
        map: &mut SubGraphCapacityMap,
        plans: &[RootPlan],
        tentative: &Tentative,
    ) -> Result<usize> {
        let mut frontier: Vec<NodeId> = Vec::new();

        for plan in plans.iter().filter(|p| !p.roots.is_empty()) {
            let mut roots = plan.roots.clone();
            tentative.criterion.sort(graph, &mut roots);

            let selected = &plan.sub_graphs[..selected_count(plan.sub_graphs.len(), tentative.density)];
            let requests: Vec<SubGraphId> = (0..roots.len())
                .map(|i| selected[i % selected.len()])
                .collect();

            let placed = map.add_element_to_sub_graph(&requests)?;
            graph.set_sub_graph_of_node(&roots, &placed)?;
            frontier.extend(roots);
        }
        let roots_placed = frontier.len();

        loop {
            let mut ready = ready_children(graph, &frontier);
            if ready.is_empty() {
                break;
            }
            tentative.criterion.sort(graph, &mut ready);

            let requests = ready
                .iter()
                .map(|&child| {
                    graph.parents(child).filter_map(|p| graph.sub_graph(p)).max().ok_or_else(|| {
                        AmslaError::InvalidInput(format!("node {} has no assigned parent", child))
                    })
                })
                .collect::<Result<Vec<SubGraphId>>>()?;

            let placed = map.add_element_to_sub_graph(&requests)?;
            graph.set_sub_graph_of_node(&ready, &placed)?;
            frontier = ready;
        }

        Ok(roots_placed)
    }
}

impl Partitioner for BalancedPartitioner {
    fn name(&self) -> &str {
        "balanced"
    }

    fn partition(&mut self, graph: &mut DependencyGraph) -> Result<PartitionReport> {
        graph.reset_all_assignments();

        let (ids, sizes): (Vec<ComponentId>, Vec<usize>) = graph
            .compute_components()
            .iter()
            .map(|c| (c.id, c.size))
            .unzip();
        let mut map = SubGraphCapacityMap::new(&ids, &sizes, self.max_size)?;
        let plans = Self::root_plans(graph, &map)?;

        let mut unassigned = Vec::new();
        for (n, tentative) in self.tentatives.iter().enumerate() {
            graph.reset_all_assignments();
            map.reset_sub_graphs();

            match Self::run_tentative(graph, &mut map, &plans, tentative) {
                Ok(roots) if graph.check_full_assignment() => {
                    let sub_graphs = graph.list_of_sub_graphs().len();
                    let root_density = RootDensity { roots, sub_graphs };
                    info!(
                        "Balanced partition: {} nodes in {} sub-graphs after {} tentative(s) ({}, density {}, root density {})",
                        graph.num_nodes(),
                        sub_graphs,
                        n + 1,
                        tentative.criterion,
                        tentative.density,
                        root_density
                    );
                    return Ok(PartitionReport {
                        algorithm: AlgorithmKind::Balanced,
                        success: true,
                        num_sub_graphs: sub_graphs,
                        balanced: Some(BalancedOutcome {
                            tentatives: n + 1,
                            criterion: tentative.criterion,
                            density: tentative.density,
                            root_density,
                        }),
                    });
                }
                Ok(_) => {
                    unassigned = graph.unassigned_nodes();
                    debug!(
                        "Tentative {} ({}, density {}) left {} node(s) unassigned",
                        n + 1,
                        tentative.criterion,
                        tentative.density,
                        unassigned.len()
                    );
                }
                Err(e) if e.is_retryable() => {
                    unassigned = graph.unassigned_nodes();
                    debug!(
                        "Tentative {} ({}, density {}) failed: {}",
                        n + 1,
                        tentative.criterion,
                        tentative.density,
                        e
                    );
                }
                Err(e) => {
                    graph.reset_all_assignments();
                    return Err(e);
                }
            }
        }

        graph.reset_all_assignments();
        warn!(
            "Balanced partition failed: {} tentative(s) exhausted, {} node(s) unassigned",
            self.tentatives.len(),
            unassigned.len()
        );
        Err(AmslaError::PartitioningFailed {
            tentatives: self.tentatives.len(),
            unassigned,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn occupancy(graph: &DependencyGraph) -> HashMap<SubGraphId, usize> {
        let mut counts = HashMap::new();
        for node in graph.nodes() {
            if let Some(sg) = node.sub_graph {
                *counts.entry(sg).or_insert(0) += 1;
            }
        }
        counts
    }

    fn assert_causal(graph: &DependencyGraph) {
        for e in graph.edges().iter().filter(|e| !e.is_loop()) {
            assert!(graph.sub_graph(e.source) <= graph.sub_graph(e.target));
        }
    }

    #[test]
    fn zero_capacity_rejected_at_construction() {
        assert!(matches!(
            BalancedPartitioner::new(0),
            Err(AmslaError::InvalidInput(_))
        ));
    }

    #[test]
    fn bad_tentatives_rejected() {
        let p = BalancedPartitioner::new(4).unwrap();
        assert!(p.clone().with_tentatives(vec![]).is_err());
        let bad = vec![Tentative {
            criterion: SortCriterion::AscendingNodeIndex,
            density: 1.5,
        }];
        assert!(p.with_tentatives(bad).is_err());
    }

    #[test]
    fn default_candidate_list() {
        let t = default_tentatives();
        assert_eq!(t.len(), 18);
        let head: Vec<(SortCriterion, f64)> =
            t[..4].iter().map(|t| (t.criterion, t.density)).collect();
        assert_eq!(
            head,
            vec![
                (SortCriterion::AscendingNodeIndex, 1.0),
                (SortCriterion::DescendingInDegree, 0.5),
                (SortCriterion::DescendingOutDegree, 0.25),
                (SortCriterion::AscendingOutDegree, 1.0),
            ]
        );
        assert_eq!((t[6].criterion, t[6].density), (SortCriterion::AscendingNodeIndex, 0.5));

        for criterion in DEFAULT_CRITERIA {
            let mut densities: Vec<f64> = t
                .iter()
                .filter(|t| t.criterion == criterion)
                .map(|t| t.density)
                .collect();
            densities.sort_by(|a, b| b.total_cmp(a));
            assert_eq!(densities, DEFAULT_DENSITIES.to_vec());
        }
    }

    #[test]
    fn selected_count_bounds() {
        assert_eq!(selected_count(4, 1.0), 4);
        assert_eq!(selected_count(4, 0.5), 2);
        assert_eq!(selected_count(4, 0.25), 1);
        assert_eq!(selected_count(3, 0.1), 1);
        assert_eq!(selected_count(1, 0.25), 1);
    }

    #[test]
    fn diamond_fits_one_sub_graph() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();
        let report = BalancedPartitioner::new(4).unwrap().partition(&mut g).unwrap();

        assert!(report.success);
        assert_eq!(report.num_sub_graphs, 1);
        let outcome = report.balanced.unwrap();
        assert_eq!(outcome.tentatives, 1);
        assert_eq!(outcome.root_density, RootDensity { roots: 1, sub_graphs: 1 });
        assert_eq!(g.list_of_sub_graphs(), vec![1]);
    }

    #[test]
    fn small_components_share_a_sub_graph() {
        // Three 2-node chains with capacity 6: packed into one sub-graph.
        let mut g = DependencyGraph::from_edges(&[(1, 2), (3, 4), (5, 6)]).unwrap();
        let report = BalancedPartitioner::new(6).unwrap().partition(&mut g).unwrap();
        assert_eq!(report.num_sub_graphs, 1);
        assert_eq!(report.balanced.unwrap().root_density.as_f64(), 3.0);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        // Lower-triangular band: i depends on i-1 and i-2.
        let mut pairs = Vec::new();
        for i in 1..=30u32 {
            pairs.push((i, i));
            if i > 1 {
                pairs.push((i - 1, i));
            }
            if i > 2 {
                pairs.push((i - 2, i));
            }
        }
        let mut g = DependencyGraph::from_edges(&pairs).unwrap();
        let report = BalancedPartitioner::new(7).unwrap().partition(&mut g).unwrap();

        assert!(g.check_full_assignment());
        assert_eq!(report.num_sub_graphs, 5);
        assert!(occupancy(&g).values().all(|&n| n <= 7));
        assert_causal(&g);
    }

    // 8 nodes, capacity 4, so one merged component with 2 sub-graphs. Root 2
    // has four children; node 5 also waits on node 4 under root 1.
    fn contended() -> DependencyGraph {
        DependencyGraph::from_edges(&[(1, 3), (1, 4), (2, 5), (2, 6), (2, 7), (2, 8), (4, 5)])
            .unwrap()
    }

    #[test]
    fn retries_until_a_tentative_fits() {
        // Roots on both sub-graphs: root 2 and its children 6, 7, 8 fill
        // sub-graph 2, and node 5 has nowhere above it to spill. Packing both
        // roots into sub-graph 1 lets the overflow move up into sub-graph 2.
        let mut g = contended();
        let tentatives = vec![
            Tentative {
                criterion: SortCriterion::AscendingNodeIndex,
                density: 1.0,
            },
            Tentative {
                criterion: SortCriterion::DescendingOutDegree,
                density: 0.5,
            },
        ];
        let mut p = BalancedPartitioner::new(4).unwrap().with_tentatives(tentatives).unwrap();
        let report = p.partition(&mut g).unwrap();

        let outcome = report.balanced.unwrap();
        assert_eq!(outcome.tentatives, 2);
        assert_eq!(outcome.criterion, SortCriterion::DescendingOutDegree);
        assert_eq!(outcome.density, 0.5);
        assert_eq!(outcome.root_density, RootDensity { roots: 2, sub_graphs: 2 });
        assert!(occupancy(&g).values().all(|&n| n <= 4));
        assert_causal(&g);
    }

    // Two roots, 4 and 9, in one component of 16 nodes; capacity 2 gives 8
    // sub-graphs with no slack. Root 9 has to take sub-graph 1.
    fn two_rooted() -> DependencyGraph {
        DependencyGraph::from_edges(&[
            (2, 12),
            (3, 11),
            (4, 13),
            (4, 16),
            (5, 10),
            (7, 1),
            (7, 14),
            (8, 5),
            (8, 13),
            (9, 7),
            (9, 8),
            (9, 16),
            (12, 15),
            (14, 6),
            (15, 6),
            (16, 2),
            (16, 3),
            (16, 12),
        ])
        .unwrap()
    }

    #[test]
    fn default_list_succeeds_on_descending_out_degree() {
        let mut g = two_rooted();
        let report = BalancedPartitioner::new(2).unwrap().partition(&mut g).unwrap();

        let outcome = report.balanced.unwrap();
        assert_eq!(outcome.tentatives, 3);
        assert_eq!(outcome.criterion, SortCriterion::DescendingOutDegree);
        assert_eq!(outcome.density, 0.25);
        assert_eq!(outcome.root_density, RootDensity { roots: 2, sub_graphs: 8 });
        assert_eq!(outcome.root_density.as_f64(), 0.25);

        assert_eq!(
            g.sub_graph_of_node(&[9, 4, 7, 8, 16]).unwrap(),
            vec![Some(1), Some(2), Some(1), Some(2), Some(3)]
        );
        assert!(occupancy(&g).values().all(|&n| n == 2));
        assert_causal(&g);
    }

    #[test]
    fn exhausted_tentatives_fail() {
        let mut g = contended();
        let only_full_density = vec![Tentative {
            criterion: SortCriterion::AscendingNodeIndex,
            density: 1.0,
        }];
        let mut p = BalancedPartitioner::new(4)
            .unwrap()
            .with_tentatives(only_full_density)
            .unwrap();

        match p.partition(&mut g) {
            Err(AmslaError::PartitioningFailed {
                tentatives,
                unassigned,
            }) => {
                assert_eq!(tentatives, 1);
                assert!(!unassigned.is_empty());
            }
            other => panic!("expected PartitioningFailed, got {:?}", other),
        }
        assert!(g.list_of_sub_graphs().is_empty());
    }

    #[test]
    fn cyclic_input_fails() {
        let mut g = DependencyGraph::from_edges(&[(1, 2), (2, 3), (3, 2)]).unwrap();
        let err = BalancedPartitioner::new(8).unwrap().partition(&mut g).unwrap_err();
        match err {
            AmslaError::PartitioningFailed { tentatives, unassigned } => {
                assert_eq!(tentatives, 18);
                assert_eq!(unassigned, vec![2, 3]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn empty_graph_succeeds() {
        let mut g = DependencyGraph::from_edges(&[]).unwrap();
        let report = BalancedPartitioner::new(4).unwrap().partition(&mut g).unwrap();
        assert!(report.success);
        assert_eq!(report.num_sub_graphs, 0);
    }
}

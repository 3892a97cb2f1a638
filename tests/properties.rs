use std::collections::HashMap;

use bpmn_layout::{
    LayoutConfig, LayoutError, NodeKind, ProcessGraph, Theme, compute_layout, normalize,
    render_bpmn,
};
use proptest::prelude::*;

const KINDS: [NodeKind; 7] = [
    NodeKind::StartEvent,
    NodeKind::EndEvent,
    NodeKind::Task,
    NodeKind::UserTask,
    NodeKind::ExclusiveGateway,
    NodeKind::ParallelGateway,
    NodeKind::IntermediateCatchEvent,
];

/// Arbitrary process graphs, cycles and self-loops included.
fn arb_graph() -> impl Strategy<Value = ProcessGraph> {
    (1usize..12, 1usize..5)
        .prop_flat_map(|(nodes, lanes)| {
            (
                Just(lanes),
                prop::collection::vec((0..KINDS.len(), 0..lanes), nodes),
                prop::collection::vec((0..nodes, 0..nodes, any::<bool>()), 0..nodes * 2),
            )
        })
        .prop_map(|(lanes, specs, flows)| {
            let lane_names: Vec<String> = (0..lanes).map(|lane| format!("Lane {lane}")).collect();
            let mut graph = ProcessGraph::new("generated").with_lanes(lane_names.clone());
            for (idx, (kind, lane)) in specs.iter().enumerate() {
                graph.push_node(&format!("n{idx}"), KINDS[*kind], &lane_names[*lane], "");
            }
            for (from, to, labeled) in flows {
                let label = labeled.then_some("cond");
                graph.add_flow(&format!("n{from}"), &format!("n{to}"), label);
            }
            graph
        })
}

proptest! {
    #[test]
    fn normalization_bounds_in_degree_and_is_idempotent(graph in arb_graph()) {
        let mut graph = graph;
        let inserted = normalize(&mut graph);
        let degrees = graph.in_degrees();
        for node in graph.nodes.iter().filter(|node| !node.kind.is_gateway()) {
            prop_assert!(degrees[node.id.as_str()] <= 1, "{}", node.id);
        }
        for id in &inserted {
            prop_assert_eq!(graph.node(id).map(|node| node.outgoing.len()), Some(1));
        }
        let snapshot = graph.clone();
        prop_assert!(normalize(&mut graph).is_empty());
        prop_assert_eq!(graph, snapshot);
    }

    #[test]
    fn layouts_respect_ranks_and_stay_complete(graph in arb_graph()) {
        let config = LayoutConfig::default();
        let layout = match compute_layout(&graph, &config) {
            Ok(layout) => layout,
            Err(LayoutError::CollisionUnresolved { .. }) => return Ok(()),
            Err(err) => return Err(TestCaseError::fail(err.to_string())),
        };

        prop_assert_eq!(layout.nodes.len(), graph.nodes.len() + layout.inserted_gateways.len());
        prop_assert_eq!(layout.edges.len(), graph.edge_count() + layout.inserted_gateways.len());

        let ranks: HashMap<&str, usize> =
            layout.nodes.iter().map(|node| (node.id.as_str(), node.rank)).collect();
        for edge in layout.edges.iter().filter(|edge| !edge.back_edge) {
            prop_assert!(ranks[edge.to.as_str()] > ranks[edge.from.as_str()]);
        }

        for edge in &layout.edges {
            prop_assert!(!edge.points.is_empty());
            for pair in edge.points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!((a.0 - b.0).abs() < 1e-3 || (a.1 - b.1).abs() < 1e-3);
            }
            prop_assert_eq!(edge.label_bounds.is_some(), edge.label.is_some());
        }

        for (idx, a) in layout.nodes.iter().enumerate() {
            for b in &layout.nodes[idx + 1..] {
                prop_assert!(!a.bounds.overlaps(&b.bounds), "{} overlaps {}", a.id, b.id);
            }
        }

        let lane_total: usize = layout.lanes.iter().map(|lane| lane.nodes.len()).sum();
        prop_assert_eq!(lane_total, layout.nodes.len());
    }

    #[test]
    fn rendering_is_deterministic(graph in arb_graph()) {
        let config = LayoutConfig::default();
        let first = compute_layout(&graph, &config);
        let second = compute_layout(&graph, &config);
        match (first, second) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(render_bpmn(&a, &Theme::signavio()), render_bpmn(&b, &Theme::signavio()));
            }
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "runs disagree"),
        }
    }
}

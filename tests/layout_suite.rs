use std::collections::HashMap;
use std::path::Path;

use bpmn_layout::layout::EdgeSide;
use bpmn_layout::{
    Layout, LayoutConfig, LayoutError, NodeKind, ProcessGraph, Theme, compute_layout,
    parse_process, render_bpmn,
};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::DEBUG.into()),
        )
        .with_test_writer()
        .try_init();
}

fn load(name: &str) -> ProcessGraph {
    init_tracing();
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_process(&input).expect("parse failed")
}

fn layout(name: &str) -> Layout {
    compute_layout(&load(name), &LayoutConfig::default()).expect("layout failed")
}

fn assert_forward_ranks_increase(layout: &Layout) {
    for edge in layout.edges.iter().filter(|edge| !edge.back_edge) {
        let from = layout.rank(&edge.from).unwrap();
        let to = layout.rank(&edge.to).unwrap();
        assert!(to > from, "{} -> {}: {from} vs {to}", edge.from, edge.to);
    }
}

fn assert_orthogonal(layout: &Layout) {
    for edge in &layout.edges {
        assert!(!edge.points.is_empty(), "{} has no waypoints", edge.id);
        for pair in edge.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(
                (a.0 - b.0).abs() < 1e-3 || (a.1 - b.1).abs() < 1e-3,
                "{} has a diagonal segment: {:?}",
                edge.id,
                edge.points
            );
        }
    }
}

fn non_gateway_in_degrees(layout: &Layout) -> HashMap<&str, usize> {
    let mut degrees = HashMap::new();
    for edge in &layout.edges {
        *degrees.entry(edge.to.as_str()).or_insert(0) += 1;
    }
    degrees.retain(|id, _| !layout.node(id).unwrap().kind.is_gateway());
    degrees
}

#[test]
fn linear_chain() {
    let layout = layout("linear.json");
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.edges.len(), 2);
    assert_eq!(layout.lanes.len(), 1);
    let ranks: Vec<usize> = layout.nodes.iter().map(|node| node.rank).collect();
    assert_eq!(ranks, vec![0, 1, 2]);
    assert!(layout.inserted_gateways.is_empty());
    assert_orthogonal(&layout);
}

#[test]
fn converging_branches_get_one_gateway() {
    let layout = layout("converging.json");
    assert_eq!(layout.inserted_gateways, vec!["notify_merge".to_string()]);
    assert_eq!(layout.nodes.len(), 7);
    assert_eq!(layout.edges.len(), 7);

    let merge = layout.node("notify_merge").unwrap();
    assert_eq!(merge.kind, NodeKind::ExclusiveGateway);
    assert_eq!(merge.lane, "Team");
    assert!(layout.edge("approve", "notify_merge").is_some());
    assert!(layout.edge("reject", "notify_merge").is_some());
    assert!(layout.edge("approve", "notify").is_none());
    assert_eq!(layout.incoming("notify").count(), 1);

    assert!(non_gateway_in_degrees(&layout).values().all(|&d| d <= 1));
    assert_eq!(layout.rank("approve"), layout.rank("reject"));
    assert_forward_ranks_increase(&layout);
}

#[test]
fn independent_branches_keep_their_end_events_close() {
    let layout = layout("branches.json");
    assert!(layout.inserted_gateways.is_empty());
    assert_eq!(layout.rank("ship"), layout.rank("backorder"));

    // End events follow their predecessor's lane.
    assert_eq!(layout.node("shipped").unwrap().lane, "Warehouse");
    assert_eq!(layout.node("waiting").unwrap().lane, "Sales");
    let lane_names: Vec<&str> = layout.lanes.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(lane_names, vec!["Sales", "Warehouse"]);

    // The cross-lane branch leaves the gateway from the bottom.
    let stock = layout.node("stock").unwrap().bounds;
    let down = layout.edge("stock", "ship").unwrap();
    assert_eq!(down.points[0], stock.port(EdgeSide::Bottom));
    let bend = down.points[1];
    let label = down.label_bounds.unwrap();
    assert_eq!((label.x, label.y), (bend.0 + 8.0, bend.1 + 15.0));
    assert_eq!(label.width, 21.0);

    let right = layout.edge("stock", "backorder").unwrap();
    assert_eq!(right.points[0], stock.port(EdgeSide::Right));
    assert_orthogonal(&layout);
}

#[test]
fn obstructed_cross_lane_edge_uses_a_corridor() {
    let layout = layout("corridor.json");
    let edge = layout.edge("g", "b").unwrap();
    assert!(edge.corridor);
    assert_eq!(layout.edges.iter().filter(|e| e.corridor).count(), 1);

    let g = layout.rank("g").unwrap();
    let b = layout.rank("b").unwrap();
    let highest = layout
        .nodes
        .iter()
        .filter(|node| node.lane == "L2")
        .map(|node| node.rank)
        .filter(|&rank| rank >= g && rank < b)
        .max()
        .unwrap();
    assert!(b >= highest + 2);

    // The vertical channel runs halfway between the gateway and its target.
    let target = layout.node("b").unwrap().bounds;
    let start = edge.points[0];
    let mid_x = start.0 + (target.x - start.0) / 2.0;
    assert!(edge.points[1..edge.points.len() - 1]
        .iter()
        .all(|point| (point.0 - mid_x).abs() < 1e-3));
    assert_forward_ranks_increase(&layout);
    assert_orthogonal(&layout);
}

#[test]
fn rework_loop_becomes_a_back_edge() {
    let layout = layout("rework_cycle.json");
    assert_eq!(layout.inserted_gateways, vec!["draft_merge".to_string()]);
    let back: Vec<_> = layout.edges.iter().filter(|e| e.back_edge).collect();
    assert_eq!(back.len(), 1);
    assert_eq!((back[0].from.as_str(), back[0].to.as_str()), ("draft_merge", "draft"));

    let x_max = layout.pool.right() - LayoutConfig::default().routing_margin;
    assert!(back[0].points.iter().any(|point| (point.0 - x_max).abs() < 1e-3));
    let draft = layout.node("draft").unwrap().bounds;
    assert_eq!(back[0].points.last(), Some(&draft.port(EdgeSide::Top)));
    assert_forward_ranks_increase(&layout);
    assert_orthogonal(&layout);
}

#[test]
fn expense_report_with_legacy_keys() {
    let graph = load("expense_report.json");
    assert_eq!(graph.name, "Spesenabrechnung");
    let layout = compute_layout(&graph, &LayoutConfig::default()).unwrap();

    let lane_names: Vec<&str> = layout.lanes.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(lane_names, vec!["Mitarbeiter", "Buchhaltung", "HR-Tool", "Teamleiter"]);
    // The amount check follows both of its branches into the HR tool.
    assert_eq!(layout.node("node_3").unwrap().lane, "HR-Tool");
    // The final end event joins the merge gateway's lane.
    assert_eq!(layout.node("node_15").unwrap().lane, "Buchhaltung");
    assert!(layout.inserted_gateways.is_empty());

    let payout = layout.edge("node_9", "node_10").unwrap();
    assert!(payout.corridor);
    assert!(layout.rank("node_10") >= Some(layout.rank("node_13").unwrap() + 2));
    assert_forward_ranks_increase(&layout);
    assert_orthogonal(&layout);

    let xml = render_bpmn(&layout, &Theme::signavio());
    assert!(xml.contains("name=\"Ja (&lt; 100€)\""));
    assert!(xml.contains("<documentation>Mitarbeiter bekommen ihre Auslagen schnell erstattet.</documentation>"));
    assert_eq!(xml.matches("<sequenceFlow ").count(), 13);
}

#[test]
fn output_is_deterministic() {
    for name in [
        "linear.json",
        "converging.json",
        "branches.json",
        "corridor.json",
        "rework_cycle.json",
        "expense_report.json",
    ] {
        let graph = load(name);
        let config = LayoutConfig::default();
        let first = render_bpmn(&compute_layout(&graph, &config).unwrap(), &Theme::signavio());
        let second = render_bpmn(&compute_layout(&graph, &config).unwrap(), &Theme::signavio());
        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn every_node_and_flow_reaches_the_document() {
    for name in ["converging.json", "corridor.json", "expense_report.json"] {
        let layout = layout(name);
        let xml = render_bpmn(&layout, &Theme::signavio());
        for node in &layout.nodes {
            assert!(
                xml.contains(&format!("<bpmndi:BPMNShape id=\"{}_gui\"", node.id)),
                "{name}: {}",
                node.id
            );
        }
        for edge in &layout.edges {
            assert!(xml.contains(&format!("<sequenceFlow id=\"{}\"", edge.id)));
            assert!(xml.contains(&format!("<bpmndi:BPMNEdge id=\"{}_gui\"", edge.id)));
        }
    }
}

#[test]
fn input_errors_are_typed() {
    init_tracing();
    let config = LayoutConfig::default();
    let mut graph = load("linear.json");
    graph.nodes[1].lane = "Nobody".to_string();
    assert_eq!(
        compute_layout(&graph, &config).unwrap_err(),
        LayoutError::UnknownLane {
            node: "file".to_string(),
            lane: "Nobody".to_string()
        }
    );

    let mut graph = load("linear.json");
    graph.nodes[2].id = "file".to_string();
    assert_eq!(
        compute_layout(&graph, &config).unwrap_err(),
        LayoutError::DuplicateNode {
            id: "file".to_string()
        }
    );

    assert_eq!(
        compute_layout(&ProcessGraph::default(), &config).unwrap_err(),
        LayoutError::EmptyGraph
    );
}

mod collision;
mod error;
mod geometry;
pub(crate) mod label_placement;
mod lanes;
mod normalize;
mod ranking;
mod routing;
pub(crate) mod types;

pub use error::LayoutError;
pub use normalize::normalize;
pub use types::*;

use collision::resolve_collisions;
use geometry::place_nodes;
use lanes::{enforce_end_event_lanes, optimize_gateway_lanes, sequence_lanes};
use ranking::{assign_ranks, synchronize_gateway_branches};
use routing::route_edges;

use crate::config::LayoutConfig;
use crate::ir::{Node, ProcessGraph, is_valid_element_id};
use std::collections::{HashMap, HashSet};

/// Index-based view of a normalized process graph, owned by one layout run.
#[derive(Debug, Clone)]
pub(crate) struct FlowGraph {
    pub nodes: Vec<Node>,
    /// Declared lanes, deduplicated, in declaration order.
    pub lanes: Vec<String>,
    /// Lane index per node. Lane adjustments write here, never to `nodes`.
    pub lane_of: Vec<usize>,
    /// Edges in node order, then in each node's outgoing order.
    pub edges: Vec<FlowEdge>,
    pub outgoing: Vec<Vec<usize>>,
    pub incoming: Vec<Vec<usize>>,
    pub index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct FlowEdge {
    pub from: usize,
    pub to: usize,
    pub label: Option<String>,
}

impl FlowGraph {
    pub fn build(graph: &ProcessGraph) -> Result<Self, LayoutError> {
        let lanes = graph.declared_lanes();
        let lane_index: HashMap<&str, usize> = lanes
            .iter()
            .enumerate()
            .map(|(idx, lane)| (lane.as_str(), idx))
            .collect();

        let mut index = HashMap::with_capacity(graph.nodes.len());
        let mut lane_of = Vec::with_capacity(graph.nodes.len());
        for (idx, node) in graph.nodes.iter().enumerate() {
            let Some(&lane) = lane_index.get(node.lane.as_str()) else {
                return Err(LayoutError::UnknownLane {
                    node: node.id.clone(),
                    lane: node.lane.clone(),
                });
            };
            lane_of.push(lane);
            index.entry(node.id.clone()).or_insert(idx);
        }

        let mut edges = Vec::new();
        let mut outgoing = vec![Vec::new(); graph.nodes.len()];
        let mut incoming = vec![Vec::new(); graph.nodes.len()];
        for (from, node) in graph.nodes.iter().enumerate() {
            for flow in &node.outgoing {
                let Some(&to) = index.get(&flow.target) else {
                    continue;
                };
                let edge = edges.len();
                edges.push(FlowEdge {
                    from,
                    to,
                    label: flow.label.clone(),
                });
                outgoing[from].push(edge);
                incoming[to].push(edge);
            }
        }

        Ok(Self {
            nodes: graph.nodes.clone(),
            lanes,
            lane_of,
            edges,
            outgoing,
            incoming,
            index,
        })
    }
}

/// Rejects graphs the pipeline cannot lay out: no nodes, repeated ids, or ids
/// that cannot be used as XML element ids.
pub fn validate_graph(graph: &ProcessGraph) -> Result<(), LayoutError> {
    if graph.nodes.is_empty() {
        return Err(LayoutError::EmptyGraph);
    }
    let mut seen = HashSet::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        if !is_valid_element_id(&node.id) {
            return Err(LayoutError::InvalidNodeId {
                id: node.id.clone(),
            });
        }
        if !seen.insert(node.id.as_str()) {
            return Err(LayoutError::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }
    Ok(())
}

/// Runs the full layout pipeline on a copy of `graph`.
///
/// The caller's graph is never modified. Either a complete layout is returned
/// or an error; there is no partial result.
pub fn compute_layout(graph: &ProcessGraph, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    validate_graph(graph)?;

    let mut working = graph.clone();
    for (from, to) in working.prune_dangling_flows() {
        tracing::warn!(%from, %to, "dropped flow to unknown node");
    }
    let inserted_gateways = normalize(&mut working);
    tracing::debug!(
        nodes = working.nodes.len(),
        edges = working.edge_count(),
        inserted = inserted_gateways.len(),
        "normalized process graph"
    );

    let mut flow = FlowGraph::build(&working)?;
    optimize_gateway_lanes(&mut flow);
    let lane_order = sequence_lanes(&flow);
    enforce_end_event_lanes(&mut flow);

    let mut lane_position = vec![0usize; flow.lanes.len()];
    for (position, &lane) in lane_order.iter().enumerate() {
        lane_position[lane] = position;
    }

    let mut ranking = assign_ranks(&flow);
    synchronize_gateway_branches(&flow, &mut ranking);
    let corridor = resolve_collisions(&flow, &lane_position, &mut ranking)?;
    tracing::debug!(
        max_rank = ranking.ranks.iter().copied().max().unwrap_or(0),
        back_edges = ranking.back_edges.iter().filter(|back| **back).count(),
        corridors = corridor.iter().filter(|c| **c).count(),
        "assigned ranks"
    );

    let geometry = place_nodes(&flow, &lane_order, &ranking.ranks, config);
    let routes = route_edges(&flow, &ranking, &lane_position, &corridor, &geometry, config);

    let nodes = flow
        .nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| NodeLayout {
            id: node.id.clone(),
            kind: node.kind,
            label: node.label.clone(),
            lane: flow.lanes[flow.lane_of[idx]].clone(),
            rank: ranking.ranks[idx],
            bounds: geometry.nodes[idx],
        })
        .collect();

    let lanes = lane_order
        .iter()
        .enumerate()
        .map(|(order, &lane)| LaneLayout {
            id: format!("sid-lane-{}", order + 1),
            name: flow.lanes[lane].clone(),
            order,
            bounds: geometry.lanes[lane],
            nodes: (0..flow.nodes.len())
                .filter(|&node| flow.lane_of[node] == lane)
                .map(|node| flow.nodes[node].id.clone())
                .collect(),
        })
        .collect();

    let edges = flow
        .edges
        .iter()
        .zip(routes)
        .enumerate()
        .map(|(idx, (edge, route))| EdgeLayout {
            id: format!("sid-flow-{}", idx + 1),
            from: flow.nodes[edge.from].id.clone(),
            to: flow.nodes[edge.to].id.clone(),
            label: edge.label.clone(),
            points: route.points,
            label_bounds: route.label_bounds,
            corridor: corridor[idx],
            back_edge: ranking.back_edges[idx],
        })
        .collect();

    let pool = geometry.pool;
    tracing::debug!(width = pool.width, height = pool.height, "placed pool");
    Ok(Layout {
        process_name: working.name,
        goal: working.goal,
        pool,
        lanes,
        nodes,
        edges,
        inserted_gateways,
        width: pool.right() + config.pool_padding_x,
        height: pool.bottom() + config.pool_padding_y,
    })
}

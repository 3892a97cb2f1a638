use crate::config::LayoutConfig;

use super::FlowGraph;
use super::geometry::Geometry;
use super::label_placement::edge_label_bounds;
use super::ranking::Ranking;
use super::types::{Bounds, EdgeSide};

const EPS: f32 = 1e-4;

#[derive(Debug, Clone)]
pub(super) struct Route {
    pub points: Vec<(f32, f32)>,
    pub label_bounds: Option<Bounds>,
}

/// Orthogonal waypoints for every edge, in edge order.
pub(super) fn route_edges(
    graph: &FlowGraph,
    ranking: &Ranking,
    lane_position: &[usize],
    corridor: &[bool],
    geometry: &Geometry,
    config: &LayoutConfig,
) -> Vec<Route> {
    (0..graph.edges.len())
        .map(|edge| {
            let points = route_edge(graph, ranking, lane_position, corridor, geometry, config, edge);
            let source = graph.edges[edge].from;
            let label_bounds = graph.edges[edge].label.as_deref().map(|label| {
                edge_label_bounds(
                    &points,
                    label,
                    graph.nodes[source].kind.is_gateway(),
                    config,
                )
            });
            Route {
                points,
                label_bounds,
            }
        })
        .collect()
}

fn route_edge(
    graph: &FlowGraph,
    ranking: &Ranking,
    lane_position: &[usize],
    corridor: &[bool],
    geometry: &Geometry,
    config: &LayoutConfig,
    edge: usize,
) -> Vec<(f32, f32)> {
    let (from, to) = (graph.edges[edge].from, graph.edges[edge].to);
    let source = geometry.nodes[from];
    let target = geometry.nodes[to];
    if from == to {
        return compress_path(&route_self_loop(&source, config.routing_margin));
    }

    let side = exit_side(graph, lane_position, edge);
    let mut start = source.port(side);
    let mut end = target.port(EdgeSide::Left);
    let rank_diff = ranking.ranks[to] as i64 - ranking.ranks[from] as i64;
    let mut points = Vec::with_capacity(5);

    match rank_diff {
        diff if diff > 1 => {
            if corridor[edge] {
                let mid_x = start.0 + (target.x - start.0) / 2.0;
                points.push(start);
                points.push((mid_x, start.1));
                points.push((mid_x, end.1));
            } else {
                if graph.nodes[to].kind.is_gateway() {
                    end = target.port(EdgeSide::Top);
                }
                let routing_y = start.1.min(end.1) - config.vertical_spacing;
                let stub_x = start.0 + config.routing_margin;
                points.push(start);
                points.push((stub_x, start.1));
                points.push((stub_x, routing_y));
                points.push((end.0, routing_y));
            }
        }
        1 => {
            points.push(start);
            if side.is_vertical() {
                points.push((start.0, end.1));
            } else {
                let jog_x = start.0 + config.routing_margin * 2.0;
                points.push((jog_x, start.1));
                points.push((jog_x, end.1));
            }
        }
        0 => {
            // Same column: straight vertical between facing sides.
            if target.y >= source.bottom() {
                start = source.port(EdgeSide::Bottom);
                end = target.port(EdgeSide::Top);
            } else {
                start = source.port(EdgeSide::Top);
                end = target.port(EdgeSide::Bottom);
            }
            points.push(start);
        }
        _ => {
            end = target.port(EdgeSide::Top);
            let x_max = geometry.pool.right() - config.routing_margin;
            let channel_y = geometry.lanes[graph.lane_of[to]].y + config.lane_padding_top / 2.0;
            points.push(start);
            points.push((x_max, start.1));
            points.push((x_max, channel_y));
            points.push((end.0, channel_y));
        }
    }
    points.push(end);
    compress_path(&points)
}

/// Side of the source shape an edge leaves from.
///
/// Gateways exit vertically toward another lane, and spread several
/// same-lane branches over their top, right and bottom corners. Everything
/// else leaves from the right.
pub(super) fn exit_side(graph: &FlowGraph, lane_position: &[usize], edge: usize) -> EdgeSide {
    let (from, to) = (graph.edges[edge].from, graph.edges[edge].to);
    if !graph.nodes[from].kind.is_gateway() {
        return EdgeSide::Right;
    }

    let source_lane = lane_position[graph.lane_of[from]];
    let target_lane = lane_position[graph.lane_of[to]];
    if source_lane != target_lane {
        return if target_lane < source_lane {
            EdgeSide::Top
        } else {
            EdgeSide::Bottom
        };
    }

    let same_lane: Vec<usize> = graph.outgoing[from]
        .iter()
        .copied()
        .filter(|&out| graph.lane_of[graph.edges[out].to] == graph.lane_of[from])
        .collect();
    let Some(idx) = same_lane.iter().position(|&out| out == edge) else {
        return EdgeSide::Right;
    };
    match (same_lane.len(), idx) {
        (0 | 1, _) => EdgeSide::Right,
        (2, 0) => EdgeSide::Top,
        (2, _) => EdgeSide::Bottom,
        (3, 0) => EdgeSide::Top,
        (3, 1) => EdgeSide::Right,
        (3, _) => EdgeSide::Bottom,
        (_, idx) if idx % 2 == 0 => EdgeSide::Top,
        _ => EdgeSide::Bottom,
    }
}

/// Loop leaving the right side and re-entering from above.
pub(super) fn route_self_loop(node: &Bounds, pad: f32) -> Vec<(f32, f32)> {
    let (cx, cy) = node.center();
    let right_x = node.right() + pad;
    let top_y = node.y - pad;
    vec![
        node.port(EdgeSide::Right),
        (right_x, cy),
        (right_x, top_y),
        (cx, top_y),
        node.port(EdgeSide::Top),
    ]
}

/// Drops repeated points and interior points that continue a straight run.
pub(super) fn compress_path(points: &[(f32, f32)]) -> Vec<(f32, f32)> {
    let mut out: Vec<(f32, f32)> = Vec::with_capacity(points.len());
    for &point in points {
        if let Some(&last) = out.last() {
            if same_point(last, point) {
                continue;
            }
        }
        if out.len() >= 2 {
            let prev = out[out.len() - 2];
            let curr = out[out.len() - 1];
            let vertical = (prev.0 - curr.0).abs() <= EPS && (curr.0 - point.0).abs() <= EPS;
            let horizontal = (prev.1 - curr.1).abs() <= EPS && (curr.1 - point.1).abs() <= EPS;
            if vertical || horizontal {
                out.pop();
            }
        }
        out.push(point);
    }
    out
}

fn same_point(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 - b.0).abs() <= EPS && (a.1 - b.1).abs() <= EPS
}

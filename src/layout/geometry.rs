use std::collections::BTreeMap;

use crate::config::LayoutConfig;

use super::FlowGraph;
use super::types::Bounds;

/// Absolute boxes for one layout run, indexed like the flow graph.
#[derive(Debug, Clone)]
pub(super) struct Geometry {
    pub nodes: Vec<Bounds>,
    /// Lane band per lane index (declaration order, not sequence order).
    pub lanes: Vec<Bounds>,
    pub pool: Bounds,
}

/// Stacks lane bands in sequence order and places every node in its rank
/// column. Nodes sharing a rank inside one lane are sorted by id and spread
/// evenly over the lane height.
pub(super) fn place_nodes(
    graph: &FlowGraph,
    lane_order: &[usize],
    ranks: &[usize],
    config: &LayoutConfig,
) -> Geometry {
    let pitch = config.column_pitch();
    let pool_x = config.pool_padding_x;
    let pool_y = config.pool_padding_y;
    let first_column_x = pool_x + config.lane_header_width + config.lane_content_padding_x;
    let max_rank = ranks.iter().copied().max().unwrap_or(0);
    let pool_width = config.lane_header_width
        + config.lane_content_padding_x
        + (max_rank as f32 + 1.5) * pitch
        + config.pool_padding_x;

    let mut nodes = vec![Bounds::new(0.0, 0.0, 0.0, 0.0); graph.nodes.len()];
    let mut lane_bands = vec![(0.0f32, 0.0f32); graph.lanes.len()];
    let mut cursor = pool_y;

    for &lane in lane_order {
        let mut columns: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for node in (0..graph.nodes.len()).filter(|&node| graph.lane_of[node] == lane) {
            columns.entry(ranks[node]).or_default().push(node);
        }
        let stack = columns.values().map(Vec::len).max().unwrap_or(0).max(1);
        let height = stack as f32 * (config.task_height + config.vertical_spacing)
            + config.lane_padding_top
            + config.lane_padding_bottom;

        for (&rank, members) in columns.iter_mut() {
            members.sort_by(|a, b| graph.nodes[*a].id.cmp(&graph.nodes[*b].id));
            let slot = height / (members.len() + 1) as f32;
            let column_x = first_column_x + rank as f32 * pitch;
            for (j, &node) in members.iter().enumerate() {
                let (width, node_height) = config.node_size(graph.nodes[node].kind.shape());
                let x = column_x + (config.task_width - width) / 2.0;
                let y = cursor + slot * (j + 1) as f32 - node_height / 2.0;
                nodes[node] = Bounds::new(x, y, width, node_height);
            }
        }

        lane_bands[lane] = (cursor, height);
        cursor += height;
    }

    let pool = Bounds::new(pool_x, pool_y, pool_width, cursor - pool_y);
    let lanes = lane_bands
        .into_iter()
        .map(|(y, height)| {
            Bounds::new(
                pool.x + config.lane_header_width,
                y,
                pool.width - config.lane_header_width,
                height,
            )
        })
        .collect();

    Geometry { nodes, lanes, pool }
}

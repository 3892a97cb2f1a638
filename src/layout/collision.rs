use super::error::LayoutError;
use super::ranking::{Ranking, propagate_forward, synchronize_gateway_branches};
use super::FlowGraph;

/// Defers the targets of forward edges that would cut through occupied lanes.
///
/// An edge spanning more than one lane is obstructed by any node in a lane
/// strictly between its endpoints whose rank lies in `rank(from)..rank(to)`.
/// Obstructed edges are marked as corridor edges; when the target is not at
/// least two ranks past the last obstruction it is raised there, the raise is
/// propagated and the pass restarts. Returns the corridor flag per edge.
/// At most n² raises are made before giving up.
pub(super) fn resolve_collisions(
    graph: &FlowGraph,
    lane_position: &[usize],
    ranking: &mut Ranking,
) -> Result<Vec<bool>, LayoutError> {
    let n = graph.nodes.len();
    resolve_collisions_within(graph, lane_position, ranking, n.saturating_mul(n))
}

fn resolve_collisions_within(
    graph: &FlowGraph,
    lane_position: &[usize],
    ranking: &mut Ranking,
    max_raises: usize,
) -> Result<Vec<bool>, LayoutError> {
    let n = graph.nodes.len();
    let node_lane = |node: usize| lane_position[graph.lane_of[node]];

    let mut corridor = vec![false; graph.edges.len()];
    let mut passes = 0usize;
    'passes: loop {
        for (idx, edge) in graph.edges.iter().enumerate() {
            if !ranking.is_forward(idx) {
                continue;
            }
            let (from, to) = (edge.from, edge.to);
            let (lane_from, lane_to) = (node_lane(from), node_lane(to));
            if lane_from.abs_diff(lane_to) <= 1 {
                continue;
            }
            let (low, high) = (lane_from.min(lane_to), lane_from.max(lane_to));
            let (rank_from, rank_to) = (ranking.ranks[from], ranking.ranks[to]);

            let obstruction = (0..n)
                .filter(|&node| node != from && node != to)
                .filter(|&node| {
                    let lane = node_lane(node);
                    low < lane && lane < high
                })
                .map(|node| ranking.ranks[node])
                .filter(|&rank| rank_from <= rank && rank < rank_to)
                .max();
            let Some(highest) = obstruction else {
                continue;
            };
            corridor[idx] = true;

            if rank_to < highest + 2 {
                passes += 1;
                if passes > max_raises {
                    return Err(LayoutError::CollisionUnresolved {
                        from: graph.nodes[from].id.clone(),
                        to: graph.nodes[to].id.clone(),
                        passes,
                    });
                }
                tracing::trace!(
                    from = %graph.nodes[from].id,
                    to = %graph.nodes[to].id,
                    rank = highest + 2,
                    "deferred target past intervening lane"
                );
                ranking.ranks[to] = highest + 2;
                propagate_forward(graph, ranking, to);
                synchronize_gateway_branches(graph, ranking);
                continue 'passes;
            }
        }
        break;
    }

    tracing::debug!(passes, "resolved cross-lane collisions");
    Ok(corridor)
}

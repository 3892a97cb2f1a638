use std::collections::{BTreeMap, HashMap};

use crate::ir::NodeKind;

use super::FlowGraph;

/// Moves a diverging gateway into the lane that receives the strict majority
/// of its branches. Ties leave the gateway where it is.
pub(super) fn optimize_gateway_lanes(graph: &mut FlowGraph) {
    for node in 0..graph.nodes.len() {
        if !graph.nodes[node].kind.is_gateway() || graph.outgoing[node].len() <= 1 {
            continue;
        }
        let mut tally: BTreeMap<usize, usize> = BTreeMap::new();
        for &edge in &graph.outgoing[node] {
            *tally.entry(graph.lane_of[graph.edges[edge].to]).or_default() += 1;
        }
        let Some(&best) = tally.values().max() else {
            continue;
        };
        let mut leaders = tally.iter().filter(|(_, count)| **count == best);
        let (Some((&lane, _)), None) = (leaders.next(), leaders.next()) else {
            continue;
        };
        if graph.lane_of[node] != lane {
            tracing::debug!(
                gateway = %graph.nodes[node].id,
                lane = %graph.lanes[lane],
                "moved gateway to majority branch lane"
            );
            graph.lane_of[node] = lane;
        }
    }
}

/// Puts every end event into the lane of its first predecessor.
pub(super) fn enforce_end_event_lanes(graph: &mut FlowGraph) {
    for node in 0..graph.nodes.len() {
        if graph.nodes[node].kind != NodeKind::EndEvent {
            continue;
        }
        let Some(&first) = graph.incoming[node].first() else {
            continue;
        };
        let lane = graph.lane_of[graph.edges[first].from];
        if graph.lane_of[node] != lane {
            tracing::debug!(
                end_event = %graph.nodes[node].id,
                lane = %graph.lanes[lane],
                "moved end event to predecessor lane"
            );
            graph.lane_of[node] = lane;
        }
    }
}

/// Orders lanes so that lanes exchanging many edges end up adjacent.
///
/// Greedy: starting from the lane of the first start event, repeatedly append
/// the remaining lane with the best `2 * forward - backward` vote score
/// relative to the last placed lane. Ties keep declaration order.
pub(super) fn sequence_lanes(graph: &FlowGraph) -> Vec<usize> {
    let lane_count = graph.lanes.len();
    if lane_count == 0 {
        return Vec::new();
    }

    let mut votes: HashMap<(usize, usize), i64> = HashMap::new();
    for edge in &graph.edges {
        let from = graph.lane_of[edge.from];
        let to = graph.lane_of[edge.to];
        if from != to {
            *votes.entry((from, to)).or_default() += 1;
        }
    }
    let vote = |from: usize, to: usize| votes.get(&(from, to)).copied().unwrap_or(0);

    let seed = graph
        .nodes
        .iter()
        .position(|node| node.kind == NodeKind::StartEvent)
        .map(|node| graph.lane_of[node])
        .unwrap_or(0);

    let mut order = Vec::with_capacity(lane_count);
    order.push(seed);
    let mut remaining: Vec<usize> = (0..lane_count).filter(|&lane| lane != seed).collect();
    let mut current = seed;
    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = i64::MIN;
        for (idx, &candidate) in remaining.iter().enumerate() {
            let score = 2 * vote(current, candidate) - vote(candidate, current);
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
        }
        current = remaining.remove(best_idx);
        order.push(current);
    }

    if let Some(pos) = order.iter().position(|&lane| lane == seed) {
        if pos != 0 {
            order.remove(pos);
            order.insert(0, seed);
        }
    }

    tracing::debug!(
        order = ?order.iter().map(|&lane| graph.lanes[lane].as_str()).collect::<Vec<_>>(),
        "sequenced lanes"
    );
    order
}

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::FlowGraph;

#[derive(Debug, Clone)]
pub(super) struct Ranking {
    /// Layout column per node.
    pub ranks: Vec<usize>,
    /// Edges that close a cycle, per edge index.
    pub back_edges: Vec<bool>,
    /// Position of each node in the layering order. Forward edges always
    /// point from a lower to a higher position.
    pub position: Vec<usize>,
}

impl Ranking {
    pub fn is_forward(&self, edge: usize) -> bool {
        !self.back_edges[edge]
    }
}

/// Longest-path layering with Kahn's algorithm.
///
/// When the ready queue drains while nodes remain, the graph has a cycle. The
/// earliest remaining node whose strongly connected component has no pending
/// predecessor outside the component is released, and its pending incoming
/// edges from inside that component become back edges. Edges between
/// components are never back edges.
pub(super) fn assign_ranks(graph: &FlowGraph) -> Ranking {
    let n = graph.nodes.len();
    let component = strongly_connected_components(graph);
    let mut ranks = vec![0usize; n];
    let mut back_edges = vec![false; graph.edges.len()];
    let mut pending: Vec<usize> = graph.incoming.iter().map(Vec::len).collect();
    let mut processed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue: VecDeque<usize> = (0..n).filter(|&node| pending[node] == 0).collect();

    loop {
        while let Some(node) = queue.pop_front() {
            if processed[node] {
                continue;
            }
            processed[node] = true;
            order.push(node);
            for &edge in &graph.outgoing[node] {
                let next = graph.edges[edge].to;
                if processed[next] {
                    back_edges[edge] = true;
                    continue;
                }
                ranks[next] = ranks[next].max(ranks[node] + 1);
                pending[next] = pending[next].saturating_sub(1);
                if pending[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() >= n {
            break;
        }
        let releasable = |node: usize| {
            !processed[node]
                && graph.incoming[node].iter().all(|&edge| {
                    let from = graph.edges[edge].from;
                    processed[from] || component[from] == component[node]
                })
        };
        let Some(release) = (0..n)
            .find(|&node| releasable(node))
            .or_else(|| (0..n).find(|&node| !processed[node]))
        else {
            break;
        };
        for &edge in &graph.incoming[release] {
            if !processed[graph.edges[edge].from] {
                back_edges[edge] = true;
            }
        }
        tracing::debug!(node = %graph.nodes[release].id, "cycle detected; releasing node");
        pending[release] = 0;
        queue.push_back(release);
    }

    let mut position = vec![0usize; n];
    for (idx, &node) in order.iter().enumerate() {
        position[node] = idx;
    }

    Ranking {
        ranks,
        back_edges,
        position,
    }
}

/// Component id per node, from Tarjan's algorithm.
fn strongly_connected_components(graph: &FlowGraph) -> Vec<usize> {
    let mut digraph: DiGraph<(), ()> = DiGraph::with_capacity(graph.nodes.len(), graph.edges.len());
    let indices: Vec<NodeIndex> = (0..graph.nodes.len()).map(|_| digraph.add_node(())).collect();
    for edge in &graph.edges {
        digraph.add_edge(indices[edge.from], indices[edge.to], ());
    }

    let mut component = vec![0usize; graph.nodes.len()];
    for (id, members) in tarjan_scc(&digraph).into_iter().enumerate() {
        for member in members {
            component[member.index()] = id;
        }
    }
    component
}

/// Raises successors of `start` until every forward edge below it satisfies
/// `rank(to) >= rank(from) + 1`. Nodes are visited once, in layering order.
pub(super) fn propagate_forward(graph: &FlowGraph, ranking: &mut Ranking, start: usize) {
    let mut visited = vec![false; graph.nodes.len()];
    let mut ready: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();
    ready.push(Reverse((ranking.position[start], start)));
    while let Some(Reverse((_, node))) = ready.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;
        for &edge in &graph.outgoing[node] {
            if !ranking.is_forward(edge) {
                continue;
            }
            let next = graph.edges[edge].to;
            let required = ranking.ranks[node] + 1;
            if ranking.ranks[next] < required {
                tracing::trace!(node = %graph.nodes[next].id, rank = required, "raised rank");
                ranking.ranks[next] = required;
                ready.push(Reverse((ranking.position[next], next)));
            }
        }
    }
}

/// Aligns the branches leaving each diverging gateway on one rank.
///
/// Only branches that are not reachable from a sibling branch take part;
/// forcing a chained sibling onto the same column would break monotonicity.
/// Ranks only grow. Returns true when anything changed.
pub(super) fn synchronize_gateway_branches(graph: &FlowGraph, ranking: &mut Ranking) -> bool {
    let n = graph.nodes.len();
    let mut gateways: Vec<usize> = (0..n)
        .filter(|&node| graph.nodes[node].kind.is_gateway() && graph.outgoing[node].len() > 1)
        .collect();
    gateways.sort_by_key(|&node| ranking.position[node]);

    let mut changed_any = false;
    for _ in 0..n.max(1) {
        let mut changed = false;
        for &gateway in &gateways {
            let branches = independent_branches(graph, ranking, gateway);
            let Some(target) = branches.iter().map(|&node| ranking.ranks[node]).max() else {
                continue;
            };
            for &branch in &branches {
                if ranking.ranks[branch] < target {
                    ranking.ranks[branch] = target;
                    propagate_forward(graph, ranking, branch);
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
        changed_any = true;
    }
    changed_any
}

/// Forward successors of `gateway` that no other successor can reach.
pub(super) fn independent_branches(
    graph: &FlowGraph,
    ranking: &Ranking,
    gateway: usize,
) -> Vec<usize> {
    let mut branches: Vec<usize> = Vec::new();
    for &edge in &graph.outgoing[gateway] {
        let next = graph.edges[edge].to;
        if ranking.is_forward(edge) && next != gateway && !branches.contains(&next) {
            branches.push(next);
        }
    }
    if branches.len() <= 1 {
        return branches;
    }
    let reached: Vec<Vec<bool>> = branches
        .iter()
        .map(|&branch| forward_reachable(graph, ranking, branch))
        .collect();
    branches
        .iter()
        .enumerate()
        .filter(|(idx, node)| {
            !reached
                .iter()
                .enumerate()
                .any(|(other, seen)| other != *idx && seen[**node])
        })
        .map(|(_, &node)| node)
        .collect()
}

fn forward_reachable(graph: &FlowGraph, ranking: &Ranking, start: usize) -> Vec<bool> {
    let mut seen = vec![false; graph.nodes.len()];
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for &edge in &graph.outgoing[node] {
            let next = graph.edges[edge].to;
            if ranking.is_forward(edge) && !seen[next] {
                seen[next] = true;
                stack.push(next);
            }
        }
    }
    seen
}

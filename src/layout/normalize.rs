use std::collections::{HashMap, HashSet};

use crate::ir::{Flow, Node, NodeKind, ProcessGraph};

/// Inserts a converging exclusive gateway in front of every non-gateway node
/// with more than one incoming edge and reroutes those edges through it.
///
/// Returns the ids of the inserted gateways, in insertion order. Nodes and
/// edges are never removed; only edge targets change. A graph without merge
/// points is left untouched, so a second run inserts nothing.
pub fn normalize(graph: &mut ProcessGraph) -> Vec<String> {
    let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
    let known: HashSet<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
    for node in &graph.nodes {
        for flow in &node.outgoing {
            if known.contains(flow.target.as_str()) {
                predecessors
                    .entry(flow.target.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }
    }

    let offenders: Vec<(String, String)> = graph
        .nodes
        .iter()
        .filter(|node| !node.kind.is_gateway())
        .filter(|node| {
            predecessors
                .get(&node.id)
                .is_some_and(|sources| sources.len() > 1)
        })
        .map(|node| (node.id.clone(), node.lane.clone()))
        .collect();

    let mut taken: HashSet<String> = graph.nodes.iter().map(|node| node.id.clone()).collect();
    let mut inserted = Vec::with_capacity(offenders.len());
    for (target, lane) in offenders {
        let gateway_id = fresh_gateway_id(&target, &taken);
        taken.insert(gateway_id.clone());

        let sources: HashSet<&str> = predecessors
            .get(&target)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default();
        for node in graph.nodes.iter_mut() {
            if !sources.contains(node.id.as_str()) {
                continue;
            }
            for flow in node.outgoing.iter_mut() {
                if flow.target == target {
                    flow.target = gateway_id.clone();
                }
            }
        }

        tracing::debug!(merge = %target, gateway = %gateway_id, "inserted converging gateway");
        graph.nodes.push(Node {
            id: gateway_id.clone(),
            kind: NodeKind::ExclusiveGateway,
            label: String::new(),
            lane,
            outgoing: vec![Flow::to(target)],
        });
        inserted.push(gateway_id);
    }
    inserted
}

fn fresh_gateway_id(target: &str, taken: &HashSet<String>) -> String {
    let base = format!("{target}_merge");
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|suffix| format!("{base}_{suffix}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

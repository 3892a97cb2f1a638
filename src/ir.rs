use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// BPMN element ids are XML NCNames; node ids are emitted verbatim.
static ELEMENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{M}\p{N}_.\-\x{B7}]*$").unwrap());

pub fn is_valid_element_id(id: &str) -> bool {
    ELEMENT_ID_RE.is_match(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    #[serde(alias = "start-event", alias = "start_event", alias = "start")]
    StartEvent,
    #[serde(alias = "end-event", alias = "end_event", alias = "end")]
    EndEvent,
    #[serde(alias = "intermediate-throw-event", alias = "intermediate_throw_event")]
    IntermediateThrowEvent,
    #[serde(alias = "intermediate-catch-event", alias = "intermediate_catch_event")]
    IntermediateCatchEvent,
    Task,
    #[serde(alias = "user-task", alias = "user_task")]
    UserTask,
    #[serde(alias = "service-task", alias = "service_task")]
    ServiceTask,
    #[serde(alias = "manual-task", alias = "manual_task")]
    ManualTask,
    #[serde(alias = "exclusive-gateway", alias = "exclusive_gateway", alias = "gateway")]
    ExclusiveGateway,
    #[serde(alias = "parallel-gateway", alias = "parallel_gateway")]
    ParallelGateway,
    #[serde(alias = "inclusive-gateway", alias = "inclusive_gateway")]
    InclusiveGateway,
}

/// Geometric family of a node kind. Sizing and port selection dispatch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeClass {
    Event,
    Task,
    Gateway,
}

impl NodeKind {
    pub fn shape(self) -> ShapeClass {
        match self {
            Self::StartEvent
            | Self::EndEvent
            | Self::IntermediateThrowEvent
            | Self::IntermediateCatchEvent => ShapeClass::Event,
            Self::Task | Self::UserTask | Self::ServiceTask | Self::ManualTask => ShapeClass::Task,
            Self::ExclusiveGateway | Self::ParallelGateway | Self::InclusiveGateway => {
                ShapeClass::Gateway
            }
        }
    }

    pub fn is_gateway(self) -> bool {
        self.shape() == ShapeClass::Gateway
    }

    /// BPMN 2.0 model element name.
    pub fn element_name(self) -> &'static str {
        match self {
            Self::StartEvent => "startEvent",
            Self::EndEvent => "endEvent",
            Self::IntermediateThrowEvent => "intermediateThrowEvent",
            Self::IntermediateCatchEvent => "intermediateCatchEvent",
            Self::Task => "task",
            Self::UserTask => "userTask",
            Self::ServiceTask => "serviceTask",
            Self::ManualTask => "manualTask",
            Self::ExclusiveGateway => "exclusiveGateway",
            Self::ParallelGateway => "parallelGateway",
            Self::InclusiveGateway => "inclusiveGateway",
        }
    }
}

/// One outgoing control-flow edge. Accepts either a bare target id or an
/// object with `target`/`target_id`/`id` and an optional `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FlowRepr")]
pub struct Flow {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlowRepr {
    Target(String),
    Full {
        #[serde(alias = "target_id", alias = "id")]
        target: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<FlowRepr> for Flow {
    fn from(repr: FlowRepr) -> Self {
        match repr {
            FlowRepr::Target(target) => Flow { target, label: None },
            FlowRepr::Full { target, label } => Flow {
                target,
                label: label.filter(|text| !text.trim().is_empty()),
            },
        }
    }
}

impl Flow {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: None,
        }
    }

    pub fn labeled(target: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    pub lane: String,
    #[serde(default, alias = "next_nodes")]
    pub outgoing: Vec<Flow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessGraph {
    #[serde(default, alias = "prozessname", alias = "process_name")]
    pub name: String,
    #[serde(default, alias = "prozessziel")]
    pub goal: String,
    #[serde(default, alias = "akteure")]
    pub lanes: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl ProcessGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_lanes<I, S>(mut self, lanes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lanes = lanes.into_iter().map(Into::into).collect();
        self
    }

    pub fn push_node(&mut self, id: &str, kind: NodeKind, lane: &str, label: &str) {
        self.nodes.push(Node {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            lane: lane.to_string(),
            outgoing: Vec::new(),
        });
    }

    /// Appends an edge to the node `from`. Returns false when `from` is unknown.
    pub fn add_flow(&mut self, from: &str, to: &str, label: Option<&str>) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|node| node.id == from) else {
            return false;
        };
        node.outgoing.push(Flow {
            target: to.to_string(),
            label: label.map(str::to_string),
        });
        true
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|node| node.outgoing.len()).sum()
    }

    /// Declared lanes with duplicates collapsed to their first occurrence.
    pub fn declared_lanes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.lanes
            .iter()
            .filter(|lane| seen.insert(lane.as_str()))
            .cloned()
            .collect()
    }

    /// Drops edges whose target is not a node of this graph and returns them
    /// as `(source, target)` pairs.
    pub fn prune_dangling_flows(&mut self) -> Vec<(String, String)> {
        let known: HashSet<String> = self.nodes.iter().map(|node| node.id.clone()).collect();
        let mut dropped = Vec::new();
        for node in &mut self.nodes {
            node.outgoing.retain(|flow| {
                if known.contains(&flow.target) {
                    true
                } else {
                    dropped.push((node.id.clone(), flow.target.clone()));
                    false
                }
            });
        }
        dropped
    }

    /// Number of edges pointing at each node, keyed by node id.
    pub fn in_degrees(&self) -> HashMap<&str, usize> {
        let mut degrees: HashMap<&str, usize> =
            self.nodes.iter().map(|node| (node.id.as_str(), 0)).collect();
        for node in &self.nodes {
            for flow in &node.outgoing {
                if let Some(count) = degrees.get_mut(flow.target.as_str()) {
                    *count += 1;
                }
            }
        }
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flows_accept_bare_ids_and_objects() {
        let node: Node = serde_json::from_str(
            r#"{"id": "g", "type": "exclusiveGateway", "lane": "A",
                "next_nodes": ["a", {"id": "b", "label": "no"}, {"target_id": "c", "label": ""}]}"#,
        )
        .unwrap();
        assert_eq!(node.outgoing[0], Flow::to("a"));
        assert_eq!(node.outgoing[1], Flow::labeled("b", "no"));
        assert_eq!(node.outgoing[2], Flow::to("c"));
        assert_eq!(node.label, "");
    }

    #[test]
    fn kind_aliases() {
        let kind: NodeKind = serde_json::from_str("\"exclusive-gateway\"").unwrap();
        assert_eq!(kind, NodeKind::ExclusiveGateway);
        let kind: NodeKind = serde_json::from_str("\"start_event\"").unwrap();
        assert_eq!(kind, NodeKind::StartEvent);
        assert_eq!(NodeKind::UserTask.element_name(), "userTask");
        assert_eq!(NodeKind::ParallelGateway.shape(), ShapeClass::Gateway);
    }

    #[test]
    fn prunes_dangling_flows() {
        let mut graph = ProcessGraph::new("p").with_lanes(["A"]);
        graph.push_node("a", NodeKind::StartEvent, "A", "");
        graph.push_node("b", NodeKind::EndEvent, "A", "");
        graph.add_flow("a", "b", None);
        graph.add_flow("a", "ghost", None);
        let dropped = graph.prune_dangling_flows();
        assert_eq!(dropped, vec![("a".to_string(), "ghost".to_string())]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn element_ids() {
        assert!(is_valid_element_id("node_1"));
        assert!(is_valid_element_id("_x-1.2"));
        assert!(!is_valid_element_id("1node"));
        assert!(!is_valid_element_id("has space"));
        assert!(!is_valid_element_id(""));
        assert!(is_valid_element_id("prüfen"));
        assert!(is_valid_element_id("Größe_2"));
        assert!(!is_valid_element_id("ärger:los"));
        assert!(!is_valid_element_id("-start"));
    }

    #[test]
    fn declared_lanes_are_deduplicated() {
        let graph = ProcessGraph::new("p").with_lanes(["A", "B", "A"]);
        assert_eq!(graph.declared_lanes(), vec!["A".to_string(), "B".to_string()]);
    }
}

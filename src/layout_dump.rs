use crate::layout::{Bounds, Layout};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub process: String,
    pub width: f32,
    pub height: f32,
    pub pool: BoundsDump,
    pub lanes: Vec<LaneDump>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub inserted_gateways: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BoundsDump {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct LaneDump {
    pub id: String,
    pub name: String,
    pub order: usize,
    pub bounds: BoundsDump,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub lane: String,
    pub rank: usize,
    pub bounds: BoundsDump,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub corridor: bool,
    pub back_edge: bool,
    pub points: Vec<[f32; 2]>,
    pub label_bounds: Option<BoundsDump>,
}

impl From<&Bounds> for BoundsDump {
    fn from(bounds: &Bounds) -> Self {
        Self {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let lanes = layout
            .lanes
            .iter()
            .map(|lane| LaneDump {
                id: lane.id.clone(),
                name: lane.name.clone(),
                order: lane.order,
                bounds: (&lane.bounds).into(),
                nodes: lane.nodes.clone(),
            })
            .collect();

        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: node.kind.element_name().to_string(),
                lane: node.lane.clone(),
                rank: node.rank,
                bounds: (&node.bounds).into(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                id: edge.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
                label: edge.label.clone(),
                corridor: edge.corridor,
                back_edge: edge.back_edge,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
                label_bounds: edge.label_bounds.as_ref().map(BoundsDump::from),
            })
            .collect();

        LayoutDump {
            process: layout.process_name.clone(),
            width: layout.width,
            height: layout.height,
            pool: (&layout.pool).into(),
            lanes,
            nodes,
            edges,
            inserted_gateways: layout.inserted_gateways.clone(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{NodeKind, ProcessGraph};
    use crate::layout::compute_layout;

    #[test]
    fn dump_carries_ranks_and_routes() {
        let mut graph = ProcessGraph::new("dump").with_lanes(["A"]);
        graph.push_node("s", NodeKind::StartEvent, "A", "");
        graph.push_node("t", NodeKind::Task, "A", "Work");
        graph.add_flow("s", "t", Some("go"));
        let layout = compute_layout(&graph, &LayoutConfig::default()).unwrap();
        let value = serde_json::to_value(LayoutDump::from_layout(&layout)).unwrap();

        assert_eq!(value["nodes"][1]["id"], "t");
        assert_eq!(value["nodes"][1]["kind"], "task");
        assert_eq!(value["nodes"][1]["rank"], 1);
        assert_eq!(value["lanes"][0]["nodes"], serde_json::json!(["s", "t"]));
        assert_eq!(value["edges"][0]["corridor"], false);
        assert_eq!(value["edges"][0]["points"][0], serde_json::json!([195.0, 180.0]));
        assert!(value["edges"][0]["label_bounds"].is_object());
    }
}

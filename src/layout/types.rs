use crate::ir::NodeKind;

/// Axis-aligned box in diagram coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Attachment point at the middle of one side.
    pub fn port(&self, side: EdgeSide) -> (f32, f32) {
        let (cx, cy) = self.center();
        match side {
            EdgeSide::Left => (self.x, cy),
            EdgeSide::Right => (self.right(), cy),
            EdgeSide::Top => (cx, self.y),
            EdgeSide::Bottom => (cx, self.bottom()),
        }
    }

    /// Strict interior overlap; touching edges do not count.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl EdgeSide {
    pub fn is_vertical(self) -> bool {
        matches!(self, EdgeSide::Top | EdgeSide::Bottom)
    }
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Lane after gateway and end-event lane adjustments.
    pub lane: String,
    pub rank: usize,
    pub bounds: Bounds,
}

#[derive(Debug, Clone)]
pub struct LaneLayout {
    pub id: String,
    pub name: String,
    /// Position in the sequenced lane order, top to bottom.
    pub order: usize,
    pub bounds: Bounds,
    /// Member node ids in input order.
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub points: Vec<(f32, f32)>,
    pub label_bounds: Option<Bounds>,
    /// Routed through a vertical channel around an intervening lane.
    pub corridor: bool,
    /// Closes a cycle; exempt from rank monotonicity.
    pub back_edge: bool,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub process_name: String,
    pub goal: String,
    pub pool: Bounds,
    pub lanes: Vec<LaneLayout>,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    /// Converging gateways inserted by normalization.
    pub inserted_gateways: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn lane(&self, name: &str) -> Option<&LaneLayout> {
        self.lanes.iter().find(|lane| lane.name == name)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeLayout> {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a EdgeLayout> + 'a {
        self.edges.iter().filter(move |edge| edge.to == id)
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a EdgeLayout> + 'a {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    pub fn rank(&self, id: &str) -> Option<usize> {
        self.node(id).map(|node| node.rank)
    }
}

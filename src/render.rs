use crate::layout::{Bounds, Layout};
use crate::theme::Theme;
use anyhow::{Context, Result};
use std::path::Path;

const NS_MODEL: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
const NS_BPMNDI: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
const NS_DC: &str = "http://www.omg.org/spec/DD/20100524/DC";
const NS_DI: &str = "http://www.omg.org/spec/DD/20100524/DI";
const NS_SIGNAVIO: &str = "http://www.signavio.com";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

const DEFINITIONS_ID: &str = "sid-definitions";
const COLLABORATION_ID: &str = "sid-collaboration";
const PARTICIPANT_ID: &str = "sid-participant";
const PROCESS_ID: &str = "sid-process";
const LANE_SET_ID: &str = "sid-laneset";
const DIAGRAM_ID: &str = "sid-diagram";
const PLANE_ID: &str = "sid-plane";
const LABEL_STYLE_ID: &str = "sid-label-style";

/// Serializes a layout as a BPMN 2.0 document with a diagram interchange
/// section. Coordinates are rounded to whole pixels here and nowhere else.
pub fn render_bpmn(layout: &Layout, theme: &Theme) -> String {
    let mut xml = XmlWriter::new();
    xml.declaration();
    xml.open(
        "definitions",
        &[
            ("id", DEFINITIONS_ID),
            ("targetNamespace", NS_SIGNAVIO),
            ("xmlns", NS_MODEL),
            ("xmlns:bpmndi", NS_BPMNDI),
            ("xmlns:omgdc", NS_DC),
            ("xmlns:omgdi", NS_DI),
            ("xmlns:signavio", NS_SIGNAVIO),
            ("xmlns:xsi", NS_XSI),
        ],
    );

    xml.open("collaboration", &[("id", COLLABORATION_ID)]);
    xml.empty(
        "participant",
        &[
            ("id", PARTICIPANT_ID),
            ("name", layout.process_name.as_str()),
            ("processRef", PROCESS_ID),
        ],
    );
    xml.close("collaboration");

    write_process(&mut xml, layout);
    write_diagram(&mut xml, layout, theme);

    xml.close("definitions");
    xml.finish()
}

fn write_process(xml: &mut XmlWriter, layout: &Layout) {
    xml.open("process", &[("id", PROCESS_ID), ("isExecutable", "false")]);
    if !layout.goal.trim().is_empty() {
        xml.text("documentation", &[], &layout.goal);
    }

    xml.open("laneSet", &[("id", LANE_SET_ID)]);
    for lane in &layout.lanes {
        let attrs = [("id", lane.id.as_str()), ("name", lane.name.as_str())];
        if lane.nodes.is_empty() {
            xml.empty("lane", &attrs);
            continue;
        }
        xml.open("lane", &attrs);
        for node in &lane.nodes {
            xml.text("flowNodeRef", &[], node);
        }
        xml.close("lane");
    }
    xml.close("laneSet");

    for node in &layout.nodes {
        let element = node.kind.element_name();
        let mut attrs: Vec<(&str, &str)> =
            vec![("id", node.id.as_str()), ("name", node.label.as_str())];
        if node.kind.is_gateway() {
            let direction = if layout.outgoing(&node.id).count() > 1 {
                "Diverging"
            } else {
                "Converging"
            };
            attrs.push(("gatewayDirection", direction));
        }
        let incoming: Vec<&str> = layout.incoming(&node.id).map(|e| e.id.as_str()).collect();
        let outgoing: Vec<&str> = layout.outgoing(&node.id).map(|e| e.id.as_str()).collect();
        if incoming.is_empty() && outgoing.is_empty() {
            xml.empty(element, &attrs);
            continue;
        }
        xml.open(element, &attrs);
        for id in incoming {
            xml.text("incoming", &[], id);
        }
        for id in outgoing {
            xml.text("outgoing", &[], id);
        }
        xml.close(element);
    }

    for edge in &layout.edges {
        let mut attrs: Vec<(&str, &str)> = vec![
            ("id", edge.id.as_str()),
            ("sourceRef", edge.from.as_str()),
            ("targetRef", edge.to.as_str()),
        ];
        if let Some(label) = edge.label.as_deref() {
            attrs.push(("name", label));
        }
        xml.empty("sequenceFlow", &attrs);
    }
    xml.close("process");
}

fn write_diagram(xml: &mut XmlWriter, layout: &Layout, theme: &Theme) {
    xml.open("bpmndi:BPMNDiagram", &[("id", DIAGRAM_ID)]);
    xml.open(
        "bpmndi:BPMNPlane",
        &[("id", PLANE_ID), ("bpmnElement", COLLABORATION_ID)],
    );

    let pool_gui = format!("{PARTICIPANT_ID}_gui");
    xml.open(
        "bpmndi:BPMNShape",
        &[
            ("id", pool_gui.as_str()),
            ("bpmnElement", PARTICIPANT_ID),
            ("isHorizontal", "true"),
        ],
    );
    xml.bounds(&layout.pool);
    xml.close("bpmndi:BPMNShape");

    for lane in &layout.lanes {
        let gui = format!("{}_gui", lane.id);
        xml.open(
            "bpmndi:BPMNShape",
            &[
                ("id", gui.as_str()),
                ("bpmnElement", lane.id.as_str()),
                ("isHorizontal", "true"),
            ],
        );
        xml.bounds(&lane.bounds);
        xml.close("bpmndi:BPMNShape");
    }

    for node in &layout.nodes {
        let gui = format!("{}_gui", node.id);
        xml.open(
            "bpmndi:BPMNShape",
            &[("id", gui.as_str()), ("bpmnElement", node.id.as_str())],
        );
        xml.bounds(&node.bounds);
        if !node.label.is_empty() {
            xml.empty("bpmndi:BPMNLabel", &[("labelStyle", LABEL_STYLE_ID)]);
        }
        xml.close("bpmndi:BPMNShape");
    }

    for edge in &layout.edges {
        let gui = format!("{}_gui", edge.id);
        xml.open(
            "bpmndi:BPMNEdge",
            &[("id", gui.as_str()), ("bpmnElement", edge.id.as_str())],
        );
        for &(x, y) in &edge.points {
            let (x, y) = (px(x), px(y));
            xml.empty("omgdi:waypoint", &[("x", x.as_str()), ("y", y.as_str())]);
        }
        if let Some(bounds) = &edge.label_bounds {
            xml.open("bpmndi:BPMNLabel", &[("labelStyle", LABEL_STYLE_ID)]);
            xml.bounds(bounds);
            xml.close("bpmndi:BPMNLabel");
        }
        xml.close("bpmndi:BPMNEdge");
    }

    xml.close("bpmndi:BPMNPlane");

    xml.open("bpmndi:BPMNLabelStyle", &[("id", LABEL_STYLE_ID)]);
    let size = format!("{:.1}", theme.font_size);
    xml.empty(
        "omgdc:Font",
        &[("name", theme.font_family.as_str()), ("size", size.as_str())],
    );
    xml.close("bpmndi:BPMNLabelStyle");
    xml.close("bpmndi:BPMNDiagram");
}

/// Minimal indenting writer; every element sits on its own line.
struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            depth: 0,
        }
    }

    fn declaration(&mut self) {
        self.out
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }

    fn start_tag(&mut self, name: &str, attrs: &[(&str, &str)]) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out
                .push_str(&format!(" {key}=\"{}\"", escape_xml(value)));
        }
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start_tag(name, attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start_tag(name, attrs);
        self.out.push_str("/>\n");
    }

    fn text(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) {
        self.start_tag(name, attrs);
        self.out
            .push_str(&format!(">{}</{name}>\n", escape_xml(text)));
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(&format!("</{name}>\n"));
    }

    fn bounds(&mut self, bounds: &Bounds) {
        let (x, y) = (px(bounds.x), px(bounds.y));
        let (width, height) = (px(bounds.width), px(bounds.height));
        self.empty(
            "omgdc:Bounds",
            &[
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("width", width.as_str()),
                ("height", height.as_str()),
            ],
        );
    }

    fn finish(self) -> String {
        self.out
    }
}

fn px(value: f32) -> String {
    format!("{}", value.round() as i64)
}

pub fn write_output(xml: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, xml)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            print!("{}", xml);
        }
    }
    Ok(())
}

/// Escapes markup characters and drops characters XML 1.0 does not allow.
fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            _ => out.push(ch),
        }
    }
    out
}

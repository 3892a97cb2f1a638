use bpmn_layout::{RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BpmnRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    horizontal_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
}

fn build_render_options(options: BpmnRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("camunda") {
        RenderOptions::camunda()
    } else {
        RenderOptions::signavio()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(spacing) = options.horizontal_spacing {
        render_options.layout.horizontal_spacing = spacing.max(0.0);
    }
    if let Some(spacing) = options.vertical_spacing {
        render_options.layout.vertical_spacing = spacing.max(0.0);
    }

    render_options
}

#[wasm_bindgen]
pub fn render_bpmn_xml(graph_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<BpmnRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        BpmnRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(graph_json, render_options)
        .map_err(|error| JsValue::from_str(&format!("{error:#}")))
}

#[cfg(test)]
mod tests {
    use bpmn_layout::render_with_options;

    use crate::{BpmnRenderOptions, build_render_options};

    #[test]
    fn renders_gateway_branches_across_lanes() {
        let graph = r#"{
            "name": "Leave request",
            "lanes": ["Employee", "Manager"],
            "nodes": [
                {"id": "ask", "type": "startEvent", "lane": "Employee", "outgoing": ["decide"]},
                {"id": "decide", "type": "exclusiveGateway", "lane": "Manager", "label": "Approve?",
                 "outgoing": [{"target": "yes", "label": "yes"}, {"target": "no", "label": "no"}]},
                {"id": "yes", "type": "endEvent", "lane": "Manager"},
                {"id": "no", "type": "endEvent", "lane": "Employee"}
            ]
        }"#;

        let xml = render_with_options(graph, build_render_options(BpmnRenderOptions::default()))
            .expect("leave request should render");

        assert!(xml.contains("<exclusiveGateway id=\"decide\""));
        assert!(xml.contains("name=\"yes\""));
        assert!(xml.contains("name=\"no\""));
    }

    #[test]
    fn camunda_theme_changes_font_size() {
        let options = build_render_options(BpmnRenderOptions {
            theme: Some("camunda".to_string()),
            ..BpmnRenderOptions::default()
        });
        assert_eq!(options.theme.font_size, 11.0);
    }
}

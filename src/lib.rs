#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::LayoutConfig;
pub use ir::{Flow, Node, NodeKind, ProcessGraph};
pub use layout::{Layout, LayoutError, compute_layout, normalize};
pub use parser::parse_process;
pub use render::render_bpmn;
pub use theme::Theme;

/// Theme and geometry for one rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl RenderOptions {
    pub fn signavio() -> Self {
        Self {
            theme: Theme::signavio(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn camunda() -> Self {
        Self {
            theme: Theme::camunda(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Lays out `graph` and serializes it as BPMN 2.0 XML.
pub fn render_process(graph: &ProcessGraph, options: &RenderOptions) -> Result<String, LayoutError> {
    let layout = compute_layout(graph, &options.layout)?;
    Ok(render_bpmn(&layout, &options.theme))
}

/// Parses a JSON process graph and renders it in one step.
pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let graph = parse_process(input)?;
    Ok(render_process(&graph, &options)?)
}

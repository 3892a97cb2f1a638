use crate::ir::ShapeClass;
use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry constants for the swimlane layout, in diagram pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub task_width: f32,
    pub task_height: f32,
    pub gateway_size: f32,
    pub event_size: f32,
    pub horizontal_spacing: f32,
    pub vertical_spacing: f32,
    pub lane_padding_top: f32,
    pub lane_padding_bottom: f32,
    pub lane_header_width: f32,
    pub lane_content_padding_x: f32,
    pub pool_padding_x: f32,
    pub pool_padding_y: f32,
    pub routing_margin: f32,
    pub label_char_width: f32,
    pub label_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            task_width: 100.0,
            task_height: 80.0,
            gateway_size: 40.0,
            event_size: 30.0,
            horizontal_spacing: 150.0,
            vertical_spacing: 80.0,
            lane_padding_top: 60.0,
            lane_padding_bottom: 60.0,
            lane_header_width: 30.0,
            lane_content_padding_x: 60.0,
            pool_padding_x: 40.0,
            pool_padding_y: 40.0,
            routing_margin: 30.0,
            label_char_width: 7.0,
            label_height: 14.0,
        }
    }
}

impl LayoutConfig {
    pub fn node_size(&self, shape: ShapeClass) -> (f32, f32) {
        match shape {
            ShapeClass::Task => (self.task_width, self.task_height),
            ShapeClass::Gateway => (self.gateway_size, self.gateway_size),
            ShapeClass::Event => (self.event_size, self.event_size),
        }
    }

    /// Horizontal distance between two rank columns.
    pub fn column_pitch(&self) -> f32 {
        self.task_width + self.horizontal_spacing
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::signavio(),
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    task_width: Option<f32>,
    task_height: Option<f32>,
    gateway_size: Option<f32>,
    event_size: Option<f32>,
    horizontal_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
    lane_padding_top: Option<f32>,
    lane_padding_bottom: Option<f32>,
    lane_header_width: Option<f32>,
    lane_content_padding_x: Option<f32>,
    pool_padding_x: Option<f32>,
    pool_padding_y: Option<f32>,
    routing_margin: Option<f32>,
    label_char_width: Option<f32>,
    label_height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
}

/// Loads a JSON5 config file on top of the defaults. `None` yields the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config file {}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = match theme_name {
            "signavio" | "default" => Theme::signavio(),
            "camunda" => Theme::camunda(),
            other => anyhow::bail!("unknown theme `{other}`"),
        };
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
    }

    if let Some(layout) = parsed.layout {
        apply_layout_overrides(&mut config.layout, layout);
    }

    Ok(config)
}

fn apply_layout_overrides(config: &mut LayoutConfig, file: LayoutConfigFile) {
    let fields = [
        (file.task_width, &mut config.task_width),
        (file.task_height, &mut config.task_height),
        (file.gateway_size, &mut config.gateway_size),
        (file.event_size, &mut config.event_size),
        (file.horizontal_spacing, &mut config.horizontal_spacing),
        (file.vertical_spacing, &mut config.vertical_spacing),
        (file.lane_padding_top, &mut config.lane_padding_top),
        (file.lane_padding_bottom, &mut config.lane_padding_bottom),
        (file.lane_header_width, &mut config.lane_header_width),
        (file.lane_content_padding_x, &mut config.lane_content_padding_x),
        (file.pool_padding_x, &mut config.pool_padding_x),
        (file.pool_padding_y, &mut config.pool_padding_y),
        (file.routing_margin, &mut config.routing_margin),
        (file.label_char_width, &mut config.label_char_width),
        (file.label_height, &mut config.label_height),
    ];
    for (value, slot) in fields {
        if let Some(value) = value {
            *slot = value.max(0.0);
        }
    }
}

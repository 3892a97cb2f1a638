use serde::{Deserialize, Serialize};

/// Label styling written into the diagram interchange section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
}

impl Theme {
    pub fn signavio() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 12.0,
        }
    }

    pub fn camunda() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 11.0,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::signavio()
    }
}

use crate::config::LayoutConfig;

use super::types::Bounds;

// Offsets from the anchoring point, in diagram pixels.
const BEND_OFFSET_X: f32 = 8.0;
const BEND_OFFSET_Y: f32 = 15.0;
const SEGMENT_OFFSET_Y: f32 = 20.0;
const START_OFFSET_X: f32 = 5.0;
const START_OFFSET_Y: f32 = 25.0;

/// Bounds for an edge's condition label.
///
/// Labels on gateway branches sit next to the first bend, beside a vertical
/// first segment or above a horizontal one. Other labels sit above the start
/// of the route. Size is proportional to the character count.
pub(crate) fn edge_label_bounds(
    points: &[(f32, f32)],
    label: &str,
    from_gateway: bool,
    config: &LayoutConfig,
) -> Bounds {
    let width = label.chars().count() as f32 * config.label_char_width;
    let height = config.label_height;
    let (x, y) = label_anchor(points, from_gateway);
    Bounds::new(x, y, width, height)
}

fn label_anchor(points: &[(f32, f32)], from_gateway: bool) -> (f32, f32) {
    let Some(&start) = points.first() else {
        return (0.0, 0.0);
    };
    let Some(&bend) = points.get(1) else {
        return start;
    };
    if !from_gateway {
        return (start.0 + START_OFFSET_X, start.1 - START_OFFSET_Y);
    }
    if (start.0 - bend.0).abs() <= f32::EPSILON {
        let y = if start.1 < bend.1 {
            bend.1 + BEND_OFFSET_Y
        } else {
            bend.1 - BEND_OFFSET_Y
        };
        (bend.0 + BEND_OFFSET_X, y)
    } else {
        (start.0 + (bend.0 - start.0) / 2.0, bend.1 - SEGMENT_OFFSET_Y)
    }
}

// src/overlay.rs
//
// Layout for the bounding-box overlay. Pure geometry: the drawing layer
// consumes these shapes, nothing here touches a canvas.

use crate::types::Detection;

pub const CORNER_RADIUS: f32 = 10.0;
pub const STROKE_WIDTH: f32 = 8.0;
pub const LABEL_TEXT_HEIGHT: f32 = 24.0;

/// One rendered detection: rounded box plus a label anchored to it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    /// Label text origin. Above the box when there is room, inside it when
    /// the box touches the top of the frame.
    pub label_x: f32,
    pub label_y: f32,
}

/// Label text: distance readout when the server estimated one, otherwise
/// the detection confidence.
pub fn label_text(det: &Detection) -> String {
    match det.distance {
        Some(d) => format!("{} {:.2} m", det.name, d),
        None => format!("{} {:.1}%", det.name, det.confidence * 100.0),
    }
}

pub fn layout(det: &Detection) -> OverlayBox {
    let has_headroom = det.ymin > LABEL_TEXT_HEIGHT + 10.0;
    let label_y = if has_headroom {
        det.ymin - LABEL_TEXT_HEIGHT + 5.0
    } else {
        det.ymin + 10.0
    };

    OverlayBox {
        x: det.xmin,
        y: det.ymin,
        width: det.xmax - det.xmin,
        height: det.ymax - det.ymin,
        label: label_text(det),
        label_x: det.xmin + 10.0,
        label_y,
    }
}

pub fn layout_batch(detections: &[Detection]) -> Vec<OverlayBox> {
    detections.iter().map(layout).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(ymin: f32, distance: Option<f32>) -> Detection {
        Detection {
            name: "speed50km".to_string(),
            xmin: 100.0,
            ymin,
            xmax: 220.0,
            ymax: ymin + 120.0,
            confidence: 0.876,
            distance,
        }
    }

    #[test]
    fn test_label_prefers_distance_over_confidence() {
        assert_eq!(label_text(&det(50.0, Some(12.345))), "speed50km 12.35 m");
        assert_eq!(label_text(&det(50.0, None)), "speed50km 87.6%");
    }

    #[test]
    fn test_label_sits_above_box_when_there_is_room() {
        let shape = layout(&det(100.0, None));
        assert_eq!(shape.label_y, 100.0 - LABEL_TEXT_HEIGHT + 5.0);
        assert_eq!(shape.label_x, 110.0);
    }

    #[test]
    fn test_label_moves_inside_box_near_frame_top() {
        let shape = layout(&det(20.0, None));
        assert_eq!(shape.label_y, 30.0);
    }

    #[test]
    fn test_box_dimensions_follow_detection() {
        let shape = layout(&det(50.0, None));
        assert_eq!(shape.width, 120.0);
        assert_eq!(shape.height, 120.0);
    }
}

//! Figure boxes from 2D pose keypoints.

use crate::geometry::BBox;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Keypoints of one detected person in pixel space. `(0, 0)` marks a
/// keypoint the detector did not find.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Person {
    pub keypoints: Vec<[f64; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseBoxParams {
    /// Boxes narrower or shorter than this are dropped.
    pub min_box_size: i32,
}

impl Default for PoseBoxParams {
    fn default() -> Self {
        Self { min_box_size: 30 }
    }
}

fn is_missing(p: &[f64; 2]) -> bool {
    p[0] == 0.0 && p[1] == 0.0
}

/// Bounding box of the detected keypoints of `person`.
pub fn person_box(person: &Person) -> Option<BBox> {
    let mut pts = person
        .keypoints
        .iter()
        .filter(|p| !is_missing(p) && p[0].is_finite() && p[1].is_finite());
    let first = pts.next()?;
    let (mut x1, mut y1, mut x2, mut y2) = (first[0], first[1], first[0], first[1]);
    for p in pts {
        x1 = x1.min(p[0]);
        y1 = y1.min(p[1]);
        x2 = x2.max(p[0]);
        y2 = y2.max(p[1]);
    }
    Some(BBox::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32))
}

/// Box used when no figure survives cleaning: the centre-left region of
/// the canvas.
pub fn fallback_box(canvas_width: i32, canvas_height: i32) -> BBox {
    BBox::new(
        canvas_width / 3,
        canvas_height / 3,
        canvas_width / 2,
        canvas_height / 2,
    )
}

/// Cleaned figure boxes in detection order, never empty.
pub fn figure_boxes(
    people: &[Person],
    canvas_width: i32,
    canvas_height: i32,
    params: &PoseBoxParams,
) -> Vec<BBox> {
    let boxes: Vec<BBox> = people
        .iter()
        .filter_map(person_box)
        .filter(|b| {
            !b.is_degenerate()
                && b.width() >= params.min_box_size
                && b.height() >= params.min_box_size
        })
        .collect();
    if boxes.is_empty() {
        let fb = fallback_box(canvas_width, canvas_height);
        warn!(
            "figure_boxes: no usable figure among {} detections, using fallback {:?}",
            people.len(),
            <[i32; 4]>::from(fb)
        );
        return vec![fb];
    }
    debug!("figure_boxes: kept {}/{} detections", boxes.len(), people.len());
    boxes
}

use crate::geometry::BBox;
use serde::Serialize;
use std::f64::consts::SQRT_2;

/// Elliptic speech balloon with a triangular tail.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpeechBalloon {
    pub center: [f64; 2],
    /// Semi-axes `(a, b)` along x and y.
    pub semi_axes: [f64; 2],
    /// Two base corners followed by the apex.
    pub tail: [[f64; 2]; 3],
}

const MIN_SEMI_AXIS: f64 = 1e-9;

/// Balloon circumscribing `text_box` with its tail pointing at `target`.
///
/// The ellipse passes through the box corners (semi-axes `w/2 * sqrt(2)`
/// and `h/2 * sqrt(2)`). The tail base is centred on the ellipse point at
/// parametric angle `atan2((ty - cy) / b, (tx - cx) / a)`, spans
/// `base_width` along the tangent and is pulled `inset` pixels toward the
/// centre so it overlaps the outline.
pub fn speech_balloon(
    text_box: &BBox,
    target: [f64; 2],
    base_width: f64,
    inset: f64,
) -> SpeechBalloon {
    let [cx, cy] = text_box.center();
    let a = (text_box.width() as f64 / 2.0 * SQRT_2).max(MIN_SEMI_AXIS);
    let b = (text_box.height() as f64 / 2.0 * SQRT_2).max(MIN_SEMI_AXIS);
    let [tx, ty] = target;

    let theta = ((ty - cy) / b).atan2((tx - cx) / a);
    let (sin, cos) = theta.sin_cos();
    let base = [cx + a * cos, cy + b * sin];

    let tangent = unit([-a * sin, b * cos]);
    let radial = unit([base[0] - cx, base[1] - cy]);
    let half = base_width / 2.0;
    let corner = |side: f64| {
        [
            base[0] + side * tangent[0] * half - radial[0] * inset,
            base[1] + side * tangent[1] * half - radial[1] * inset,
        ]
    };

    SpeechBalloon {
        center: [cx, cy],
        semi_axes: [a, b],
        tail: [corner(1.0), corner(-1.0), target],
    }
}

fn unit(v: [f64; 2]) -> [f64; 2] {
    let n = v[0].hypot(v[1]);
    if n > 0.0 {
        [v[0] / n, v[1] / n]
    } else {
        [0.0, 0.0]
    }
}

//! Geometry primitives shared by the matcher and the page engine.
//!
//! - [`BBox`]: integer pixel box `(x1, y1, x2, y2)` used by layout elements.
//! - [`Rect`]: floating-point `(x, y, w, h)` region produced by the page sampler.
//! - [`Polygon`]: vertex list produced by the panel optimiser.
//!
//! Scaling a [`BBox`] truncates toward zero. Repeated scaling therefore
//! drifts: each pass can lose up to one pixel per coordinate, and a
//! down-then-up round trip by `f < 1` can lose up to `ceil(1/f)` pixels.
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-12;

/// Axis-aligned bounding box in pixel space.
///
/// Serialised as `[x1, y1, x2, y2]`. A box is valid when `x1 < x2` and
/// `y1 < y2`; degenerate boxes are representable but report zero
/// [`BBox::valid_area`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl From<[i32; 4]> for BBox {
    fn from(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BBox {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Raw signed area `(x2-x1)*(y2-y1)`. Negative or zero for degenerate boxes.
    pub fn area(&self) -> f64 {
        self.width() as f64 * self.height() as f64
    }

    /// Area clamped to zero for degenerate boxes.
    pub fn valid_area(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            self.area()
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.x1 as f64 + self.x2 as f64) * 0.5,
            (self.y1 as f64 + self.y2 as f64) * 0.5,
        ]
    }

    /// Uniform scale with truncation toward zero.
    pub fn scaled(&self, factor: f64) -> Self {
        self.scaled_xy(factor, factor)
    }

    /// Per-axis scale with truncation toward zero.
    pub fn scaled_xy(&self, sx: f64, sy: f64) -> Self {
        Self {
            x1: (self.x1 as f64 * sx) as i32,
            y1: (self.y1 as f64 * sy) as i32,
            x2: (self.x2 as f64 * sx) as i32,
            y2: (self.y2 as f64 * sy) as i32,
        }
    }

    /// Grow (or shrink, for negative `d`) every side by `d` pixels.
    pub fn inflated(&self, d: i32) -> Self {
        Self::new(self.x1 - d, self.y1 - d, self.x2 + d, self.y2 + d)
    }

    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0);
        w as f64 * h as f64
    }

    /// Intersection-over-union. Zero when the union is empty.
    pub fn iou(&self, other: &BBox) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.valid_area() + other.valid_area() - inter;
        if union <= EPS {
            0.0
        } else {
            inter / union
        }
    }
}

/// Floating-point rectangle `(x, y, w, h)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// `w / h`, or 1.0 when the height collapses.
    pub fn aspect(&self) -> f64 {
        if self.h > 0.0 {
            self.w / self.h
        } else {
            1.0
        }
    }

    /// Truncated `[x, y, w, h]`.
    pub fn to_xywh_i32(&self) -> [i32; 4] {
        [self.x as i32, self.y as i32, self.w as i32, self.h as i32]
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon(vec![
            [self.x, self.y],
            [self.x + self.w, self.y],
            [self.x + self.w, self.y + self.h],
            [self.x, self.y + self.h],
        ])
    }
}

/// Closed polygon as an ordered vertex list (implicit closing edge).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(pub Vec<[f64; 2]>);

impl Polygon {
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shoelace area (unsigned). Zero for fewer than three vertices.
    pub fn area(&self) -> f64 {
        let n = self.0.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0f64;
        for i in 0..n {
            let [x0, y0] = self.0[(i + n - 1) % n];
            let [x1, y1] = self.0[i];
            twice += x0 * y1 - x1 * y0;
        }
        0.5 * twice.abs()
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.0.first()?;
        let mut b = (first[0], first[1], first[0], first[1]);
        for &[x, y] in &self.0[1..] {
            b.0 = b.0.min(x);
            b.1 = b.1.min(y);
            b.2 = b.2.max(x);
            b.3 = b.3.max(y);
        }
        Some(b)
    }

    /// Mean of the vertices.
    pub fn vertex_centroid(&self) -> Option<[f64; 2]> {
        if self.0.is_empty() {
            return None;
        }
        let n = self.0.len() as f64;
        let (sx, sy) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
        Some([sx / n, sy / n])
    }

    /// Split by the line through `origin` with normal `normal`.
    ///
    /// Returns `(negative, positive)`: vertices with signed distance `< 0`
    /// go to the first polygon, `>= 0` to the second. Every edge that crosses
    /// the line contributes its interpolated intersection to both outputs.
    pub fn clip_by_line(&self, normal: [f64; 2], origin: [f64; 2]) -> (Polygon, Polygon) {
        let n = self.0.len();
        let mut negative = Vec::with_capacity(n + 2);
        let mut positive = Vec::with_capacity(n + 2);
        let dist = |p: &[f64; 2]| normal[0] * (p[0] - origin[0]) + normal[1] * (p[1] - origin[1]);
        for i in 0..n {
            let curr = self.0[i];
            let prev = self.0[(i + n - 1) % n];
            let d_curr = dist(&curr);
            let d_prev = dist(&prev);
            let crosses = (d_curr >= 0.0) != (d_prev >= 0.0);
            if crosses {
                let t = d_prev / (d_prev - d_curr);
                let ix = [
                    prev[0] + t * (curr[0] - prev[0]),
                    prev[1] + t * (curr[1] - prev[1]),
                ];
                positive.push(ix);
                negative.push(ix);
            }
            if d_curr >= 0.0 {
                positive.push(curr);
            } else {
                negative.push(curr);
            }
        }
        (Polygon(negative), Polygon(positive))
    }

    /// Move every vertex toward the vertex centroid so the bounding box loses
    /// roughly `gutter` pixels per side.
    ///
    /// The scale is `min((w - 2g)/w, (h - 2g)/h)`. The polygon is returned
    /// unchanged when `gutter <= 0` or when either bounding dimension is not
    /// larger than `2 * gutter`.
    pub fn shrunk(&self, gutter: f64) -> Polygon {
        if gutter <= 0.0 {
            return self.clone();
        }
        let (Some((min_x, min_y, max_x, max_y)), Some([cx, cy])) =
            (self.bounds(), self.vertex_centroid())
        else {
            return self.clone();
        };
        let w = max_x - min_x;
        let h = max_y - min_y;
        if w <= 2.0 * gutter || h <= 2.0 * gutter {
            return self.clone();
        }
        let scale = ((w - 2.0 * gutter) / w).min((h - 2.0 * gutter) / h);
        Polygon(
            self.0
                .iter()
                .map(|&[x, y]| [cx + (x - cx) * scale, cy + (y - cy) * scale])
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = BBox::new(0, 0, 100, 100);
        assert_eq!(a.iou(&a), 1.0);
        let b = BBox::new(200, 200, 300, 300);
        assert_eq!(a.iou(&b), 0.0);
        let c = BBox::new(50, 0, 150, 100);
        assert!((a.iou(&c) - 5000.0 / 15000.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_box_has_zero_valid_area() {
        let d = BBox::new(10, 10, 5, 20);
        assert!(d.is_degenerate());
        assert!(d.area() < 0.0);
        assert_eq!(d.valid_area(), 0.0);
        assert_eq!(d.iou(&d), 0.0);
    }

    #[test]
    fn scale_round_trip_stays_within_one_pixel() {
        let b = BBox::new(13, 27, 311, 499);
        let f = 1.7;
        let back = b.scaled(f).scaled(1.0 / f);
        for (orig, got) in <[i32; 4]>::from(b).iter().zip(<[i32; 4]>::from(back).iter()) {
            assert!((orig - got).abs() <= 1, "orig={orig} got={got}");
        }
    }

    #[test]
    fn bbox_serialises_as_array() {
        let b = BBox::new(1, 2, 3, 4);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[1,2,3,4]");
        let back: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn clip_square_through_middle() {
        let sq = Rect::new(0.0, 0.0, 10.0, 10.0).to_polygon();
        let (top, bottom) = sq.clip_by_line([0.0, 1.0], [5.0, 4.0]);
        assert!((top.area() - 40.0).abs() < 1e-9);
        assert!((bottom.area() - 60.0).abs() < 1e-9);
        assert!((top.area() + bottom.area() - sq.area()).abs() < 1e-9);
    }

    #[test]
    fn clip_missing_polygon_leaves_one_side_empty() {
        let sq = Rect::new(0.0, 0.0, 10.0, 10.0).to_polygon();
        let (neg, pos) = sq.clip_by_line([1.0, 0.0], [-5.0, 0.0]);
        assert!(neg.is_empty());
        assert_eq!(pos.len(), 4);
    }

    #[test]
    fn shrink_with_zero_gutter_is_identity() {
        let sq = Rect::new(3.0, 4.0, 50.0, 20.0).to_polygon();
        assert_eq!(sq.shrunk(0.0), sq);
    }

    #[test]
    fn shrink_skips_small_polygons() {
        let sq = Rect::new(0.0, 0.0, 30.0, 30.0).to_polygon();
        assert_eq!(sq.shrunk(20.0), sq);
    }

    #[test]
    fn shrink_uses_smaller_axis_scale() {
        let sq = Rect::new(0.0, 0.0, 100.0, 50.0).to_polygon();
        let s = sq.shrunk(5.0);
        let (min_x, min_y, max_x, max_y) = s.bounds().unwrap();
        // scale = min(90/100, 40/50) = 0.8
        assert!((max_x - min_x - 80.0).abs() < 1e-9);
        assert!((max_y - min_y - 40.0).abs() < 1e-9);
        assert!(min_x > 0.0 && min_y > 0.0 && max_x < 100.0 && max_y < 50.0);
    }
}

//! Layout similarity via weighted bipartite matching.
//!
//! # Algorithm Outline
//! 1. Gate on canvas aspect ratio; mismatches score zero without building
//!    any matrix.
//! 2. Rescale a copy of the reference so its width equals the query width.
//! 3. Build the `m x n` IoU matrix and, optionally, an area-similarity matrix.
//! 4. Mask pairs of different element types to zero and blend IoU with area
//!    similarity.
//! 5. Solve the maximum-weight assignment and keep only strictly positive
//!    pairs.

pub mod assignment;
pub mod ranking;

use crate::layout::{Element, Layout};
use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub use assignment::max_weight_assignment;
pub use ranking::{find_similar_layouts, rank_references, RankedReference, ScoredReference};

/// Formula used to compare element areas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMethod {
    /// `min(a1, a2) / max(a1, a2)`
    #[default]
    Ratio,
    /// `exp(-|ln(a1 / a2)|)`
    Log,
    /// Product of `ratio` and `log`.
    Hybrid,
}

impl AreaMethod {
    /// Similarity in `(0, 1]` for positive areas, zero otherwise.
    pub fn similarity(self, a1: f64, a2: f64) -> f64 {
        if !(a1 > 0.0 && a2 > 0.0) || !a1.is_finite() || !a2.is_finite() {
            return 0.0;
        }
        let ratio = || a1.min(a2) / a1.max(a2);
        let log = || (-(a1 / a2).ln().abs()).exp();
        match self {
            AreaMethod::Ratio => ratio(),
            AreaMethod::Log => log(),
            AreaMethod::Hybrid => ratio() * log(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Maximum allowed `|ar_query - ar_reference|`.
    pub aspect_ratio_threshold: f64,
    pub use_area: bool,
    /// Blend factor `alpha` in `(1 - alpha) * IoU + alpha * area_sim`.
    pub area_weight: f64,
    pub area_method: AreaMethod,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            aspect_ratio_threshold: 0.20,
            use_area: true,
            area_weight: 0.1,
            area_method: AreaMethod::Ratio,
        }
    }
}

/// Similarity score and the surviving `(query_index, reference_index)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Similarity {
    pub score: f64,
    pub matching: Vec<(usize, usize)>,
}

impl Similarity {
    fn zero() -> Self {
        Self::default()
    }
}

pub fn iou_matrix(query: &[Element], reference: &[Element]) -> DMatrix<f64> {
    DMatrix::from_fn(query.len(), reference.len(), |i, j| {
        query[i].bbox.iou(&reference[j].bbox)
    })
}

pub fn area_similarity_matrix(
    query: &[Element],
    reference: &[Element],
    method: AreaMethod,
) -> DMatrix<f64> {
    DMatrix::from_fn(query.len(), reference.len(), |i, j| {
        method.similarity(query[i].bbox.area(), reference[j].bbox.area())
    })
}

/// Type-masked blend of IoU and area similarity.
///
/// Entry `(i, j)` is exactly zero whenever the element types differ. The
/// area term only participates when `area` is given and `area_weight > 0`.
pub fn weight_matrix(
    query: &[Element],
    reference: &[Element],
    iou: &DMatrix<f64>,
    area: Option<&DMatrix<f64>>,
    area_weight: f64,
) -> DMatrix<f64> {
    DMatrix::from_fn(query.len(), reference.len(), |i, j| {
        if query[i].element_type != reference[j].element_type {
            return 0.0;
        }
        let w = match area {
            Some(a) if area_weight > 0.0 => {
                (1.0 - area_weight) * iou[(i, j)] + area_weight * a[(i, j)]
            }
            _ => iou[(i, j)],
        };
        if w.is_finite() {
            w
        } else {
            0.0
        }
    })
}

/// Total matched weight and its positive-weight pairs.
pub fn solve_bipartite_matching(weights: &DMatrix<f64>) -> Similarity {
    let mut score = 0.0f64;
    let mut matching = Vec::new();
    for (i, j) in max_weight_assignment(weights) {
        let w = weights[(i, j)];
        if w > 0.0 {
            score += w;
            matching.push((i, j));
        }
    }
    Similarity { score, matching }
}

/// Similarity of `reference` to `query`; `reference` is never modified.
pub fn similarity(query: &Layout, reference: &Layout, params: &MatchParams) -> Similarity {
    let (Some(ar_q), Some(ar_r)) = (query.aspect_ratio(), reference.aspect_ratio()) else {
        debug!("similarity: collapsed canvas, score 0");
        return Similarity::zero();
    };
    if (ar_q - ar_r).abs() > params.aspect_ratio_threshold {
        debug!("similarity: aspect ratio mismatch {ar_q:.3} vs {ar_r:.3}");
        return Similarity::zero();
    }

    let scale_factor = query.width as f64 / reference.width as f64;
    let scaled = reference.scaled(scale_factor);

    if query.is_empty() || scaled.is_empty() {
        return Similarity::zero();
    }

    let iou = iou_matrix(&query.elements, &scaled.elements);
    let area = params
        .use_area
        .then(|| area_similarity_matrix(&query.elements, &scaled.elements, params.area_method));
    let area_weight = if params.use_area {
        params.area_weight
    } else {
        0.0
    };
    let weights = weight_matrix(
        &query.elements,
        &scaled.elements,
        &iou,
        area.as_ref(),
        area_weight,
    );
    solve_bipartite_matching(&weights)
}

//! Ranking of candidate (image variation, layout) pairs.
//!
//! `final_score = sim_score * 100 + quality_score * 50 - geom_penalty`,
//! where the similarity comes from [`crate::matching`] and the quality and
//! geometric penalty are supplied by the caller.

use serde::{Deserialize, Serialize};

pub const SIMILARITY_WEIGHT: f64 = 100.0;
pub const QUALITY_WEIGHT: f64 = 50.0;

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutOption {
    pub variation: usize,
    /// Rank of the reference layout within its variation.
    pub rank: usize,
    #[serde(default)]
    pub sim_score: f64,
    #[serde(default)]
    pub geom_penalty: f64,
    #[serde(default)]
    pub quality_score: f64,
}

impl LayoutOption {
    /// Combined score; non-finite inputs count as zero.
    pub fn final_score(&self) -> f64 {
        finite_or_zero(self.sim_score) * SIMILARITY_WEIGHT
            + finite_or_zero(self.quality_score) * QUALITY_WEIGHT
            - finite_or_zero(self.geom_penalty)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Winner {
    pub index: usize,
    pub variation: usize,
    pub rank: usize,
    pub score: f64,
}

/// Option with the greatest final score; the first one wins a tie.
pub fn select_winner(options: &[LayoutOption]) -> Option<Winner> {
    let mut best: Option<Winner> = None;
    for (index, opt) in options.iter().enumerate() {
        let score = opt.final_score();
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Winner {
                index,
                variation: opt.variation,
                rank: opt.rank,
                score,
            });
        }
    }
    best
}

//! Monte-Carlo search over binary page partitions.
//!
//! # Algorithm Outline
//! 1. Recursively split the page: the cut orientation is drawn from the
//!    style model's per-depth horizontal probability, the panel group is cut
//!    at a uniform index, and the cut position is the importance share of
//!    the first sub-group plus a small uniform jitter.
//! 2. Score each tree by how closely the leaf area fractions, ranked by
//!    size, follow the style model's importance table, plus a penalty for
//!    elongated leaves.
//! 3. Keep the cheapest tree (`generate_layout`) or the cheapest trees with
//!    distinct signatures (`generate_top_k`).
//!
//! Every call draws from an explicit generator; the convenience entry points
//! derive it from [`SamplerParams::seed`].

use super::style::StyleModel;
use super::tree::{FlatPanel, LayoutTree, NodeId, PanelSpec, SplitKind, TreeBuilder};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::SearchReport;
use crate::error::{LayoutError, Result};
use crate::geometry::Rect;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

const AREA_COST_WEIGHT: f64 = 100.0;
const SOFT_SHAPE_RANGE: (f64, f64) = (0.5, 2.0);
const SOFT_SHAPE_PENALTY: f64 = 50.0;
const HARD_SHAPE_RANGE: (f64, f64) = (0.15, 6.0);
const HARD_SHAPE_PENALTY: f64 = 1000.0;

/// Page reading order; only vertical cuts depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingDirection {
    Ltr,
    #[default]
    Rtl,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    pub page_width: f64,
    pub page_height: f64,
    pub direction: ReadingDirection,
    /// Monte-Carlo trials per call.
    pub iterations: usize,
    /// Half-width of the uniform jitter added to each target ratio.
    pub ratio_jitter: f64,
    pub min_ratio: f64,
    pub max_ratio: f64,
    /// Fixed seed for reproducible searches; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            page_width: 1000.0,
            page_height: 1414.0,
            direction: ReadingDirection::Rtl,
            iterations: 1000,
            ratio_jitter: 0.05,
            min_ratio: 0.2,
            max_ratio: 0.8,
            seed: None,
        }
    }
}

/// One searched tree with its cost and flattened panels.
#[derive(Clone, Debug)]
pub struct LayoutCandidate {
    pub cost: f64,
    pub signature: String,
    pub tree: LayoutTree,
    pub panels: Vec<FlatPanel>,
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

pub struct PageStructureSampler<'a> {
    style: &'a StyleModel,
    params: SamplerParams,
}

impl<'a> PageStructureSampler<'a> {
    pub fn new(style: &'a StyleModel, params: SamplerParams) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(params.page_width) || !valid(params.page_height) {
            return Err(LayoutError::InvalidCanvas {
                width: params.page_width as i64,
                height: params.page_height as i64,
            });
        }
        Ok(Self { style, params })
    }

    pub fn params(&self) -> &SamplerParams {
        &self.params
    }

    fn page_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.params.page_width, self.params.page_height)
    }

    /// One random partition of the page, `None` for an empty panel list.
    pub fn random_tree<R: Rng + ?Sized>(
        &self,
        panels: &[PanelSpec],
        rng: &mut R,
    ) -> Option<LayoutTree> {
        if panels.is_empty() {
            return None;
        }
        let mut builder = TreeBuilder::new();
        let root = self.grow(&mut builder, panels, self.page_rect(), 0, rng);
        Some(builder.finish(root))
    }

    fn grow<R: Rng + ?Sized>(
        &self,
        b: &mut TreeBuilder,
        group: &[PanelSpec],
        rect: Rect,
        depth: usize,
        rng: &mut R,
    ) -> NodeId {
        if group.len() == 1 {
            return b.leaf(group[0].panel_index, rect);
        }

        let split = if rng.random::<f64>() < self.style.prob_horizontal(depth) {
            SplitKind::H
        } else {
            SplitKind::V
        };
        let split_idx = rng.random_range(1..group.len());
        let (grp_a, grp_b) = group.split_at(split_idx);
        let ratio = self.jittered_ratio(grp_a, group, rng);
        let Rect { x, y, w, h } = rect;

        match split {
            SplitKind::H => {
                let rect_a = Rect::new(x, y, w, h * ratio);
                let rect_b = Rect::new(x, y + h * ratio, w, h * (1.0 - ratio));
                let top = self.grow(b, grp_a, rect_a, depth + 1, rng);
                let bottom = self.grow(b, grp_b, rect_b, depth + 1, rng);
                b.split(SplitKind::H, top, bottom, rect)
            }
            SplitKind::V => {
                let w_a = w * ratio;
                let w_b = w * (1.0 - ratio);
                match self.params.direction {
                    ReadingDirection::Rtl => {
                        // earlier panels read first, so they sit on the right
                        let rect_left = Rect::new(x, y, w_b, h);
                        let rect_right = Rect::new(x + w_b, y, w_a, h);
                        let left = self.grow(b, grp_b, rect_left, depth + 1, rng);
                        let right = self.grow(b, grp_a, rect_right, depth + 1, rng);
                        b.split(SplitKind::V, left, right, rect)
                    }
                    ReadingDirection::Ltr => {
                        let rect_left = Rect::new(x, y, w_a, h);
                        let rect_right = Rect::new(x + w_a, y, w_b, h);
                        let left = self.grow(b, grp_a, rect_left, depth + 1, rng);
                        let right = self.grow(b, grp_b, rect_right, depth + 1, rng);
                        b.split(SplitKind::V, left, right, rect)
                    }
                }
            }
        }
    }

    /// Importance share of `first` within `group`, jittered and clamped.
    fn jittered_ratio<R: Rng + ?Sized>(
        &self,
        first: &[PanelSpec],
        group: &[PanelSpec],
        rng: &mut R,
    ) -> f64 {
        let w_a: f64 = first.iter().map(|p| p.importance_score).sum();
        let w_tot: f64 = group.iter().map(|p| p.importance_score).sum();
        let target = if w_tot > 0.0 { w_a / w_tot } else { 0.5 };
        let j = self.params.ratio_jitter;
        let jitter = if j > 0.0 { rng.random_range(-j..=j) } else { 0.0 };
        (target + jitter)
            .max(self.params.min_ratio)
            .min(self.params.max_ratio)
    }

    /// Badness of a tree; lower is better.
    pub fn score_tree(&self, tree: &LayoutTree, num_panels: usize) -> f64 {
        let mut areas: Vec<(f64, f64)> = tree
            .leaves()
            .into_iter()
            .map(|id| {
                let r = tree.node(id).rect();
                (r.area(), r.aspect())
            })
            .collect();
        // stable: equal areas keep leaf order
        areas.sort_by(|a, b| b.0.total_cmp(&a.0));

        let page_area = self.params.page_width * self.params.page_height;
        let mut cost = 0.0;
        if let Some(targets) = self.style.importance_targets(num_panels) {
            for (rank, (area, _)) in areas.iter().enumerate() {
                if let Some(target) = targets.get(&rank.to_string()) {
                    let actual = area / page_area;
                    cost += (actual - target).powi(2) * AREA_COST_WEIGHT;
                }
            }
        }
        for (_, ratio) in &areas {
            cost += shape_penalty(*ratio);
        }
        cost
    }

    fn trial<R: Rng + ?Sized>(
        &self,
        panels: &[PanelSpec],
        rng: &mut R,
    ) -> Option<(f64, LayoutTree)> {
        let tree = self.random_tree(panels, rng)?;
        let cost = self.score_tree(&tree, panels.len());
        Some((cost, tree))
    }

    /// Cheapest tree over the trial budget; the earliest trial wins ties.
    pub fn search_best<R: Rng + ?Sized>(
        &self,
        panels: &[PanelSpec],
        rng: &mut R,
    ) -> (Option<LayoutCandidate>, SearchReport) {
        let start = Instant::now();
        let mut best: Option<(f64, LayoutTree)> = None;
        let mut seen = HashSet::new();
        let mut trials = 0usize;
        if !panels.is_empty() {
            for _ in 0..self.params.iterations {
                let Some((cost, tree)) = self.trial(panels, rng) else {
                    break;
                };
                trials += 1;
                seen.insert(tree.signature());
                let improves = best.as_ref().map_or(true, |(c, _)| cost < *c);
                if improves {
                    best = Some((cost, tree));
                }
            }
        }
        let candidate = best.map(|(cost, tree)| self.candidate(cost, tree, panels));
        let report = SearchReport {
            trials,
            best_cost: candidate.as_ref().map(|c| c.cost),
            unique_signatures: seen.len(),
            elapsed_ms: elapsed_ms(start),
        };
        debug!(
            "PageStructureSampler::search_best panels={} trials={} unique={} best={:?}",
            panels.len(),
            report.trials,
            report.unique_signatures,
            report.best_cost
        );
        (candidate, report)
    }

    /// Cheapest trees with pairwise distinct signatures, cheapest first.
    pub fn search_top_k<R: Rng + ?Sized>(
        &self,
        panels: &[PanelSpec],
        k: usize,
        rng: &mut R,
    ) -> (Vec<LayoutCandidate>, SearchReport) {
        let start = Instant::now();
        let mut trials: Vec<(f64, LayoutTree, String)> = Vec::new();
        if !panels.is_empty() && k > 0 {
            trials.reserve(self.params.iterations);
            for _ in 0..self.params.iterations {
                let Some((cost, tree)) = self.trial(panels, rng) else {
                    break;
                };
                let signature = tree.signature();
                trials.push((cost, tree, signature));
            }
        }
        let trial_count = trials.len();
        trials.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(k);
        for (cost, tree, signature) in trials {
            if !seen.insert(signature.clone()) {
                continue;
            }
            if out.len() < k {
                let panels_flat = tree.flatten(panels);
                out.push(LayoutCandidate {
                    cost,
                    signature,
                    tree,
                    panels: panels_flat,
                });
            }
        }
        let report = SearchReport {
            trials: trial_count,
            best_cost: out.first().map(|c| c.cost),
            unique_signatures: seen.len(),
            elapsed_ms: elapsed_ms(start),
        };
        debug!(
            "PageStructureSampler::search_top_k k={} returned={} unique={}",
            k,
            out.len(),
            report.unique_signatures
        );
        (out, report)
    }

    fn candidate(&self, cost: f64, tree: LayoutTree, panels: &[PanelSpec]) -> LayoutCandidate {
        LayoutCandidate {
            cost,
            signature: tree.signature(),
            panels: tree.flatten(panels),
            tree,
        }
    }

    /// Flattened panels of the best tree, seeded from the parameters.
    pub fn generate_layout(&self, panels: &[PanelSpec]) -> Vec<FlatPanel> {
        self.generate_tree(panels)
            .map(|c| c.panels)
            .unwrap_or_default()
    }

    /// Best tree, seeded from the parameters.
    pub fn generate_tree(&self, panels: &[PanelSpec]) -> Option<LayoutCandidate> {
        let mut rng = rng_from_seed(self.params.seed);
        self.search_best(panels, &mut rng).0
    }

    pub fn generate_top_k(&self, panels: &[PanelSpec], k: usize) -> Vec<LayoutCandidate> {
        let mut rng = rng_from_seed(self.params.seed);
        self.search_top_k(panels, k, &mut rng).0
    }
}

fn shape_penalty(ratio: f64) -> f64 {
    let mut p = 0.0;
    if ratio < SOFT_SHAPE_RANGE.0 || ratio > SOFT_SHAPE_RANGE.1 {
        p += SOFT_SHAPE_PENALTY;
    }
    if ratio < HARD_SHAPE_RANGE.0 || ratio > HARD_SHAPE_RANGE.1 {
        p += HARD_SHAPE_PENALTY;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tree::TreeNode;

    fn style(json: &str) -> StyleModel {
        serde_json::from_str(json).unwrap()
    }

    fn panels(n: usize) -> Vec<PanelSpec> {
        (0..n).map(|i| PanelSpec::new(i, 5.0)).collect()
    }

    fn first_leaf_panel(tree: &LayoutTree) -> Option<usize> {
        tree.leaves()
            .first()
            .and_then(|&id| match tree.node(id) {
                TreeNode::Leaf { panel_index, .. } => Some(*panel_index),
                TreeNode::Split { .. } => None,
            })
    }

    fn seeded(seed: u64) -> SamplerParams {
        SamplerParams {
            seed: Some(seed),
            iterations: 200,
            ..Default::default()
        }
    }

    #[test]
    fn invalid_page_is_rejected() {
        let m = StyleModel::default();
        let params = SamplerParams {
            page_height: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            PageStructureSampler::new(&m, params),
            Err(LayoutError::InvalidCanvas { .. })
        ));
    }

    #[test]
    fn rtl_vertical_split_puts_first_group_on_the_right() {
        let m = style(r#"{"structure": {"depth_0": {"H": 0.0}}}"#);
        let s = PageStructureSampler::new(&m, seeded(1)).unwrap();
        let mut rng = rng_from_seed(Some(1));
        let tree = s.random_tree(&panels(2), &mut rng).unwrap();
        assert_eq!(tree.signature(), "V[L(1)|L(0)]");
        let flat = tree.flatten(&panels(2));
        assert_eq!(flat[0].panel_index, 1);
        assert!(flat[1].bbox[0] > flat[0].bbox[0]);
    }

    #[test]
    fn ltr_vertical_split_keeps_reading_order() {
        let m = style(r#"{"structure": {"depth_0": {"H": 0.0}}}"#);
        let params = SamplerParams {
            direction: ReadingDirection::Ltr,
            ..seeded(1)
        };
        let s = PageStructureSampler::new(&m, params).unwrap();
        let mut rng = rng_from_seed(Some(4));
        let tree = s.random_tree(&panels(2), &mut rng).unwrap();
        assert_eq!(tree.signature(), "V[L(0)|L(1)]");
        assert_eq!(first_leaf_panel(&tree), Some(0));
    }

    #[test]
    fn shape_penalties_stack() {
        assert_eq!(shape_penalty(1.0), 0.0);
        assert_eq!(shape_penalty(2.5), 50.0);
        assert_eq!(shape_penalty(0.1), 1050.0);
        assert_eq!(shape_penalty(7.0), 1050.0);
    }

    #[test]
    fn score_uses_ranked_area_fractions() {
        let m = style(r#"{"importance": {"2": {"0": 0.5, "1": 0.5}}}"#);
        let params = SamplerParams {
            page_width: 100.0,
            page_height: 100.0,
            ..Default::default()
        };
        let s = PageStructureSampler::new(&m, params).unwrap();
        let mut b = TreeBuilder::new();
        let top = b.leaf(0, Rect::new(0.0, 0.0, 100.0, 70.0));
        let bottom = b.leaf(1, Rect::new(0.0, 70.0, 100.0, 30.0));
        let root = b.split(SplitKind::H, top, bottom, Rect::new(0.0, 0.0, 100.0, 100.0));
        let tree = b.finish(root);
        // (0.7-0.5)^2*100 + (0.3-0.5)^2*100 = 8, bottom leaf ratio 3.33 adds 50
        assert!((s.score_tree(&tree, 2) - 58.0).abs() < 1e-9);
    }

    #[test]
    fn empty_panels_produce_nothing() {
        let m = StyleModel::default();
        let s = PageStructureSampler::new(&m, seeded(3)).unwrap();
        assert!(s.generate_layout(&[]).is_empty());
        assert!(s.generate_top_k(&[], 3).is_empty());
        let (best, report) = s.search_best(&[], &mut rng_from_seed(Some(3)));
        assert!(best.is_none());
        assert_eq!(report.trials, 0);
    }

    fn tie_prone() -> SamplerParams {
        SamplerParams {
            page_width: 1000.0,
            page_height: 1000.0,
            iterations: 300,
            ratio_jitter: 0.0,
            ..seeded(3)
        }
    }

    #[test]
    fn earliest_cheapest_trial_wins() {
        let m = style(r#"{"structure": {"depth_0": {"H": 0.5}}}"#);
        let s = PageStructureSampler::new(&m, tie_prone()).unwrap();
        let spec = panels(4);

        let mut replay = rng_from_seed(Some(3));
        let costs: Vec<(f64, String)> = (0..300)
            .map(|_| {
                let tree = s.random_tree(&spec, &mut replay).unwrap();
                (s.score_tree(&tree, spec.len()), tree.signature())
            })
            .collect();
        let min = costs.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let first = costs.iter().position(|c| c.0 == min).unwrap();
        assert!(costs.iter().filter(|c| c.0 == min).count() > 1);

        let (best, report) = s.search_best(&spec, &mut rng_from_seed(Some(3)));
        let best = best.unwrap();
        assert_eq!(report.trials, 300);
        assert_eq!(best.cost, min);
        assert_eq!(best.signature, costs[first].1);
    }

    #[test]
    fn best_and_top_one_agree_under_one_seed() {
        let m = style(r#"{"structure": {"depth_0": {"H": 1.0}}}"#);
        let s = PageStructureSampler::new(&m, tie_prone()).unwrap();
        for n in [2, 3, 5] {
            let spec = panels(n);
            let best = s
                .search_best(&spec, &mut rng_from_seed(Some(3)))
                .0
                .unwrap();
            let top = s.search_top_k(&spec, 1, &mut rng_from_seed(Some(3))).0;
            assert_eq!(top.len(), 1);
            assert_eq!(top[0].cost, best.cost);
            assert_eq!(top[0].signature, best.signature);
            assert_eq!(top[0].panels, best.panels);
        }
    }

    #[test]
    fn single_panel_is_the_whole_page() {
        let m = StyleModel::default();
        let s = PageStructureSampler::new(&m, seeded(5)).unwrap();
        let flat = s.generate_layout(&panels(1));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].bbox, [0, 0, 1000, 1414]);
    }
}

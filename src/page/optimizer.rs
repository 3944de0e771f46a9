//! Continuous refinement of a page tree into slanted panel polygons.
//!
//! Every split node owns two parameters, a cut ratio and a cut angle, kept
//! in a flat vector whose slots are assigned to split nodes in pre-order.
//! The energy rebuilds all leaf polygons by clipping the page top-down and
//! compares their areas with importance-derived targets; the bounded
//! minimiser in [`crate::optim`] searches the parameters, then every leaf is
//! shrunk by the gutter.

use super::tree::{importance_of, LayoutTree, NodeId, PanelSpec, SplitKind, TreeNode};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::OptimizerReport;
use crate::error::{LayoutError, Result};
use crate::geometry::{Polygon, Rect};
use crate::optim::{minimize_bounded, Bound, MinimizeOptions};
use log::{debug, warn};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const INITIAL_RATIO: f64 = 0.5;
const INITIAL_ANGLE: f64 = 0.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerParams {
    pub page_width: f64,
    pub page_height: f64,
    pub max_iterations: usize,
    pub min_ratio: f64,
    pub max_ratio: f64,
    /// Cut angles are limited to `[-angle_bound, angle_bound]` radians.
    pub angle_bound: f64,
    /// Target area per unit of importance is `page_area / area_divisor`.
    pub area_divisor: f64,
    /// Energy added for a leaf that clipped down to fewer than three vertices.
    pub collapse_penalty: f64,
    pub area_weight: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            page_width: 1000.0,
            page_height: 1414.0,
            max_iterations: 50,
            min_ratio: 0.2,
            max_ratio: 0.8,
            angle_bound: 0.15,
            area_divisor: 25.0,
            collapse_penalty: 10_000.0,
            area_weight: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PanelPolygon {
    pub panel_index: usize,
    pub polygon: Polygon,
}

#[derive(Clone, Debug)]
pub struct Refinement {
    pub panels: Vec<PanelPolygon>,
    /// `(ratio, angle)` per split node in pre-order.
    pub cuts: Vec<(f64, f64)>,
    pub report: OptimizerReport,
}

/// Slot assignment of split nodes into the parameter vector.
struct CutSlots {
    /// Indexed by [`NodeId`]; `None` for leaves.
    slot_of: Vec<Option<usize>>,
}

impl CutSlots {
    fn new(tree: &LayoutTree) -> Self {
        let mut slot_of = vec![None; tree.node_count()];
        for (slot, id) in tree.split_nodes().into_iter().enumerate() {
            slot_of[id] = Some(slot);
        }
        Self { slot_of }
    }

    fn cut(&self, id: NodeId, x: &[f64]) -> (f64, f64) {
        match self.slot_of[id] {
            Some(s) if 2 * s + 1 < x.len() => (x[2 * s], x[2 * s + 1]),
            _ => (INITIAL_RATIO, INITIAL_ANGLE),
        }
    }
}

pub struct PanelGeometryOptimizer {
    params: OptimizerParams,
}

impl PanelGeometryOptimizer {
    pub fn new(params: OptimizerParams) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(params.page_width) || !valid(params.page_height) {
            return Err(LayoutError::InvalidCanvas {
                width: params.page_width as i64,
                height: params.page_height as i64,
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &OptimizerParams {
        &self.params
    }

    fn page_polygon(&self) -> Polygon {
        Rect::new(0.0, 0.0, self.params.page_width, self.params.page_height).to_polygon()
    }

    /// Leaf polygons for the given cut parameters, in leaf order.
    ///
    /// `x` holds `[ratio_0, angle_0, ratio_1, angle_1, ...]` for the split
    /// nodes in pre-order; missing entries fall back to a straight centred
    /// cut.
    pub fn reconstruct(&self, tree: &LayoutTree, x: &[f64]) -> Vec<PanelPolygon> {
        let slots = CutSlots::new(tree);
        let mut out = Vec::new();
        slice(tree, tree.root(), self.page_polygon(), &slots, x, &mut out);
        out
    }

    /// Energy of a set of leaf polygons; lower is better.
    pub fn energy(&self, leaves: &[PanelPolygon], panels: &[PanelSpec]) -> f64 {
        let unit_area = self.params.page_width * self.params.page_height / self.params.area_divisor;
        leaves
            .iter()
            .map(|leaf| {
                if leaf.polygon.len() < 3 {
                    return self.params.collapse_penalty;
                }
                let target = importance_of(panels, leaf.panel_index) * unit_area;
                if target <= 0.0 || !target.is_finite() {
                    return 0.0;
                }
                let rel = (leaf.polygon.area() - target) / target;
                rel * rel * self.params.area_weight
            })
            .sum()
    }

    /// Optimise the cut parameters of `tree` and shrink the resulting
    /// leaves by `gutter` pixels.
    pub fn refine(&self, tree: &LayoutTree, panels: &[PanelSpec], gutter: f64) -> Refinement {
        let start = Instant::now();
        let num_cuts = tree.split_nodes().len();
        if num_cuts == 0 {
            let leaves = self.reconstruct(tree, &[]);
            let energy = self.energy(&leaves, panels);
            let mut report = OptimizerReport::trivial(energy);
            report.elapsed_ms = elapsed_ms(start);
            return Refinement {
                panels: apply_gutter(leaves, gutter),
                cuts: Vec::new(),
                report,
            };
        }

        let mut x0 = Vec::with_capacity(2 * num_cuts);
        let mut bounds = Vec::with_capacity(2 * num_cuts);
        for _ in 0..num_cuts {
            x0.extend([INITIAL_RATIO, INITIAL_ANGLE]);
            bounds.push(Bound::new(self.params.min_ratio, self.params.max_ratio));
            bounds.push(Bound::new(-self.params.angle_bound, self.params.angle_bound));
        }
        let x0 = DVector::from_vec(x0);
        let slots = CutSlots::new(tree);
        let page = self.page_polygon();
        let objective = |x: &DVector<f64>| {
            let mut leaves = Vec::with_capacity(num_cuts + 1);
            slice(tree, tree.root(), page.clone(), &slots, x.as_slice(), &mut leaves);
            self.energy(&leaves, panels)
        };
        let initial_energy = objective(&x0);

        let options = MinimizeOptions {
            max_iterations: self.params.max_iterations,
            ..Default::default()
        };
        let result = minimize_bounded(objective, &x0, &bounds, &options);
        if !result.fun.is_finite() {
            warn!("PanelGeometryOptimizer::refine non-finite energy, keeping initial cuts");
        }
        let x = if result.fun.is_finite() {
            result.x.clone()
        } else {
            x0
        };
        let leaves = self.reconstruct(tree, x.as_slice());
        let converged = result.converged();
        let report = OptimizerReport {
            split_nodes: num_cuts,
            iterations: result.iterations,
            evaluations: result.evaluations,
            initial_energy,
            final_energy: self.energy(&leaves, panels),
            converged,
            elapsed_ms: elapsed_ms(start),
        };
        debug!(
            "PanelGeometryOptimizer::refine cuts={} iterations={} energy {:.4} -> {:.4}",
            num_cuts, report.iterations, report.initial_energy, report.final_energy
        );
        Refinement {
            panels: apply_gutter(leaves, gutter),
            cuts: x
                .as_slice()
                .chunks_exact(2)
                .map(|c| (c[0], c[1]))
                .collect(),
            report,
        }
    }
}

fn apply_gutter(leaves: Vec<PanelPolygon>, gutter: f64) -> Vec<PanelPolygon> {
    leaves
        .into_iter()
        .map(|p| PanelPolygon {
            panel_index: p.panel_index,
            polygon: p.polygon.shrunk(gutter),
        })
        .collect()
}

/// Cut line `(normal, origin)` for a split over `poly`.
///
/// Horizontal cuts pass through `(cx, min_y + h * ratio)` with normal
/// `(sin a, cos a)`; vertical cuts through `(min_x + w * ratio, cy)` with
/// normal `(cos a, sin a)`. The negative side is the top or left child.
fn cut_line(
    split: SplitKind,
    poly: &Polygon,
    ratio: f64,
    angle: f64,
) -> Option<([f64; 2], [f64; 2])> {
    let (min_x, min_y, max_x, max_y) = poly.bounds()?;
    let (w, h) = (max_x - min_x, max_y - min_y);
    let (cx, cy) = (min_x + w / 2.0, min_y + h / 2.0);
    let (sin, cos) = angle.sin_cos();
    Some(match split {
        SplitKind::H => ([sin, cos], [cx, min_y + h * ratio]),
        SplitKind::V => ([cos, sin], [min_x + w * ratio, cy]),
    })
}

fn slice(
    tree: &LayoutTree,
    id: NodeId,
    poly: Polygon,
    slots: &CutSlots,
    x: &[f64],
    out: &mut Vec<PanelPolygon>,
) {
    match tree.node(id) {
        TreeNode::Leaf { panel_index, .. } => out.push(PanelPolygon {
            panel_index: *panel_index,
            polygon: poly,
        }),
        TreeNode::Split {
            split, left, right, ..
        } => {
            let (ratio, angle) = slots.cut(id, x);
            let (a, b) = match cut_line(*split, &poly, ratio, angle) {
                Some((normal, origin)) => poly.clip_by_line(normal, origin),
                // an empty region stays empty on both sides
                None => (Polygon::default(), Polygon::default()),
            };
            slice(tree, *left, a, slots, x, out);
            slice(tree, *right, b, slots, x, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tree::TreeBuilder;

    fn small_params() -> OptimizerParams {
        OptimizerParams {
            page_width: 100.0,
            page_height: 100.0,
            ..Default::default()
        }
    }

    fn h_tree() -> LayoutTree {
        let mut b = TreeBuilder::new();
        let top = b.leaf(0, Rect::new(0.0, 0.0, 100.0, 50.0));
        let bottom = b.leaf(1, Rect::new(0.0, 50.0, 100.0, 50.0));
        let root = b.split(SplitKind::H, top, bottom, Rect::new(0.0, 0.0, 100.0, 100.0));
        b.finish(root)
    }

    #[test]
    fn straight_cut_halves_the_page() {
        let opt = PanelGeometryOptimizer::new(small_params()).unwrap();
        let leaves = opt.reconstruct(&h_tree(), &[0.3, 0.0]);
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].panel_index, 0);
        assert!((leaves[0].polygon.area() - 3000.0).abs() < 1e-9);
        assert!((leaves[1].polygon.area() - 7000.0).abs() < 1e-9);
        let (_, min_y, _, max_y) = leaves[0].polygon.bounds().unwrap();
        assert_eq!((min_y, max_y), (0.0, 30.0));
    }

    #[test]
    fn slanted_cut_preserves_total_area() {
        let opt = PanelGeometryOptimizer::new(small_params()).unwrap();
        let leaves = opt.reconstruct(&h_tree(), &[0.5, 0.1]);
        let total: f64 = leaves.iter().map(|l| l.polygon.area()).sum();
        assert!((total - 10_000.0).abs() < 1e-6);
        assert!(leaves.iter().all(|l| l.polygon.len() >= 4));
    }

    #[test]
    fn energy_penalises_collapsed_leaves() {
        let opt = PanelGeometryOptimizer::new(small_params()).unwrap();
        let leaves = vec![PanelPolygon {
            panel_index: 0,
            polygon: Polygon(vec![[0.0, 0.0], [1.0, 1.0]]),
        }];
        assert_eq!(opt.energy(&leaves, &[]), 10_000.0);
    }

    #[test]
    fn refine_moves_cut_toward_importance_targets() {
        // targets: 8 * 400 = 3200 and 17 * 400 = 6800 of a 10000 page
        let panels = [PanelSpec::new(0, 8.0), PanelSpec::new(1, 17.0)];
        let opt = PanelGeometryOptimizer::new(small_params()).unwrap();
        let tree = h_tree();
        let r = opt.refine(&tree, &panels, 0.0);
        assert_eq!(r.cuts.len(), 1);
        assert!(r.report.final_energy < r.report.initial_energy);
        let ratio = r.cuts[0].0;
        assert!((0.2..=0.8).contains(&ratio));
        assert!(ratio < 0.45, "ratio {ratio}");
    }

    #[test]
    fn single_leaf_returns_shrunk_page() {
        let mut b = TreeBuilder::new();
        let root = b.leaf(4, Rect::new(0.0, 0.0, 100.0, 100.0));
        let tree = b.finish(root);
        let opt = PanelGeometryOptimizer::new(small_params()).unwrap();
        let r = opt.refine(&tree, &[], 10.0);
        assert_eq!(r.panels.len(), 1);
        assert_eq!(r.report.iterations, 0);
        let (min_x, min_y, max_x, max_y) = r.panels[0].polygon.bounds().unwrap();
        assert!((min_x - 10.0).abs() < 1e-9 && (max_x - 90.0).abs() < 1e-9);
        assert!((min_y - 10.0).abs() < 1e-9 && (max_y - 90.0).abs() < 1e-9);
    }
}

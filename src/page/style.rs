//! Learned page-style model.
//!
//! ```json
//! {
//!   "structure":  { "depth_0": { "H": 0.62 }, "depth_1": { "H": 0.35 } },
//!   "importance": { "3": { "0": 0.45, "1": 0.30, "2": 0.25 } },
//!   "shape":      { "mean": [0.0, 0.01], "std": [0.02, 0.03] }
//! }
//! ```
//!
//! `structure` holds the probability of a horizontal cut per recursion
//! depth, `importance` the target area fraction per rank keyed by total
//! panel count, and `shape` cut-delta statistics that are carried along but
//! not used by the search.

use crate::error::Result;
use crate::io::read_json_file;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const FALLBACK_PROB_H: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitProbability {
    #[serde(rename = "H")]
    pub horizontal: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeModel {
    #[serde(default)]
    pub mean: Vec<f64>,
    #[serde(default)]
    pub std: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleModel {
    #[serde(default)]
    pub structure: BTreeMap<String, SplitProbability>,
    #[serde(default)]
    pub importance: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub shape: ShapeModel,
}

impl StyleModel {
    pub fn load(path: &Path) -> Result<Self> {
        let model: StyleModel = read_json_file(path)?;
        debug!(
            "StyleModel::load {} depths={} panel_counts={}",
            path.display(),
            model.structure.len(),
            model.importance.len()
        );
        if !model.structure.contains_key("depth_0") {
            warn!(
                "StyleModel {}: no depth_0 entry, horizontal splits default to p={FALLBACK_PROB_H}",
                path.display()
            );
        }
        Ok(model)
    }

    /// Probability of a horizontal cut at `depth`, falling back to depth 0.
    pub fn prob_horizontal(&self, depth: usize) -> f64 {
        self.structure
            .get(&format!("depth_{depth}"))
            .or_else(|| self.structure.get("depth_0"))
            .map(|p| p.horizontal)
            .unwrap_or(FALLBACK_PROB_H)
    }

    /// Rank -> target area fraction for `num_panels`.
    ///
    /// Uses the exact panel-count key when present, otherwise the numerically
    /// closest key (the smaller count wins a tie). `None` when the table is
    /// empty.
    pub fn importance_targets(&self, num_panels: usize) -> Option<&BTreeMap<String, f64>> {
        if let Some(t) = self.importance.get(&num_panels.to_string()) {
            return Some(t);
        }
        self.importance
            .iter()
            .filter_map(|(k, v)| k.parse::<usize>().ok().map(|n| (n, v)))
            .min_by_key(|(n, _)| (n.abs_diff(num_panels), *n))
            .map(|(_, v)| v)
    }
}

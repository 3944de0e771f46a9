use serde::{Deserialize, Serialize};

/// Outcome of one Monte-Carlo structure search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub trials: usize,
    /// `None` when no trial ran (empty panel list or zero iterations).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_cost: Option<f64>,
    /// Distinct structural signatures seen across all trials.
    pub unique_signatures: usize,
    pub elapsed_ms: f64,
}

/// Summary of a bounded minimisation of the panel energy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerReport {
    pub split_nodes: usize,
    pub iterations: usize,
    pub evaluations: usize,
    pub initial_energy: f64,
    pub final_energy: f64,
    pub converged: bool,
    pub elapsed_ms: f64,
}

impl OptimizerReport {
    /// Report for a tree without split nodes; nothing is optimised.
    pub fn trivial(energy: f64) -> Self {
        Self {
            initial_energy: energy,
            final_energy: energy,
            converged: true,
            ..Default::default()
        }
    }
}

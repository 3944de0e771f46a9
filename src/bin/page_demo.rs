use manga_layout::config::page_demo;
use manga_layout::diagnostics::{OptimizerReport, SearchReport, TimingBreakdown};
use manga_layout::io::write_json_file;
use manga_layout::page::{
    rng_from_seed, FlatPanel, LayoutCandidate, NestedNode, PageStructureSampler,
    PanelGeometryOptimizer, PanelPolygon, StyleModel,
};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = page_demo::load_config(Path::new(&config_path))?;
    let mut timing = TimingBreakdown::default();

    let style = StyleModel::load(&config.style_model).map_err(|e| e.to_string())?;
    let sampler =
        PageStructureSampler::new(&style, config.sampler_params()).map_err(|e| e.to_string())?;
    let optimizer =
        PanelGeometryOptimizer::new(config.optimizer_params()).map_err(|e| e.to_string())?;

    let mut rng = rng_from_seed(config.sampler.seed);
    let (best, search) = timing.time("search_best", || {
        sampler.search_best(&config.panels, &mut rng)
    });
    let best = best.ok_or_else(|| no_candidate(config.panels.len(), config.sampler.iterations))?;
    let (top_k, _) = timing.time("search_top_k", || {
        sampler.search_top_k(&config.panels, config.top_k, &mut rng)
    });
    let refinement = timing.time("refine", || {
        optimizer.refine(&best.tree, &config.panels, config.gutter)
    });
    timing.finish();

    let report = PageReport {
        best: CandidateSummary::from(&best),
        search,
        top_k: top_k.iter().map(CandidateSummary::from).collect(),
        polygons: refinement.panels,
        optimizer: refinement.report,
        timing,
    };
    write_json_file(&config.output.report_json, &report)?;

    println!(
        "Best structure {} (cost {:.4}) out of {} trials",
        report.best.signature, report.best.cost, report.search.trials
    );
    for (rank, c) in report.top_k.iter().enumerate() {
        println!("  #{rank} {} cost {:.4}", c.signature, c.cost);
    }
    println!(
        "Refined {} panels in {} iterations, energy {:.4} -> {:.4}",
        report.polygons.len(),
        report.optimizer.iterations,
        report.optimizer.initial_energy,
        report.optimizer.final_energy
    );
    println!("Report written to {}", config.output.report_json.display());
    Ok(())
}

fn no_candidate(panels: usize, iterations: usize) -> String {
    if panels == 0 {
        "No panels to lay out".to_string()
    } else {
        format!("No search trial ran for {panels} panels (sampler.iterations = {iterations})")
    }
}

fn usage() -> String {
    "Usage: page_demo <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CandidateSummary {
    cost: f64,
    signature: String,
    panels: Vec<FlatPanel>,
    tree: NestedNode,
}

impl From<&LayoutCandidate> for CandidateSummary {
    fn from(c: &LayoutCandidate) -> Self {
        Self {
            cost: c.cost,
            signature: c.signature.clone(),
            panels: c.panels.clone(),
            tree: c.tree.to_nested(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageReport {
    best: CandidateSummary,
    search: SearchReport,
    top_k: Vec<CandidateSummary>,
    polygons: Vec<PanelPolygon>,
    optimizer: OptimizerReport,
    timing: TimingBreakdown,
}

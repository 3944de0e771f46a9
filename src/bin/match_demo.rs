use manga_layout::bubble::{place_bubbles, Bubble};
use manga_layout::config::match_demo;
use manga_layout::diagnostics::TimingBreakdown;
use manga_layout::geometry::BBox;
use manga_layout::io::write_json_file;
use manga_layout::layout::{build_query_layout, Corpus, QueryLayout};
use manga_layout::matching::{find_similar_layouts, RankedReference};
use manga_layout::pose::figure_boxes;
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
    let config = match_demo::load_config(Path::new(&config_path))?;
    let mut timing = TimingBreakdown::default();

    let corpus = timing
        .time("load_corpus", || Corpus::load(&config.corpus))
        .map_err(|e| e.to_string())?;

    let boxes: Vec<BBox> = match &config.figure_boxes {
        Some(boxes) => boxes.clone(),
        None => figure_boxes(
            &config.people,
            config.canvas.width,
            config.canvas.height,
            &config.pose,
        ),
    };
    let query = build_query_layout(
        &boxes,
        &config.script,
        config.canvas.width,
        config.canvas.height,
    );

    let ranked = timing
        .time("rank_references", || {
            find_similar_layouts(&corpus, &query, &config.filter, &config.matching)
        })
        .map_err(|e| e.to_string())?;

    let bubbles = match ranked.first() {
        Some(best) => timing
            .time("place_bubbles", || {
                place_bubbles(
                    &query,
                    &best.record,
                    &best.matching,
                    &config.script,
                    &config.bubbles,
                )
            })
            .map_err(|e| e.to_string())?,
        None => Vec::new(),
    };
    timing.finish();

    let report = MatchReport {
        query: &query,
        candidates: ranked.len(),
        references: ranked.iter().take(config.top_n).map(ReferenceSummary::from).collect(),
        bubbles,
        timing,
    };
    write_json_file(&config.output.report_json, &report)?;

    match ranked.first() {
        Some(best) => println!(
            "Signature {}_{}: {} candidates, best {} (score {:.4}, {} bubbles)",
            query.num_speakers,
            query.num_non_speakers,
            report.candidates,
            best.record.image_path,
            best.score,
            report.bubbles.len()
        ),
        None => println!(
            "Signature {}_{}: no reference passed the filter",
            query.num_speakers, query.num_non_speakers
        ),
    }
    println!("Report written to {}", config.output.report_json.display());
    Ok(())
}

fn usage() -> String {
    "Usage: match_demo <config.json>".to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceSummary {
    image_path: String,
    score: f64,
    matching: Vec<(usize, usize)>,
}

impl From<&RankedReference> for ReferenceSummary {
    fn from(r: &RankedReference) -> Self {
        Self {
            image_path: r.record.image_path.clone(),
            score: r.score,
            matching: r.matching.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchReport<'a> {
    query: &'a QueryLayout,
    candidates: usize,
    references: Vec<ReferenceSummary>,
    bubbles: Vec<Bubble>,
    timing: TimingBreakdown,
}

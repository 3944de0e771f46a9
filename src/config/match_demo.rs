use crate::bubble::BubbleParams;
use crate::geometry::BBox;
use crate::layout::{CorpusFilter, ScriptElement};
use crate::matching::MatchParams;
use crate::pose::{Person, PoseBoxParams};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct MatchDemoConfig {
    pub corpus: PathBuf,
    pub canvas: CanvasConfig,
    /// Figure boxes from an upstream detector. Takes precedence over `people`.
    #[serde(default)]
    pub figure_boxes: Option<Vec<BBox>>,
    /// Raw pose keypoints, cleaned into figure boxes when no boxes are given.
    #[serde(default)]
    pub people: Vec<Person>,
    pub script: Vec<ScriptElement>,
    #[serde(default)]
    pub filter: CorpusFilter,
    #[serde(default)]
    pub matching: MatchParams,
    #[serde(default)]
    pub pose: PoseBoxParams,
    #[serde(default)]
    pub bubbles: BubbleParams,
    /// Number of ranked references kept in the report.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    pub output: MatchOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct CanvasConfig {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Deserialize)]
pub struct MatchOutputConfig {
    pub report_json: PathBuf,
}

fn default_top_n() -> usize {
    5
}

pub fn load_config(path: &Path) -> Result<MatchDemoConfig, String> {
    super::read_config(path)
}

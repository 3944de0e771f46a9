use crate::page::{OptimizerParams, PanelSpec, SamplerParams};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct PageDemoConfig {
    pub style_model: PathBuf,
    pub panels: Vec<PanelSpec>,
    /// Page size shared by the sampler and the optimiser; overrides the
    /// page fields of both parameter blocks.
    #[serde(default)]
    pub page: PageConfig,
    #[serde(default)]
    pub sampler: SamplerParams,
    #[serde(default)]
    pub optimizer: OptimizerParams,
    #[serde(default = "default_gutter")]
    pub gutter: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    pub output: PageOutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1414.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PageOutputConfig {
    pub report_json: PathBuf,
}

fn default_gutter() -> f64 {
    20.0
}

fn default_top_k() -> usize {
    3
}

impl PageDemoConfig {
    pub fn sampler_params(&self) -> SamplerParams {
        SamplerParams {
            page_width: self.page.width,
            page_height: self.page.height,
            ..self.sampler.clone()
        }
    }

    pub fn optimizer_params(&self) -> OptimizerParams {
        OptimizerParams {
            page_width: self.page.width,
            page_height: self.page.height,
            ..self.optimizer.clone()
        }
    }
}

pub fn load_config(path: &Path) -> Result<PageDemoConfig, String> {
    super::read_config(path)
}

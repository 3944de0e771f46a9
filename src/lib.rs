#![doc = include_str!("../README.md")]

// Engine
pub mod bubble;
pub mod geometry;
pub mod layout;
pub mod matching;
pub mod optim;
pub mod page;
pub mod pose;
pub mod scoring;

// Support
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod io;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{LayoutError, Result};
pub use crate::geometry::{BBox, Polygon, Rect};
pub use crate::layout::{Corpus, CorpusFilter, CorpusRecord, Element, ElementType, Layout};
pub use crate::matching::{find_similar_layouts, similarity, MatchParams, Similarity};
pub use crate::page::{PageStructureSampler, PanelGeometryOptimizer, PanelSpec, StyleModel};

// --- Prelude ---------------------------------------------------------------

/// Common imports for driving the engine end to end.
///
/// ```no_run
/// use manga_layout::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> manga_layout::Result<()> {
/// let style = StyleModel::load(Path::new("style_model.json"))?;
/// let sampler = PageStructureSampler::new(&style, SamplerParams::default())?;
/// let panels: Vec<PanelSpec> = (0..4).map(|i| PanelSpec::new(i, 5.0)).collect();
/// if let Some(best) = sampler.generate_tree(&panels) {
///     let optimizer = PanelGeometryOptimizer::new(OptimizerParams::default())?;
///     let refined = optimizer.refine(&best.tree, &panels, 20.0);
///     println!("{} polygons, energy {:.3}", refined.panels.len(), refined.report.final_energy);
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::bubble::{place_bubbles, Bubble, BubbleParams};
    pub use crate::layout::{build_query_layout, QueryLayout, ScriptElement, ScriptKind};
    pub use crate::page::{OptimizerParams, SamplerParams};
    pub use crate::pose::{figure_boxes, Person, PoseBoxParams};
    pub use crate::{
        BBox, Corpus, CorpusFilter, Layout, MatchParams, PageStructureSampler,
        PanelGeometryOptimizer, PanelSpec, StyleModel,
    };
}

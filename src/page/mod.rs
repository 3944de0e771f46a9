//! Page-level layout: structure search and polygon refinement.
//!
//! [`sampler::PageStructureSampler`] chooses a binary partition of the page
//! for a list of panels; [`optimizer::PanelGeometryOptimizer`] turns the
//! chosen tree into slanted, gutter-separated panel polygons.

pub mod optimizer;
pub mod sampler;
pub mod style;
pub mod tree;

pub use optimizer::{OptimizerParams, PanelGeometryOptimizer, PanelPolygon, Refinement};
pub use sampler::{
    rng_from_seed, LayoutCandidate, PageStructureSampler, ReadingDirection, SamplerParams,
};
pub use style::StyleModel;
pub use tree::{
    FlatPanel, LayoutTree, NestedNode, NodeId, PanelSpec, SplitKind, TreeBuilder, TreeNode,
};

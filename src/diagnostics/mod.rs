//! Serialisable reports produced by the layout engine and its demo tools.
//!
//! The engine itself only fills [`SearchReport`] and [`OptimizerReport`];
//! the demos wrap them together with [`TimingBreakdown`] into JSON dumps.

pub mod page;
pub mod timing;

pub use page::{OptimizerReport, SearchReport};
pub use timing::{StageTiming, TimingBreakdown};

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures surfaced to callers.
///
/// Soft failures inside scoring and sampling loops (empty layouts,
/// degenerate boxes, collapsed polygons) never produce an error; they
/// degrade to a zero score or a penalty term instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LayoutError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("corpus does not contain signature: {0}")]
    MissingSignature(String),

    #[error("invalid canvas {width}x{height}")]
    InvalidCanvas { width: i64, height: i64 },

    #[error("text needs {needed}px but the box is {available}px wide")]
    TextOverflow { needed: i64, available: i64 },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

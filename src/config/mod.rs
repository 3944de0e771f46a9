//! JSON configuration for the demo tools.
//!
//! Each tool reads a single file whose path is its first argument. Engine
//! parameter blocks reuse the library's own parameter structs, so every
//! block may be omitted or partially specified.

pub mod match_demo;
pub mod page_demo;

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub(crate) fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

//! Synthetic corpus and style-model files for integration tests.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn record(
    name: &str,
    w: i32,
    h: i32,
    speaker: [i32; 4],
    silent: [i32; 4],
    unrelated: usize,
) -> Value {
    json!({
        "image_path": name,
        "width": w,
        "height": h,
        "speaker_objects": [{
            "bbox": speaker,
            "text_length": 6,
            "text_info": [{"bbox": [60, 0, 200, 60], "length": 6}]
        }],
        "non_speaker_objects": [{"bbox": silent}],
        "unrelated_text_length": unrelated,
        "unrelated_text_bbox": [{"bbox": [300, 0, 380, 60], "length": 4}]
    })
}

/// Corpus with four `1_1` records (one geometric twin of [`query_boxes`]
/// at twice the size, one shifted, one too wide, one too wordy) and one
/// `2_0` record.
pub fn corpus() -> Value {
    json!({
        "1_1": [
            record("shifted.png", 400, 400, [0, 0, 100, 200], [300, 200, 400, 400], 0),
            record("exact.png", 400, 400, [40, 80, 160, 380], [240, 80, 360, 380], 0),
            record("wide.png", 800, 400, [40, 80, 160, 380], [240, 80, 360, 380], 0),
            record("wordy.png", 400, 400, [40, 80, 160, 380], [240, 80, 360, 380], 100),
        ],
        "2_0": [{
            "image_path": "pair.png",
            "width": 300,
            "height": 300,
            "speaker_objects": [
                {"bbox": [0, 0, 100, 300], "text_length": 3},
                {"bbox": [200, 0, 300, 300], "text_length": 3}
            ],
            "non_speaker_objects": [],
            "unrelated_text_length": 0
        }]
    })
}

/// Two figures on a 200x200 canvas; the left one speaks.
pub fn query_boxes() -> Vec<[i32; 4]> {
    vec![[120, 40, 180, 190], [20, 40, 80, 190]]
}

pub fn script() -> Value {
    json!([
        {"type": "description", "content": "two friends at a bus stop"},
        {"type": "dialogue", "content": "おはよう", "speaker": "aki"},
        {"type": "monologue", "content": "まだ雨"},
        {"type": "dialogue", "content": "ござ", "speaker": "aki"}
    ])
}

pub fn style_model(depth0_h: f64) -> Value {
    json!({
        "structure": {"depth_0": {"H": depth0_h}, "depth_1": {"H": 0.4}},
        "importance": {
            "2": {"0": 0.5, "1": 0.5},
            "3": {"0": 0.45, "1": 0.3, "2": 0.25},
            "4": {"0": 0.35, "1": 0.25, "2": 0.2, "3": 0.2},
            "6": {"0": 0.25, "1": 0.2, "2": 0.15, "3": 0.15, "4": 0.15, "5": 0.1}
        },
        "shape": {"mean": [0.0, 0.0], "std": [0.02, 0.02]}
    })
}

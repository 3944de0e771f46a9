//! Reference corpus of annotated manga panels.
//!
//! The corpus file maps a signature `"{num_speakers}_{num_non_speakers}"` to
//! the list of panel records with exactly that many speaking and silent
//! figures. It is built offline and only read at query time; every
//! operation here either borrows records or returns owned copies.

use super::{Element, Layout};
use crate::error::{LayoutError, Result};
use crate::geometry::BBox;
use crate::io::read_json_file;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A text region inside a reference panel and the number of characters it holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub bbox: BBox,
    pub length: usize,
}

impl TextBox {
    fn scaled_xy(&self, sx: f64, sy: f64) -> Self {
        Self {
            bbox: self.bbox.scaled_xy(sx, sy),
            length: self.length,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeakerObject {
    pub bbox: BBox,
    pub text_length: usize,
    /// Speech-text boxes attributed to this figure.
    #[serde(default)]
    pub text_info: Vec<TextBox>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NonSpeakerObject {
    pub bbox: BBox,
}

/// One annotated reference panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub image_path: String,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub speaker_objects: Vec<SpeakerObject>,
    #[serde(default)]
    pub non_speaker_objects: Vec<NonSpeakerObject>,
    pub unrelated_text_length: usize,
    /// Narration boxes not attributed to any figure.
    #[serde(default)]
    pub unrelated_text_bbox: Vec<TextBox>,
}

impl CorpusRecord {
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width <= 0 || self.height <= 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }

    /// Element layout: speakers first, then silent figures, each in file order.
    pub fn to_layout(&self) -> Layout {
        let elements = self
            .speaker_objects
            .iter()
            .map(|s| Element::speaker(s.bbox, s.text_length))
            .chain(
                self.non_speaker_objects
                    .iter()
                    .map(|n| Element::non_speaker(n.bbox)),
            )
            .collect();
        Layout::new(self.width, self.height, elements)
    }

    /// Copy rescaled to exactly `base_width x base_height`.
    ///
    /// The record is first letterboxed to the target aspect ratio keeping its
    /// larger relative dimension, then resized to the target size. Boxes are
    /// scaled by the product of both stages and truncated toward zero.
    /// Records or targets with a collapsed dimension are returned unchanged.
    pub fn adjusted(&self, base_width: i32, base_height: i32) -> CorpusRecord {
        if self.width <= 0 || self.height <= 0 || base_width <= 0 || base_height <= 0 {
            return self.clone();
        }
        let ow = self.width as f64;
        let oh = self.height as f64;
        let target_ar = base_width as f64 / base_height as f64;
        let original_ar = ow / oh;

        let (new_w, new_h) = if original_ar > target_ar {
            (ow, (ow / target_ar).trunc())
        } else {
            ((oh * target_ar).trunc(), oh)
        };
        if new_w <= 0.0 || new_h <= 0.0 {
            return self.clone();
        }
        let sx = (new_w / ow) * (base_width as f64 / new_w);
        let sy = (new_h / oh) * (base_height as f64 / new_h);
        self.rescaled(base_width, base_height, sx, sy)
    }

    /// Uniform copy scaled by `factor`, truncated like [`Layout::scaled`].
    pub fn scaled(&self, factor: f64) -> CorpusRecord {
        self.rescaled(
            (self.width as f64 * factor) as i32,
            (self.height as f64 * factor) as i32,
            factor,
            factor,
        )
    }

    fn rescaled(&self, width: i32, height: i32, sx: f64, sy: f64) -> CorpusRecord {
        CorpusRecord {
            image_path: self.image_path.clone(),
            width,
            height,
            speaker_objects: self
                .speaker_objects
                .iter()
                .map(|s| SpeakerObject {
                    bbox: s.bbox.scaled_xy(sx, sy),
                    text_length: s.text_length,
                    text_info: s.text_info.iter().map(|t| t.scaled_xy(sx, sy)).collect(),
                })
                .collect(),
            non_speaker_objects: self
                .non_speaker_objects
                .iter()
                .map(|n| NonSpeakerObject {
                    bbox: n.bbox.scaled_xy(sx, sy),
                })
                .collect(),
            unrelated_text_length: self.unrelated_text_length,
            unrelated_text_bbox: self
                .unrelated_text_bbox
                .iter()
                .map(|t| t.scaled_xy(sx, sy))
                .collect(),
        }
    }
}

/// Signature-keyed reference corpus.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    entries: BTreeMap<String, Vec<CorpusRecord>>,
}

impl Corpus {
    pub fn new(entries: BTreeMap<String, Vec<CorpusRecord>>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let corpus: Corpus = read_json_file(path)?;
        debug!(
            "Corpus::load {} signatures={} records={}",
            path.display(),
            corpus.entries.len(),
            corpus.len()
        );
        Ok(corpus)
    }

    pub fn signature(num_speakers: usize, num_non_speakers: usize) -> String {
        format!("{num_speakers}_{num_non_speakers}")
    }

    /// Total number of records over all signatures.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Records with exactly this figure signature.
    pub fn query(&self, num_speakers: usize, num_non_speakers: usize) -> Result<&[CorpusRecord]> {
        let key = Self::signature(num_speakers, num_non_speakers);
        self.entries
            .get(&key)
            .map(Vec::as_slice)
            .ok_or(LayoutError::MissingSignature(key))
    }
}

/// Text-length and aspect-ratio window applied after a signature lookup.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CorpusFilter {
    pub target_text_length: usize,
    pub text_length_threshold: usize,
    pub target_aspect_ratio: f64,
    pub aspect_ratio_threshold: f64,
    /// When set, surviving records are rescaled to this `(width, height)`.
    pub canonical_size: Option<(i32, i32)>,
}

impl Default for CorpusFilter {
    fn default() -> Self {
        Self {
            target_text_length: 0,
            text_length_threshold: 20,
            target_aspect_ratio: 1.0,
            aspect_ratio_threshold: 0.4,
            canonical_size: None,
        }
    }
}

impl CorpusFilter {
    pub fn accepts(&self, record: &CorpusRecord) -> bool {
        let target = self.target_text_length as i64;
        let thresh = self.text_length_threshold as i64;
        let length = record.unrelated_text_length as i64;
        if length < target - thresh || length > target + thresh {
            return false;
        }
        match record.aspect_ratio() {
            Some(ar) => {
                ar >= self.target_aspect_ratio - self.aspect_ratio_threshold
                    && ar <= self.target_aspect_ratio + self.aspect_ratio_threshold
            }
            None => false,
        }
    }

    /// Owned copies of the accepted records, rescaled when `canonical_size` is set.
    pub fn apply(&self, records: &[CorpusRecord]) -> Vec<CorpusRecord> {
        let kept: Vec<CorpusRecord> = records
            .iter()
            .filter(|r| self.accepts(r))
            .map(|r| match self.canonical_size {
                Some((w, h)) => r.adjusted(w, h),
                None => r.clone(),
            })
            .collect();
        debug!(
            "CorpusFilter::apply kept={}/{} text={}±{} aspect={:.3}±{:.3}",
            kept.len(),
            records.len(),
            self.target_text_length,
            self.text_length_threshold,
            self.target_aspect_ratio,
            self.aspect_ratio_threshold
        );
        kept
    }
}

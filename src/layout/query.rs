//! Query layouts for freshly generated panel art.
//!
//! Detected figure boxes are labelled as speakers or silent figures using
//! the panel script: each distinct dialogue speaker claims one figure, in
//! left-to-right order of the boxes.

use super::{Element, Layout};
use crate::geometry::BBox;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    Dialogue,
    Monologue,
    Description,
}

/// One line of a script panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptElement {
    #[serde(rename = "type")]
    pub kind: ScriptKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
}

impl ScriptElement {
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Identity used to group dialogue lines by speaker. Unattributed lines
/// are their own speaker.
pub(crate) fn speaker_key(element: &ScriptElement, script_index: usize) -> String {
    match &element.speaker {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("#{script_index}"),
    }
}

/// Query layout plus the bookkeeping needed to draw bubbles afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryLayout {
    pub layout: Layout,
    /// Speaker key of element `i` for every speaker element (the first
    /// `num_speakers` elements).
    pub speaker_keys: Vec<String>,
    pub num_speakers: usize,
    pub num_non_speakers: usize,
    /// Total monologue characters.
    pub unrelated_text_length: usize,
}

impl QueryLayout {
    /// Element index of the figure that voices `key`, if it got one.
    pub fn element_for_speaker(&self, key: &str) -> Option<usize> {
        self.speaker_keys.iter().position(|k| k == key)
    }
}

/// Build the query layout for one generated image.
///
/// Boxes are sorted by `(x1, y1)`. The first `min(speakers, boxes)` become
/// speaker elements with the total dialogue length of their speaker, the
/// remaining boxes become silent figures.
pub fn build_query_layout(
    figure_boxes: &[BBox],
    panel: &[ScriptElement],
    width: i32,
    height: i32,
) -> QueryLayout {
    let mut speakers: Vec<(String, usize)> = Vec::new();
    let mut unrelated = 0usize;
    for (idx, element) in panel.iter().enumerate() {
        match element.kind {
            ScriptKind::Dialogue => {
                let key = speaker_key(element, idx);
                let len = element.char_count();
                match speakers.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, total)) => *total += len,
                    None => speakers.push((key, len)),
                }
            }
            ScriptKind::Monologue => unrelated += element.char_count(),
            ScriptKind::Description => {}
        }
    }

    let mut boxes: Vec<BBox> = figure_boxes.to_vec();
    boxes.sort_by_key(|b| (b.x1, b.y1));

    let num_speakers = speakers.len().min(boxes.len());
    let mut elements = Vec::with_capacity(boxes.len());
    let mut speaker_keys = Vec::with_capacity(num_speakers);
    for (bbox, (key, len)) in boxes.iter().zip(speakers.into_iter()) {
        elements.push(Element::speaker(*bbox, len));
        speaker_keys.push(key);
    }
    for bbox in &boxes[num_speakers..] {
        elements.push(Element::non_speaker(*bbox));
    }

    QueryLayout {
        layout: Layout::new(width, height, elements),
        speaker_keys,
        num_speakers,
        num_non_speakers: boxes.len() - num_speakers,
        unrelated_text_length: unrelated,
    }
}

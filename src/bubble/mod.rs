//! Speech-bubble placement from a matched reference panel.
//!
//! After [`crate::matching`] pairs the query figures with a reference
//! record, each speaker's dialogue is poured into the text boxes of the
//! reference figure it was matched to, and monologue text into the
//! reference's narration boxes. The reference is first scaled into the
//! query's frame with the same factor the similarity used.

mod balloon;
mod vertical;

pub use balloon::{speech_balloon, SpeechBalloon};
pub use vertical::{layout_vertical_text, Glyph, GlyphMetrics};

use crate::error::{LayoutError, Result};
use crate::geometry::BBox;
use crate::layout::query::speaker_key;
use crate::layout::{CorpusRecord, QueryLayout, ScriptElement, ScriptKind, TextBox};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleParams {
    /// A box takes only its own capacity when the remaining text exceeds
    /// that capacity by more than this many characters.
    pub split_threshold: usize,
    pub tail_base_width: f64,
    /// Distance the tail base is pulled inside the ellipse.
    pub tail_inset: f64,
    /// Padding between a narration box and its frame.
    pub narration_gap: i32,
    pub glyphs: GlyphMetrics,
}

impl Default for BubbleParams {
    fn default() -> Self {
        Self {
            split_threshold: 10,
            tail_base_width: 40.0,
            tail_inset: 2.0,
            narration_gap: 2,
            glyphs: GlyphMetrics::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Bubble {
    Speech {
        speaker: String,
        text: String,
        text_box: BBox,
        balloon: SpeechBalloon,
        glyphs: Vec<Glyph>,
    },
    Narration {
        text: String,
        text_box: BBox,
        frame: BBox,
        glyphs: Vec<Glyph>,
    },
}

impl Bubble {
    pub fn text(&self) -> &str {
        match self {
            Bubble::Speech { text, .. } | Bubble::Narration { text, .. } => text,
        }
    }
}

/// Chunks of `text` for boxes with the given character capacities, paired
/// with the index of the box that receives them.
///
/// Every box but the last takes exactly its capacity while the remaining
/// text exceeds it by more than `threshold`; the first box that does not
/// takes everything left and the split stops there. Zero-capacity boxes
/// other than the last receive nothing. No chunk is empty.
pub fn split_text(text: &str, capacities: &[usize], threshold: usize) -> Vec<(usize, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut pos = 0;
    for (i, &cap) in capacities.iter().enumerate() {
        if pos >= chars.len() {
            break;
        }
        let remaining = chars.len() - pos;
        let last = i + 1 == capacities.len();
        if !last && cap == 0 {
            continue;
        }
        if !last && remaining > cap + threshold {
            out.push((i, chars[pos..pos + cap].iter().collect()));
            pos += cap;
        } else {
            out.push((i, chars[pos..].iter().collect()));
            break;
        }
    }
    out
}

/// Dialogue grouped by speaker in order of first appearance.
fn dialogue_by_speaker(panel: &[ScriptElement]) -> Vec<(String, String)> {
    let mut grouped: Vec<(String, String)> = Vec::new();
    for (idx, element) in panel.iter().enumerate() {
        if element.kind != ScriptKind::Dialogue {
            continue;
        }
        let key = speaker_key(element, idx);
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, text)) => text.push_str(&element.content),
            None => grouped.push((key, element.content.clone())),
        }
    }
    grouped
}

fn fill_boxes<'b>(
    text: &str,
    boxes: &'b [TextBox],
    params: &BubbleParams,
) -> impl Iterator<Item = (String, &'b TextBox)> {
    let capacities: Vec<usize> = boxes.iter().map(|b| b.length).collect();
    split_text(text, &capacities, params.split_threshold)
        .into_iter()
        .map(move |(i, chunk)| (chunk, &boxes[i]))
}

/// Bubbles for one panel.
///
/// `matching` pairs query element indices with element indices of
/// `reference.to_layout()`. Speakers without a figure, figures matched to
/// nothing and reference figures without text boxes get no bubble.
pub fn place_bubbles(
    query: &QueryLayout,
    reference: &CorpusRecord,
    matching: &[(usize, usize)],
    panel: &[ScriptElement],
    params: &BubbleParams,
) -> Result<Vec<Bubble>> {
    if reference.width <= 0 || reference.height <= 0 {
        return Err(LayoutError::InvalidCanvas {
            width: reference.width as i64,
            height: reference.height as i64,
        });
    }
    let factor = query.layout.width as f64 / reference.width as f64;
    let reference = reference.scaled(factor);
    let mut bubbles = Vec::new();

    for (key, text) in dialogue_by_speaker(panel) {
        let Some(q) = query.element_for_speaker(&key) else {
            debug!("place_bubbles: speaker {key} has no figure");
            continue;
        };
        let Some(&(_, r)) = matching.iter().find(|(qi, _)| *qi == q) else {
            debug!("place_bubbles: figure {q} of {key} is unmatched");
            continue;
        };
        let Some(speaker) = reference.speaker_objects.get(r) else {
            continue;
        };
        let figure = query.layout.elements[q].bbox;
        let target = [(figure.x1 + figure.x2) as f64 / 2.0, figure.y1 as f64];
        for (chunk, text_box) in fill_boxes(&text, &speaker.text_info, params) {
            let glyphs = layout_vertical_text(&chunk, &text_box.bbox, &params.glyphs)?;
            bubbles.push(Bubble::Speech {
                speaker: key.clone(),
                balloon: speech_balloon(
                    &text_box.bbox,
                    target,
                    params.tail_base_width,
                    params.tail_inset,
                ),
                text: chunk,
                text_box: text_box.bbox,
                glyphs,
            });
        }
    }

    let narration: String = panel
        .iter()
        .filter(|e| e.kind == ScriptKind::Monologue)
        .map(|e| e.content.as_str())
        .collect();
    for (chunk, text_box) in fill_boxes(&narration, &reference.unrelated_text_bbox, params) {
        let glyphs = layout_vertical_text(&chunk, &text_box.bbox, &params.glyphs)?;
        bubbles.push(Bubble::Narration {
            text: chunk,
            text_box: text_box.bbox,
            frame: text_box.bbox.inflated(params.narration_gap),
            glyphs,
        });
    }

    debug!(
        "place_bubbles: {} bubbles from {}",
        bubbles.len(),
        reference.image_path
    );
    Ok(bubbles)
}

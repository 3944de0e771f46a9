//! Typed element layouts.
//!
//! A [`Layout`] is a canvas size plus an ordered list of [`Element`]s in
//! the same pixel frame. Layouts are values: every transformation returns a
//! new layout and never touches the receiver, so corpus entries can be
//! shared freely between queries.
//!
//! - [`corpus`]: reference corpus records, signature lookup and filtering.
//! - [`query`]: query layouts built from detected figures and a script panel.

pub mod corpus;
pub mod query;

use crate::geometry::BBox;
use serde::{Deserialize, Serialize};

pub use corpus::{Corpus, CorpusFilter, CorpusRecord, NonSpeakerObject, SpeakerObject, TextBox};
pub use query::{build_query_layout, QueryLayout, ScriptElement, ScriptKind};

/// Element category. Matching only pairs elements with equal types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Face,
    Body,
    /// Speech text tied to a figure.
    RelatedText,
    /// Narration or monologue text.
    NonrelatedText,
    /// Query-side figure that speaks in the panel.
    Speaker,
    /// Query-side figure without dialogue.
    NonSpeaker,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub element_type: ElementType,
    pub bbox: BBox,
    /// Characters to render; only meaningful for [`ElementType::Speaker`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
}

impl Element {
    pub fn new(element_type: ElementType, bbox: BBox) -> Self {
        Self {
            element_type,
            bbox,
            text_length: None,
        }
    }

    pub fn speaker(bbox: BBox, text_length: usize) -> Self {
        Self {
            element_type: ElementType::Speaker,
            bbox,
            text_length: Some(text_length),
        }
    }

    pub fn non_speaker(bbox: BBox) -> Self {
        Self::new(ElementType::NonSpeaker, bbox)
    }

    pub fn area(&self) -> f64 {
        self.bbox.valid_area()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub elements: Vec<Element>,
}

impl Layout {
    pub fn new(width: i32, height: i32, elements: Vec<Element>) -> Self {
        Self {
            width,
            height,
            elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// `width / height`, or `None` for a collapsed canvas.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width <= 0 || self.height <= 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }

    /// Uniformly scaled copy; canvas and boxes are truncated toward zero.
    pub fn scaled(&self, factor: f64) -> Layout {
        Layout {
            width: (self.width as f64 * factor) as i32,
            height: (self.height as f64 * factor) as i32,
            elements: self
                .elements
                .iter()
                .map(|e| Element {
                    bbox: e.bbox.scaled(factor),
                    ..e.clone()
                })
                .collect(),
        }
    }

    pub fn count(&self, element_type: ElementType) -> usize {
        self.elements
            .iter()
            .filter(|e| e.element_type == element_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Layout {
        Layout::new(
            400,
            300,
            vec![
                Element::speaker(BBox::new(10, 20, 110, 220), 12),
                Element::non_speaker(BBox::new(200, 30, 390, 290)),
            ],
        )
    }

    #[test]
    fn scaled_returns_new_value_and_keeps_original() {
        let layout = sample();
        let before = layout.clone();
        let half = layout.scaled(0.5);
        assert_eq!(layout, before);
        assert_eq!((half.width, half.height), (200, 150));
        assert_eq!(half.elements[0].bbox, BBox::new(5, 10, 55, 110));
        assert_eq!(half.elements[0].text_length, Some(12));
    }

    #[test]
    fn scale_and_inverse_within_truncation_tolerance() {
        let layout = sample();
        let f = 0.37;
        let back = layout.scaled(f).scaled(1.0 / f);
        // truncation on both passes loses at most ceil(1/f) = 3 px
        let tol = (1.0 / f).ceil() as i32;
        assert!((back.width - layout.width).abs() <= tol);
        assert!((back.height - layout.height).abs() <= tol);
        for (a, b) in layout.elements.iter().zip(back.elements.iter()) {
            let a: [i32; 4] = a.bbox.into();
            let b: [i32; 4] = b.bbox.into();
            for k in 0..4 {
                assert!((a[k] - b[k]).abs() <= tol, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn aspect_ratio_rejects_collapsed_canvas() {
        assert_eq!(Layout::new(100, 0, Vec::new()).aspect_ratio(), None);
        assert_eq!(Layout::new(200, 100, Vec::new()).aspect_ratio(), Some(2.0));
    }

    #[test]
    fn element_type_uses_snake_case_names() {
        let json = serde_json::to_string(&ElementType::NonrelatedText).unwrap();
        assert_eq!(json, "\"nonrelated_text\"");
        let t: ElementType = serde_json::from_str("\"non_speaker\"").unwrap();
        assert_eq!(t, ElementType::NonSpeaker);
    }
}

use crate::error::{LayoutError, Result};
use crate::geometry::BBox;
use serde::{Deserialize, Serialize};

/// Fixed glyph cell used for vertical typesetting, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphMetrics {
    pub char_width: i32,
    pub char_height: i32,
    /// Gap between consecutive glyphs of one column.
    pub line_gap: i32,
    pub col_gap: i32,
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self {
            char_width: 10,
            char_height: 10,
            line_gap: 0,
            col_gap: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Glyph {
    pub ch: char,
    /// Top-left corner of the glyph cell.
    pub x: i32,
    pub y: i32,
}

/// Place `text` top-to-bottom in columns running right-to-left inside
/// `bbox`.
///
/// Fails with [`LayoutError::TextOverflow`] when the columns needed are
/// wider than the box.
pub fn layout_vertical_text(
    text: &str,
    bbox: &BBox,
    metrics: &GlyphMetrics,
) -> Result<Vec<Glyph>> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }
    let pitch_y = metrics.char_height + metrics.line_gap;
    let pitch_x = metrics.char_width + metrics.col_gap;
    let rows = if pitch_y > 0 {
        ((bbox.height() + metrics.line_gap) / pitch_y).max(1) as usize
    } else {
        1
    };
    let cols = chars.len().div_ceil(rows) as i64;
    let needed = cols * metrics.char_width as i64 + (cols - 1) * metrics.col_gap as i64;
    let available = bbox.width() as i64;
    if needed > available {
        return Err(LayoutError::TextOverflow { needed, available });
    }

    let start_x = bbox.x2 - metrics.char_width;
    Ok(chars
        .into_iter()
        .enumerate()
        .map(|(i, ch)| {
            let col = (i / rows) as i32;
            let row = (i % rows) as i32;
            Glyph {
                ch,
                x: start_x - col * pitch_x,
                y: bbox.y1 + row * pitch_y,
            }
        })
        .collect())
}

use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

use super::{FontDescriptor, TextMeasurer};

/// Measurer with one advance for narrow graphemes and another for wide
/// (CJK, fullwidth) ones, breaking at Unicode line-break opportunities.
/// Stands in for a platform typesetter where none is available.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMeasurer {
    /// Advance of a narrow grapheme, in ems.
    pub narrow_advance: f32,
    /// Advance of a wide grapheme, in ems.
    pub wide_advance: f32,
    /// Line height, in ems.
    pub line_height: f32,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self {
            narrow_advance: 0.5,
            wide_advance: 1.0,
            line_height: 1.2,
        }
    }
}

impl FixedAdvanceMeasurer {
    pub fn advance(&self, grapheme: &str, point_size: f32) -> f32 {
        let Some(ch) = grapheme.chars().next() else {
            return 0.0;
        };
        if ch == '\n' || ch == '\r' {
            return 0.0;
        }
        if is_wide(ch) {
            self.wide_advance * point_size
        } else {
            self.narrow_advance * point_size
        }
    }

    pub fn width_of(&self, text: &str, point_size: f32) -> f32 {
        text.graphemes(true)
            .map(|g| self.advance(g, point_size))
            .sum()
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn line_breaks(&self, text: &str, font: &FontDescriptor, max_width: f32) -> Vec<usize> {
        let mut breaks: Vec<usize> = Vec::new();
        if text.is_empty() {
            return breaks;
        }
        let size = font.point_size;
        let mut line_width = 0.0f32;
        let mut seg_start = 0usize;

        for (idx, opp) in linebreaks(text) {
            let segment = &text[seg_start..idx];
            // Trailing spaces and the newline hang past the margin.
            let body_width = self.width_of(segment.trim_end_matches(is_hanging), size);
            if line_width > 0.0 && line_width + body_width > max_width {
                breaks.push(seg_start);
                line_width = 0.0;
            }
            if body_width > max_width {
                // Overlong segment: fall back to grapheme breaks.
                for (offset, grapheme) in segment.grapheme_indices(true) {
                    let advance = self.advance(grapheme, size);
                    let hangs = grapheme.chars().all(is_hanging);
                    if !hangs && line_width > 0.0 && line_width + advance > max_width {
                        breaks.push(seg_start + offset);
                        line_width = 0.0;
                    }
                    line_width += advance;
                }
            } else {
                line_width += self.width_of(segment, size);
            }
            if matches!(opp, BreakOpportunity::Mandatory) && breaks.last() != Some(&idx) {
                breaks.push(idx);
                line_width = 0.0;
            }
            seg_start = idx;
        }

        if breaks.last() != Some(&text.len()) {
            breaks.push(text.len());
        }
        breaks
    }

    fn line_height(&self, font: &FontDescriptor) -> f32 {
        self.line_height * font.point_size
    }
}

fn is_hanging(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

fn is_wide(ch: char) -> bool {
    matches!(ch,
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{303E}'
        | '\u{3041}'..='\u{33FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{A000}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}'
        | '\u{20000}'..='\u{3FFFD}')
}

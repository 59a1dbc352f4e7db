use super::{FrameLayout, FrameSize, TextMeasurer, TextStyle};

const FIT_EPSILON: f32 = 0.01;

/// Line-by-line frame fill on top of [`TextMeasurer::line_breaks`]: a line is
/// visible when its bottom edge is inside the frame. Lines ending a paragraph
/// add the paragraph spacing below them.
pub fn fill_frame<M: TextMeasurer + ?Sized>(
    measurer: &M,
    text: &str,
    style: &TextStyle,
    frame: FrameSize,
) -> FrameLayout {
    let line_ends = measurer.line_breaks(text, &style.font, frame.width);
    let line_height = measurer.line_height(&style.font);

    let mut y = 0.0f32;
    let mut start = 0usize;
    let mut visible_end = 0usize;
    for &end in &line_ends {
        if end <= start || end > text.len() || !text.is_char_boundary(end) {
            break;
        }
        if y + line_height > frame.height + FIT_EPSILON {
            break;
        }
        visible_end = end;
        y += line_height + style.line_spacing;
        if text[..end].ends_with('\n') {
            y += style.paragraph_spacing;
        }
        start = end;
    }

    FrameLayout {
        line_ends,
        visible_end,
    }
}

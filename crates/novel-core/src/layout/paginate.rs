use unicode_segmentation::UnicodeSegmentation;

use super::{FrameSize, LayoutParameters, Page, Pagination, TextMeasurer, TextStyle};

/// Title font size relative to the body font.
pub const TITLE_SCALE: f32 = 1.4;
pub const TITLE_MARGIN_TOP: f32 = 20.0;
pub const TITLE_MARGIN_BOTTOM: f32 = 16.0;

// First prefix size; doubled while a whole prefix fits on the page.
const INITIAL_PREFIX_BYTES: usize = 4096;

/// Slices `text` into pages that each fit the layout's text box. Page 0 gives
/// up room for the chapter title. Pages are contiguous and cover `text`
/// exactly; there is always at least one page.
pub fn paginate<M: TextMeasurer + ?Sized>(
    text: &str,
    layout: &LayoutParameters,
    chapter_title: &str,
    measurer: &M,
) -> Pagination {
    let style = layout.text_style();
    let body = layout.body_frame();
    let mut first = layout.first_page_frame(measurer, chapter_title);
    if first.height < measurer.line_height(&layout.font) {
        // Title leaves no room for a single line: let it overlap rather than
        // starve page 0.
        log::debug!("title block leaves no room on the first page; using body frame");
        first = body;
    }

    let mut pages: Vec<Page> = Vec::new();
    let mut cursor = 0usize;
    while cursor < text.len() {
        let frame = if pages.is_empty() { first } else { body };
        let remaining = &text[cursor..];
        let fitted = fit_page(measurer, remaining, &style, frame);
        let len = if fitted == 0 {
            log::debug!(
                "nothing measurable fits at offset {}; {} bytes go on a final page",
                cursor,
                remaining.len()
            );
            remaining.len()
        } else {
            absorb_newlines(remaining, fitted)
        };
        pages.push(Page {
            index: pages.len(),
            start_offset: cursor,
            text: remaining[..len].to_string(),
        });
        cursor += len;
    }

    Pagination::from_pages(pages)
}

/// Bytes of `remaining` that go on a page of size `frame`; zero when the frame
/// shows nothing at all.
fn fit_page<M: TextMeasurer + ?Sized>(
    measurer: &M,
    remaining: &str,
    style: &TextStyle,
    frame: FrameSize,
) -> usize {
    if frame.width <= 0.0 || frame.height <= 0.0 {
        return 0;
    }
    let mut budget = INITIAL_PREFIX_BYTES;
    loop {
        let prefix_end = prefix_boundary(remaining, budget);
        let prefix = &remaining[..prefix_end];
        let layout = measurer.layout_frame(prefix, style, frame);
        let visible = floor_char_boundary(prefix, layout.visible_end.min(prefix_end));

        if visible == prefix_end && prefix_end < remaining.len() {
            budget = budget.saturating_mul(2);
            continue;
        }
        if visible == 0 {
            return 0;
        }

        let line_ends = sanitize_line_ends(layout.line_ends, prefix);
        let accepted = last_full_line_end(&line_ends, visible);
        if accepted > 0 {
            return accepted;
        }
        // Even the first line is clipped: show what is visible, at least one
        // grapheme, so the cursor always moves.
        return floor_grapheme_boundary(prefix, visible).max(first_grapheme_len(prefix));
    }
}

/// Widow-line correction: the largest reported line end not past `visible`.
/// A `visible` inside a line means that line is truncated and is pushed to the
/// next page.
fn last_full_line_end(line_ends: &[usize], visible: usize) -> usize {
    match line_ends.binary_search(&visible) {
        Ok(_) => visible,
        Err(0) => 0,
        Err(i) => {
            log::trace!(
                "last line truncated at {}; backing off to {}",
                visible,
                line_ends[i - 1]
            );
            line_ends[i - 1]
        }
    }
}

// Paragraph-aligned prefix of at least `budget` bytes, so line breaks inside the
// prefix match those of the full text.
fn prefix_boundary(text: &str, budget: usize) -> usize {
    if budget >= text.len() {
        return text.len();
    }
    let from = floor_char_boundary(text, budget);
    text[from..]
        .find('\n')
        .map(|i| from + i + 1)
        .unwrap_or(text.len())
}

fn sanitize_line_ends(mut line_ends: Vec<usize>, text: &str) -> Vec<usize> {
    let mut last = 0usize;
    line_ends.retain(|&end| {
        let keep = end > last && end <= text.len() && text.is_char_boundary(end);
        if keep {
            last = end;
        }
        keep
    });
    line_ends
}

// A newline right after a page end is invisible there and would otherwise open
// the next page with a blank line.
fn absorb_newlines(remaining: &str, len: usize) -> usize {
    let extra = remaining[len..]
        .bytes()
        .take_while(|b| *b == b'\n' || *b == b'\r')
        .count();
    len + extra
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn floor_grapheme_boundary(text: &str, idx: usize) -> usize {
    text.grapheme_indices(true)
        .map(|(offset, _)| offset)
        .take_while(|&offset| offset <= idx)
        .last()
        .unwrap_or(0)
}

fn first_grapheme_len(text: &str) -> usize {
    text.graphemes(true).next().map(str::len).unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widow_correction_backs_off_to_line_end() {
        let ends = [10, 20, 30];
        assert_eq!(last_full_line_end(&ends, 20), 20);
        assert_eq!(last_full_line_end(&ends, 25), 20);
        assert_eq!(last_full_line_end(&ends, 5), 0);
        assert_eq!(last_full_line_end(&ends, 40), 30);
    }

    #[test]
    fn prefix_ends_after_a_newline() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(prefix_boundary(text, 2), 5);
        assert_eq!(prefix_boundary(text, 6), 10);
        assert_eq!(prefix_boundary(text, 11), text.len());
        assert_eq!(prefix_boundary(text, 100), text.len());
    }

    #[test]
    fn sanitize_drops_unordered_and_out_of_range_ends() {
        let text = "一二三";
        assert_eq!(sanitize_line_ends(vec![3, 2, 3, 6, 12, 9], text), vec![3, 6, 9]);
    }

    #[test]
    fn absorbs_only_newlines() {
        assert_eq!(absorb_newlines("ab\n\ncd", 2), 4);
        assert_eq!(absorb_newlines("ab cd", 2), 2);
        assert_eq!(absorb_newlines("ab", 2), 2);
    }

    #[test]
    fn grapheme_floor_keeps_clusters_whole() {
        let text = "e\u{301}x";
        assert_eq!(floor_grapheme_boundary(text, 2), 0);
        assert_eq!(floor_grapheme_boundary(text, 3), 3);
        assert_eq!(first_grapheme_len(text), 3);
    }
}

use proptest::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

use super::*;

/// Wraps after a fixed number of graphemes; `'\n'` ends the line it is on.
struct GridMeasurer {
    per_line: usize,
}

impl TextMeasurer for GridMeasurer {
    fn line_breaks(&self, text: &str, _font: &FontDescriptor, _max_width: f32) -> Vec<usize> {
        let mut ends = Vec::new();
        let mut count = 0;
        for (offset, g) in text.grapheme_indices(true) {
            if g == "\n" {
                ends.push(offset + 1);
                count = 0;
                continue;
            }
            if count == self.per_line {
                ends.push(offset);
                count = 0;
            }
            count += 1;
        }
        if !text.is_empty() && ends.last() != Some(&text.len()) {
            ends.push(text.len());
        }
        ends
    }

    fn line_height(&self, _font: &FontDescriptor) -> f32 {
        10.0
    }
}

/// Reports a clipped, partly visible line below the last full one, the way
/// platform framesetters do.
struct ClippingMeasurer {
    grid: GridMeasurer,
}

impl TextMeasurer for ClippingMeasurer {
    fn line_breaks(&self, text: &str, font: &FontDescriptor, max_width: f32) -> Vec<usize> {
        self.grid.line_breaks(text, font, max_width)
    }

    fn line_height(&self, font: &FontDescriptor) -> f32 {
        self.grid.line_height(font)
    }

    fn layout_frame(&self, text: &str, style: &TextStyle, frame: FrameSize) -> FrameLayout {
        let mut layout = fill_frame(self, text, style, frame);
        layout.visible_end = (layout.visible_end + 2).min(text.len());
        layout
    }
}

fn layout(width: f32, height: f32) -> LayoutParameters {
    LayoutParameters {
        viewport: ViewportSize::new(width, height),
        font: FontDescriptor::new("mono", 10.0),
        line_spacing: 0.0,
        paragraph_spacing: 0.0,
        alignment: Alignment::Justified,
        header_reserved_height: 0.0,
        footer_reserved_height: 0.0,
    }
}

fn lens(pagination: &Pagination) -> Vec<usize> {
    pagination.pages().iter().map(Page::len).collect()
}

fn assert_covers(pagination: &Pagination, text: &str) {
    assert_eq!(pagination.texts().concat(), text);
    let mut expected_start = 0;
    for (i, page) in pagination.pages().iter().enumerate() {
        assert_eq!(page.index, i);
        assert_eq!(page.start_offset, expected_start);
        expected_start = page.end_offset();
    }
}

#[test]
fn empty_text_is_one_empty_page() {
    let p = paginate("", &layout(300.0, 600.0), "Ch1", &FixedAdvanceMeasurer::default());
    assert_eq!(p.total_pages(), 1);
    assert_eq!(p.pages()[0].text, "");
    assert_eq!(p.pages()[0].start_offset, 0);
}

#[test]
fn single_character_is_one_page() {
    let p = paginate("字", &layout(300.0, 600.0), "Ch1", &FixedAdvanceMeasurer::default());
    assert_eq!(p.texts(), vec!["字"]);
}

#[test]
fn short_chapter_fits_on_one_page() {
    let text = "\u{3000}\u{3000}Hello\n\n\u{3000}\u{3000}World";
    let p = paginate(text, &layout(300.0, 600.0), "Ch1", &FixedAdvanceMeasurer::default());
    assert_eq!(p.total_pages(), 1);
    assert_eq!(p.pages()[0].text, text);
}

#[test]
fn first_page_gives_room_to_the_title() {
    // Title block: one 10pt line plus 36pt of margins leaves 54pt => 5 lines.
    let text = "a".repeat(100);
    let m = GridMeasurer { per_line: 5 };
    let p = paginate(&text, &layout(100.0, 100.0), "T", &m);
    assert_eq!(lens(&p), vec![25, 50, 25]);
    assert_covers(&p, &text);
}

#[test]
fn untitled_chapter_uses_full_first_page() {
    let text = "a".repeat(100);
    let m = GridMeasurer { per_line: 5 };
    let p = paginate(&text, &layout(100.0, 100.0), "  ", &m);
    assert_eq!(lens(&p), vec![50, 50]);
}

#[test]
fn clipped_last_line_moves_to_next_page() {
    let text = "x".repeat(97);
    let m = ClippingMeasurer {
        grid: GridMeasurer { per_line: 5 },
    };
    let p = paginate(&text, &layout(100.0, 50.0), "", &m);
    assert_eq!(lens(&p), vec![25, 25, 25, 22]);
    for page in &p.pages()[..p.total_pages() - 1] {
        assert_eq!(page.len() % 5, 0, "page {} ends mid-line", page.index);
    }
    assert_covers(&p, &text);
}

#[test]
fn pages_end_on_reported_line_boundaries() {
    let text = "天地玄黄宇宙洪荒日月盈昃辰宿列张\n\n寒来暑往秋收冬藏闰余成岁律吕调阳\n\n云腾致雨露结为霜";
    let m = ClippingMeasurer {
        grid: GridMeasurer { per_line: 4 },
    };
    let p = paginate(text, &layout(100.0, 30.0), "", &m);
    for page in p.pages() {
        let rest = &text[page.start_offset..];
        let ends = m.line_breaks(rest, &FontDescriptor::new("mono", 10.0), 100.0);
        assert!(
            ends.contains(&page.len()),
            "page {} ({:?}) does not end at a line boundary",
            page.index,
            page.text
        );
    }
    assert_covers(&p, text);
}

#[test]
fn no_page_opens_with_a_blank_line() {
    let text = (0..40)
        .map(|i| format!("\u{3000}\u{3000}段落{}的内容比较长一些需要换行显示", i))
        .collect::<Vec<_>>()
        .join("\n\n");
    let p = paginate(&text, &layout(120.0, 150.0), "第一章", &FixedAdvanceMeasurer::default());
    assert!(p.total_pages() > 3);
    for page in &p.pages()[1..] {
        assert!(!page.text.starts_with('\n'), "page {} starts blank", page.index);
    }
    assert_covers(&p, &text);
}

#[test]
fn zero_height_viewport_degrades_to_one_page() {
    let text = "some text that cannot be measured";
    let p = paginate(text, &layout(100.0, 0.0), "T", &FixedAdvanceMeasurer::default());
    assert_eq!(p.texts(), vec![text]);
}

#[test]
fn oversized_title_falls_back_to_body_frame() {
    let text = "a".repeat(60);
    let title = "t".repeat(100);
    let m = GridMeasurer { per_line: 5 };
    let p = paginate(&text, &layout(100.0, 50.0), &title, &m);
    assert_eq!(lens(&p), vec![25, 25, 10]);
}

#[test]
fn header_and_footer_shrink_every_page() {
    let text = "a".repeat(50);
    let m = GridMeasurer { per_line: 5 };
    let mut params = layout(100.0, 100.0);
    params.header_reserved_height = 25.0;
    params.footer_reserved_height = 25.0;
    let p = paginate(&text, &params, "", &m);
    assert_eq!(lens(&p), vec![25, 25]);
}

#[test]
fn long_chapter_is_laid_out_in_growing_prefixes() {
    let text = "一二三四五\n".repeat(600);
    let m = FixedAdvanceMeasurer::default();
    // 600 lines of 12pt fit in 7200pt.
    let p = paginate(&text, &layout(100.0, 7200.0), "", &m);
    assert_eq!(p.total_pages(), 1);

    let p = paginate(&text, &layout(100.0, 1200.0), "", &m);
    assert_eq!(lens(&p), vec![1600; 6]);
    assert_covers(&p, &text);
}

#[test]
fn clamp_index_stays_in_range() {
    let text = "a".repeat(100);
    let p = paginate(&text, &layout(100.0, 50.0), "", &GridMeasurer { per_line: 5 });
    assert_eq!(p.total_pages(), 4);
    assert_eq!(p.clamp_index(2), 2);
    assert_eq!(p.clamp_index(9), 3);
}

proptest! {
    #[test]
    fn pages_cover_text_in_order(
        text in "[a-z 一-龥\n]{0,600}",
        width in 20.0f32..300.0,
        height in 12.0f32..400.0,
    ) {
        let p = paginate(&text, &layout(width, height), "标题", &FixedAdvanceMeasurer::default());
        prop_assert!(p.total_pages() >= 1);
        prop_assert_eq!(p.texts().concat(), text.clone());
        for pair in p.pages().windows(2) {
            prop_assert!(pair[0].start_offset < pair[1].start_offset);
        }
    }

    #[test]
    fn clipping_measurer_still_covers_text(
        text in "[a-z一-龥\n]{0,300}",
        per_line in 1usize..12,
        height in 10.0f32..120.0,
    ) {
        let m = ClippingMeasurer { grid: GridMeasurer { per_line } };
        let p = paginate(&text, &layout(100.0, height), "", &m);
        prop_assert_eq!(p.texts().concat(), text.clone());
        for pair in p.pages().windows(2) {
            prop_assert!(pair[0].start_offset < pair[1].start_offset);
        }
    }
}

//! Chapter pagination.
//!
//! Text measurement is a capability supplied by the host through
//! [`TextMeasurer`]; everything above line breaking (frame filling, title
//! space on the first page, widow-line correction, cursor advance) lives here
//! and is deterministic for a deterministic measurer.

mod frame;
mod measure;
mod paginate;

#[cfg(test)]
mod tests;

use crate::types::ReaderPreferences;

pub use frame::fill_frame;
pub use measure::FixedAdvanceMeasurer;
pub use paginate::{paginate, TITLE_MARGIN_BOTTOM, TITLE_MARGIN_TOP, TITLE_SCALE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportSize {
    pub width: f32,
    pub height: f32,
}

impl ViewportSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontDescriptor {
    pub family: String,
    pub point_size: f32,
}

impl FontDescriptor {
    pub fn new(family: impl Into<String>, point_size: f32) -> Self {
        Self {
            family: family.into(),
            point_size,
        }
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            family: self.family.clone(),
            point_size: self.point_size * factor,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    Left,
    #[default]
    Justified,
    Center,
    Right,
}

/// Everything that shapes pagination. Compared by value: any difference means
/// the current chapter's pages are stale.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParameters {
    pub viewport: ViewportSize,
    pub font: FontDescriptor,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
    pub alignment: Alignment,
    pub header_reserved_height: f32,
    pub footer_reserved_height: f32,
}

impl LayoutParameters {
    pub fn new(viewport: ViewportSize, font: FontDescriptor) -> Self {
        Self {
            viewport,
            font,
            line_spacing: 6.0,
            paragraph_spacing: 0.0,
            alignment: Alignment::Justified,
            header_reserved_height: 24.0,
            footer_reserved_height: 24.0,
        }
    }

    pub fn from_preferences(viewport: ViewportSize, prefs: &ReaderPreferences) -> Self {
        Self::new(
            viewport,
            FontDescriptor::new(prefs.font_family.clone(), prefs.font_size),
        )
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font: self.font.clone(),
            line_spacing: self.line_spacing,
            paragraph_spacing: self.paragraph_spacing,
            alignment: self.alignment,
        }
    }

    /// Text box of every page after the first.
    pub fn body_frame(&self) -> FrameSize {
        FrameSize {
            width: self.viewport.width.max(0.0),
            height: (self.viewport.height
                - self.header_reserved_height
                - self.footer_reserved_height)
                .max(0.0),
        }
    }

    pub fn title_font(&self) -> FontDescriptor {
        self.font.scaled(TITLE_SCALE)
    }

    /// Vertical space the first page gives to the chapter title block.
    pub fn title_block_height<M: TextMeasurer + ?Sized>(&self, measurer: &M, title: &str) -> f32 {
        let title = title.trim();
        if title.is_empty() {
            return 0.0;
        }
        let frame = self.body_frame();
        measurer.wrapped_height(title, &self.title_font(), frame.width, self.line_spacing)
            + TITLE_MARGIN_TOP
            + TITLE_MARGIN_BOTTOM
    }

    /// Text box of the first page: the body box minus the title block.
    pub fn first_page_frame<M: TextMeasurer + ?Sized>(&self, measurer: &M, title: &str) -> FrameSize {
        let body = self.body_frame();
        FrameSize {
            width: body.width,
            height: (body.height - self.title_block_height(measurer, title)).max(0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font: FontDescriptor,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
    pub alignment: Alignment,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

/// Result of setting text into one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameLayout {
    /// Byte offsets where each laid-out line ends, ascending.
    pub line_ends: Vec<usize>,
    /// Byte offset up to which the frame shows text. May fall inside a line
    /// when the measurer clips the last line.
    pub visible_end: usize,
}

/// Host text-measurement capability.
pub trait TextMeasurer: Send + Sync {
    /// Byte offsets, strictly ascending, at which successive lines of `text`
    /// end when wrapped to `max_width`. A `'\n'` ends its line, and the last
    /// offset is `text.len()` for non-empty text.
    fn line_breaks(&self, text: &str, font: &FontDescriptor, max_width: f32) -> Vec<usize>;

    /// Height of one line set in `font`, without extra spacing.
    fn line_height(&self, font: &FontDescriptor) -> f32;

    fn wrapped_height(
        &self,
        text: &str,
        font: &FontDescriptor,
        max_width: f32,
        line_spacing: f32,
    ) -> f32 {
        let lines = self.line_breaks(text, font, max_width).len();
        if lines == 0 {
            return 0.0;
        }
        lines as f32 * self.line_height(font) + (lines - 1) as f32 * line_spacing
    }

    /// Sets as much of `text` as fits into `frame`. Platform measurers with
    /// their own framesetter can override this.
    fn layout_frame(&self, text: &str, style: &TextStyle, frame: FrameSize) -> FrameLayout {
        fill_frame(self, text, style, frame)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    /// Byte offset of the page's first character in the chapter text.
    pub start_offset: usize,
    pub text: String,
}

impl Page {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn end_offset(&self) -> usize {
        self.start_offset + self.text.len()
    }
}

/// Pages of one chapter for one [`LayoutParameters`]. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pages: Vec<Page>,
}

impl Pagination {
    pub(crate) fn from_pages(mut pages: Vec<Page>) -> Self {
        if pages.is_empty() {
            pages.push(Page {
                index: 0,
                start_offset: 0,
                text: String::new(),
            });
        }
        Self { pages }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn last_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    pub fn texts(&self) -> Vec<&str> {
        self.pages.iter().map(|p| p.text.as_str()).collect()
    }
}

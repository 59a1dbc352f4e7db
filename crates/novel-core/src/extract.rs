//! Chapter markup to plain text.
//!
//! The extractor only knows about markup: it finds the body container named by
//! the [`SiteProfile`], drops boilerplate nodes, turns block structure into line
//! breaks and cuts known site banners. Paragraph shaping belongs to
//! [`crate::normalize`].

mod entities;
mod error;
mod html;
mod markers;
mod toc;


use crate::config::SiteProfile;
use crate::normalize::title_key;

pub use entities::decode_entities;
pub use error::ExtractError;
pub use toc::{parse_book_info, parse_chapter_list, BookInfo};

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

pub fn extract(
    raw_html: &str,
    chapter_title: &str,
    profile: &SiteProfile,
) -> Result<String, ExtractError> {
    let document = html::parse_document(raw_html)?;
    let container = html::select_first(&document, &profile.content_selector)?
        .ok_or(ExtractError::ContentNotFound)?;

    for selector in &profile.boilerplate_selectors {
        let removed = html::remove_matching(&container, selector)?;
        if removed > 0 {
            log::debug!("removed {} `{}` node(s) from chapter body", removed, selector);
        }
    }
    remove_title_headings(&container, chapter_title)?;

    let text = html::block_text(&container);
    let text = decode_entities(&text);
    let text = markers::cut_trailing(&text, &profile.trailing_markers);
    let text = match profile.leading_marker.as_deref() {
        Some(marker) => markers::cut_leading(text, marker),
        None => text,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::ContentNotFound);
    }
    Ok(text.to_string())
}

fn remove_title_headings(
    container: &kuchiki::NodeRef,
    chapter_title: &str,
) -> Result<(), ExtractError> {
    let key = title_key(chapter_title);
    if key.is_empty() {
        return Ok(());
    }
    let headings = html::select_all(container, HEADING_SELECTOR)?;
    for heading in headings {
        if title_key(&heading.text_contents()).contains(&key) {
            heading.detach();
        }
    }
    Ok(())
}

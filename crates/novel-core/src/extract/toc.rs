use reqwest::Url;

use crate::config::SiteProfile;
use crate::types::ChapterLink;

use super::html;
use super::ExtractError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

const AUTHOR_PREFIXES: [&str; 3] = ["作者：", "作者:", "作者"];

/// Chapter anchors of a table-of-contents page, in document order, with links
/// resolved against `base_url`. Anchors without `href` and the "expand all
/// chapters" placeholder are skipped.
pub fn parse_chapter_list(
    raw_html: &str,
    base_url: &str,
    profile: &SiteProfile,
) -> Result<Vec<ChapterLink>, ExtractError> {
    let base =
        Url::parse(base_url).map_err(|_| ExtractError::InvalidBaseUrl(base_url.to_string()))?;
    let document = html::parse_document(raw_html)?;
    let anchors = html::select_all(&document, &profile.chapter_list_selector)?;

    let mut links = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        let Some(href) = html::attr(&anchor, "href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") {
            continue;
        }
        let title = collapse_whitespace(&anchor.text_contents());
        if !profile.expand_placeholder.is_empty() && title.contains(&profile.expand_placeholder) {
            continue;
        }
        let link = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(err) => {
                log::debug!("skipping chapter link `{}`: {}", href, err);
                continue;
            }
        };
        links.push(ChapterLink { title, link });
    }
    Ok(links)
}

pub fn parse_book_info(raw_html: &str, profile: &SiteProfile) -> Result<BookInfo, ExtractError> {
    let document = html::parse_document(raw_html)?;
    let title = html::select_first(&document, &profile.book_title_selector)?
        .map(|node| node_value(&node))
        .filter(|t| !t.is_empty());
    let author = html::select_first(&document, &profile.book_author_selector)?
        .map(|node| strip_author_prefix(&node_value(&node)))
        .filter(|a| !a.is_empty());
    Ok(BookInfo { title, author })
}

// `<meta content=..>` carries its value in an attribute; everything else in text.
fn node_value(node: &kuchiki::NodeRef) -> String {
    if html::tag_name(node).as_deref() == Some("meta") {
        return html::attr(node, "content")
            .map(|c| collapse_whitespace(&c))
            .unwrap_or_default();
    }
    collapse_whitespace(&node.text_contents())
}

fn strip_author_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    for prefix in AUTHOR_PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

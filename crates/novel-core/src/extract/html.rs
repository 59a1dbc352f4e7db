use kuchiki::{traits::*, NodeRef, Selectors};

use super::ExtractError;

pub(super) fn parse_document(raw_html: &str) -> Result<NodeRef, ExtractError> {
    // html5ever recovers from any tag soup, so the only input it cannot give us a
    // tree for is input that has no markup at all.
    if !raw_html.contains('<') {
        return Err(ExtractError::MalformedMarkup(
            "document contains no markup".into(),
        ));
    }
    Ok(kuchiki::parse_html().one(raw_html.to_string()))
}

fn compile(selector: &str) -> Result<Selectors, ExtractError> {
    Selectors::compile(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))
}

pub(super) fn select_first(node: &NodeRef, selector: &str) -> Result<Option<NodeRef>, ExtractError> {
    let selectors = compile(selector)?;
    let found = selectors
        .filter(node.descendants().elements())
        .next()
        .map(|el| el.as_node().clone());
    Ok(found)
}

pub(super) fn select_all(node: &NodeRef, selector: &str) -> Result<Vec<NodeRef>, ExtractError> {
    let selectors = compile(selector)?;
    Ok(selectors
        .filter(node.descendants().elements())
        .map(|el| el.as_node().clone())
        .collect())
}

/// Detaches every descendant matching `selector`; returns how many went.
pub(super) fn remove_matching(node: &NodeRef, selector: &str) -> Result<usize, ExtractError> {
    let matches = select_all(node, selector)?;
    for found in &matches {
        found.detach();
    }
    Ok(matches.len())
}

pub(super) fn attr(node: &NodeRef, name: &str) -> Option<String> {
    let el = node.as_element()?;
    let attrs = el.attributes.borrow();
    attrs.get(name).map(|s| s.to_string())
}

pub(super) fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|el| el.name.local.to_lowercase())
}

/// Text of `node` with `br`, `p` and `div` turned into line breaks and every
/// other tag dropped.
pub(super) fn block_text(node: &NodeRef) -> String {
    let mut out = String::new();
    for child in node.children() {
        append_block_text(&child, &mut out);
    }
    out
}

fn append_block_text(node: &NodeRef, out: &mut String) {
    if let Some(text) = node.as_text() {
        let text = text.borrow();
        // Source indentation between tags, not content.
        if text.trim().is_empty() && text.contains(['\n', '\r']) {
            return;
        }
        for ch in text.chars() {
            match ch {
                '\r' | '\n' | '\t' | '\u{00A0}' => out.push(' '),
                _ => out.push(ch),
            }
        }
        return;
    }
    let Some(el) = node.as_element() else {
        for child in node.children() {
            append_block_text(&child, out);
        }
        return;
    };
    let tag = el.name.local.to_lowercase();
    match tag.as_str() {
        "br" => out.push('\n'),
        "script" | "style" | "noscript" => {}
        "p" | "div" => {
            out.push('\n');
            for child in node.children() {
                append_block_text(&child, out);
            }
            out.push('\n');
        }
        _ => {
            for child in node.children() {
                append_block_text(&child, out);
            }
        }
    }
}

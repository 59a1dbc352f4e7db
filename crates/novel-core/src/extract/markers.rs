/// Cuts everything from the earliest occurrence of any marker onward.
pub(super) fn cut_trailing<'a>(text: &'a str, markers: &[String]) -> &'a str {
    let cut = markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| text.find(m.as_str()))
        .min();
    match cut {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// Drops a leading block that runs from the document start through the first
/// blank line following `marker`. The marker must sit on the first non-blank
/// line; anywhere later it is body text. Text without a blank line after the
/// marker is left alone.
pub(super) fn cut_leading<'a>(text: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return text;
    }
    let mut line_start = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            line_start += line.len();
            continue;
        }
        let Some(rel) = line.find(marker) else {
            return text;
        };
        return match blank_line_end(text, line_start + rel + marker.len()) {
            Some(end) => &text[end..],
            None => text,
        };
    }
    text
}

// Byte offset just past the first blank line at or after `from`.
fn blank_line_end(text: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(rel) = text[search..].find('\n') {
        let line_start = search + rel + 1;
        let rest = &text[line_start..];
        let line_len = rest.find('\n')?;
        if rest[..line_len].trim().is_empty() {
            return Some(line_start + line_len + 1);
        }
        search = line_start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_cut_uses_earliest_marker() {
        let markers = vec!["END".to_string(), "stop".to_string()];
        assert_eq!(cut_trailing("body stop more END tail", &markers), "body ");
        assert_eq!(cut_trailing("body only", &markers), "body only");
    }

    #[test]
    fn leading_block_runs_to_blank_line() {
        let text = "相关推荐：a b c\nd e\n\n正文开始\n\n第二段";
        assert_eq!(cut_leading(text, "相关推荐"), "正文开始\n\n第二段");
    }

    #[test]
    fn leading_block_tolerates_whitespace_only_blank_line() {
        let text = "\n相关推荐 x\n \n正文";
        assert_eq!(cut_leading(text, "相关推荐"), "正文");
    }

    #[test]
    fn marker_inside_the_body_is_not_a_leading_block() {
        let text = "\n第一段\n\n第二段\n\n相关推荐：某书\n\n第三段";
        assert_eq!(cut_leading(text, "相关推荐"), text);
    }

    #[test]
    fn leading_marker_without_blank_line_is_kept() {
        let text = "相关推荐 only one paragraph";
        assert_eq!(cut_leading(text, "相关推荐"), text);
    }
}

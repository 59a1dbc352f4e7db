//! Paragraph shaping for extracted chapter text.


/// Two ideographic spaces, the customary first-line indent for CJK prose.
pub const PARAGRAPH_INDENT: &str = "\u{3000}\u{3000}";
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Turns extractor output into the canonical chapter text: one paragraph per
/// non-empty line, each indented, joined by a blank line. Lines that echo the
/// chapter title are dropped. Blank runs of any length vanish, so paragraphs
/// are never separated by more than one empty line.
///
/// Re-normalizing the output yields the same string.
pub fn normalize(extracted: &str, chapter_title: &str) -> String {
    let title = chapter_title.trim();
    let key = title_key(title);

    let mut paragraphs: Vec<String> = Vec::new();
    for line in extracted.lines() {
        let line = line.trim();
        if line.is_empty() || is_title_echo(line, title, &key) {
            continue;
        }
        let mut paragraph = String::with_capacity(PARAGRAPH_INDENT.len() + line.len());
        paragraph.push_str(PARAGRAPH_INDENT);
        push_collapsed(&mut paragraph, line);
        paragraphs.push(paragraph);
    }
    paragraphs.join(PARAGRAPH_SEPARATOR)
}

/// Title with whitespace and punctuation removed, used for echo detection.
pub fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|ch| !ch.is_whitespace() && !is_punctuation(*ch))
        .collect()
}

fn is_title_echo(line: &str, title: &str, key: &str) -> bool {
    if !title.is_empty() && line == title {
        return true;
    }
    !key.is_empty() && title_key(line).contains(key)
}

// Runs of spaces (ASCII or tab) collapse to one.
fn push_collapsed(out: &mut String, line: &str) {
    let mut in_space = false;
    for ch in line.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
}

fn is_punctuation(ch: char) -> bool {
    ch.is_ascii_punctuation()
        || matches!(ch,
            '\u{00A1}'..='\u{00BF}'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{205E}'
            | '\u{3000}'..='\u{303F}'
            | '\u{FE30}'..='\u{FE4F}'
            | '\u{FF01}'..='\u{FF0F}'
            | '\u{FF1A}'..='\u{FF20}'
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}')
}

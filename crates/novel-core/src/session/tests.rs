use std::collections::HashMap;

use super::*;
use crate::config::SiteProfile;
use crate::layout::{FixedAdvanceMeasurer, FontDescriptor, ViewportSize};
use crate::source::{Fetcher, NetworkError};
use crate::types::ChapterLink;

const WAIT: Duration = Duration::from_secs(5);

struct MapFetcher(HashMap<String, String>);

impl Fetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.0
            .get(url)
            .map(|s| s.clone().into_bytes())
            .ok_or(NetworkError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn session(titles: &[&str], pages: &[(usize, &str)], options: SessionOptions) -> ReadingSession {
    let links: Vec<ChapterLink> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| ChapterLink {
            title: (*t).to_string(),
            link: format!("mem://{}", i),
        })
        .collect();
    let map = pages
        .iter()
        .map(|(i, body)| {
            (
                format!("mem://{}", i),
                format!("<div id=\"content\">{}</div>", body),
            )
        })
        .collect();
    let source = ChapterSource::new(MapFetcher(map), SiteProfile::default());
    let layout = LayoutParameters::new(
        ViewportSize::new(400.0, 800.0),
        FontDescriptor::new("serif", 16.0),
    );
    ReadingSession::new(
        Book::new("Book", None, "mem://book", links),
        Arc::new(source),
        Arc::new(FixedAdvanceMeasurer::default()),
        layout,
        options,
    )
}

fn one_page() -> Pagination {
    Pagination::from_pages(Vec::new())
}

fn pages(n: usize) -> Pagination {
    Pagination::from_pages(
        (0..n)
            .map(|i| Page {
                index: i,
                start_offset: i,
                text: "x".into(),
            })
            .collect(),
    )
}

#[test]
fn landing_page_follows_entry_direction() {
    let p = pages(5);
    assert_eq!(LoadIntent::Forward.landing_page(&p), 0);
    assert_eq!(LoadIntent::Jump.landing_page(&p), 0);
    assert_eq!(LoadIntent::Backward.landing_page(&p), 4);
    assert_eq!(LoadIntent::Restore(3).landing_page(&p), 3);
    assert_eq!(LoadIntent::Restore(40).landing_page(&p), 4);
    assert_eq!(LoadIntent::Backward.landing_page(&one_page()), 0);
}

#[test]
fn progress_fraction_spans_first_to_last_page() {
    assert_eq!(progress_fraction(0, 0), 0.0);
    assert_eq!(progress_fraction(0, 1), 0.0);
    assert_eq!(progress_fraction(0, 5), 0.0);
    assert_eq!(progress_fraction(2, 5), 0.5);
    assert_eq!(progress_fraction(4, 5), 1.0);
}

#[test]
fn open_empty_book_fails() {
    let mut s = session(&[], &[], SessionOptions::default());
    assert_eq!(s.open(), Err(SessionError::EmptyBook));
    assert_eq!(s.state(), &SessionState::Idle);
}

#[test]
fn open_skips_leading_placeholder() {
    let mut s = session(
        &["展开全部章节", "第一章"],
        &[(1, "正文")],
        SessionOptions::default(),
    );
    s.open().expect("open");
    assert_eq!(s.current_chapter_index(), 1);
    assert!(s.wait_for_load(WAIT));
    assert_eq!(s.state(), &SessionState::Ready);
    assert_eq!(s.current_pages(), vec!["\u{3000}\u{3000}正文"]);
}

#[test]
fn restore_clamps_saved_page() {
    let options = SessionOptions::default().with_position(Some(ReadingPosition::new(1, 99)));
    let mut s = session(&["一", "二"], &[(0, "a"), (1, "b")], options);
    s.open().expect("open");
    assert!(s.wait_for_load(WAIT));
    assert_eq!(s.position(), ReadingPosition::new(1, 0));
}

#[test]
fn restore_disabled_starts_at_first_chapter() {
    let options = SessionOptions {
        restore_progress: false,
        ..SessionOptions::default()
    }
    .with_position(Some(ReadingPosition::new(1, 0)));
    let mut s = session(&["一", "二"], &[(0, "a"), (1, "b")], options);
    s.open().expect("open");
    assert_eq!(s.current_chapter_index(), 0);
}

#[test]
fn out_of_range_load_is_rejected() {
    let mut s = session(&["一"], &[(0, "a")], SessionOptions::default());
    assert_eq!(
        s.load_chapter(3),
        Err(SessionError::InvalidChapterIndex { index: 3, len: 1 })
    );
    assert_eq!(s.state(), &SessionState::Idle);
}

#[test]
fn page_turns_need_loaded_pages() {
    let mut s = session(&["一"], &[], SessionOptions::default());
    assert_eq!(s.next_page(), PageTurn::NotReady);
    s.open().expect("open");
    assert!(s.wait_for_load(WAIT));
    assert!(s.error_message().is_some());
    assert_eq!(s.previous_page(), PageTurn::NotReady);
    assert_eq!(s.total_pages(), 0);
}

#[test]
fn excerpt_collapses_whitespace() {
    let mut s = session(&["一"], &[(0, "<p>alpha   beta</p><p>gamma</p>")], SessionOptions::default());
    s.open().expect("open");
    assert!(s.wait_for_load(WAIT));
    assert_eq!(s.current_excerpt(10).as_deref(), Some("alpha beta"));
}

#[test]
fn saved_position_on_a_placeholder_restores_the_next_readable_chapter() {
    let options = SessionOptions::default().with_position(Some(ReadingPosition::new(1, 3)));
    let mut s = session(
        &["一", "展开全部章节", "二"],
        &[(0, "<p>a</p>"), (2, "<p>b</p>")],
        options,
    );
    s.open().expect("open");
    assert!(s.wait_for_load(WAIT));
    assert_eq!(s.state(), &SessionState::Ready);
    assert_eq!(s.position(), ReadingPosition::new(2, 0));
}

#[test]
fn http_failure_is_retryable() {
    // Unserved pages come back as HTTP 404.
    let mut s = session(&["一"], &[], SessionOptions::default());
    s.open().expect("open");
    assert!(s.wait_for_load(WAIT));
    assert!(matches!(
        s.state(),
        SessionState::Error { chapter: 0, retryable: true, .. }
    ));
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use novel_core::layout::{FontDescriptor, ViewportSize};
use novel_core::types::{Book, ChapterLink};
use novel_core::{
    ChapterSource, Fetcher, LayoutParameters, NetworkError, ReadingSession, SessionOptions,
    SiteProfile, TextMeasurer,
};

pub const BOOK_URL: &str = "https://novel.test/book/";

pub fn chapter_url(index: usize) -> String {
    format!("{}{}.html", BOOK_URL, index)
}

/// A chapter page in the default site layout.
pub fn chapter_html(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
    format!(
        "<html><body><div id=\"content\">{}<p class=\"ad\">广告</p></div></body></html>",
        body
    )
}

#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

/// In-memory site. Counts requests per URL and can hold a URL's response
/// until [`ScriptedFetcher::release`] is called.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Result<String, NetworkError>>>,
    calls: Mutex<HashMap<String, usize>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

impl ScriptedFetcher {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, html: impl Into<String>) {
        self.responses
            .lock()
            .expect("responses")
            .insert(url.to_string(), Ok(html.into()));
    }

    pub fn fail(&self, url: &str, err: NetworkError) {
        self.responses
            .lock()
            .expect("responses")
            .insert(url.to_string(), Err(err));
    }

    pub fn hold(&self, url: &str) {
        self.gates
            .lock()
            .expect("gates")
            .insert(url.to_string(), Arc::new(Gate::default()));
    }

    pub fn release(&self, url: &str) {
        if let Some(gate) = self.gates.lock().expect("gates").remove(url) {
            *gate.open.lock().expect("gate") = true;
            gate.cv.notify_all();
        }
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .expect("calls")
            .get(url)
            .copied()
            .unwrap_or(0)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        *self
            .calls
            .lock()
            .expect("calls")
            .entry(url.to_string())
            .or_default() += 1;

        let gate = self.gates.lock().expect("gates").get(url).cloned();
        if let Some(gate) = gate {
            let mut open = gate.open.lock().expect("gate");
            while !*open {
                open = gate.cv.wait(open).expect("gate wait");
            }
        }

        match self.responses.lock().expect("responses").get(url) {
            Some(Ok(html)) => Ok(html.clone().into_bytes()),
            Some(Err(err)) => Err(err.clone()),
            None => Err(NetworkError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// One line per `'\n'`-terminated run of text, 10pt tall, any width.
pub struct LineMeasurer;

impl TextMeasurer for LineMeasurer {
    fn line_breaks(&self, text: &str, _font: &FontDescriptor, _max_width: f32) -> Vec<usize> {
        let mut ends: Vec<usize> = text.match_indices('\n').map(|(i, _)| i + 1).collect();
        if !text.is_empty() && ends.last() != Some(&text.len()) {
            ends.push(text.len());
        }
        ends
    }

    fn line_height(&self, _font: &FontDescriptor) -> f32 {
        10.0
    }
}

/// Viewport showing `lines` lines of [`LineMeasurer`] text per page.
pub fn lines_layout(lines: usize) -> LayoutParameters {
    LayoutParameters {
        viewport: ViewportSize::new(200.0, lines as f32 * 10.0),
        font: FontDescriptor::new("mono", 10.0),
        line_spacing: 0.0,
        paragraph_spacing: 0.0,
        alignment: Default::default(),
        header_reserved_height: 0.0,
        footer_reserved_height: 0.0,
    }
}

pub fn book(titles: &[&str]) -> Book {
    let links = titles
        .iter()
        .enumerate()
        .map(|(i, t)| ChapterLink {
            title: (*t).to_string(),
            link: chapter_url(i),
        })
        .collect();
    Book::new("测试之书", None, BOOK_URL, links)
}

/// Session over `fetcher` with three [`LineMeasurer`] lines per page.
pub fn session(
    fetcher: &Arc<ScriptedFetcher>,
    titles: &[&str],
    options: SessionOptions,
) -> ReadingSession {
    let source = ChapterSource::new(Arc::clone(fetcher), SiteProfile::default());
    ReadingSession::new(
        book(titles),
        Arc::new(source),
        Arc::new(LineMeasurer),
        lines_layout(3),
        options,
    )
}

pub fn numbered_titles(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("第{}章", i)).collect()
}

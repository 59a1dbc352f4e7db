//! Background chapter loading.
//!
//! Each job runs on its own worker thread: fetch, extract, normalize and, for
//! a chapter the reader is waiting on, paginate. Outcomes come back over one
//! channel that only the owning session drains.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::layout::{paginate, LayoutParameters, Pagination, TextMeasurer};
use crate::source::{ChapterSource, LoadError, NetworkError};
use crate::types::{Chapter, ChapterText};

pub struct FetchJob {
    pub chapter: Chapter,
    /// Bumped whenever the chapter list is replaced; stale outcomes are dropped.
    pub generation: u64,
    /// Layout to paginate with on the worker, for foreground loads.
    pub layout: Option<LayoutParameters>,
}

#[derive(Debug, Clone)]
pub struct PreparedChapter {
    pub text: ChapterText,
    /// Pages computed on the worker together with the layout they were
    /// computed for.
    pub pages: Option<(LayoutParameters, Pagination)>,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub chapter_index: usize,
    pub generation: u64,
    pub result: Result<PreparedChapter, LoadError>,
}

pub struct FetchDispatcher {
    source: Arc<ChapterSource>,
    measurer: Arc<dyn TextMeasurer>,
    tx: Sender<FetchOutcome>,
    rx: Receiver<FetchOutcome>,
}

impl FetchDispatcher {
    pub fn new(source: Arc<ChapterSource>, measurer: Arc<dyn TextMeasurer>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            measurer,
            tx,
            rx,
        }
    }

    /// Starts a worker for `job`. Fails only if the thread cannot be spawned.
    pub fn spawn(&self, job: FetchJob) -> Result<(), LoadError> {
        let source = Arc::clone(&self.source);
        let measurer = Arc::clone(&self.measurer);
        let tx = self.tx.clone();
        let index = job.chapter.ordinal_index;
        thread::Builder::new()
            .name(format!("chapter-{}", index))
            .spawn(move || {
                let result = run_job(&source, measurer.as_ref(), &job);
                let outcome = FetchOutcome {
                    chapter_index: index,
                    generation: job.generation,
                    result,
                };
                // The session may be gone; nobody is left to care.
                let _ = tx.send(outcome);
            })
            .map(|_| ())
            .map_err(|err| {
                LoadError::Network(NetworkError::Transport(format!(
                    "could not start fetch worker: {}",
                    err
                )))
            })
    }

    pub fn try_recv(&self) -> Option<FetchOutcome> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FetchOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            // Unreachable while `self.tx` is alive.
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn run_job(
    source: &ChapterSource,
    measurer: &dyn TextMeasurer,
    job: &FetchJob,
) -> Result<PreparedChapter, LoadError> {
    let text = source.load_text(&job.chapter)?;
    let pages = job.layout.as_ref().map(|layout| {
        let pagination = paginate(&text, layout, &job.chapter.title, measurer);
        (layout.clone(), pagination)
    });
    Ok(PreparedChapter { text, pages })
}

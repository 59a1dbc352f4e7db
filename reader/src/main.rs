use std::{
    env,
    io::{self, BufRead, Write},
    sync::Arc,
    time::Duration,
};

use novel_core::{
    layout::ViewportSize,
    types::Bookmark,
    ChapterSource, FixedAdvanceMeasurer, HttpFetcher, LayoutParameters, PageTurn, ReaderConfig,
    ReadingSession, SessionOptions, SessionState, StateStore,
};

const EXCERPT_CHARS: usize = 40;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(book_url) = args.get(1).cloned() else {
        eprintln!("usage: novel-reader <book index URL>");
        return;
    };
    let viewport = ViewportSize::new(
        env_f32("NOVEL_READER_WIDTH").unwrap_or(360.0),
        env_f32("NOVEL_READER_HEIGHT").unwrap_or(640.0),
    );
    let load_timeout = Duration::from_secs(
        env::var("NOVEL_READER_WAIT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30),
    );

    let config = match ReaderConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to read config, using defaults: {}", e);
            ReaderConfig::default()
        }
    };
    let store = StateStore::open_default();
    let mut prefs = store
        .as_ref()
        .map(StateStore::load_preferences)
        .unwrap_or_default();

    let fetcher = match HttpFetcher::new(&config.fetch) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to set up HTTP client: {}", e);
            return;
        }
    };
    let source = Arc::new(ChapterSource::new(fetcher, config.site.clone()));
    let book = match source.open_book(&book_url) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to open {}: {}", book_url, e);
            return;
        }
    };
    println!(
        "{}{} ({} chapters)",
        book.title,
        book.author
            .as_deref()
            .map(|a| format!(" / {}", a))
            .unwrap_or_default(),
        book.chapter_count()
    );

    let saved = store.as_ref().and_then(|s| s.load_position(&book.id));
    let options = SessionOptions::from_config(&config).with_position(saved);
    let layout = LayoutParameters::from_preferences(viewport, &prefs);
    let mut session = ReadingSession::new(
        book,
        source,
        Arc::new(FixedAdvanceMeasurer::default()),
        layout,
        options,
    );
    if let Err(e) = session.open() {
        eprintln!("Nothing to read: {}", e);
        return;
    }
    session.wait_for_load(load_timeout);
    show(&session);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("n");
        let arg = parts.next();
        match cmd {
            "q" => break,
            "n" => report_turn(session.next_page()),
            "p" => report_turn(session.previous_page()),
            "N" => report_turn(session.next_chapter()),
            "P" => report_turn(session.previous_chapter()),
            "g" => match arg.and_then(|a| a.parse::<usize>().ok()) {
                Some(n) if n > 0 => {
                    if let Err(e) = session.jump_to_chapter(n - 1) {
                        println!("{}", e);
                    }
                }
                _ => println!("usage: g <chapter number>"),
            },
            "j" => match arg.and_then(|a| a.parse::<f32>().ok()) {
                Some(pct) => {
                    session.jump_to_progress(pct / 100.0);
                }
                None => println!("usage: j <percent>"),
            },
            "r" => {
                if let Err(e) = session.retry_load_current_chapter() {
                    println!("{}", e);
                }
            }
            "f" => match arg.and_then(|a| a.parse::<f32>().ok()) {
                Some(size) if size > 0.0 => {
                    prefs.font_size = size;
                    session.set_layout(LayoutParameters::from_preferences(viewport, &prefs));
                    if let Some(store) = &store {
                        if let Err(e) = store.save_preferences(&prefs) {
                            eprintln!("Failed to save preferences: {}", e);
                        }
                    }
                }
                _ => println!("usage: f <font size>"),
            },
            "b" => add_bookmark(&session, store.as_ref()),
            "B" => list_bookmarks(&session, store.as_ref()),
            "l" => list_chapters(&session),
            _ => {
                println!("commands: n p N P g<num> j<pct> f<size> r b B l q");
                continue;
            }
        }
        if session.is_loading() {
            session.wait_for_load(load_timeout);
        }
        session.poll();
        show(&session);
    }

    if let Some(store) = &store {
        match store.save_position(session.book(), session.position()) {
            Ok(()) => log::debug!("saved position {:?}", session.position()),
            Err(e) => eprintln!("Failed to save reading position: {}", e),
        }
    }
}

fn env_f32(name: &str) -> Option<f32> {
    env::var(name).ok().and_then(|s| s.parse::<f32>().ok())
}

fn show(session: &ReadingSession) {
    let title = session.chapter_title().unwrap_or_default();
    match session.state() {
        SessionState::Ready => {
            let text = session
                .current_page()
                .map(|p| p.text.as_str())
                .unwrap_or_default();
            println!("── {} ──", title);
            println!("{}", text);
            println!(
                "── {}/{} · {:.0}% ──",
                session.current_page_index() + 1,
                session.total_pages(),
                session.progress() * 100.0
            );
        }
        SessionState::Fetching { .. } => println!("Loading {}…", title),
        SessionState::Error {
            message, retryable, ..
        } => {
            if *retryable {
                println!("Failed to load {}: {} (r to retry)", title, message)
            } else {
                println!("Failed to load {}: {}", title, message)
            }
        }
        SessionState::Idle => {}
    }
    if let Err(e) = io::stdout().flush() {
        eprintln!("Failed to flush output: {}", e);
    }
}

fn report_turn(turn: PageTurn) {
    match turn {
        PageTurn::AtStart => println!("Already at the first chapter."),
        PageTurn::AtEnd => println!("End of book."),
        PageTurn::Page(_) | PageTurn::Chapter(_) | PageTurn::NotReady => {}
    }
}

fn add_bookmark(session: &ReadingSession, store: Option<&StateStore>) {
    let Some(store) = store else {
        println!("No config directory; bookmarks are unavailable.");
        return;
    };
    let Some(excerpt) = session.current_excerpt(EXCERPT_CHARS) else {
        println!("Nothing to bookmark yet.");
        return;
    };
    let mark = Bookmark::new(
        session.position(),
        session.chapter_title().unwrap_or_default(),
        excerpt,
    );
    match store.add_bookmark(session.book(), mark) {
        Ok(()) => println!("Bookmarked."),
        Err(e) => eprintln!("Failed to save bookmark: {}", e),
    }
}

fn list_bookmarks(session: &ReadingSession, store: Option<&StateStore>) {
    let marks = store
        .map(|s| s.bookmarks(&session.book().id))
        .unwrap_or_default();
    if marks.is_empty() {
        println!("No bookmarks.");
    }
    for mark in marks {
        println!(
            "{} p{}  {}  {}",
            mark.chapter_title,
            mark.position.page_index + 1,
            mark.excerpt,
            mark.created_at
        );
    }
}

fn list_chapters(session: &ReadingSession) {
    let current = session.current_chapter_index();
    let chapters = session.book().chapters();
    let start = current.saturating_sub(5);
    let end = (current + 6).min(chapters.len());
    for chapter in &chapters[start..end] {
        let marker = if chapter.ordinal_index == current { ">" } else { " " };
        println!("{} {:>4} {}", marker, chapter.ordinal_index + 1, chapter.title);
    }
}

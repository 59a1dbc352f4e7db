pub mod cache;
pub mod config;
pub mod dispatch;
pub mod extract;
pub mod layout;
pub mod normalize;
pub mod session;
pub mod source;
pub mod state;
pub mod types;

pub use cache::PreloadCache;
pub use config::{ReaderConfig, SiteProfile};
pub use layout::{paginate, FixedAdvanceMeasurer, LayoutParameters, Page, Pagination, TextMeasurer};
pub use session::{PageTurn, ReadingSession, SessionError, SessionEvent, SessionOptions, SessionState};
pub use source::{ChapterSource, Fetcher, HttpFetcher, LoadError, NetworkError};
pub use state::StateStore;

use std::{fs, io, path::PathBuf, time::Duration};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const QUALIFIER: &str = "com";
pub const ORGANIZATION: &str = "novel";
pub const APPLICATION: &str = "novel-reader";

const CONFIG_FILE: &str = "config.toml";

pub fn config_root() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).map(|p| p.config_dir().to_path_buf())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub site: SiteProfile,
    pub preload: PreloadConfig,
    pub fetch: FetchConfig,
    pub restore_progress: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            site: SiteProfile::default(),
            preload: PreloadConfig::default(),
            fetch: FetchConfig::default(),
            restore_progress: true,
        }
    }
}

impl ReaderConfig {
    /// Reads `config.toml` from the config root; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(root) = config_root() else {
            return Ok(Self::default());
        };
        let path = root.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Where a content site keeps chapter text, and what it wraps around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub content_selector: String,
    pub boilerplate_selectors: Vec<String>,
    /// Everything from the first occurrence of any of these onward is dropped.
    pub trailing_markers: Vec<String>,
    /// Text up to the first blank line after this phrase is dropped.
    pub leading_marker: Option<String>,
    pub chapter_list_selector: String,
    pub expand_placeholder: String,
    pub book_title_selector: String,
    pub book_author_selector: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            content_selector: "#content".into(),
            boilerplate_selectors: vec![
                "script".into(),
                "style".into(),
                "p.ad".into(),
                "div.ad".into(),
                "div.footer".into(),
                "div.bottem".into(),
            ],
            trailing_markers: vec!["请收藏本站".into(), "天才一秒记住本站地址".into()],
            leading_marker: Some("相关推荐".into()),
            chapter_list_selector: "#list dd a".into(),
            expand_placeholder: "展开全部章节".into(),
            book_title_selector: "#info h1".into(),
            book_author_selector: "meta[property=\"og:novel:author\"]".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    pub ahead: usize,
    pub behind: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            ahead: 2,
            behind: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: concat!("novel-reader/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

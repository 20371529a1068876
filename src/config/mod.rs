//! Configuration management for Freshet.
//!
//! Configuration is read from `~/.config/freshet/config.toml` unless a path is
//! given explicitly. If the default file doesn't exist, one with comments and
//! no sources is created.

pub mod fetch;
pub mod state;

pub use fetch::FetchConfig;
pub use state::{MarkAllScope, StateConfig};

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::domain::Source;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub state: StateConfig,
    pub sources: Vec<Source>,
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// An explicit path must exist. A missing default file is created with
    /// comments and the default configuration is returned.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::parse(&content, &config_path)
    }

    /// Parse and validate TOML content; `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/freshet/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("freshet").join("config.toml"))
    }

    pub fn source_urls(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.url.clone()).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            Url::parse(&source.url).map_err(|e| ConfigError::InvalidSourceUrl {
                url: source.url.clone(),
                source: e,
            })?;
            if !seen.insert(source.url.as_str()) {
                return Err(ConfigError::DuplicateSource(source.url.clone()));
            }
            if source.selectors.is_empty() {
                return Err(ConfigError::NoSelectors(source.url.clone()));
            }
        }
        Ok(())
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Freshet Configuration

[fetch]
# Per-request timeout in seconds
timeout_secs = 30

# Limit on sources checked at the same time (unbounded when unset)
# max_concurrency = 8

[state]
# SQLite file holding seen and read items (default: data dir)
# db_path = "/path/to/state.sqlite3"

# What "read-all" marks: "global" (every unread item) or
# "configured" (only items of the sources below)
mark_all_scope = "global"

# Each source is a page or feed plus one or more selectors.
# `document_type` ("html" or "xml") picks the parser. Selectors come in
# two kinds, and either works with either document type:
#   xpath - XPath 1.0 expressions
#   css   - CSS selectors;
#           links are read from `link_attr` (default "href"),
#           or from element text with `link_text = true`,
#           titles from element text or `title_attr`;
#           `rows` scopes both queries to each matching row
#
# [[sources]]
# url = "http://example.com/"
#
# [[sources.selectors]]
# kind = "xpath"
# links = '//a[@class="post-title"]/@href'
# titles = '//a[@class="post-title"]/text()'
#
# [[sources]]
# url = "https://example.com/path.aspx"
# document_type = "xml"
#
# [sources.fetch]
# method = "POST"
# tls_verify = false
# payload = { page = 1 }
#
# [[sources.selectors]]
# kind = "css"
# rows = "tr"
# links = "td:last-child a"
# titles = ".subdesc"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Source URL {url} is not a valid absolute URL: {source}")]
    InvalidSourceUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Source {0} is configured more than once")]
    DuplicateSource(String),

    #[error("Source {0} has no selectors")]
    NoSelectors(String),
}

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// SQLite file; defaults to `<data dir>/freshet/state.sqlite3`
    pub db_path: Option<PathBuf>,
    pub mark_all_scope: MarkAllScope,
}

/// Which unread items "mark all as read" touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkAllScope {
    /// Every unread item in the store.
    #[default]
    Global,
    /// Only items of currently configured sources.
    Configured,
}

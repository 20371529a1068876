//! Transport settings shared by every source.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    pub user_agent: String,

    /// Upper bound on simultaneous source checks (default: unbounded)
    pub max_concurrency: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("freshet/", env!("CARGO_PKG_VERSION")).to_string(),
            max_concurrency: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

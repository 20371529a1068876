pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FetchOptions;

#[async_trait]
pub trait Fetcher {
    /// Fetch the body at `url`. Failures are transport errors
    /// (see [`FreshetError::is_transport`](crate::app::FreshetError::is_transport)).
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Vec<u8>>;
}

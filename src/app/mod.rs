pub mod context;
pub mod error;

pub use context::{AppContext, CheckSummary};
pub use error::{FreshetError, Result};

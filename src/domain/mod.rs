pub mod item;
pub mod source;

pub use item::{Extraction, Item};
pub use source::{DocumentType, FetchOptions, HttpMethod, Source};

use serde::{Deserialize, Serialize};

use crate::selector::SelectorDef;

/// A configured page or feed to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub fetch: FetchOptions,
    pub selectors: Vec<SelectorDef>,
}

impl Source {
    pub fn new(url: &str, selectors: Vec<SelectorDef>) -> Self {
        Self {
            url: url.to_string(),
            document_type: DocumentType::default(),
            fetch: FetchOptions::default(),
            selectors,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Html,
    Xml,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }
}

/// Per-source transport options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub method: HttpMethod,
    /// Set to false to accept invalid TLS certificates.
    pub tls_verify: bool,
    /// Sent as a JSON request body when present.
    pub payload: Option<serde_json::Value>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            tls_verify: true,
            payload: None,
        }
    }
}

//! Parsing context for DOM extraction

use url::Url;

/// Context information for one extraction pass
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// Document URL for resolving relative image sources
    pub base_url: Option<Url>,
}

impl ExtractionContext {
    /// Create a context from the document URL; unparsable URLs leave links unresolved
    pub fn new(document_url: &str) -> Self {
        Self {
            base_url: Url::parse(document_url).ok(),
        }
    }

    /// Resolve a possibly relative link against the document URL
    pub fn resolve(&self, link: &str) -> String {
        self.base_url
            .as_ref()
            .and_then(|base| base.join(link).ok())
            .map_or_else(|| link.to_string(), String::from)
    }
}

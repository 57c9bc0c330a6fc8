//! Per-field DOM extraction
//!
//! Each field is pulled independently as an ordered sequence, one value per
//! matched node, in DOM order. That order is the only correlation key
//! between fields, so nothing here may sort, dedupe or skip nodes beyond
//! the configured id-prefix filter.
//!
//! Leniency boundary: malformed numbers become `Missing` (JSON `null`)
//! instead of errors, and a selector with no matches yields an empty
//! sequence. Length disagreements are the validator's concern.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::{FieldSelector, Projection, SelectorConfig};
use super::context::ExtractionContext;
use super::numeric;
use super::ContextualParser;
use crate::domain::{FieldKind, FieldSequence, FieldSequences, RawValue, WishlistField};
use crate::infrastructure::document::Document;
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};

lazy_static! {
    static ref IMAGE_SELECTOR: Selector =
        Selector::parse("img").unwrap_or_else(|e| panic!("invalid img selector: {e}"));
}

/// A field selector compiled and ready to run against a DOM snapshot
#[derive(Debug)]
pub struct CompiledField {
    field: WishlistField,
    source: String,
    selector: Selector,
    id_prefix: Option<String>,
    projection: Projection,
}

impl CompiledField {
    pub fn compile(field: WishlistField, definition: &FieldSelector) -> HarvestResult<Self> {
        let selector = Selector::parse(&definition.selector).map_err(|e| HarvestError::InvalidSelector {
            target: format!("field '{field}'"),
            selector: definition.selector.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            field,
            source: definition.selector.clone(),
            selector,
            id_prefix: definition.id_prefix.clone(),
            projection: definition.projection.clone(),
        })
    }

    pub const fn field(&self) -> WishlistField {
        self.field
    }

    /// Matched nodes in DOM order, after the id-prefix filter
    fn matching_nodes<'a>(&'a self, html: &'a Html) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        html.select(&self.selector).filter(move |element| match &self.id_prefix {
            Some(prefix) => element.value().id().is_some_and(|id| id.starts_with(prefix.as_str())),
            None => true,
        })
    }

    pub fn count(&self, html: &Html) -> usize {
        self.matching_nodes(html).count()
    }

    pub fn extract(&self, html: &Html, context: &ExtractionContext) -> FieldSequence {
        self.matching_nodes(html)
            .map(|element| self.project(element, context))
            .collect()
    }

    fn project(&self, element: ElementRef<'_>, context: &ExtractionContext) -> RawValue {
        let raw = match &self.projection {
            Projection::Text => Some(element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")),
            Projection::InnerHtml => Some(element.inner_html().trim().to_string()),
            Projection::Attribute(name) => element.value().attr(name).map(|value| value.trim().to_string()),
            Projection::NestedImageSource => element
                .select(&IMAGE_SELECTOR)
                .next()
                .and_then(|image| image.value().attr("src"))
                .map(|src| context.resolve(src.trim())),
        };

        match self.field.kind() {
            FieldKind::Number => numeric::to_numeric_value(raw.as_deref()),
            FieldKind::Text => raw.map_or(RawValue::Missing, RawValue::Text),
        }
    }
}

/// Extracts every wishlist field from one DOM snapshot
#[derive(Debug)]
pub struct FieldExtractor {
    fields: Vec<CompiledField>,
}

impl FieldExtractor {
    /// Compile all selectors up front; a bad selector fails before any page access
    pub fn new(config: &SelectorConfig) -> HarvestResult<Self> {
        let fields = config
            .iter()
            .map(|(field, definition)| CompiledField::compile(field, definition))
            .collect::<HarvestResult<Vec<_>>>()?;

        Ok(Self { fields })
    }

    pub fn compiled(&self, field: WishlistField) -> Option<&CompiledField> {
        self.fields.iter().find(|compiled| compiled.field == field)
    }

    /// Extract a single field from the live document
    pub async fn extract_field(&self, document: &dyn Document, field: WishlistField) -> HarvestResult<FieldSequence> {
        let compiled = self
            .compiled(field)
            .ok_or_else(|| HarvestError::invalid_config(format!("no selector configured for '{field}'")))?;
        let (content, context) = snapshot(document).await?;

        let html = Html::parse_document(&content);
        Ok(compiled.extract(&html, &context))
    }

    /// Extract every field from ONE snapshot so all sequences describe the same DOM state
    pub async fn extract_all(&self, document: &dyn Document) -> HarvestResult<FieldSequences> {
        let (content, context) = snapshot(document).await?;
        self.extract_from_html(&content, &context)
    }

    pub fn extract_from_html(&self, content: &str, context: &ExtractionContext) -> HarvestResult<FieldSequences> {
        let html = Html::parse_document(content);
        self.parse_with_context(&html, context)
    }

    /// Visible item count, as anchored by the name field
    pub fn count_items(&self, content: &str) -> usize {
        let html = Html::parse_document(content);
        self.compiled(WishlistField::Name)
            .map_or(0, |compiled| compiled.count(&html))
    }
}

impl ContextualParser for FieldExtractor {
    type Output = FieldSequences;
    type Context = ExtractionContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> HarvestResult<Self::Output> {
        let mut sequences = FieldSequences::new();

        for compiled in &self.fields {
            let sequence = compiled.extract(html, context);
            if sequence.is_empty() {
                warn!(
                    "Selector for '{}' matched no nodes: {}",
                    compiled.field,
                    compiled.source
                );
            } else {
                debug!("Extracted {} values for '{}'", sequence.len(), compiled.field);
            }
            sequences.insert(compiled.field, sequence);
        }

        Ok(sequences)
    }
}

/// One-off extraction of a single field with an ad-hoc selector
pub async fn extract_field(
    document: &dyn Document,
    field: WishlistField,
    definition: &FieldSelector,
) -> HarvestResult<FieldSequence> {
    let compiled = CompiledField::compile(field, definition)?;
    let (content, context) = snapshot(document).await?;

    let html = Html::parse_document(&content);
    Ok(compiled.extract(&html, &context))
}

async fn snapshot(document: &dyn Document) -> HarvestResult<(String, ExtractionContext)> {
    let url = document.url().await?;
    let content = document.content().await?;
    Ok((content, ExtractionContext::new(&url)))
}

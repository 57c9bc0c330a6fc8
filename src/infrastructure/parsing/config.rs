//! Selector configuration for wishlist field extraction
//!
//! Selectors are the compatibility surface with the source page: a markup
//! change should only ever require a config change here.

use serde::{Deserialize, Serialize};

use crate::domain::WishlistField;

/// Maps a matched node to a raw scalar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Projection {
    /// Whitespace-normalized text content
    Text,
    /// Trimmed inner HTML
    InnerHtml,
    /// Value of the named attribute
    Attribute(String),
    /// `src` of the first descendant `<img>`, resolved against the page URL
    NestedImageSource,
}

/// Where one field lives in the DOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    /// CSS selector matching one node per item
    pub selector: String,

    /// Keep only nodes whose `id` starts with this exact prefix
    #[serde(default)]
    pub id_prefix: Option<String>,

    pub projection: Projection,
}

impl FieldSelector {
    pub fn new(selector: &str, projection: Projection) -> Self {
        Self {
            selector: selector.to_string(),
            id_prefix: None,
            projection,
        }
    }

    #[must_use]
    pub fn with_id_prefix(mut self, prefix: &str) -> Self {
        self.id_prefix = Some(prefix.to_string());
        self
    }
}

/// CSS selectors for every wishlist field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub name: FieldSelector,
    pub image_url: FieldSelector,
    pub price: FieldSelector,
    pub priority: FieldSelector,
    pub quantity_requested: FieldSelector,
    pub quantity_fulfilled: FieldSelector,
    pub comment: FieldSelector,
}

impl SelectorConfig {
    pub const fn get(&self, field: WishlistField) -> &FieldSelector {
        match field {
            WishlistField::Name => &self.name,
            WishlistField::ImageUrl => &self.image_url,
            WishlistField::Price => &self.price,
            WishlistField::Priority => &self.priority,
            WishlistField::QuantityRequested => &self.quantity_requested,
            WishlistField::QuantityFulfilled => &self.quantity_fulfilled,
            WishlistField::Comment => &self.comment,
        }
    }

    /// Selectors in validation order
    pub fn iter(&self) -> impl Iterator<Item = (WishlistField, &FieldSelector)> {
        WishlistField::ALL.into_iter().map(move |field| (field, self.get(field)))
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        // Labels share the id prefix of their values ("itemRequestedLabel_" vs
        // "itemRequested_"), so the prefix filter includes the underscore.
        Self {
            name: FieldSelector::new(r#"a[id^="itemName"]"#, Projection::Text).with_id_prefix("itemName_"),
            image_url: FieldSelector::new(r#"div[id^="itemImage"]"#, Projection::NestedImageSource)
                .with_id_prefix("itemImage_"),
            price: FieldSelector::new(r#"span[id^="itemPrice_"] > span.a-offscreen"#, Projection::Text),
            priority: FieldSelector::new(r#"span[id^="itemPriority"]"#, Projection::Text)
                .with_id_prefix("itemPriority_"),
            quantity_requested: FieldSelector::new(r#"span[id^="itemRequested"]"#, Projection::Text)
                .with_id_prefix("itemRequested_"),
            quantity_fulfilled: FieldSelector::new(r#"span[id^="itemPurchased"]"#, Projection::Text)
                .with_id_prefix("itemPurchased_"),
            comment: FieldSelector::new(r#"span[id^="itemComment"]"#, Projection::Text)
                .with_id_prefix("itemComment_"),
        }
    }
}

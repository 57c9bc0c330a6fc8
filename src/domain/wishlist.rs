use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One wishlist entry, built from a single positional index of every field sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub name: String,
    pub image_url: String,
    /// `None` when the price markup was absent or did not parse
    pub price: Option<f64>,
    pub priority: String,
    pub quantity_requested: Option<u32>,
    pub quantity_fulfilled: Option<u32>,
    pub comment: String,
}

/// Result envelope of one extraction run.
///
/// Immutable after assembly: `item_count` always equals `items.len()`,
/// and deserialization rejects payloads that break that rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SnapshotPayload")]
pub struct WishlistSnapshot {
    captured_at: DateTime<Utc>,
    item_count: usize,
    items: Vec<WishlistItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotPayload {
    captured_at: DateTime<Utc>,
    item_count: usize,
    items: Vec<WishlistItem>,
}

impl TryFrom<SnapshotPayload> for WishlistSnapshot {
    type Error = String;

    fn try_from(payload: SnapshotPayload) -> Result<Self, Self::Error> {
        if payload.item_count != payload.items.len() {
            return Err(format!(
                "itemCount {} does not match {} items",
                payload.item_count,
                payload.items.len()
            ));
        }
        Ok(Self::new(payload.captured_at, payload.items))
    }
}

impl WishlistSnapshot {
    pub(crate) fn new(captured_at: DateTime<Utc>, items: Vec<WishlistItem>) -> Self {
        Self {
            captured_at,
            item_count: items.len(),
            items,
        }
    }

    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub const fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub const fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Pretty JSON, the shape handed to the response/persistence side
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Wishlist item attributes, declared in the fixed validation order.
///
/// `Name` is always first: it anchors the visible-item count that every
/// other field is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WishlistField {
    Name,
    ImageUrl,
    Price,
    Priority,
    QuantityRequested,
    QuantityFulfilled,
    Comment,
}

impl WishlistField {
    /// Every field, in validation order
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::ImageUrl,
        Self::Price,
        Self::Priority,
        Self::QuantityRequested,
        Self::QuantityFulfilled,
        Self::Comment,
    ];

    /// Wire name, matching the camelCase keys of the item record
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::ImageUrl => "imageUrl",
            Self::Price => "price",
            Self::Priority => "priority",
            Self::QuantityRequested => "quantityRequested",
            Self::QuantityFulfilled => "quantityFulfilled",
            Self::Comment => "comment",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Price | Self::QuantityRequested | Self::QuantityFulfilled => FieldKind::Number,
            Self::Name | Self::ImageUrl | Self::Priority | Self::Comment => FieldKind::Text,
        }
    }
}

impl fmt::Display for WishlistField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a projected node value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
}

/// One raw scalar pulled from a DOM node.
///
/// Numeric fields that fail the strict parse land here as `Missing`
/// (serialized as `null`) instead of failing the extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Text rendering used for string fields of a record
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Number(n) => n.to_string(),
            Self::Missing => String::new(),
        }
    }

    /// Finite number, if this value holds one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Whole, non-negative number that fits a quantity counter
    pub fn as_count(&self) -> Option<u32> {
        self.as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n as u32)
    }

    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        if value.is_finite() { Self::Number(value) } else { Self::Missing }
    }
}

impl From<Option<f64>> for RawValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::from)
    }
}

/// Ordered raw values for one field, one per visible item, in DOM order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSequence(Vec<RawValue>);

impl FieldSequence {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RawValue> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: RawValue) {
        self.0.push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawValue> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[RawValue] {
        &self.0
    }
}

impl From<Vec<RawValue>> for FieldSequence {
    fn from(values: Vec<RawValue>) -> Self {
        Self(values)
    }
}

impl<V: Into<RawValue>> FromIterator<V> for FieldSequence {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a FieldSequence {
    type Item = &'a RawValue;
    type IntoIter = std::slice::Iter<'a, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Field name to sequence mapping produced by one extraction pass.
///
/// Iteration always follows [`WishlistField::ALL`] order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSequences {
    fields: BTreeMap<WishlistField, FieldSequence>,
}

impl FieldSequences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, field: WishlistField, sequence: impl Into<FieldSequence>) -> Self {
        self.insert(field, sequence.into());
        self
    }

    pub fn insert(&mut self, field: WishlistField, sequence: FieldSequence) -> Option<FieldSequence> {
        self.fields.insert(field, sequence)
    }

    pub fn get(&self, field: WishlistField) -> Option<&FieldSequence> {
        self.fields.get(&field)
    }

    /// Length of a field's sequence; an absent field counts as empty
    pub fn len_of(&self, field: WishlistField) -> usize {
        self.fields.get(&field).map_or(0, FieldSequence::len)
    }

    /// Value at `index`, or `Missing` when the field or index is absent
    pub fn value_at(&self, field: WishlistField, index: usize) -> &RawValue {
        static MISSING: RawValue = RawValue::Missing;
        self.fields
            .get(&field)
            .and_then(|sequence| sequence.get(index))
            .unwrap_or(&MISSING)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WishlistField, &FieldSequence)> {
        self.fields.iter().map(|(field, sequence)| (*field, sequence))
    }
}

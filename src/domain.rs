//! Domain module - wishlist entities and raw field values
//!
//! Record identity is purely positional: the page exposes no stable item key,
//! so an item is whatever sits at index `i` of every field sequence.

pub mod field;
pub mod wishlist;

// Re-export commonly used items for convenience
pub use field::{FieldKind, FieldSequence, FieldSequences, RawValue, WishlistField};
pub use wishlist::{WishlistItem, WishlistSnapshot};

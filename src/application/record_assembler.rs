//! Zips validated field sequences into wishlist records

use chrono::{DateTime, Utc};
use tracing::debug;

use super::consistency_validator::ConsistencyValidator;
use crate::domain::{FieldSequences, WishlistField, WishlistItem, WishlistSnapshot};
use crate::infrastructure::harvest_error::HarvestResult;
use crate::infrastructure::parsing::Validator;

/// Builds one record per index across all field sequences.
///
/// Record `i` is made of entry `i` of every sequence. Assembly refuses to
/// run on sequences that fail the length check, so records are never
/// built from partially aligned data.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAssembler {
    validator: ConsistencyValidator,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assemble(&self, sequences: &FieldSequences, captured_at: DateTime<Utc>) -> HarvestResult<WishlistSnapshot> {
        let item_count = self.validator.validate(sequences)?;

        let items: Vec<WishlistItem> = (0..item_count).map(|i| Self::item_at(sequences, i)).collect();

        debug!("Assembled {} wishlist items", items.len());
        Ok(WishlistSnapshot::new(captured_at, items))
    }

    fn item_at(sequences: &FieldSequences, index: usize) -> WishlistItem {
        let value = |field| sequences.value_at(field, index);

        WishlistItem {
            name: value(WishlistField::Name).as_text(),
            image_url: value(WishlistField::ImageUrl).as_text(),
            price: value(WishlistField::Price).as_f64(),
            priority: value(WishlistField::Priority).as_text(),
            quantity_requested: value(WishlistField::QuantityRequested).as_count(),
            quantity_fulfilled: value(WishlistField::QuantityFulfilled).as_count(),
            comment: value(WishlistField::Comment).as_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldSequence, RawValue};
    use crate::infrastructure::harvest_error::HarvestError;
    use proptest::prelude::*;

    fn two_item_sequences() -> FieldSequences {
        FieldSequences::new()
            .with(WishlistField::Name, FieldSequence::from_iter(["Book", "Pen"]))
            .with(
                WishlistField::ImageUrl,
                FieldSequence::from_iter(["https://img.example.com/book.jpg", "https://img.example.com/pen.jpg"]),
            )
            .with(WishlistField::Price, FieldSequence::from_iter([9.99, 1.50]))
            .with(WishlistField::Priority, FieldSequence::from_iter(["high", "low"]))
            .with(WishlistField::QuantityRequested, FieldSequence::from_iter([1.0, 3.0]))
            .with(WishlistField::QuantityFulfilled, FieldSequence::from_iter([0.0, 1.0]))
            .with(WishlistField::Comment, FieldSequence::from_iter(["gift", ""]))
    }

    #[test]
    fn test_records_follow_index_order() {
        let snapshot = RecordAssembler::new().assemble(&two_item_sequences(), Utc::now()).unwrap();

        assert_eq!(snapshot.item_count(), 2);
        let items = snapshot.items();
        assert_eq!(items[0].name, "Book");
        assert_eq!(items[0].price, Some(9.99));
        assert_eq!(items[0].quantity_requested, Some(1));
        assert_eq!(items[0].comment, "gift");
        assert_eq!(items[1].name, "Pen");
        assert_eq!(items[1].price, Some(1.5));
        assert_eq!(items[1].image_url, "https://img.example.com/pen.jpg");
        assert_eq!(items[1].quantity_fulfilled, Some(1));
    }

    #[test]
    fn test_empty_page_is_an_empty_snapshot() {
        let sequences = WishlistField::ALL
            .into_iter()
            .fold(FieldSequences::new(), |acc, field| acc.with(field, FieldSequence::new()));

        let snapshot = RecordAssembler::new().assemble(&sequences, Utc::now()).unwrap();
        assert_eq!(snapshot.item_count(), 0);
        assert!(snapshot.items().is_empty());
    }

    #[test]
    fn test_missing_and_fractional_values_become_none() {
        let sequences = two_item_sequences()
            .with(WishlistField::Price, vec![RawValue::Missing, RawValue::Number(4.0)])
            .with(WishlistField::QuantityRequested, FieldSequence::from_iter([2.5, -1.0]))
            .with(WishlistField::Comment, vec![RawValue::Missing, RawValue::Number(7.0)]);

        let snapshot = RecordAssembler::new().assemble(&sequences, Utc::now()).unwrap();
        let items = snapshot.items();
        assert_eq!(items[0].price, None);
        assert_eq!(items[0].quantity_requested, None);
        assert_eq!(items[1].quantity_requested, None);
        assert_eq!(items[0].comment, "");
        assert_eq!(items[1].comment, "7");
    }

    #[test]
    fn test_mismatched_sequences_are_never_assembled() {
        let sequences = two_item_sequences().with(WishlistField::Price, FieldSequence::from_iter([9.99]));

        let err = RecordAssembler::new().assemble(&sequences, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            HarvestError::InconsistentLengths {
                field: WishlistField::Price,
                expected: 2,
                actual: 1
            }
        );
    }

    fn aligned_sequences() -> impl Strategy<Value = FieldSequences> {
        (0usize..12).prop_flat_map(|len| {
            (
                prop::collection::vec("[a-zA-Z ]{0,12}", len),
                prop::collection::vec(prop::option::of(0.0f64..10_000.0), len),
                prop::collection::vec(prop::option::of(0u32..50), len),
            )
                .prop_map(|(names, prices, counts)| {
                    let counts: FieldSequence = counts.iter().map(|c| c.map(f64::from)).collect();
                    FieldSequences::new()
                        .with(WishlistField::Name, FieldSequence::from_iter(names.clone()))
                        .with(WishlistField::ImageUrl, FieldSequence::from_iter(names.clone()))
                        .with(WishlistField::Price, FieldSequence::from_iter(prices))
                        .with(WishlistField::Priority, FieldSequence::from_iter(names.clone()))
                        .with(WishlistField::QuantityRequested, counts.clone())
                        .with(WishlistField::QuantityFulfilled, counts)
                        .with(WishlistField::Comment, FieldSequence::from_iter(names))
                })
        })
    }

    proptest! {
        #[test]
        fn prop_records_correlate_by_position(sequences in aligned_sequences()) {
            let captured_at = Utc::now();
            let assembler = RecordAssembler::new();
            let snapshot = assembler.assemble(&sequences, captured_at).unwrap();

            prop_assert_eq!(snapshot.item_count(), snapshot.items().len());
            prop_assert_eq!(snapshot.item_count(), sequences.len_of(WishlistField::Name));

            for (i, item) in snapshot.items().iter().enumerate() {
                prop_assert_eq!(&item.name, &sequences.value_at(WishlistField::Name, i).as_text());
                prop_assert_eq!(item.price, sequences.value_at(WishlistField::Price, i).as_f64());
                prop_assert_eq!(
                    item.quantity_requested,
                    sequences.value_at(WishlistField::QuantityRequested, i).as_count()
                );
            }

            let again = assembler.assemble(&sequences, captured_at).unwrap();
            prop_assert_eq!(again, snapshot);
        }
    }
}

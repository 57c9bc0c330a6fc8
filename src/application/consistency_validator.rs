//! Length consistency check across field sequences

use tracing::warn;

use crate::domain::{FieldSequences, WishlistField};
use crate::infrastructure::harvest_error::{HarvestError, HarvestResult};
use crate::infrastructure::parsing::Validator;

/// Confirms every field sequence has as many entries as the name sequence.
///
/// Equal lengths are necessary but not sufficient for correct positional
/// correlation; nothing further can be checked without a per-item key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyValidator;

impl Validator<FieldSequences> for ConsistencyValidator {
    /// Agreed item count
    type Output = usize;

    fn validate(&self, sequences: &FieldSequences) -> HarvestResult<usize> {
        let expected = sequences.len_of(WishlistField::Name);

        for field in WishlistField::ALL.into_iter().skip(1) {
            let actual = sequences.len_of(field);
            if actual != expected {
                warn!("Field '{}' has {} values, expected {}", field, actual, expected);
                return Err(HarvestError::InconsistentLengths { field, expected, actual });
            }
        }

        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldSequence, RawValue};
    use proptest::prelude::*;
    use rstest::rstest;

    fn sequence(len: usize) -> FieldSequence {
        (0..len).map(|i| format!("v{i}")).collect()
    }

    fn sequences_with(lengths: [usize; 7]) -> FieldSequences {
        WishlistField::ALL
            .into_iter()
            .zip(lengths)
            .fold(FieldSequences::new(), |acc, (field, len)| acc.with(field, sequence(len)))
    }

    #[test]
    fn test_all_equal_lengths_pass() {
        assert_eq!(ConsistencyValidator.validate(&sequences_with([2; 7])), Ok(2));
    }

    #[test]
    fn test_all_empty_is_zero_items() {
        assert_eq!(ConsistencyValidator.validate(&sequences_with([0; 7])), Ok(0));
    }

    #[rstest]
    #[case([3, 3, 2, 3, 3, 3, 3], WishlistField::Price, 2)]
    #[case([3, 4, 3, 3, 3, 3, 3], WishlistField::ImageUrl, 4)]
    #[case([3, 3, 3, 3, 3, 3, 0], WishlistField::Comment, 0)]
    #[case([3, 3, 3, 1, 5, 3, 3], WishlistField::Priority, 1)]
    fn test_first_mismatch_is_reported(
        #[case] lengths: [usize; 7],
        #[case] field: WishlistField,
        #[case] actual: usize,
    ) {
        let err = ConsistencyValidator.validate(&sequences_with(lengths)).unwrap_err();
        assert_eq!(err, HarvestError::InconsistentLengths { field, expected: 3, actual });
    }

    #[test]
    fn test_absent_field_counts_as_empty() {
        let sequences = FieldSequences::new().with(WishlistField::Name, vec![RawValue::from("Book")]);

        let err = ConsistencyValidator.validate(&sequences).unwrap_err();
        assert_eq!(
            err,
            HarvestError::InconsistentLengths {
                field: WishlistField::ImageUrl,
                expected: 1,
                actual: 0
            }
        );
    }

    proptest! {
        #[test]
        fn prop_any_deviation_is_rejected(
            base in 0usize..20,
            offset in 1usize..10,
            shorter in any::<bool>(),
            target in 1usize..7,
        ) {
            let deviant = if shorter { base.saturating_sub(offset) } else { base + offset };
            prop_assume!(deviant != base);

            let mut lengths = [base; 7];
            lengths[target] = deviant;

            let err = ConsistencyValidator.validate(&sequences_with(lengths)).unwrap_err();
            prop_assert_eq!(
                err,
                HarvestError::InconsistentLengths {
                    field: WishlistField::ALL[target],
                    expected: base,
                    actual: deviant,
                }
            );
        }
    }
}

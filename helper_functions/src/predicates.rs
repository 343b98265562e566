use core::num::NonZeroU64;

use bls::SignatureBytes;
use typenum::Unsigned as _;
use types::{
    phase0::{
        consts::{TargetAggregatorsPerCommittee, FAR_FUTURE_EPOCH},
        containers::Validator,
        primitives::Epoch,
    },
    preset::Preset,
};

#[must_use]
pub const fn is_eligible_for_activation_queue<P: Preset>(validator: &Validator) -> bool {
    validator.activation_eligibility_epoch == FAR_FUTURE_EPOCH
        && validator.effective_balance == P::MAX_EFFECTIVE_BALANCE
}

#[must_use]
pub const fn is_eligible_for_activation(finalized_epoch: Epoch, validator: &Validator) -> bool {
    validator.activation_eligibility_epoch <= finalized_epoch
        && validator.activation_epoch == FAR_FUTURE_EPOCH
}

/// [`is_aggregator`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/validator.md#aggregation-selection)
/// with the committee already resolved.
#[must_use]
pub fn is_aggregator(committee_length: usize, slot_signature: SignatureBytes) -> bool {
    let dividend = hashing::hash_768(slot_signature.to_fixed_bytes())[..size_of::<u64>()]
        .try_into()
        .map(u64::from_le_bytes)
        .expect("slice has the same length as u64");

    let modulo = (committee_length as u64 / TargetAggregatorsPerCommittee::U64)
        .try_into()
        .unwrap_or(NonZeroU64::MIN);

    dividend % modulo == 0
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use types::preset::Minimal;

    use super::*;

    #[test]
    fn small_committees_always_aggregate() {
        for byte in 0..=u8::MAX {
            assert!(is_aggregator(15, SignatureBytes::repeat_byte(byte)));
        }
    }

    #[test]
    fn large_committees_select_some_aggregators() {
        let aggregator_count = (0..=u8::MAX)
            .filter(|byte| is_aggregator(2048, SignatureBytes::repeat_byte(*byte)))
            .count();

        assert!(aggregator_count < 256);
    }

    #[test_case(FAR_FUTURE_EPOCH, 32_000_000_000 => true)]
    #[test_case(FAR_FUTURE_EPOCH, 31_000_000_000 => false)]
    #[test_case(3, 32_000_000_000 => false)]
    fn activation_queue_eligibility(
        activation_eligibility_epoch: Epoch,
        effective_balance: u64,
    ) -> bool {
        is_eligible_for_activation_queue::<Minimal>(&Validator {
            activation_eligibility_epoch,
            effective_balance,
            ..Validator::default()
        })
    }

    #[test_case(2, FAR_FUTURE_EPOCH, 3 => true)]
    #[test_case(3, FAR_FUTURE_EPOCH, 3 => true)]
    #[test_case(4, FAR_FUTURE_EPOCH, 3 => false)]
    #[test_case(2, 5, 3 => false)]
    fn activation_eligibility(
        activation_eligibility_epoch: Epoch,
        activation_epoch: Epoch,
        finalized_epoch: Epoch,
    ) -> bool {
        is_eligible_for_activation(
            finalized_epoch,
            &Validator {
                activation_eligibility_epoch,
                activation_epoch,
                ..Validator::default()
            },
        )
    }
}

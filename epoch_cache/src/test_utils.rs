use core::num::NonZeroU64;

use bls::{SecretKey, SecretKeyBytes};
use nonzero_ext::nonzero;
use ssz::{PersistentList, SszHash as _};
use typenum::{Prod, U1099511627776, U128, U2, U2048, U64};
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        containers::{Fork, Validator},
        primitives::ValidatorIndex,
    },
    preset::Preset,
};

/// A preset with 2 slots per epoch and 1 committee per slot for small registries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct TwoSlots;

impl Preset for TwoSlots {
    type EpochsPerHistoricalVector = U64;
    type EpochsPerSlashingsVector = U64;
    type MaxAttestations = U128;
    type MaxValidatorsPerCommittee = U2048;
    type SlotsPerEpoch = U2;
    type SlotsPerHistoricalRoot = U64;
    type ValidatorRegistryLimit = U1099511627776;

    type MaxAttestationsPerEpoch = Prod<Self::MaxAttestations, Self::SlotsPerEpoch>;

    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(4_u64);
    const SHUFFLE_ROUND_COUNT: u8 = 10;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(4_u64);
}

pub fn secret_key(validator_index: ValidatorIndex) -> SecretKey {
    let mut bytes = [0; 32];
    bytes[24..].copy_from_slice(&(validator_index + 1).to_be_bytes());

    SecretKey::try_from(SecretKeyBytes::from(bytes)).expect("bytes encode a valid secret key")
}

pub fn active_validator(validator_index: ValidatorIndex) -> Validator {
    let pubkey = secret_key(validator_index).to_public_key().to_bytes();

    Validator {
        effective_balance: TwoSlots::MAX_EFFECTIVE_BALANCE,
        activation_eligibility_epoch: 0,
        activation_epoch: 0,
        ..Validator::pending(pubkey)
    }
}

pub fn genesis_state<P: Preset>(config: &Config, validator_count: u64) -> BeaconState<P> {
    let validators = PersistentList::<_, P::ValidatorRegistryLimit>::try_from_iter(
        (0..validator_count).map(active_validator),
    )
    .expect("validator count is below the registry limit");

    let balances = PersistentList::<_, P::ValidatorRegistryLimit>::try_from_iter(
        validators.iter().map(|validator| validator.effective_balance),
    )
    .expect("validator count is below the registry limit");

    BeaconState {
        genesis_validators_root: validators.hash_tree_root(),
        fork: Fork {
            previous_version: config.genesis_fork_version,
            current_version: config.genesis_fork_version,
            epoch: 0,
        },
        validators,
        balances,
        ..BeaconState::default()
    }
}

use std::sync::Arc;

use anyhow::Result;
use bls::{SecretKey, SecretKeyBytes};
use epoch_cache::CachedBeaconState;
use pubkey_cache::PubkeyCache;
use ssz::{PersistentList, SszHash as _};
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        containers::{Fork, Validator},
        primitives::{Slot, ValidatorIndex},
    },
    preset::Preset,
};

fn interop_secret_key(validator_index: ValidatorIndex) -> SecretKey {
    let mut bytes = [0; 32];
    bytes[24..].copy_from_slice(&(validator_index + 1).to_be_bytes());

    SecretKey::try_from(SecretKeyBytes::from(bytes)).expect("bytes encode a valid secret key")
}

/// Validators active since genesis with the maximum effective balance.
pub fn active_validators(count: u64) -> Vec<Validator> {
    (0..count)
        .map(|validator_index| Validator {
            effective_balance: types::preset::Mainnet::MAX_EFFECTIVE_BALANCE,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            ..Validator::pending(interop_secret_key(validator_index).to_public_key().to_bytes())
        })
        .collect()
}

/// Builds a state at `slot` with zeroed history and balances equal to effective balances.
pub fn cached_state<P: Preset>(
    config: &Config,
    slot: Slot,
    validators: Vec<Validator>,
) -> Result<CachedBeaconState<P>> {
    let balances = PersistentList::<_, P::ValidatorRegistryLimit>::try_from_iter(
        validators.iter().map(|validator| validator.effective_balance),
    )?;

    let validators = PersistentList::<_, P::ValidatorRegistryLimit>::try_from_iter(validators)?;

    let state = BeaconState {
        slot,
        genesis_validators_root: validators.hash_tree_root(),
        fork: Fork {
            previous_version: config.genesis_fork_version,
            current_version: config.genesis_fork_version,
            epoch: 0,
        },
        validators,
        balances,
        ..BeaconState::default()
    };

    CachedBeaconState::new(Arc::new(PubkeyCache::new()), state)
}

//! Accessors that read the canonical state directly.
//!
//! Validator queries go through the epoch context instead, which caches them.

use anyhow::{ensure, Result};
use typenum::Unsigned as _;
use types::{
    config::Config,
    phase0::{
        beacon_state::BeaconState,
        consts::GENESIS_EPOCH,
        primitives::{Domain, DomainType, Epoch, Slot, H256},
    },
    preset::Preset,
};

use crate::{error::Error, misc};

#[must_use]
pub fn get_current_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    misc::compute_epoch_at_slot::<P>(state.slot)
}

#[must_use]
pub fn get_previous_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state).saturating_sub(1).max(GENESIS_EPOCH)
}

#[must_use]
pub fn get_next_epoch<P: Preset>(state: &BeaconState<P>) -> Epoch {
    get_current_epoch(state) + 1
}

pub fn get_block_root<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> Result<H256> {
    get_block_root_at_slot(state, misc::compute_start_slot_at_epoch::<P>(epoch))
}

pub fn get_block_root_at_slot<P: Preset>(state: &BeaconState<P>, slot: Slot) -> Result<H256> {
    let state_slot = state.slot;

    ensure!(
        slot < state_slot && state_slot <= slot + P::SlotsPerHistoricalRoot::U64,
        Error::SlotOutOfRange { slot, state_slot },
    );

    Ok(*state.block_roots.mod_index(slot))
}

#[must_use]
pub fn get_randao_mix<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    *state.randao_mixes.mod_index(epoch)
}

/// [`get_seed`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#get_seed)
#[must_use]
pub fn get_seed<P: Preset>(state: &BeaconState<P>, epoch: Epoch, domain_type: DomainType) -> H256 {
    shuffling::compute_seed(domain_type, epoch, seed_randao_mix(state, epoch))
}

/// The RANDAO mix that seeds `epoch`, looked up `MIN_SEED_LOOKAHEAD + 1` epochs back.
#[must_use]
pub fn seed_randao_mix<P: Preset>(state: &BeaconState<P>, epoch: Epoch) -> H256 {
    get_randao_mix(
        state,
        epoch + P::EpochsPerHistoricalVector::U64 - P::MIN_SEED_LOOKAHEAD - 1,
    )
}

#[must_use]
pub fn get_domain<P: Preset>(
    config: &Config,
    state: &BeaconState<P>,
    domain_type: DomainType,
    epoch: Option<Epoch>,
) -> Domain {
    let epoch = epoch.unwrap_or_else(|| get_current_epoch(state));
    let fork = state.fork;

    let fork_version = if epoch < fork.epoch {
        fork.previous_version
    } else {
        fork.current_version
    };

    misc::compute_domain(
        config,
        domain_type,
        Some(fork_version),
        Some(state.genesis_validators_root),
    )
}

//! Builders of [`SignatureSet`]s for messages found in blocks.
//!
//! Public keys are looked up in the epoch context. Signatures are not decompressed here.

use anyhow::Result;
use helper_functions::{
    misc,
    signing::{RandaoEpoch, SignForSingleFork as _},
    verifier::SignatureSet,
};
use itertools::Itertools as _;
use types::{
    config::Config,
    phase0::containers::{BeaconBlock, IndexedAttestation, SignedBeaconBlock},
    preset::Preset,
};

use crate::cached_state::CachedBeaconState;

pub fn get_proposer_signature_set<P: Preset>(
    config: &Config,
    state: &CachedBeaconState<P>,
    signed_block: &SignedBeaconBlock<P>,
) -> Result<SignatureSet> {
    let block = &signed_block.message;

    Ok(SignatureSet::Single {
        public_key: state.epoch_context().public_key(block.proposer_index)?,
        signing_root: block.signing_root(config, state.state()),
        signature: signed_block.signature,
    })
}

pub fn get_randao_signature_set<P: Preset>(
    config: &Config,
    state: &CachedBeaconState<P>,
    block: &BeaconBlock<P>,
) -> Result<SignatureSet> {
    let epoch = RandaoEpoch::from(misc::compute_epoch_at_slot::<P>(block.slot));

    Ok(SignatureSet::Single {
        public_key: state.epoch_context().public_key(block.proposer_index)?,
        signing_root: epoch.signing_root(config, state.state()),
        signature: block.body.randao_reveal,
    })
}

pub fn get_indexed_attestation_signature_set<P: Preset>(
    config: &Config,
    state: &CachedBeaconState<P>,
    indexed_attestation: &IndexedAttestation<P>,
) -> Result<SignatureSet> {
    let epoch_context = state.epoch_context();

    let public_keys = indexed_attestation
        .attesting_indices
        .iter()
        .map(|validator_index| epoch_context.public_key(*validator_index))
        .try_collect()?;

    Ok(SignatureSet::Aggregate {
        public_keys,
        signing_root: indexed_attestation.data.signing_root(config, state.state()),
        signature: indexed_attestation.signature,
    })
}

//! A beacon state paired with the caches derived from it.
//!
//! The tree in [`BeaconState`] is the source of truth for hashing. The flat copy of the registry is
//! the source of truth for reads, which are far more frequent than writes during epoch processing.
//! Every write goes to both, so they agree whenever a [`CachedBeaconState`] is observable.

use std::sync::Arc;

use anyhow::{ensure, Result};
use helper_functions::accessors;
use pubkey_cache::PubkeyCache;
use ssz::{PersistentList, SszHash as _};
use types::{
    phase0::{
        beacon_state::BeaconState,
        containers::{BeaconBlockHeader, Checkpoint, Fork, PendingAttestation, Validator},
        primitives::{Epoch, Gwei, Slot, ValidatorIndex, H256},
    },
    preset::Preset,
};

use crate::{epoch_context::EpochContext, error::Error};

/// Plain copy of a validator record kept outside the tree.
pub type FlatValidator = Validator;

/// The flat validator cache. Clones share structure until written to.
pub type FlatValidators = im::Vector<FlatValidator>;

type EpochAttestations<P> =
    PersistentList<PendingAttestation<P>, <P as Preset>::MaxAttestationsPerEpoch>;

/// Cloning is cheap. Both the tree and the flat cache are persistent, and the epoch context only
/// holds reference counted handles.
#[derive(Clone, Debug)]
pub struct CachedBeaconState<P: Preset> {
    state: BeaconState<P>,
    validators: FlatValidators,
    epoch_context: EpochContext<P>,
}

impl<P: Preset> CachedBeaconState<P> {
    pub fn new(pubkey_cache: Arc<PubkeyCache>, state: BeaconState<P>) -> Result<Self> {
        let validators = state.validators.iter().copied().collect::<FlatValidators>();
        let epoch_context = EpochContext::new(pubkey_cache, &state, &validators)?;

        Ok(Self {
            state,
            validators,
            epoch_context,
        })
    }

    /// Read-only view of the canonical state.
    #[must_use]
    pub const fn state(&self) -> &BeaconState<P> {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> BeaconState<P> {
        self.state
    }

    #[must_use]
    pub const fn epoch_context(&self) -> &EpochContext<P> {
        &self.epoch_context
    }

    #[must_use]
    pub fn hash_tree_root(&self) -> H256 {
        self.state.hash_tree_root()
    }

    /// Advances the epoch context after the state has entered a new epoch.
    pub fn rotate_epoch_context(&mut self) -> Result<()> {
        self.epoch_context.rotate(&self.state, &self.validators)
    }

    // Versioning

    #[must_use]
    pub const fn genesis_validators_root(&self) -> H256 {
        self.state.genesis_validators_root
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.state.slot
    }

    pub fn set_slot(&mut self, slot: Slot) {
        self.state.slot = slot;
    }

    #[must_use]
    pub fn current_epoch(&self) -> Epoch {
        accessors::get_current_epoch(&self.state)
    }

    #[must_use]
    pub fn previous_epoch(&self) -> Epoch {
        accessors::get_previous_epoch(&self.state)
    }

    #[must_use]
    pub const fn fork(&self) -> Fork {
        self.state.fork
    }

    // History

    #[must_use]
    pub const fn latest_block_header(&self) -> BeaconBlockHeader {
        self.state.latest_block_header
    }

    pub fn set_latest_block_header(&mut self, header: BeaconBlockHeader) {
        self.state.latest_block_header = header;
    }

    pub fn block_root_at_slot(&self, slot: Slot) -> Result<H256> {
        accessors::get_block_root_at_slot(&self.state, slot)
    }

    pub fn set_block_root(&mut self, slot: Slot, root: H256) {
        *self.state.block_roots.mod_index_mut(slot) = root;
    }

    #[must_use]
    pub fn state_root(&self, slot: Slot) -> H256 {
        *self.state.state_roots.mod_index(slot)
    }

    pub fn set_state_root(&mut self, slot: Slot, root: H256) {
        *self.state.state_roots.mod_index_mut(slot) = root;
    }

    // Randomness

    #[must_use]
    pub fn randao_mix(&self, epoch: Epoch) -> H256 {
        accessors::get_randao_mix(&self.state, epoch)
    }

    pub fn set_randao_mix(&mut self, epoch: Epoch, mix: H256) {
        *self.state.randao_mixes.mod_index_mut(epoch) = mix;
    }

    // Registry

    #[must_use]
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Reads from the flat cache in constant time.
    pub fn validator(&self, validator_index: ValidatorIndex) -> Result<&FlatValidator> {
        let position = self.validator_position(validator_index)?;
        Ok(&self.validators[position])
    }

    pub fn validators(&self) -> impl ExactSizeIterator<Item = &FlatValidator> {
        self.validators.iter()
    }

    #[must_use]
    pub const fn flat_validators(&self) -> &FlatValidators {
        &self.validators
    }

    pub fn set_validator(
        &mut self,
        validator_index: ValidatorIndex,
        validator: FlatValidator,
    ) -> Result<()> {
        let position = self.validator_position(validator_index)?;

        // The pubkey registry is shared between clones, so it cannot follow a key change in one.
        ensure!(
            validator.pubkey == self.validators[position].pubkey,
            Error::PubkeyChanged { validator_index },
        );

        self.state.validators.set(position, validator)?;
        self.validators.set(position, validator);

        Ok(())
    }

    pub fn update_validator(
        &mut self,
        validator_index: ValidatorIndex,
        modifier: impl FnOnce(&mut FlatValidator),
    ) -> Result<()> {
        let mut validator = *self.validator(validator_index)?;
        modifier(&mut validator);
        self.set_validator(validator_index, validator)
    }

    /// Appends a validator along with its balance and returns its index.
    pub fn push_validator(
        &mut self,
        validator: FlatValidator,
        balance: Gwei,
    ) -> Result<ValidatorIndex> {
        let validator_index = ValidatorIndex::try_from(self.validators.len())?;

        self.state.validators.push(validator)?;

        if let Err(error) = self
            .epoch_context
            .add_pubkey(validator_index, validator.pubkey)
        {
            self.state.validators.pop();
            return Err(error);
        }

        self.state
            .balances
            .push(balance)
            .expect("balances have the same length and limit as validators");

        self.validators.push_back(validator);

        Ok(validator_index)
    }

    /// Removes the last validator along with its balance.
    ///
    /// The public key stays in the shared cache.
    pub fn pop_validator(&mut self) -> Option<(FlatValidator, Gwei)> {
        let validator = self.validators.pop_back()?;

        self.state.validators.pop();

        let balance = self
            .state
            .balances
            .pop()
            .expect("balances have the same length as validators");

        Some((validator, balance))
    }

    pub fn balance(&self, validator_index: ValidatorIndex) -> Result<Gwei> {
        let position = self.validator_position(validator_index)?;
        Ok(*self.state.balances.get(position)?)
    }

    pub fn set_balance(&mut self, validator_index: ValidatorIndex, balance: Gwei) -> Result<()> {
        let position = self.validator_position(validator_index)?;
        self.state.balances.set(position, balance)?;
        Ok(())
    }

    // Attestations

    #[must_use]
    pub const fn previous_epoch_attestations(&self) -> &EpochAttestations<P> {
        &self.state.previous_epoch_attestations
    }

    #[must_use]
    pub const fn current_epoch_attestations(&self) -> &EpochAttestations<P> {
        &self.state.current_epoch_attestations
    }

    /// Stores `attestation` in the container for the epoch it targets.
    pub fn push_pending_attestation(&mut self, attestation: PendingAttestation<P>) -> Result<()> {
        let epoch = attestation.data.target.epoch;
        let previous_epoch = self.previous_epoch();
        let current_epoch = self.current_epoch();

        if epoch == current_epoch {
            self.state.current_epoch_attestations.push(attestation)?;
        } else {
            ensure!(
                epoch == previous_epoch,
                Error::EpochOutOfRange {
                    epoch,
                    previous_epoch,
                    next_epoch: current_epoch,
                },
            );

            self.state.previous_epoch_attestations.push(attestation)?;
        }

        Ok(())
    }

    /// Moves current epoch attestations to the previous epoch container.
    pub fn rotate_epoch_attestations(&mut self) {
        self.state.previous_epoch_attestations =
            core::mem::take(&mut self.state.current_epoch_attestations);
    }

    // Finality

    #[must_use]
    pub const fn previous_justified_checkpoint(&self) -> Checkpoint {
        self.state.previous_justified_checkpoint
    }

    #[must_use]
    pub const fn current_justified_checkpoint(&self) -> Checkpoint {
        self.state.current_justified_checkpoint
    }

    #[must_use]
    pub const fn finalized_checkpoint(&self) -> Checkpoint {
        self.state.finalized_checkpoint
    }

    pub fn set_finalized_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.state.finalized_checkpoint = checkpoint;
    }

    fn validator_position(&self, validator_index: ValidatorIndex) -> Result<usize> {
        let validator_count = self.validators.len();

        usize::try_from(validator_index)
            .ok()
            .filter(|position| *position < validator_count)
            .ok_or_else(|| {
                Error::ValidatorIndexOutOfBounds {
                    validator_index,
                    validator_count,
                }
                .into()
            })
    }
}

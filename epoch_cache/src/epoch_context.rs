//! Committees and proposers for the epochs around the current one.
//!
//! Shufflings are computed once per epoch and shared between all copies of an [`EpochContext`].
//! Rotation replaces the handles rather than the shufflings themselves, so states derived from the
//! same ancestor keep sharing memory across epoch boundaries.

use core::marker::PhantomData;
use std::sync::Arc;

use anyhow::{ensure, Result};
use bls::{PublicKey, PublicKeyBytes, SignatureBytes};
use helper_functions::{accessors, misc, predicates};
use itertools::Itertools as _;
use pubkey_cache::PubkeyCache;
use shuffling::EpochShuffling;
use ssz::{BitList, ContiguousList};
use tracing::{debug, info};
use typenum::Unsigned as _;
use types::{
    phase0::{
        beacon_state::BeaconState,
        consts::DOMAIN_BEACON_PROPOSER,
        containers::{Attestation, AttestationData, IndexedAttestation},
        primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex},
    },
    preset::Preset,
};

use crate::{cached_state::FlatValidators, error::Error};

/// A committee that a validator is a member of.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CommitteeAssignment<'shuffling> {
    pub committee: &'shuffling [ValidatorIndex],
    pub committee_index: CommitteeIndex,
    pub slot: Slot,
}

#[derive(Clone, Debug)]
pub struct EpochContext<P: Preset> {
    pubkey_cache: Arc<PubkeyCache>,
    previous_shuffling: Arc<EpochShuffling>,
    current_shuffling: Arc<EpochShuffling>,
    next_shuffling: Arc<EpochShuffling>,
    // Proposers of the current epoch in slot order.
    proposers: Arc<[ValidatorIndex]>,
    phantom: PhantomData<P>,
}

impl<P: Preset> EpochContext<P> {
    /// Builds the context for the epoch `state` is in.
    ///
    /// `validators` must be the registry of `state`. The previous shuffling is the current one at
    /// genesis.
    pub fn new(
        pubkey_cache: Arc<PubkeyCache>,
        state: &BeaconState<P>,
        validators: &FlatValidators,
    ) -> Result<Self> {
        pubkey_cache.sync(validators.iter().map(|validator| validator.pubkey))?;

        let previous_epoch = accessors::get_previous_epoch(state);
        let current_epoch = accessors::get_current_epoch(state);

        let current_shuffling = Arc::new(compute_shuffling(state, validators, current_epoch)?);

        let previous_shuffling = if previous_epoch == current_epoch {
            Arc::clone(&current_shuffling)
        } else {
            Arc::new(compute_shuffling(state, validators, previous_epoch)?)
        };

        let next_shuffling = Arc::new(compute_shuffling(state, validators, current_epoch + 1)?);
        let proposers = compute_proposers_for_shuffling(state, validators, &current_shuffling)?;

        info!(
            "built epoch context for epoch {current_epoch} \
             ({} active validators, {} cached public keys)",
            current_shuffling.active_indices().len(),
            pubkey_cache.len(),
        );

        Ok(Self {
            pubkey_cache,
            previous_shuffling,
            current_shuffling,
            next_shuffling,
            proposers,
            phantom: PhantomData,
        })
    }

    /// Moves every shuffling back by one epoch and computes the one for the new next epoch.
    ///
    /// Must be called exactly once after `state` enters a new epoch. On failure the context is left
    /// unchanged.
    pub fn rotate(&mut self, state: &BeaconState<P>, validators: &FlatValidators) -> Result<()> {
        let state_epoch = accessors::get_current_epoch(state);
        let next_epoch = self.next_shuffling.epoch();

        ensure!(
            state_epoch == next_epoch,
            Error::RotationOutOfOrder {
                state_epoch,
                next_epoch,
            },
        );

        self.pubkey_cache
            .sync(validators.iter().map(|validator| validator.pubkey))?;

        let new_next_shuffling = compute_shuffling(state, validators, state_epoch + 1)?;
        let proposers = compute_proposers_for_shuffling(state, validators, &self.next_shuffling)?;

        self.previous_shuffling = core::mem::replace(
            &mut self.current_shuffling,
            core::mem::replace(&mut self.next_shuffling, Arc::new(new_next_shuffling)),
        );

        self.proposers = proposers;

        debug!(
            "rotated epoch context to epoch {state_epoch} ({} active validators)",
            self.current_shuffling.active_indices().len(),
        );

        Ok(())
    }

    #[must_use]
    pub fn current_epoch(&self) -> Epoch {
        self.current_shuffling.epoch()
    }

    #[must_use]
    pub fn previous_shuffling(&self) -> &EpochShuffling {
        &self.previous_shuffling
    }

    #[must_use]
    pub fn current_shuffling(&self) -> &EpochShuffling {
        &self.current_shuffling
    }

    #[must_use]
    pub fn next_shuffling(&self) -> &EpochShuffling {
        &self.next_shuffling
    }

    #[must_use]
    pub fn proposers(&self) -> &[ValidatorIndex] {
        &self.proposers
    }

    #[must_use]
    pub const fn pubkey_cache(&self) -> &Arc<PubkeyCache> {
        &self.pubkey_cache
    }

    /// Returns whichever of the cached shufflings is for `epoch`.
    pub fn shuffling_at_epoch(&self, epoch: Epoch) -> Result<&EpochShuffling> {
        [
            &self.previous_shuffling,
            &self.current_shuffling,
            &self.next_shuffling,
        ]
        .into_iter()
        .find(|shuffling| shuffling.epoch() == epoch)
        .map(AsRef::as_ref)
        .ok_or_else(|| {
            Error::EpochOutOfRange {
                epoch,
                previous_epoch: self.previous_shuffling.epoch(),
                next_epoch: self.next_shuffling.epoch(),
            }
            .into()
        })
    }

    /// Computes proposers of every slot in `epoch`, which must be one of the cached epochs.
    ///
    /// Only proposers of the current epoch are cached. `validators` must be the registry of
    /// `state`.
    pub fn compute_proposers(
        &self,
        state: &BeaconState<P>,
        validators: &FlatValidators,
        epoch: Epoch,
    ) -> Result<Arc<[ValidatorIndex]>> {
        compute_proposers_for_shuffling(state, validators, self.shuffling_at_epoch(epoch)?)
    }

    pub fn get_committee_count_at_slot(&self, slot: Slot) -> Result<u64> {
        let epoch = misc::compute_epoch_at_slot::<P>(slot);
        Ok(self.shuffling_at_epoch(epoch)?.committees_per_slot())
    }

    pub fn get_beacon_committee(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<&[ValidatorIndex]> {
        let epoch = misc::compute_epoch_at_slot::<P>(slot);
        let shuffling = self.shuffling_at_epoch(epoch)?;
        let slot_in_epoch = misc::slots_since_epoch_start::<P>(slot);

        shuffling
            .committee(slot_in_epoch, committee_index)
            .ok_or_else(|| {
                Error::CommitteeIndexOutOfBounds {
                    slot,
                    committee_index,
                    committee_count: shuffling.committees_per_slot(),
                }
                .into()
            })
    }

    /// Returns the proposer of `slot`, which must be in the current epoch.
    pub fn get_beacon_proposer(&self, slot: Slot) -> Result<ValidatorIndex> {
        let epoch = misc::compute_epoch_at_slot::<P>(slot);
        let current_epoch = self.current_epoch();

        ensure!(
            epoch == current_epoch,
            Error::EpochNotCurrent {
                epoch,
                current_epoch,
            },
        );

        let position = usize::try_from(misc::slots_since_epoch_start::<P>(slot))?;

        Ok(self.proposers[position])
    }

    /// Returns members of the committee that attested to `data` in committee order.
    pub fn get_attesting_indices<'context>(
        &'context self,
        data: AttestationData,
        aggregation_bits: &'context BitList<P::MaxValidatorsPerCommittee>,
    ) -> Result<impl Iterator<Item = ValidatorIndex> + 'context> {
        let committee = self.get_beacon_committee(data.slot, data.index)?;

        ensure!(
            committee.len() == aggregation_bits.len(),
            Error::CommitteeLengthMismatch {
                aggregation_bitlist_length: aggregation_bits.len(),
                committee_length: committee.len(),
            },
        );

        let attesting_indices = committee
            .iter()
            .copied()
            .zip(aggregation_bits.iter())
            .filter_map(|(validator_index, bit)| bit.then_some(validator_index));

        Ok(attesting_indices)
    }

    /// Converts `attestation` to an [`IndexedAttestation`] with indices sorted in ascending order.
    pub fn get_indexed_attestation(
        &self,
        attestation: &Attestation<P>,
    ) -> Result<IndexedAttestation<P>> {
        let attesting_indices = self
            .get_attesting_indices(attestation.data, &attestation.aggregation_bits)?
            .sorted_unstable()
            .collect_vec();

        Ok(IndexedAttestation {
            attesting_indices: ContiguousList::try_from(attesting_indices)?,
            data: attestation.data,
            signature: attestation.signature,
        })
    }

    /// Finds the committee `validator_index` is assigned to in `epoch`.
    ///
    /// `epoch` must be one of the cached epochs. Committees are searched linearly.
    pub fn get_committee_assignment(
        &self,
        epoch: Epoch,
        validator_index: ValidatorIndex,
    ) -> Result<Option<CommitteeAssignment<'_>>> {
        let shuffling = self.shuffling_at_epoch(epoch)?;
        let start_slot = misc::compute_start_slot_at_epoch::<P>(epoch);

        let assignment = (0..P::SlotsPerEpoch::U64)
            .cartesian_product(0..shuffling.committees_per_slot())
            .find_map(|(slot_in_epoch, committee_index)| {
                let committee = shuffling.committee(slot_in_epoch, committee_index)?;

                committee
                    .contains(&validator_index)
                    .then_some(CommitteeAssignment {
                        committee,
                        committee_index,
                        slot: start_slot + slot_in_epoch,
                    })
            });

        Ok(assignment)
    }

    pub fn is_aggregator(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
        slot_signature: SignatureBytes,
    ) -> Result<bool> {
        let committee = self.get_beacon_committee(slot, committee_index)?;
        Ok(predicates::is_aggregator(committee.len(), slot_signature))
    }

    /// Inserts the key of a validator added outside of [`PubkeyCache::sync`].
    pub fn add_pubkey(
        &self,
        validator_index: ValidatorIndex,
        pubkey_bytes: PublicKeyBytes,
    ) -> Result<()> {
        self.pubkey_cache.add_pubkey(validator_index, pubkey_bytes)
    }

    pub fn public_key(&self, validator_index: ValidatorIndex) -> Result<PublicKey> {
        self.pubkey_cache.public_key(validator_index).ok_or_else(|| {
            Error::ValidatorIndexOutOfBounds {
                validator_index,
                validator_count: self.pubkey_cache.len(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn validator_index(&self, pubkey_bytes: &PublicKeyBytes) -> Option<ValidatorIndex> {
        self.pubkey_cache.validator_index(pubkey_bytes)
    }
}

fn compute_shuffling<P: Preset>(
    state: &BeaconState<P>,
    validators: &FlatValidators,
    epoch: Epoch,
) -> Result<EpochShuffling> {
    shuffling::compute_epoch_shuffling::<P>(
        validators
            .iter()
            .map(|validator| (validator.activation_epoch, validator.exit_epoch)),
        epoch,
        accessors::seed_randao_mix(state, epoch),
    )
}

fn compute_proposers_for_shuffling<P: Preset>(
    state: &BeaconState<P>,
    validators: &FlatValidators,
    shuffling: &EpochShuffling,
) -> Result<Arc<[ValidatorIndex]>> {
    let epoch = shuffling.epoch();
    let epoch_seed = accessors::get_seed(state, epoch, DOMAIN_BEACON_PROPOSER);
    let start_slot = misc::compute_start_slot_at_epoch::<P>(epoch);

    let effective_balance = |validator_index: ValidatorIndex| {
        usize::try_from(validator_index)
            .ok()
            .and_then(|position| validators.get(position))
            .map_or(0, |validator| validator.effective_balance)
    };

    (start_slot..start_slot + P::SlotsPerEpoch::U64)
        .map(|slot| {
            let seed = hashing::hash_256_64(epoch_seed, slot);
            misc::compute_proposer_index::<P>(shuffling.active_indices(), seed, effective_balance)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bls::SignatureBytes;
    use itertools::Itertools as _;
    use test_case::test_case;
    use types::{
        config::Config,
        phase0::{containers::Checkpoint, primitives::H256},
    };

    use crate::test_utils::{self, TwoSlots};

    use super::*;

    fn flat_validators(state: &BeaconState<TwoSlots>) -> FlatValidators {
        state.validators.iter().copied().collect()
    }

    fn context_at_genesis(
        validator_count: u64,
    ) -> Result<(BeaconState<TwoSlots>, EpochContext<TwoSlots>)> {
        let state = test_utils::genesis_state(&Config::minimal(), validator_count);
        let validators = flat_validators(&state);
        let context = EpochContext::new(Arc::new(PubkeyCache::new()), &state, &validators)?;
        Ok((state, context))
    }

    fn attestation_data(slot: Slot, index: CommitteeIndex) -> AttestationData {
        AttestationData {
            slot,
            index,
            target: Checkpoint {
                epoch: misc::compute_epoch_at_slot::<TwoSlots>(slot),
                root: H256::zero(),
            },
            ..AttestationData::default()
        }
    }

    #[test]
    fn previous_shuffling_is_current_at_genesis() -> Result<()> {
        let (_, context) = context_at_genesis(16)?;

        assert_eq!(context.current_epoch(), 0);
        assert_eq!(context.previous_shuffling(), context.current_shuffling());
        assert_eq!(context.next_shuffling().epoch(), 1);
        assert_eq!(context.pubkey_cache().len(), 16);

        Ok(())
    }

    #[test]
    fn proposers_are_active_validators() -> Result<()> {
        let (state, context) = context_at_genesis(16)?;

        assert_eq!(context.proposers().len(), 2);

        for slot in 0..2 {
            let proposer = context.get_beacon_proposer(slot)?;
            assert!(context.current_shuffling().active_indices().contains(&proposer));
        }

        let validators = flat_validators(&state);

        assert_eq!(
            context.compute_proposers(&state, &validators, 0)?.as_ref(),
            context.proposers(),
        );
        assert_eq!(context.compute_proposers(&state, &validators, 1)?.len(), 2);
        assert!(context.compute_proposers(&state, &validators, 2).is_err());
        assert!(context.get_beacon_proposer(2).is_err());

        Ok(())
    }

    #[test]
    fn proposers_cannot_be_computed_without_active_validators() {
        assert!(context_at_genesis(0).is_err());
    }

    #[test_case(0, 0 => true)]
    #[test_case(0, 1 => true)]
    #[test_case(0, 2 => false)]
    #[test_case(3, 1 => true)]
    #[test_case(4, 0 => false)]
    fn beacon_committee_is_available(slot: Slot, committee_index: CommitteeIndex) -> bool {
        let (_, context) = context_at_genesis(16).expect("genesis state has active validators");
        context.get_beacon_committee(slot, committee_index).is_ok()
    }

    #[test]
    fn committees_of_each_epoch_cover_active_validators() -> Result<()> {
        let (_, context) = context_at_genesis(16)?;

        for epoch in 0..2 {
            let start_slot = misc::compute_start_slot_at_epoch::<TwoSlots>(epoch);
            let mut members = vec![];

            for slot in start_slot..start_slot + 2 {
                assert_eq!(context.get_committee_count_at_slot(slot)?, 2);

                for committee_index in 0..2 {
                    members.extend_from_slice(context.get_beacon_committee(slot, committee_index)?);
                }
            }

            members.sort_unstable();

            assert_eq!(members, (0..16).collect_vec());
        }

        Ok(())
    }

    #[test]
    fn committee_assignment_matches_committees() -> Result<()> {
        let (_, context) = context_at_genesis(16)?;

        for validator_index in 0..16 {
            let assignment = context
                .get_committee_assignment(1, validator_index)?
                .expect("every active validator is assigned to a committee");

            assert!(assignment.committee.contains(&validator_index));
            assert_eq!(
                context.get_beacon_committee(assignment.slot, assignment.committee_index)?,
                assignment.committee,
            );
        }

        assert_eq!(context.get_committee_assignment(0, 16)?, None);
        assert!(context.get_committee_assignment(2, 0).is_err());

        Ok(())
    }

    #[test]
    fn indexed_attestation_is_sorted() -> Result<()> {
        let (_, context) = context_at_genesis(16)?;
        let data = attestation_data(1, 1);
        let committee = context.get_beacon_committee(1, 1)?.to_vec();

        let aggregation_bits = (0..committee.len()).map(|position| position != 1).collect();

        let attestation = Attestation::<TwoSlots> {
            aggregation_bits,
            data,
            signature: SignatureBytes::empty(),
        };

        let in_committee_order = context
            .get_attesting_indices(data, &attestation.aggregation_bits)?
            .collect_vec();

        let indexed_attestation = context.get_indexed_attestation(&attestation)?;

        let mut expected = committee.clone();
        expected.remove(1);

        assert_eq!(in_committee_order, expected);

        expected.sort_unstable();

        assert_eq!(indexed_attestation.attesting_indices.to_vec(), expected);
        assert_eq!(indexed_attestation.data, data);

        Ok(())
    }

    #[test]
    fn aggregation_bits_must_match_committee_length() -> Result<()> {
        let (_, context) = context_at_genesis(16)?;
        let committee_length = context.get_beacon_committee(0, 0)?.len();
        let aggregation_bits = BitList::with_length(committee_length + 1)?;

        let result = context.get_attesting_indices(attestation_data(0, 0), &aggregation_bits);

        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn small_committees_always_aggregate() -> Result<()> {
        let (_, context) = context_at_genesis(16)?;

        assert!(context.is_aggregator(0, 0, SignatureBytes::repeat_byte(0x42))?);
        assert!(context.is_aggregator(0, 5, SignatureBytes::empty()).is_err());

        Ok(())
    }

    #[test]
    fn rotation_shifts_shufflings() -> Result<()> {
        let (mut state, mut context) = context_at_genesis(16)?;
        let validators = flat_validators(&state);
        let old_copy = context.clone();

        assert!(context.rotate(&state, &validators).is_err());

        state.slot = 2;
        context.rotate(&state, &validators)?;

        assert_eq!(context.current_epoch(), 1);
        assert_eq!(context.previous_shuffling(), old_copy.current_shuffling());
        assert_eq!(context.current_shuffling(), old_copy.next_shuffling());
        assert_eq!(context.next_shuffling().epoch(), 2);
        assert_eq!(
            context.compute_proposers(&state, &validators, 1)?.as_ref(),
            context.proposers(),
        );

        // The copy made before rotation still describes epoch 0.
        assert_eq!(old_copy.current_epoch(), 0);
        assert!(Arc::ptr_eq(old_copy.pubkey_cache(), context.pubkey_cache()));

        Ok(())
    }

    #[test]
    fn rotation_excludes_exited_validators() -> Result<()> {
        let (mut state, mut context) = context_at_genesis(16)?;

        let mut validators = flat_validators(&state);
        validators[3].exit_epoch = 2;

        state.slot = 2;
        context.rotate(&state, &validators)?;

        assert!(context.current_shuffling().active_indices().contains(&3));
        assert!(!context.next_shuffling().active_indices().contains(&3));
        assert_eq!(context.next_shuffling().active_indices().len(), 15);

        Ok(())
    }

    #[test]
    fn public_keys_resolve_both_ways() -> Result<()> {
        let (state, context) = context_at_genesis(4)?;

        for (validator, validator_index) in state.validators.iter().zip(0..) {
            assert_eq!(context.public_key(validator_index)?.to_bytes(), validator.pubkey);
            assert_eq!(context.validator_index(&validator.pubkey), Some(validator_index));
        }

        assert!(context.public_key(4).is_err());

        Ok(())
    }
}

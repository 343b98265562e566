//! Committee shuffling.
//!
//! [`compute_epoch_shuffling`] computes all committees of an epoch at once, which is how they are
//! needed when processing attestations and computing duties.

use core::ops::Range;

use anyhow::Result;
use typenum::Unsigned as _;
use types::{
    phase0::{
        consts::DOMAIN_BEACON_ATTESTER,
        primitives::{CommitteeIndex, DomainType, Epoch, ValidatorIndex, H256},
    },
    preset::Preset,
};

pub use crate::swap_or_not::{shuffle_single, shuffle_slice};

mod swap_or_not;

/// Active validators of an epoch partitioned into committees.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EpochShuffling {
    epoch: Epoch,
    seed: H256,
    active_indices: Box<[ValidatorIndex]>,
    shuffled_indices: Box<[ValidatorIndex]>,
    slots_per_epoch: u64,
    committees_per_slot: u64,
}

impl EpochShuffling {
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub const fn seed(&self) -> H256 {
        self.seed
    }

    /// Indices of validators active in the epoch in ascending order.
    #[must_use]
    pub fn active_indices(&self) -> &[ValidatorIndex] {
        &self.active_indices
    }

    /// Active indices in shuffled order. Committees are contiguous subslices of this.
    #[must_use]
    pub fn shuffled_indices(&self) -> &[ValidatorIndex] {
        &self.shuffled_indices
    }

    #[must_use]
    pub const fn committees_per_slot(&self) -> u64 {
        self.committees_per_slot
    }

    /// Returns the committee with index `committee_index` in the `slot_in_epoch`th slot.
    #[must_use]
    pub fn committee(
        &self,
        slot_in_epoch: u64,
        committee_index: CommitteeIndex,
    ) -> Option<&[ValidatorIndex]> {
        if slot_in_epoch >= self.slots_per_epoch || committee_index >= self.committees_per_slot {
            return None;
        }

        let index_in_epoch = slot_in_epoch * self.committees_per_slot + committee_index;

        Some(&self.shuffled_indices[self.committee_bounds(index_in_epoch)])
    }

    /// Committees of the `slot_in_epoch`th slot in order of committee index.
    pub fn committees_at_slot(
        &self,
        slot_in_epoch: u64,
    ) -> impl Iterator<Item = &[ValidatorIndex]> {
        (0..self.committees_per_slot)
            .filter_map(move |committee_index| self.committee(slot_in_epoch, committee_index))
    }

    /// All committees of the epoch in order of slot and committee index.
    pub fn committees(&self) -> impl Iterator<Item = &[ValidatorIndex]> {
        (0..self.slots_per_epoch).flat_map(|slot_in_epoch| self.committees_at_slot(slot_in_epoch))
    }

    // [`compute_committee`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#compute_committee)
    // without the shuffling, which is done in advance.
    fn committee_bounds(&self, index_in_epoch: u64) -> Range<usize> {
        let committee_count = self.slots_per_epoch * self.committees_per_slot;
        let validator_count = self.shuffled_indices.len() as u64;

        let start = validator_count * index_in_epoch / committee_count;
        let end = validator_count * (index_in_epoch + 1) / committee_count;

        let convert = |bound: u64| usize::try_from(bound).expect("bound is at most the length");

        convert(start)..convert(end)
    }
}

/// Computes committees for `epoch`.
///
/// `validators` yields `(activation_epoch, exit_epoch)` for every validator in the registry in
/// order of validator index. `randao_mix` is the mix that seeds the epoch, as selected by
/// [`get_seed`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#get_seed).
pub fn compute_epoch_shuffling<P: Preset>(
    validators: impl IntoIterator<Item = (Epoch, Epoch)>,
    epoch: Epoch,
    randao_mix: H256,
) -> Result<EpochShuffling> {
    let active_indices = validators
        .into_iter()
        .zip(0..)
        .filter(|((activation_epoch, exit_epoch), _)| {
            *activation_epoch <= epoch && epoch < *exit_epoch
        })
        .map(|(_, validator_index)| validator_index)
        .collect::<Box<[_]>>();

    let seed = compute_seed(DOMAIN_BEACON_ATTESTER, epoch, randao_mix);

    let mut shuffled_indices = active_indices.clone();
    shuffle_slice::<P, _>(&mut shuffled_indices, seed)?;

    let committees_per_slot =
        committee_count_from_active_validator_count::<P>(active_indices.len() as u64);

    Ok(EpochShuffling {
        epoch,
        seed,
        active_indices,
        shuffled_indices,
        slots_per_epoch: P::SlotsPerEpoch::U64,
        committees_per_slot,
    })
}

/// The seed for `epoch` and `domain_type` derived from an already selected randao mix.
#[must_use]
pub fn compute_seed(domain_type: DomainType, epoch: Epoch, randao_mix: H256) -> H256 {
    hashing::hash_32_64_256(domain_type.to_fixed_bytes(), epoch, randao_mix)
}

/// [`get_committee_count_per_slot`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#get_committee_count_per_slot)
/// without the state access.
#[must_use]
pub fn committee_count_from_active_validator_count<P: Preset>(active_validator_count: u64) -> u64 {
    (active_validator_count / P::SlotsPerEpoch::U64 / P::TARGET_COMMITTEE_SIZE)
        .clamp(1, P::MAX_COMMITTEES_PER_SLOT.get())
}

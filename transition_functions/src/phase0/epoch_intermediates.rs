//! Attester statuses and epoch-wide statistics.
//!
//! Everything here is computed in a fixed number of linear passes over the registry and the pending
//! attestations of a [`CachedBeaconState`]. The registry pass must finish before attestations are
//! looked at because the latter only ever add flags to statuses created by the former.

use core::num::NonZeroU64;

use anyhow::Result;
use enumset::{EnumSet, EnumSetType};
use epoch_cache::CachedBeaconState;
use helper_functions::{misc, predicates};
use itertools::Itertools as _;
use typenum::Unsigned as _;
use types::{
    config::Config,
    phase0::{
        consts::FAR_FUTURE_EPOCH,
        containers::PendingAttestation,
        primitives::{Epoch, Gwei, ValidatorIndex},
    },
    preset::Preset,
};

use crate::error::Error;

#[derive(EnumSetType, Debug)]
pub enum AttesterFlag {
    /// Active in the current epoch.
    Active,
    /// Active in the previous epoch or slashed and not yet withdrawable.
    EligibleAttester,
    Unslashed,
    PreviousSource,
    PreviousTarget,
    PreviousHead,
    CurrentSource,
    CurrentTarget,
    CurrentHead,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Inclusion {
    pub delay: NonZeroU64,
    pub proposer_index: ValidatorIndex,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct AttesterStatus {
    pub flags: EnumSet<AttesterFlag>,
    /// Fastest inclusion among attestations from the previous epoch.
    pub inclusion: Option<Inclusion>,
}

impl AttesterStatus {
    #[must_use]
    pub fn has(self, flags: impl Into<EnumSet<AttesterFlag>>) -> bool {
        self.flags.is_superset(flags.into())
    }
}

/// Position of the next exit in the exit queue.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ExitQueue {
    pub end: Epoch,
    /// Number of validators already exiting in [`ExitQueue::end`].
    pub churn: u64,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EpochProcess {
    pub previous_epoch: Epoch,
    pub current_epoch: Epoch,
    /// Indexed by validator index.
    pub statuses: Vec<AttesterStatus>,

    pub current_epoch_active_balance: Gwei,
    pub previous_epoch_source_attesting_balance: Gwei,
    pub previous_epoch_target_attesting_balance: Gwei,
    pub previous_epoch_head_attesting_balance: Gwei,
    pub current_epoch_target_attesting_balance: Gwei,

    /// Slashed validators halfway to becoming withdrawable.
    pub indices_to_slash: Vec<ValidatorIndex>,
    pub indices_to_set_activation_eligibility: Vec<ValidatorIndex>,
    /// Sorted by activation eligibility epoch and then index. Still subject to finality.
    pub indices_to_maybe_activate: Vec<ValidatorIndex>,
    pub indices_to_eject: Vec<ValidatorIndex>,

    pub exit_queue: ExitQueue,
    pub churn_limit: u64,
}

#[derive(Clone, Copy)]
enum AttestationEpoch {
    Previous,
    Current,
}

pub fn prepare_epoch_process<P: Preset>(
    config: &Config,
    state: &CachedBeaconState<P>,
) -> Result<EpochProcess> {
    let epoch_context = state.epoch_context();
    let previous_epoch = epoch_context.previous_shuffling().epoch();
    let current_epoch = epoch_context.current_epoch();
    let slashings_epoch = current_epoch + P::EpochsPerSlashingsVector::U64 / 2;

    let mut statuses = Vec::with_capacity(state.validator_count());
    let mut current_epoch_active_balance = 0;
    let mut active_validator_count = 0;
    let mut exit_queue_end = misc::compute_activation_exit_epoch::<P>(current_epoch);

    let mut indices_to_slash = vec![];
    let mut indices_to_set_activation_eligibility = vec![];
    let mut activation_queue = vec![];
    let mut indices_to_eject = vec![];

    for (validator, validator_index) in state.validators().zip(0..) {
        let mut status = AttesterStatus::default();

        if validator.slashed {
            if slashings_epoch == validator.withdrawable_epoch {
                indices_to_slash.push(validator_index);
            }
        } else {
            status.flags |= AttesterFlag::Unslashed;
        }

        if validator.is_active(previous_epoch)
            || validator.slashed && previous_epoch + 1 < validator.withdrawable_epoch
        {
            status.flags |= AttesterFlag::EligibleAttester;
        }

        let active = validator.is_active(current_epoch);

        if active {
            status.flags |= AttesterFlag::Active;
            current_epoch_active_balance += validator.effective_balance;
            active_validator_count += 1;
        }

        if validator.exit_epoch != FAR_FUTURE_EPOCH && validator.exit_epoch > exit_queue_end {
            exit_queue_end = validator.exit_epoch;
        }

        if predicates::is_eligible_for_activation_queue::<P>(validator) {
            indices_to_set_activation_eligibility.push(validator_index);
        }

        if validator.activation_epoch == FAR_FUTURE_EPOCH
            && validator.activation_eligibility_epoch <= current_epoch
        {
            activation_queue.push((validator.activation_eligibility_epoch, validator_index));
        }

        if active
            && validator.exit_epoch == FAR_FUTURE_EPOCH
            && validator.effective_balance <= config.ejection_balance
        {
            indices_to_eject.push(validator_index);
        }

        statuses.push(status);
    }

    clamp_balance::<P>(&mut current_epoch_active_balance);

    // > Order by the sequence of activation_eligibility_epoch setting and then index
    let indices_to_maybe_activate = activation_queue
        .into_iter()
        .sorted_unstable()
        .map(|(_, validator_index)| validator_index)
        .collect();

    let churn_limit = misc::compute_validator_churn_limit(config, active_validator_count);

    let mut exit_queue = ExitQueue {
        end: exit_queue_end,
        churn: state
            .validators()
            .filter(|validator| validator.exit_epoch == exit_queue_end)
            .count()
            .try_into()?,
    };

    if exit_queue.churn >= churn_limit {
        exit_queue.end += 1;
        exit_queue.churn = 0;
    }

    accumulate_attestations(
        state,
        &mut statuses,
        previous_epoch,
        state.previous_epoch_attestations(),
        AttestationEpoch::Previous,
    )?;

    accumulate_attestations(
        state,
        &mut statuses,
        current_epoch,
        state.current_epoch_attestations(),
        AttestationEpoch::Current,
    )?;

    let mut previous_epoch_source_attesting_balance = 0;
    let mut previous_epoch_target_attesting_balance = 0;
    let mut previous_epoch_head_attesting_balance = 0;
    let mut current_epoch_target_attesting_balance = 0;

    for (validator, status) in state.validators().zip(&statuses) {
        let effective_balance = validator.effective_balance;

        if status.has(AttesterFlag::PreviousSource | AttesterFlag::Unslashed) {
            previous_epoch_source_attesting_balance += effective_balance;

            if status.has(AttesterFlag::PreviousTarget) {
                previous_epoch_target_attesting_balance += effective_balance;

                if status.has(AttesterFlag::PreviousHead) {
                    previous_epoch_head_attesting_balance += effective_balance;
                }
            }
        }

        if status.has(AttesterFlag::CurrentTarget | AttesterFlag::Unslashed) {
            current_epoch_target_attesting_balance += effective_balance;
        }
    }

    clamp_balance::<P>(&mut previous_epoch_source_attesting_balance);
    clamp_balance::<P>(&mut previous_epoch_target_attesting_balance);
    clamp_balance::<P>(&mut previous_epoch_head_attesting_balance);
    clamp_balance::<P>(&mut current_epoch_target_attesting_balance);

    Ok(EpochProcess {
        previous_epoch,
        current_epoch,
        statuses,
        current_epoch_active_balance,
        previous_epoch_source_attesting_balance,
        previous_epoch_target_attesting_balance,
        previous_epoch_head_attesting_balance,
        current_epoch_target_attesting_balance,
        indices_to_slash,
        indices_to_set_activation_eligibility,
        indices_to_maybe_activate,
        indices_to_eject,
        exit_queue,
        churn_limit,
    })
}

fn accumulate_attestations<'attestations, P: Preset>(
    state: &CachedBeaconState<P>,
    statuses: &mut [AttesterStatus],
    epoch: Epoch,
    attestations: impl IntoIterator<Item = &'attestations PendingAttestation<P>>,
    attestation_epoch: AttestationEpoch,
) -> Result<()> {
    let (source_flag, target_flag, head_flag) = match attestation_epoch {
        AttestationEpoch::Previous => (
            AttesterFlag::PreviousSource,
            AttesterFlag::PreviousTarget,
            AttesterFlag::PreviousHead,
        ),
        AttestationEpoch::Current => (
            AttesterFlag::CurrentSource,
            AttesterFlag::CurrentTarget,
            AttesterFlag::CurrentHead,
        ),
    };

    // Roots that are no longer (or not yet) in the history cannot match anything.
    let target_root = state
        .block_root_at_slot(misc::compute_start_slot_at_epoch::<P>(epoch))
        .ok();

    for attestation in attestations {
        let data = attestation.data;
        let mut flags = EnumSet::only(source_flag);

        if target_root == Some(data.target.root) {
            flags |= target_flag;

            if state.block_root_at_slot(data.slot).ok() == Some(data.beacon_block_root) {
                flags |= head_flag;
            }
        }

        let inclusion = Inclusion {
            delay: attestation.inclusion_delay.try_into()?,
            proposer_index: attestation.proposer_index,
        };

        for validator_index in state
            .epoch_context()
            .get_attesting_indices(data, &attestation.aggregation_bits)?
        {
            let validator_count = statuses.len();

            let status = usize::try_from(validator_index)
                .ok()
                .and_then(|position| statuses.get_mut(position))
                .ok_or(Error::UnknownAttester {
                    validator_index,
                    validator_count,
                })?;

            status.flags |= flags;

            if matches!(attestation_epoch, AttestationEpoch::Previous)
                && status
                    .inclusion
                    .is_none_or(|fastest| inclusion.delay < fastest.delay)
            {
                status.inclusion = Some(inclusion);
            }
        }
    }

    Ok(())
}

fn clamp_balance<P: Preset>(balance: &mut Gwei) {
    *balance = P::EFFECTIVE_BALANCE_INCREMENT.get().max(*balance);
}

#[cfg(test)]
mod tests {
    use ssz::BitList;
    use types::{
        phase0::containers::{AttestationData, Checkpoint, Validator},
        preset::Minimal,
    };

    use crate::test_utils;

    use super::*;

    const INCREMENT: Gwei = Minimal::EFFECTIVE_BALANCE_INCREMENT.get();

    fn full_committee_attestation(
        state: &CachedBeaconState<Minimal>,
        slot: u64,
        target_epoch: Epoch,
        inclusion_delay: u64,
        proposer_index: ValidatorIndex,
    ) -> Result<PendingAttestation<Minimal>> {
        let committee_length = state.epoch_context().get_beacon_committee(slot, 0)?.len();

        Ok(PendingAttestation {
            aggregation_bits: core::iter::repeat_n(true, committee_length).collect::<BitList<_>>(),
            data: AttestationData {
                slot,
                target: Checkpoint {
                    epoch: target_epoch,
                    ..Checkpoint::default()
                },
                ..AttestationData::default()
            },
            inclusion_delay,
            proposer_index,
        })
    }

    #[test]
    fn registry_without_attestations() -> Result<()> {
        let config = Config::minimal();
        let state = test_utils::cached_state::<Minimal>(
            &config,
            7,
            test_utils::active_validators(16),
        )?;
        let epoch_process = prepare_epoch_process(&config, &state)?;

        let expected_flags =
            AttesterFlag::Active | AttesterFlag::EligibleAttester | AttesterFlag::Unslashed;

        assert!(epoch_process
            .statuses
            .iter()
            .all(|status| status.flags == expected_flags && status.inclusion.is_none()));

        assert_eq!(
            epoch_process.current_epoch_active_balance,
            16 * Minimal::MAX_EFFECTIVE_BALANCE,
        );
        assert_eq!(epoch_process.previous_epoch_source_attesting_balance, INCREMENT);
        assert_eq!(epoch_process.previous_epoch_target_attesting_balance, INCREMENT);
        assert_eq!(epoch_process.previous_epoch_head_attesting_balance, INCREMENT);
        assert_eq!(epoch_process.current_epoch_target_attesting_balance, INCREMENT);
        assert!(epoch_process.indices_to_slash.is_empty());
        assert!(epoch_process.indices_to_maybe_activate.is_empty());
        assert!(epoch_process.indices_to_eject.is_empty());
        assert_eq!(epoch_process.exit_queue, ExitQueue { end: 5, churn: 0 });
        assert_eq!(epoch_process.churn_limit, config.min_per_epoch_churn_limit);

        Ok(())
    }

    #[test]
    fn small_active_balance_is_clamped() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(4);

        for validator in &mut validators[1..] {
            validator.exit_epoch = 0;
        }

        validators[0].effective_balance = INCREMENT / 2;

        let state = test_utils::cached_state::<Minimal>(&config, 7, validators)?;
        let epoch_process = prepare_epoch_process(&config, &state)?;

        assert_eq!(epoch_process.current_epoch_active_balance, INCREMENT);
        assert!(epoch_process.statuses[0].has(AttesterFlag::Active));
        assert!(epoch_process.statuses[1..]
            .iter()
            .all(|status| !status.has(AttesterFlag::Active)));

        Ok(())
    }

    #[test]
    fn flags_are_nested_and_only_added() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            15,
            test_utils::active_validators(16),
        )?;

        // All block roots in the history are zero, so default attestation data matches them.
        let matching = full_committee_attestation(&state, 1, 0, 1, 0)?;

        let mut wrong_head = full_committee_attestation(&state, 2, 0, 1, 0)?;
        wrong_head.data.beacon_block_root.0[0] = 1;

        let mut wrong_target = full_committee_attestation(&state, 3, 0, 1, 0)?;
        wrong_target.data.target.root.0[0] = 1;

        let members = |slot| -> Result<Vec<ValidatorIndex>> {
            Ok(state.epoch_context().get_beacon_committee(slot, 0)?.to_vec())
        };

        let (head_attesters, target_attesters, source_attesters) =
            (members(1)?, members(2)?, members(3)?);

        state.push_pending_attestation(matching)?;
        state.push_pending_attestation(wrong_head)?;
        state.push_pending_attestation(wrong_target)?;

        let epoch_process = prepare_epoch_process(&config, &state)?;
        let status = |validator_index: ValidatorIndex| epoch_process.statuses[validator_index as usize];

        for validator_index in head_attesters {
            assert!(status(validator_index).has(
                AttesterFlag::PreviousSource
                    | AttesterFlag::PreviousTarget
                    | AttesterFlag::PreviousHead,
            ));
        }

        for validator_index in target_attesters {
            assert!(status(validator_index)
                .has(AttesterFlag::PreviousSource | AttesterFlag::PreviousTarget));
            assert!(!status(validator_index).has(AttesterFlag::PreviousHead));
        }

        for validator_index in source_attesters {
            assert!(status(validator_index).has(AttesterFlag::PreviousSource));
            assert!(!status(validator_index).has(AttesterFlag::PreviousTarget));
            assert!(!status(validator_index).has(AttesterFlag::PreviousHead));
        }

        assert!(epoch_process
            .statuses
            .iter()
            .all(|status| !status.has(AttesterFlag::CurrentSource)));

        let committee_balance = 2 * Minimal::MAX_EFFECTIVE_BALANCE;

        assert_eq!(
            epoch_process.previous_epoch_source_attesting_balance,
            3 * committee_balance,
        );
        assert_eq!(
            epoch_process.previous_epoch_target_attesting_balance,
            2 * committee_balance,
        );
        assert_eq!(
            epoch_process.previous_epoch_head_attesting_balance,
            committee_balance,
        );

        Ok(())
    }

    #[test]
    fn fastest_inclusion_is_kept() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            15,
            test_utils::active_validators(16),
        )?;

        for (inclusion_delay, proposer_index) in [(3, 7), (1, 8), (2, 9), (1, 10)] {
            let attestation =
                full_committee_attestation(&state, 4, 0, inclusion_delay, proposer_index)?;
            state.push_pending_attestation(attestation)?;
        }

        let epoch_process = prepare_epoch_process(&config, &state)?;

        for &validator_index in state.epoch_context().get_beacon_committee(4, 0)? {
            assert_eq!(
                epoch_process.statuses[validator_index as usize].inclusion,
                Some(Inclusion {
                    delay: NonZeroU64::MIN,
                    proposer_index: 8,
                }),
            );
        }

        Ok(())
    }

    #[test]
    fn current_epoch_attestations_do_not_record_inclusion() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            15,
            test_utils::active_validators(16),
        )?;

        let attestation = full_committee_attestation(&state, 9, 1, 1, 0)?;
        state.push_pending_attestation(attestation)?;

        let epoch_process = prepare_epoch_process(&config, &state)?;

        for &validator_index in state.epoch_context().get_beacon_committee(9, 0)? {
            let status = epoch_process.statuses[validator_index as usize];

            assert!(status.has(AttesterFlag::CurrentSource | AttesterFlag::CurrentTarget));
            assert_eq!(status.inclusion, None);
        }

        assert_eq!(
            epoch_process.current_epoch_target_attesting_balance,
            2 * Minimal::MAX_EFFECTIVE_BALANCE,
        );

        Ok(())
    }

    #[test]
    fn slashed_attesters_are_not_counted() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(16);

        // Halfway through the slashings vector as seen from epoch 1.
        validators[0].slashed = true;
        validators[0].withdrawable_epoch = 1 + 32;

        let mut state = test_utils::cached_state::<Minimal>(&config, 15, validators)?;

        let slot = (8..16)
            .find(|&slot| {
                state
                    .epoch_context()
                    .get_beacon_committee(slot, 0)
                    .is_ok_and(|committee| committee.contains(&0))
            })
            .expect("validator 0 is in some committee of the current epoch");

        let attestation = full_committee_attestation(&state, slot, 1, 1, 0)?;
        state.push_pending_attestation(attestation)?;

        let epoch_process = prepare_epoch_process(&config, &state)?;
        let status = epoch_process.statuses[0];

        assert_eq!(epoch_process.indices_to_slash, [0]);
        assert!(!status.has(AttesterFlag::Unslashed));
        assert!(status.has(AttesterFlag::CurrentTarget | AttesterFlag::EligibleAttester));
        assert_eq!(
            epoch_process.current_epoch_target_attesting_balance,
            Minimal::MAX_EFFECTIVE_BALANCE,
        );

        Ok(())
    }

    #[test]
    fn slashed_validators_stay_eligible_until_withdrawable() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(16);

        for (validator, withdrawable_epoch) in validators.iter_mut().zip([2, 3]) {
            *validator = Validator {
                slashed: true,
                exit_epoch: 1,
                withdrawable_epoch,
                ..*validator
            };
        }

        let state = test_utils::cached_state::<Minimal>(&config, 23, validators)?;
        let epoch_process = prepare_epoch_process(&config, &state)?;

        assert!(!epoch_process.statuses[0].has(AttesterFlag::EligibleAttester));
        assert!(epoch_process.statuses[1].has(AttesterFlag::EligibleAttester));

        Ok(())
    }

    #[test]
    fn activation_candidates_are_sorted_by_eligibility_then_index() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(16);

        for (validator_index, activation_eligibility_epoch) in [(3, 2), (5, 1), (9, 2), (1, 1)] {
            validators[validator_index] = Validator {
                activation_eligibility_epoch,
                activation_epoch: FAR_FUTURE_EPOCH,
                ..validators[validator_index]
            };
        }

        // Not eligible yet at epoch 2.
        validators[12].activation_eligibility_epoch = 3;
        validators[12].activation_epoch = FAR_FUTURE_EPOCH;

        let state = test_utils::cached_state::<Minimal>(&config, 23, validators)?;
        let epoch_process = prepare_epoch_process(&config, &state)?;

        assert_eq!(epoch_process.indices_to_maybe_activate, [1, 5, 3, 9]);

        Ok(())
    }

    #[test]
    fn registry_candidates() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(16);

        validators[2].activation_eligibility_epoch = FAR_FUTURE_EPOCH;
        validators[2].activation_epoch = FAR_FUTURE_EPOCH;
        validators[4].effective_balance = config.ejection_balance;
        validators[6].effective_balance = config.ejection_balance + INCREMENT;
        validators[8].effective_balance = config.ejection_balance;
        validators[8].exit_epoch = 9;

        let state = test_utils::cached_state::<Minimal>(&config, 7, validators)?;
        let epoch_process = prepare_epoch_process(&config, &state)?;

        assert_eq!(epoch_process.indices_to_set_activation_eligibility, [2]);
        assert_eq!(epoch_process.indices_to_eject, [4]);
        assert_eq!(epoch_process.exit_queue, ExitQueue { end: 9, churn: 1 });

        Ok(())
    }

    #[test]
    fn full_exit_queue_moves_to_next_epoch() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(16);
        let churn_limit = config.min_per_epoch_churn_limit;

        for validator in validators.iter_mut().take(churn_limit as usize) {
            validator.exit_epoch = 5;
        }

        let state = test_utils::cached_state::<Minimal>(&config, 7, validators)?;
        let epoch_process = prepare_epoch_process(&config, &state)?;

        assert_eq!(epoch_process.churn_limit, churn_limit);
        assert_eq!(epoch_process.exit_queue, ExitQueue { end: 6, churn: 0 });

        Ok(())
    }

    #[test]
    fn mismatched_aggregation_bits_are_rejected() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            15,
            test_utils::active_validators(16),
        )?;
        let mut attestation = full_committee_attestation(&state, 9, 1, 1, 0)?;

        attestation.aggregation_bits = [true; 5].into_iter().collect();
        state.push_pending_attestation(attestation)?;

        assert!(prepare_epoch_process(&config, &state).is_err());

        Ok(())
    }
}

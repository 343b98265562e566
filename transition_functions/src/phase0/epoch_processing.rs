use anyhow::Result;
use epoch_cache::CachedBeaconState;
use helper_functions::{misc, predicates};
use tracing::debug;
use types::{
    config::Config,
    phase0::{consts::FAR_FUTURE_EPOCH, primitives::ValidatorIndex},
    preset::Preset,
};

use super::epoch_intermediates::{self, EpochProcess, ExitQueue};

/// Runs the parts of epoch processing that depend only on the registry and pending attestations.
///
/// The returned [`EpochProcess`] reflects the state before registry updates, except for the exit
/// queue, which includes exits initiated here.
pub fn process_epoch<P: Preset>(
    config: &Config,
    state: &mut CachedBeaconState<P>,
) -> Result<EpochProcess> {
    let mut epoch_process = epoch_intermediates::prepare_epoch_process(config, state)?;

    process_registry_updates(config, state, &mut epoch_process)?;
    process_randao_mixes_reset(state);
    state.rotate_epoch_attestations();

    debug!(
        "processed epoch {} (active balance: {}, ejections: {})",
        epoch_process.current_epoch,
        epoch_process.current_epoch_active_balance,
        epoch_process.indices_to_eject.len(),
    );

    Ok(epoch_process)
}

pub fn process_registry_updates<P: Preset>(
    config: &Config,
    state: &mut CachedBeaconState<P>,
    epoch_process: &mut EpochProcess,
) -> Result<()> {
    let current_epoch = epoch_process.current_epoch;
    let next_epoch = current_epoch + 1;

    // > Process activation eligibility and ejections
    for &validator_index in &epoch_process.indices_to_set_activation_eligibility {
        state.update_validator(validator_index, |validator| {
            validator.activation_eligibility_epoch = next_epoch;
        })?;
    }

    for &validator_index in &epoch_process.indices_to_eject {
        initiate_validator_exit(
            config,
            state,
            &mut epoch_process.exit_queue,
            epoch_process.churn_limit,
            validator_index,
        )?;
    }

    // > Dequeued validators for activation up to churn limit
    let finalized_epoch = state.finalized_checkpoint().epoch;
    let activation_epoch = misc::compute_activation_exit_epoch::<P>(current_epoch);
    let churn_limit = usize::try_from(epoch_process.churn_limit)?;

    for &validator_index in epoch_process.indices_to_maybe_activate.iter().take(churn_limit) {
        let validator = state.validator(validator_index)?;

        // The queue is ordered by eligibility epoch, so the rest cannot be eligible either.
        if !predicates::is_eligible_for_activation(finalized_epoch, validator) {
            break;
        }

        state.update_validator(validator_index, |validator| {
            validator.activation_epoch = activation_epoch;
        })?;
    }

    Ok(())
}

/// Queues `validator_index` for exit using the precomputed position of the exit queue.
pub fn initiate_validator_exit<P: Preset>(
    config: &Config,
    state: &mut CachedBeaconState<P>,
    exit_queue: &mut ExitQueue,
    churn_limit: u64,
    validator_index: ValidatorIndex,
) -> Result<()> {
    // > Return if validator already initiated exit
    if state.validator(validator_index)?.exit_epoch != FAR_FUTURE_EPOCH {
        return Ok(());
    }

    if exit_queue.churn >= churn_limit {
        exit_queue.end += 1;
        exit_queue.churn = 1;
    } else {
        exit_queue.churn += 1;
    }

    let exit_epoch = exit_queue.end;

    // > Set validator exit epoch and withdrawable epoch
    state.update_validator(validator_index, |validator| {
        validator.exit_epoch = exit_epoch;
        validator.withdrawable_epoch = exit_epoch + config.min_validator_withdrawability_delay;
    })
}

pub fn process_randao_mixes_reset<P: Preset>(state: &mut CachedBeaconState<P>) {
    let current_epoch = state.current_epoch();

    // > Set randao mix
    state.set_randao_mix(current_epoch + 1, state.randao_mix(current_epoch));
}

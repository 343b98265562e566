use thiserror::Error;
use types::phase0::primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex};

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error(
        "committee index {committee_index} is out of bounds \
         (slot: {slot}, committees per slot: {committee_count})"
    )]
    CommitteeIndexOutOfBounds {
        slot: Slot,
        committee_index: CommitteeIndex,
        committee_count: u64,
    },
    #[error(
        "aggregation bitlist length {aggregation_bitlist_length} \
         does not match committee length {committee_length}"
    )]
    CommitteeLengthMismatch {
        aggregation_bitlist_length: usize,
        committee_length: usize,
    },
    #[error("proposers are only cached for epoch {current_epoch} (requested epoch: {epoch})")]
    EpochNotCurrent { epoch: Epoch, current_epoch: Epoch },
    #[error(
        "epoch {epoch} is out of range of cached shufflings \
         (previous epoch: {previous_epoch}, next epoch: {next_epoch})"
    )]
    EpochOutOfRange {
        epoch: Epoch,
        previous_epoch: Epoch,
        next_epoch: Epoch,
    },
    #[error("validator {validator_index} cannot change its public key")]
    PubkeyChanged { validator_index: ValidatorIndex },
    #[error("cannot rotate epoch context with next epoch {next_epoch} to state in epoch {state_epoch}")]
    RotationOutOfOrder { state_epoch: Epoch, next_epoch: Epoch },
    #[error(
        "validator index {validator_index} is out of bounds \
         (validator count: {validator_count})"
    )]
    ValidatorIndexOutOfBounds {
        validator_index: ValidatorIndex,
        validator_count: usize,
    },
}

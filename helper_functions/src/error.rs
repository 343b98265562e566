use thiserror::Error;
use types::phase0::primitives::Slot;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("failed to select proposer")]
    FailedToSelectProposer,
    #[error("no validators are active")]
    NoActiveValidators,
    #[error("block root at slot {slot} is not available in state at slot {state_slot}")]
    SlotOutOfRange { slot: Slot, state_slot: Slot },
}

use thiserror::Error;
use types::phase0::primitives::{Slot, ValidatorIndex};

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("slot {target} is not later than {current}")]
    SlotNotLater { current: Slot, target: Slot },
    #[error(
        "attester {validator_index} is outside the registry of {validator_count} validators"
    )]
    UnknownAttester {
        validator_index: ValidatorIndex,
        validator_count: usize,
    },
}

//! Caches derived from a beacon state once per epoch and the state wrapper that keeps them in sync.

pub use crate::{
    cached_state::{CachedBeaconState, FlatValidator, FlatValidators},
    epoch_context::{CommitteeAssignment, EpochContext},
};

pub mod signature_sets;

mod cached_state;
mod epoch_context;
mod error;

#[cfg(test)]
mod test_utils;

use anyhow::{ensure, Result};
use epoch_cache::CachedBeaconState;
use helper_functions::misc;
use ssz::SszHash as _;
use types::{config::Config, phase0::primitives::Slot, preset::Preset};

use super::epoch_processing;
use crate::error::Error;

/// Advances `state` to `slot`, processing every epoch boundary on the way.
///
/// The epoch context is rotated right after the slot crosses into a new epoch, so committee and
/// proposer queries stay valid for the resulting state.
///
/// The slots are processed on a clone that replaces `state` only once every slot succeeded, so
/// `state` is left untouched on error.
pub fn process_slots<P: Preset>(
    config: &Config,
    state: &mut CachedBeaconState<P>,
    slot: Slot,
) -> Result<()> {
    ensure!(
        state.slot() < slot,
        Error::SlotNotLater {
            current: state.slot(),
            target: slot,
        },
    );

    let mut advanced = state.clone();

    while advanced.slot() < slot {
        process_slot(&mut advanced);

        // > Process epoch on the start slot of the next epoch
        if misc::is_epoch_start::<P>(advanced.slot() + 1) {
            epoch_processing::process_epoch(config, &mut advanced)?;
        }

        advanced.set_slot(advanced.slot() + 1);

        if misc::is_epoch_start::<P>(advanced.slot()) {
            advanced.rotate_epoch_context()?;
        }
    }

    *state = advanced;

    Ok(())
}

pub fn process_slot<P: Preset>(state: &mut CachedBeaconState<P>) {
    let slot = state.slot();

    // > Cache state root
    let previous_state_root = state.hash_tree_root();
    state.set_state_root(slot, previous_state_root);

    // > Cache latest block header state root
    let mut latest_block_header = state.latest_block_header();

    if latest_block_header.state_root.is_zero() {
        latest_block_header.state_root = previous_state_root;
        state.set_latest_block_header(latest_block_header);
    }

    // > Cache block root
    state.set_block_root(slot, latest_block_header.hash_tree_root());
}

#[cfg(test)]
mod tests {
    use types::{phase0::primitives::H256, preset::Minimal};

    use crate::test_utils;

    use super::*;

    #[test]
    fn slots_are_not_rewound() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            5,
            test_utils::active_validators(16),
        )?;

        assert!(process_slots(&config, &mut state, 5).is_err());
        assert!(process_slots(&config, &mut state, 4).is_err());
        assert_eq!(state.slot(), 5);

        Ok(())
    }

    #[test]
    fn roots_are_cached_every_slot() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            0,
            test_utils::active_validators(16),
        )?;

        let genesis_root = state.hash_tree_root();

        process_slots(&config, &mut state, 3)?;

        assert_eq!(state.slot(), 3);
        assert_eq!(state.state_root(0), genesis_root);
        assert_eq!(state.latest_block_header().state_root, genesis_root);

        let block_root = state.latest_block_header().hash_tree_root();

        for slot in 0..3 {
            assert_ne!(state.state_root(slot), H256::zero());
            assert_eq!(state.block_root_at_slot(slot)?, block_root);
        }

        Ok(())
    }

    #[test]
    fn crossing_epochs_rotates_epoch_context() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            0,
            test_utils::active_validators(16),
        )?;

        let next_shuffling = state.epoch_context().next_shuffling().clone();

        process_slots(&config, &mut state, 8)?;

        let epoch_context = state.epoch_context();

        assert_eq!(state.current_epoch(), 1);
        assert_eq!(epoch_context.current_epoch(), 1);
        assert_eq!(epoch_context.previous_shuffling().epoch(), 0);
        assert_eq!(epoch_context.current_shuffling(), &next_shuffling);
        assert_eq!(epoch_context.next_shuffling().epoch(), 2);
        assert!(epoch_context.get_beacon_proposer(8).is_ok());

        process_slots(&config, &mut state, 20)?;

        assert_eq!(state.epoch_context().current_epoch(), 2);
        assert_eq!(state.epoch_context().previous_shuffling().epoch(), 1);

        Ok(())
    }

    #[test]
    fn failed_rotation_leaves_the_state_unchanged() -> Result<()> {
        let config = Config::minimal();
        let mut validators = test_utils::active_validators(16);

        // Nobody is active in epoch 1, so its proposers cannot be computed.
        for validator in &mut validators {
            validator.exit_epoch = 1;
        }

        let mut state = test_utils::cached_state::<Minimal>(&config, 5, validators)?;
        let root_before = state.hash_tree_root();

        assert!(process_slots(&config, &mut state, 8).is_err());
        assert_eq!(state.slot(), 5);
        assert_eq!(state.hash_tree_root(), root_before);
        assert_eq!(state.epoch_context().current_epoch(), 0);

        process_slots(&config, &mut state, 7)?;

        assert_eq!(state.slot(), 7);

        Ok(())
    }

    #[test]
    fn clones_advance_independently() -> Result<()> {
        let config = Config::minimal();
        let mut state = test_utils::cached_state::<Minimal>(
            &config,
            0,
            test_utils::active_validators(16),
        )?;

        let snapshot = state.clone();
        let snapshot_root = snapshot.hash_tree_root();

        process_slots(&config, &mut state, 9)?;

        assert_eq!(snapshot.slot(), 0);
        assert_eq!(snapshot.hash_tree_root(), snapshot_root);
        assert_eq!(snapshot.epoch_context().current_epoch(), 0);
        assert_eq!(state.epoch_context().current_epoch(), 1);

        Ok(())
    }
}

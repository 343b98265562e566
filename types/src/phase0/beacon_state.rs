use ssz::{PersistentList, PersistentVector, SszHash, H256};

use crate::{
    phase0::{
        containers::{BeaconBlockHeader, Checkpoint, Fork, PendingAttestation, Validator},
        primitives::{Gwei, Slot, UnixSeconds},
    },
    preset::Preset,
};

/// The canonical representation of a phase 0 state.
///
/// Every collection is persistent, so clones share structure and `hash_tree_root` only rehashes
/// subtrees modified since the last call.
///
/// Eth1 voting, historical batches and justification bits are maintained by block and epoch
/// processing stages that are not part of this workspace, so they are not stored here.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BeaconState<P: Preset> {
    // Versioning
    pub genesis_time: UnixSeconds,
    pub genesis_validators_root: H256,
    pub slot: Slot,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: PersistentVector<H256, P::SlotsPerHistoricalRoot>,
    pub state_roots: PersistentVector<H256, P::SlotsPerHistoricalRoot>,

    // Registry
    pub validators: PersistentList<Validator, P::ValidatorRegistryLimit>,
    pub balances: PersistentList<Gwei, P::ValidatorRegistryLimit>,

    // Randomness
    pub randao_mixes: PersistentVector<H256, P::EpochsPerHistoricalVector>,

    // Slashings
    pub slashings: PersistentVector<Gwei, P::EpochsPerSlashingsVector>,

    // Attestations
    pub previous_epoch_attestations:
        PersistentList<PendingAttestation<P>, P::MaxAttestationsPerEpoch>,
    pub current_epoch_attestations:
        PersistentList<PendingAttestation<P>, P::MaxAttestationsPerEpoch>,

    // Finality
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

impl<P: Preset> SszHash for BeaconState<P> {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.genesis_time.hash_tree_root(),
            self.genesis_validators_root,
            self.slot.hash_tree_root(),
            self.fork.hash_tree_root(),
            self.latest_block_header.hash_tree_root(),
            self.block_roots.hash_tree_root(),
            self.state_roots.hash_tree_root(),
            self.validators.hash_tree_root(),
            self.balances.hash_tree_root(),
            self.randao_mixes.hash_tree_root(),
            self.slashings.hash_tree_root(),
            self.previous_epoch_attestations.hash_tree_root(),
            self.current_epoch_attestations.hash_tree_root(),
            self.previous_justified_checkpoint.hash_tree_root(),
            self.current_justified_checkpoint.hash_tree_root(),
            self.finalized_checkpoint.hash_tree_root(),
        ])
    }
}

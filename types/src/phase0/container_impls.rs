use ssz::{SszHash, H256};

use crate::{
    phase0::{
        consts::FAR_FUTURE_EPOCH,
        containers::{
            Attestation, AttestationData, BeaconBlock, BeaconBlockBody, BeaconBlockHeader,
            Checkpoint, Fork, ForkData, IndexedAttestation, PendingAttestation, SigningData,
            Validator,
        },
        primitives::{Epoch, PublicKeyBytes},
    },
    preset::Preset,
};

impl<P: Preset> SszHash for Attestation<P> {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.aggregation_bits.hash_tree_root(),
            self.data.hash_tree_root(),
            self.signature.hash_tree_root(),
        ])
    }
}

impl SszHash for AttestationData {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.slot.hash_tree_root(),
            self.index.hash_tree_root(),
            self.beacon_block_root,
            self.source.hash_tree_root(),
            self.target.hash_tree_root(),
        ])
    }
}

impl<P: Preset> SszHash for BeaconBlock<P> {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.slot.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
            self.parent_root,
            self.state_root,
            self.body.hash_tree_root(),
        ])
    }
}

impl<P: Preset> SszHash for BeaconBlockBody<P> {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.randao_reveal.hash_tree_root(),
            self.graffiti,
            self.attestations.hash_tree_root(),
        ])
    }
}

impl SszHash for BeaconBlockHeader {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.slot.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
            self.parent_root,
            self.state_root,
            self.body_root,
        ])
    }
}

impl SszHash for Checkpoint {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[self.epoch.hash_tree_root(), self.root])
    }
}

impl SszHash for Fork {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.previous_version.hash_tree_root(),
            self.current_version.hash_tree_root(),
            self.epoch.hash_tree_root(),
        ])
    }
}

impl SszHash for ForkData {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.current_version.hash_tree_root(),
            self.genesis_validators_root,
        ])
    }
}

impl<P: Preset> SszHash for IndexedAttestation<P> {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.attesting_indices.hash_tree_root(),
            self.data.hash_tree_root(),
            self.signature.hash_tree_root(),
        ])
    }
}

impl<P: Preset> SszHash for PendingAttestation<P> {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.aggregation_bits.hash_tree_root(),
            self.data.hash_tree_root(),
            self.inclusion_delay.hash_tree_root(),
            self.proposer_index.hash_tree_root(),
        ])
    }
}

impl SszHash for SigningData {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[self.object_root, self.domain])
    }
}

impl SszHash for Validator {
    fn hash_tree_root(&self) -> H256 {
        ssz::container_root(&[
            self.pubkey.hash_tree_root(),
            self.withdrawal_credentials,
            self.effective_balance.hash_tree_root(),
            self.slashed.hash_tree_root(),
            self.activation_eligibility_epoch.hash_tree_root(),
            self.activation_epoch.hash_tree_root(),
            self.exit_epoch.hash_tree_root(),
            self.withdrawable_epoch.hash_tree_root(),
        ])
    }
}

impl<P: Preset> BeaconBlock<P> {
    #[must_use]
    pub fn to_header(&self) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot: self.slot,
            proposer_index: self.proposer_index,
            parent_root: self.parent_root,
            state_root: self.state_root,
            body_root: self.body.hash_tree_root(),
        }
    }
}

impl Validator {
    /// A validator that has made a deposit but is not yet eligible for activation.
    #[must_use]
    pub const fn pending(pubkey: PublicKeyBytes) -> Self {
        Self {
            pubkey,
            withdrawal_credentials: H256::zero(),
            effective_balance: 0,
            slashed: false,
            activation_eligibility_epoch: FAR_FUTURE_EPOCH,
            activation_epoch: FAR_FUTURE_EPOCH,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    /// [`is_active_validator`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#is_active_validator)
    #[must_use]
    pub const fn is_active(&self, epoch: Epoch) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }
}

//! SHA-256 with fixed-width inputs.
//!
//! Function names encode the bit widths of their inputs in order, so `hash_256_64` hashes a 256-bit
//! value followed by a little-endian 64-bit integer.

use ethereum_types::H256;
use once_cell::sync::Lazy;
use sha2::{Digest as _, Sha256};

/// Height of the deepest tree merkleized in `BeaconState` (the validator registry).
pub const MAX_TREE_DEPTH: usize = 40;

/// `ZERO_HASHES[depth]` is the root of a perfect binary tree of height `depth` with zeroed leaves.
pub static ZERO_HASHES: Lazy<[H256; MAX_TREE_DEPTH + 1]> = Lazy::new(|| {
    let mut zero_hashes = [H256::zero(); MAX_TREE_DEPTH + 1];

    for depth in 1..=MAX_TREE_DEPTH {
        let below = zero_hashes[depth - 1];
        zero_hashes[depth] = hash_256_256(below, below);
    }

    zero_hashes
});

#[must_use]
pub fn hash(bytes: impl AsRef<[u8]>) -> H256 {
    H256::from_slice(&Sha256::digest(bytes))
}

#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    let digest = Sha256::new()
        .chain_update(left)
        .chain_update(right)
        .finalize();

    H256::from_slice(&digest)
}

#[must_use]
pub fn hash_256_8(seed: H256, round: u8) -> H256 {
    let digest = Sha256::new()
        .chain_update(seed)
        .chain_update([round])
        .finalize();

    H256::from_slice(&digest)
}

#[must_use]
pub fn hash_256_8_32(seed: H256, round: u8, position_window: u32) -> H256 {
    let digest = Sha256::new()
        .chain_update(seed)
        .chain_update([round])
        .chain_update(position_window.to_le_bytes())
        .finalize();

    H256::from_slice(&digest)
}

#[must_use]
pub fn hash_256_64(seed: H256, number: u64) -> H256 {
    let digest = Sha256::new()
        .chain_update(seed)
        .chain_update(number.to_le_bytes())
        .finalize();

    H256::from_slice(&digest)
}

#[must_use]
pub fn hash_32_64_256(domain_type: [u8; 4], epoch: u64, mix: H256) -> H256 {
    let digest = Sha256::new()
        .chain_update(domain_type)
        .chain_update(epoch.to_le_bytes())
        .chain_update(mix)
        .finalize();

    H256::from_slice(&digest)
}

#[must_use]
pub fn hash_768(bytes: [u8; 96]) -> H256 {
    hash(bytes)
}

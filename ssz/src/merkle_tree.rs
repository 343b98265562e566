use ethereum_types::H256;
use hashing::ZERO_HASHES;
use itertools::Itertools as _;

use crate::porcelain::SszHash;

/// Height of the smallest perfect binary tree with room for `limit` chunks.
#[must_use]
pub const fn depth_for_limit(limit: u64) -> usize {
    if limit <= 1 {
        0
    } else {
        limit.next_power_of_two().trailing_zeros() as usize
    }
}

/// Computes the root of a perfect binary tree of height `depth` whose leftmost leaves are `chunks`.
///
/// Missing leaves are zero chunks. Subtrees consisting entirely of zero chunks are never hashed.
#[must_use]
pub fn merkleize_chunks(chunks: impl IntoIterator<Item = H256>, depth: usize) -> H256 {
    let mut layer = chunks.into_iter().collect_vec();

    assert!(
        depth >= usize::BITS as usize || layer.len() <= 1 << depth,
        "{} chunks do not fit in a tree of height {depth}",
        layer.len(),
    );

    for height in 0..depth {
        if layer.is_empty() {
            return ZERO_HASHES[depth];
        }

        layer = layer
            .chunks(2)
            .map(|pair| match *pair {
                [left, right] => hashing::hash_256_256(left, right),
                [left] => hashing::hash_256_256(left, ZERO_HASHES[height]),
                _ => unreachable!("slice::chunks never yields empty or oversized chunks"),
            })
            .collect();
    }

    layer.first().copied().unwrap_or(ZERO_HASHES[depth])
}

#[must_use]
pub fn merkleize_bytes(bytes: &[u8], depth: usize) -> H256 {
    let chunks = bytes.chunks(H256::len_bytes()).map(|chunk| {
        let mut padded = H256::zero();
        padded[..chunk.len()].copy_from_slice(chunk);
        padded
    });

    merkleize_chunks(chunks, depth)
}

/// Root of a container whose fields have the roots `field_roots`, in declaration order.
#[must_use]
pub fn container_root(field_roots: &[H256]) -> H256 {
    let field_count = field_roots.len().try_into().unwrap_or(u64::MAX);
    merkleize_chunks(field_roots.iter().copied(), depth_for_limit(field_count))
}

#[must_use]
pub fn mix_in_length(root: H256, length: usize) -> H256 {
    let mut length_chunk = H256::zero();
    length_chunk[..size_of::<u64>()].copy_from_slice(&(length as u64).to_le_bytes());
    hashing::hash_256_256(root, length_chunk)
}

/// Converts values into the chunks that become leaves of a list or vector.
///
/// Composite values contribute their roots. Basic values are serialized back to back.
pub fn pack_chunks<'values, T: SszHash + 'values>(
    values: impl IntoIterator<Item = &'values T>,
) -> Vec<H256> {
    if T::PACKING_FACTOR == 1 {
        return values.into_iter().map(|value| value.hash_tree_root()).collect();
    }

    values
        .into_iter()
        .chunks(T::PACKING_FACTOR)
        .into_iter()
        .map(pack_bundle)
        .collect()
}

pub fn pack_bundle<'values, T: SszHash + 'values>(
    bundle: impl IntoIterator<Item = &'values T>,
) -> H256 {
    let size = H256::len_bytes() / T::PACKING_FACTOR;
    let mut chunk = H256::zero();

    for (position, value) in bundle.into_iter().enumerate() {
        let start = position * size;
        chunk[start..start + size].copy_from_slice(&value.hash_tree_root()[..size]);
    }

    chunk
}

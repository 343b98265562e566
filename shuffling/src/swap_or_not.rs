// The whole list is shuffled in one pass per round instead of computing the position of every
// element separately. Within a round, every element is swapped with its mirror around the pivot
// or around the pivot shifted by half the list, which lets each source hash decide 256 swaps.
//
// Based on <https://github.com/protolambda/eth2-shuffle/tree/fd840f1036c1f8f6d7625ffe6ff4d9c60f942876>.

use core::{fmt::Debug, num::NonZeroU64};

use anyhow::Result;
use bit_field::BitArray as _;
use itertools::izip;
use tap::TryConv as _;
use types::{phase0::primitives::H256, preset::Preset};

const BITS_PER_HASH: usize = H256::len_bytes() * 8;

/// Permutes `slice` so that `slice[i]` ends up holding the element previously at
/// `shuffle_single(i, slice.len(), seed)`.
pub fn shuffle_slice<P: Preset, T>(slice: &mut [T], seed: H256) -> Result<()> {
    let Some(length) = slice.len().try_into().map(NonZeroU64::new)? else {
        return Ok(());
    };

    for round in (0..P::SHUFFLE_ROUND_COUNT).rev() {
        let pivot = pivot(seed, round, length)
            .try_conv::<usize>()
            .expect("pivot is less than the length of the slice");

        let (below_pivot, above_pivot) = slice.split_at_mut(pivot + 1);

        swap_with_mirrors(seed, round, below_pivot, 0);
        swap_with_mirrors(seed, round, above_pivot, pivot + 1);
    }

    Ok(())
}

// `offset` is the position of `slice` within the whole list. Source hashes are indexed by the
// position of the higher element of each pair in the whole list, so chunks of `slice` have to be
// aligned to multiples of `BITS_PER_HASH` relative to the start of the list.
fn swap_with_mirrors<T>(seed: H256, round: u8, slice: &mut [T], offset: usize) {
    let mirror = slice.len() / 2;
    let end = offset + slice.len();
    let trailing = mirror.min(end % BITS_PER_HASH);
    let leading = (mirror - trailing) % BITS_PER_HASH;

    let (lower, mut upper) = slice.split_at_mut(mirror);

    // The middle element of an odd slice is its own mirror.
    if lower.len() < upper.len() {
        upper = &mut upper[1..];
    }

    assert_eq!(lower.len(), mirror);
    assert_eq!(upper.len(), mirror);

    if trailing > 0 {
        swap_pairs(
            source(seed, round, end / BITS_PER_HASH),
            (0..end % BITS_PER_HASH).rev(),
            lower[..trailing].iter_mut(),
            upper[mirror - trailing..].iter_mut().rev(),
        );
    }

    for (window, lower_chunk, upper_chunk) in izip!(
        (0..end / BITS_PER_HASH).rev(),
        lower[trailing..].chunks_exact_mut(BITS_PER_HASH),
        upper[..mirror - trailing].rchunks_exact_mut(BITS_PER_HASH),
    ) {
        swap_pairs(
            source(seed, round, window),
            0..BITS_PER_HASH,
            lower_chunk.iter_mut().rev(),
            upper_chunk,
        );
    }

    if leading > 0 {
        swap_pairs(
            source(seed, round, (offset + mirror) / BITS_PER_HASH),
            (0..BITS_PER_HASH).rev(),
            lower[mirror - leading..].iter_mut(),
            upper[..leading].iter_mut().rev(),
        );
    }
}

fn swap_pairs<'slice, T: 'slice>(
    source: H256,
    bit_indices: impl IntoIterator<Item = usize>,
    lower: impl IntoIterator<Item = &'slice mut T>,
    upper: impl IntoIterator<Item = &'slice mut T>,
) {
    for (bit_index, element, mirrored) in izip!(bit_indices, lower, upper) {
        if source.as_bytes().get_bit(bit_index) {
            core::mem::swap(element, mirrored);
        }
    }
}

/// [`compute_shuffled_index`](https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/phase0/beacon-chain.md#compute_shuffled_index)
#[must_use]
pub fn shuffle_single<P: Preset>(mut index: u64, index_count: NonZeroU64, seed: H256) -> u64 {
    assert!(index < index_count.get());

    for round in 0..P::SHUFFLE_ROUND_COUNT {
        let flip = (pivot(seed, round, index_count) + index_count.get() - index) % index_count;
        let position = index.max(flip);
        let source = source(seed, round, position / BITS_PER_HASH as u64);
        let bit_index = usize::from(position.to_le_bytes()[0]);

        if source.as_bytes().get_bit(bit_index) {
            index = flip;
        }
    }

    index
}

fn pivot(seed: H256, round: u8, index_count: NonZeroU64) -> u64 {
    let hash = hashing::hash_256_8(seed, round);

    let first_8_bytes = hash[..size_of::<u64>()]
        .try_into()
        .expect("slice has the same size as u64");

    u64::from_le_bytes(first_8_bytes) % index_count
}

fn source(seed: H256, round: u8, window: impl TryInto<u64, Error = impl Debug>) -> H256 {
    // `compute_shuffled_index` serializes the window as 4 bytes, truncating larger values.
    #[expect(clippy::cast_possible_truncation)]
    let window = window.try_into().expect("window should fit in u64") as u32;

    hashing::hash_256_8_32(seed, round, window)
}

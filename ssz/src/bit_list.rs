use core::marker::PhantomData;

use bitvec::{order::Lsb0, vec::BitVec};
use derivative::Derivative;
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{
    error::{IndexError, PushError},
    merkle_tree::{self, depth_for_limit},
    porcelain::SszHash,
};

const BITS_PER_CHUNK: u64 = 256;

/// A list of at most `N` bits.
#[derive(Derivative)]
#[derivative(
    Clone(bound = ""),
    PartialEq(bound = ""),
    Eq(bound = ""),
    Debug(bound = ""),
    Default(bound = "")
)]
pub struct BitList<N> {
    bits: BitVec<u8, Lsb0>,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<N>,
}

impl<N: Unsigned> FromIterator<bool> for BitList<N> {
    /// Collects bits, panicking if there are more than `N` of them.
    fn from_iter<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let bits = bits.into_iter().collect::<BitVec<u8, Lsb0>>();

        assert!(bits.len() <= N::USIZE, "bit list cannot hold more than {} bits", N::USIZE);

        Self {
            bits,
            phantom: PhantomData,
        }
    }
}

impl<N: Unsigned> SszHash for BitList<N> {
    fn hash_tree_root(&self) -> H256 {
        let limit = N::U64.div_ceil(BITS_PER_CHUNK);
        let root = merkle_tree::merkleize_bytes(self.bits.as_raw_slice(), depth_for_limit(limit));
        merkle_tree::mix_in_length(root, self.bits.len())
    }
}

impl<N: Unsigned> BitList<N> {
    pub fn with_length(length: usize) -> Result<Self, PushError> {
        if length > N::USIZE {
            return Err(PushError::ListFull { maximum: N::USIZE });
        }

        Ok(Self {
            bits: BitVec::repeat(false, length),
            phantom: PhantomData,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).map(|bit| *bit)
    }

    pub fn set(&mut self, index: usize, value: bool) -> Result<(), IndexError> {
        let length = self.bits.len();

        let mut bit = self
            .bits
            .get_mut(index)
            .ok_or(IndexError::OutOfBounds { index, length })?;

        *bit = value;

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().by_vals()
    }

    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use typenum::{U2048, U4};

    use super::*;

    #[test]
    fn set_rejects_index_past_length() {
        let mut bits = BitList::<U4>::with_length(3).expect("3 bits fit in 4");

        assert_eq!(bits.set(1, true), Ok(()));
        assert_eq!(
            bits.set(3, true),
            Err(IndexError::OutOfBounds {
                index: 3,
                length: 3,
            }),
        );
        assert_eq!(bits.iter().collect::<Vec<_>>(), [false, true, false]);
    }

    #[test]
    fn root_covers_bits_and_length() {
        let bits = [true, false, true].into_iter().collect::<BitList<U2048>>();

        // Bits are packed from the least significant bit of the first byte.
        let mut chunk = H256::zero();
        chunk.as_bytes_mut()[0] = 0b101;

        let expected = merkle_tree::mix_in_length(merkle_tree::merkleize_chunks([chunk], 3), 3);

        assert_eq!(bits.hash_tree_root(), expected);
    }
}

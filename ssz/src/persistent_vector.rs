use derivative::Derivative;
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{error::IndexError, persistent_list::PersistentList, porcelain::SszHash, Iter};

/// A persistent collection of exactly `N` values.
#[derive(Derivative)]
#[derivative(
    Clone(bound = ""),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Debug(bound = "T: core::fmt::Debug")
)]
pub struct PersistentVector<T, N> {
    values: PersistentList<T, N>,
}

impl<T: Clone + SszHash + Default, N: Unsigned> Default for PersistentVector<T, N> {
    fn default() -> Self {
        Self::repeat(T::default())
    }
}

impl<T: Clone + SszHash, N: Unsigned> PersistentVector<T, N> {
    #[must_use]
    pub fn repeat(value: T) -> Self {
        let values = PersistentList::try_from_iter(core::iter::repeat_n(value, N::USIZE))
            .expect("list limit is the same as vector length");

        Self { values }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        N::USIZE
    }

    /// Accesses the value at `index` modulo the length of the vector.
    #[must_use]
    pub fn mod_index(&self, index: u64) -> &T {
        self.values
            .get(Self::wrap(index))
            .expect("index is reduced modulo vector length")
    }

    pub fn mod_index_mut(&mut self, index: u64) -> &mut T {
        self.values
            .get_mut(Self::wrap(index))
            .expect("index is reduced modulo vector length")
    }

    pub fn get(&self, index: usize) -> Result<&T, IndexError> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, IndexError> {
        self.values.get_mut(index)
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        self.values.iter()
    }

    fn wrap(index: u64) -> usize {
        usize::try_from(index % N::U64).expect("remainder is less than a usize value")
    }
}

impl<T: Clone + SszHash, N: Unsigned> SszHash for PersistentVector<T, N> {
    fn hash_tree_root(&self) -> H256 {
        self.values.contents_root()
    }
}

#[cfg(test)]
mod tests {
    use typenum::U8;

    use crate::merkle_tree;

    use super::*;

    #[test]
    fn mod_index_wraps_around() {
        let mut vector = PersistentVector::<u64, U8>::default();

        *vector.mod_index_mut(11) = 5;

        assert_eq!(vector.get(3), Ok(&5));
        assert_eq!(vector.mod_index(19), &5);
    }

    #[test]
    fn root_does_not_mix_in_length() {
        let vector = PersistentVector::<H256, U8>::repeat(H256::repeat_byte(2));
        let expected = merkle_tree::merkleize_chunks([H256::repeat_byte(2); 8], 3);

        assert_eq!(vector.hash_tree_root(), expected);
    }
}

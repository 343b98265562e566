use core::marker::PhantomData;

use derivative::Derivative;
use derive_more::Deref;
use ethereum_types::H256;
use typenum::Unsigned;

use crate::{
    error::PushError,
    merkle_tree::{self, depth_for_limit},
    porcelain::SszHash,
};

/// A list with at most `N` elements stored in a single allocation.
///
/// Suited for short lists that are built once and never updated in place.
#[derive(Deref, Derivative)]
#[derivative(
    Clone(bound = "T: Clone"),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Debug(bound = "T: core::fmt::Debug"),
    Default(bound = "")
)]
pub struct ContiguousList<T, N> {
    #[deref]
    elements: Vec<T>,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<N>,
}

impl<T, N: Unsigned> TryFrom<Vec<T>> for ContiguousList<T, N> {
    type Error = PushError;

    fn try_from(elements: Vec<T>) -> Result<Self, Self::Error> {
        if elements.len() > N::USIZE {
            return Err(PushError::ListFull { maximum: N::USIZE });
        }

        Ok(Self {
            elements,
            phantom: PhantomData,
        })
    }
}

impl<'list, T, N> IntoIterator for &'list ContiguousList<T, N> {
    type Item = &'list T;
    type IntoIter = core::slice::Iter<'list, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T: SszHash, N: Unsigned> SszHash for ContiguousList<T, N> {
    fn hash_tree_root(&self) -> H256 {
        let limit = N::U64.div_ceil(T::PACKING_FACTOR as u64);
        let chunks = merkle_tree::pack_chunks(&self.elements);
        let root = merkle_tree::merkleize_chunks(chunks, depth_for_limit(limit));
        merkle_tree::mix_in_length(root, self.elements.len())
    }
}

impl<T, N> ContiguousList<T, N> {
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.elements
    }
}

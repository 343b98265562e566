use core::ops::DerefMut;

use derivative::Derivative;
use derive_more::Deref;
use ethereum_types::H256;
use once_cell::race::OnceBox;

use crate::porcelain::SszHash;

/// A value paired with a lazily computed copy of its root.
///
/// Any mutable access clears the cached root.
#[derive(Default, Deref, Derivative)]
#[derivative(PartialEq(bound = "T: PartialEq"), Eq(bound = "T: Eq"), Debug(bound = "T: core::fmt::Debug"))]
pub struct Hc<T> {
    #[deref]
    value: T,
    #[derivative(PartialEq = "ignore", Debug = "ignore")]
    cached_root: OnceBox<H256>,
}

// `OnceBox` does not implement `Clone`.
impl<T: Clone> Clone for Hc<T> {
    fn clone(&self) -> Self {
        let clone = Self::from(self.value.clone());

        if let Some(root) = self.cached_root.get() {
            clone.cached_root.get_or_init(|| Box::new(*root));
        }

        clone
    }
}

impl<T> DerefMut for Hc<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.cached_root = OnceBox::new();
        &mut self.value
    }
}

impl<T> From<T> for Hc<T> {
    fn from(value: T) -> Self {
        Self {
            value,
            cached_root: OnceBox::new(),
        }
    }
}

impl<T: SszHash> SszHash for Hc<T> {
    const PACKING_FACTOR: usize = T::PACKING_FACTOR;

    fn hash_tree_root(&self) -> H256 {
        *self
            .cached_root
            .get_or_init(|| Box::new(self.value.hash_tree_root()))
    }
}

impl<T> Hc<T> {
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    #[must_use]
    pub fn has_cached_root(&self) -> bool {
        self.cached_root.get().is_some()
    }
}

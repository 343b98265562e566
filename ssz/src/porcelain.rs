use ethereum_types::H256;

pub trait SszHash {
    /// Number of values that share a single 32 byte chunk when packed in a list or vector.
    ///
    /// Basic types with a size of `s` bytes use `32 / s`. Composite types are never packed.
    const PACKING_FACTOR: usize = 1;

    fn hash_tree_root(&self) -> H256;
}

impl<T: SszHash> SszHash for &T {
    const PACKING_FACTOR: usize = T::PACKING_FACTOR;

    fn hash_tree_root(&self) -> H256 {
        (*self).hash_tree_root()
    }
}

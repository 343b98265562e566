use ethereum_types::{H256, H32};

use crate::porcelain::SszHash;

impl SszHash for u64 {
    const PACKING_FACTOR: usize = H256::len_bytes() / size_of::<Self>();

    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk[..size_of::<Self>()].copy_from_slice(&self.to_le_bytes());
        chunk
    }
}

impl SszHash for bool {
    const PACKING_FACTOR: usize = H256::len_bytes();

    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk.as_bytes_mut()[0] = (*self).into();
        chunk
    }
}

impl SszHash for H32 {
    const PACKING_FACTOR: usize = H256::len_bytes() / H32::len_bytes();

    fn hash_tree_root(&self) -> H256 {
        let mut chunk = H256::zero();
        chunk[..Self::len_bytes()].copy_from_slice(self.as_bytes());
        chunk
    }
}

// Byte vectors of length 32 are a single chunk.
impl SszHash for H256 {
    fn hash_tree_root(&self) -> H256 {
        *self
    }
}

use fixed_hash::construct_fixed_hash;
use impl_serde::impl_fixed_hash_serde;
use ssz::{SszHash, H256};

pub const COMPRESSED_SIZE: usize = 96;

construct_fixed_hash! {
    pub struct SignatureBytes(COMPRESSED_SIZE);
}

impl_fixed_hash_serde!(SignatureBytes, COMPRESSED_SIZE);

impl SszHash for SignatureBytes {
    fn hash_tree_root(&self) -> H256 {
        ssz::merkleize_bytes(self.as_bytes(), 2)
    }
}

impl SignatureBytes {
    /// The compressed point at infinity.
    #[must_use]
    pub fn empty() -> Self {
        let mut bytes = Self::zero();
        bytes.as_bytes_mut()[0] = 0xc0;
        bytes
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::empty()
    }
}

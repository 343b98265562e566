use blst::BLST_ERROR;
use itertools::Itertools as _;

use crate::{consts::DOMAIN_SEPARATION_TAG, public_key::PublicKey, signature::Signature};

/// Parameters shared by every signature verification.
///
/// Meant to be created once when the process starts and passed to whatever verifies signatures.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlsContext {
    domain_separation_tag: &'static [u8],
}

impl Default for BlsContext {
    fn default() -> Self {
        Self::new(DOMAIN_SEPARATION_TAG)
    }
}

impl BlsContext {
    #[must_use]
    pub const fn new(domain_separation_tag: &'static [u8]) -> Self {
        Self {
            domain_separation_tag,
        }
    }

    #[must_use]
    pub const fn domain_separation_tag(&self) -> &'static [u8] {
        self.domain_separation_tag
    }

    // Signatures are subgroup checked when constructed and public keys come from
    // `PublicKey::try_from`, so neither is validated again here.
    #[must_use]
    pub fn verify(
        &self,
        message: impl AsRef<[u8]>,
        signature: &Signature,
        public_key: &PublicKey,
    ) -> bool {
        let result = signature.as_raw().verify(
            false,
            message.as_ref(),
            self.domain_separation_tag,
            &[],
            public_key.as_raw(),
            false,
        );

        result == BLST_ERROR::BLST_SUCCESS
    }

    /// Verifies a signature over a single message by the aggregate of `public_keys`.
    ///
    /// Returns `false` if there are no public keys.
    #[must_use]
    pub fn fast_aggregate_verify<'keys>(
        &self,
        message: impl AsRef<[u8]>,
        signature: &Signature,
        public_keys: impl IntoIterator<Item = &'keys PublicKey>,
    ) -> bool {
        let public_keys = public_keys.into_iter().map(PublicKey::as_raw).collect_vec();

        if public_keys.is_empty() {
            return false;
        }

        let result = signature.as_raw().fast_aggregate_verify(
            false,
            message.as_ref(),
            self.domain_separation_tag,
            public_keys.as_slice(),
        );

        result == BLST_ERROR::BLST_SUCCESS
    }
}

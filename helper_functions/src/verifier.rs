//! Verification of signature sets.
//!
//! A [`SignatureSet`] holds everything needed to verify a signature, so sets can be collected while
//! processing and verified later, possibly in parallel.

use bls::{BlsContext, PublicKey, Signature, SignatureBytes};
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};
use types::phase0::primitives::H256;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SignatureSet {
    Single {
        public_key: PublicKey,
        signing_root: H256,
        signature: SignatureBytes,
    },
    Aggregate {
        public_keys: Vec<PublicKey>,
        signing_root: H256,
        signature: SignatureBytes,
    },
}

impl SignatureSet {
    #[must_use]
    pub const fn signing_root(&self) -> H256 {
        match self {
            Self::Single { signing_root, .. } | Self::Aggregate { signing_root, .. } => {
                *signing_root
            }
        }
    }

    #[must_use]
    pub const fn signature(&self) -> SignatureBytes {
        match self {
            Self::Single { signature, .. } | Self::Aggregate { signature, .. } => *signature,
        }
    }
}

/// Verifies a single set.
///
/// Signature bytes are decompressed and subgroup checked first.
/// Bytes that do not encode a valid signature fail verification.
#[must_use]
pub fn verify_signature_set(context: &BlsContext, signature_set: &SignatureSet) -> bool {
    let Ok(signature) = Signature::try_from(signature_set.signature()) else {
        return false;
    };

    match signature_set {
        SignatureSet::Single {
            public_key,
            signing_root,
            ..
        } => context.verify(signing_root, &signature, public_key),
        SignatureSet::Aggregate {
            public_keys,
            signing_root,
            ..
        } => context.fast_aggregate_verify(signing_root, &signature, public_keys),
    }
}

/// Verifies sets in parallel. Succeeds only if every set is valid.
#[must_use]
pub fn verify_signature_sets(context: &BlsContext, signature_sets: &[SignatureSet]) -> bool {
    signature_sets
        .par_iter()
        .all(|signature_set| verify_signature_set(context, signature_set))
}

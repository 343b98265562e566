use blst::min_pk::{AggregateSignature as RawAggregateSignature, Signature as RawSignature};
use derive_more::From;
use itertools::Itertools as _;

use crate::{error::Error, signature_bytes::SignatureBytes};

#[derive(Clone, Copy, PartialEq, Eq, Debug, From)]
pub struct Signature(RawSignature);

impl TryFrom<SignatureBytes> for Signature {
    type Error = Error;

    /// Decompresses the signature and checks that it is in the G2 subgroup.
    ///
    /// The point at infinity is accepted here. It never verifies against a valid public key.
    fn try_from(bytes: SignatureBytes) -> Result<Self, Self::Error> {
        RawSignature::sig_validate(bytes.as_bytes(), false)
            .map(Self)
            .map_err(|_| Error::InvalidSignature)
    }
}

impl Signature {
    #[must_use]
    pub fn to_bytes(&self) -> SignatureBytes {
        SignatureBytes(self.0.compress())
    }

    pub fn aggregate<'signatures>(
        signatures: impl IntoIterator<Item = &'signatures Self>,
    ) -> Result<Self, Error> {
        let signatures = signatures.into_iter().map(Self::as_raw).collect_vec();

        RawAggregateSignature::aggregate(signatures.as_slice(), false)
            .map(|aggregate| Self(aggregate.to_signature()))
            .map_err(|_| Error::InvalidSignature)
    }

    pub(crate) const fn as_raw(&self) -> &RawSignature {
        &self.0
    }
}

use blst::min_pk::PublicKey as RawPublicKey;
use derive_more::From;

use crate::{error::Error, public_key_bytes::PublicKeyBytes};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, From)]
pub struct PublicKey(RawPublicKey);

impl TryFrom<PublicKeyBytes> for PublicKey {
    type Error = Error;

    /// Decompresses the key and checks that it is a non-infinity point in the G1 subgroup.
    fn try_from(bytes: PublicKeyBytes) -> Result<Self, Self::Error> {
        RawPublicKey::key_validate(bytes.as_bytes())
            .map(Self)
            .map_err(|_| Error::InvalidPublicKey)
    }
}

impl PublicKey {
    #[must_use]
    pub fn to_bytes(&self) -> PublicKeyBytes {
        PublicKeyBytes(self.0.compress())
    }

    pub(crate) const fn as_raw(&self) -> &RawPublicKey {
        &self.0
    }
}

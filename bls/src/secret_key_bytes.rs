use derive_more::From;
use hex::FromHex;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const SIZE: usize = 32;

// Deliberately not `Clone`, `Copy` or `Debug` to avoid leaking secret keys.
#[derive(Default, From, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeyBytes {
    pub(crate) bytes: [u8; SIZE],
}

impl AsRef<[u8]> for SecretKeyBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl FromHex for SecretKeyBytes {
    type Error = <[u8; SIZE] as FromHex>::Error;

    fn from_hex<T: AsRef<[u8]>>(digits: T) -> Result<Self, Self::Error> {
        FromHex::from_hex(digits).map(|bytes| Self { bytes })
    }
}

//! BLS12-381 signatures with public keys in G1, as used by the beacon chain.

pub use crate::{
    consts::DOMAIN_SEPARATION_TAG,
    context::BlsContext,
    error::Error,
    public_key::PublicKey,
    public_key_bytes::PublicKeyBytes,
    secret_key::SecretKey,
    secret_key_bytes::SecretKeyBytes,
    signature::Signature,
    signature_bytes::SignatureBytes,
};

mod consts;
mod context;
mod error;
mod public_key;
mod public_key_bytes;
mod secret_key;
mod secret_key_bytes;
mod signature;
mod signature_bytes;

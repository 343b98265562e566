//! Bidirectional mapping between validator indices and decompressed public keys.
//!
//! Decompressing a public key is expensive, so every key in the registry is decompressed exactly
//! once. The cache only grows. It is shared between all states derived from the same anchor.

use anyhow::{ensure, Result};
use bls::{PublicKey, PublicKeyBytes};
use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};
use types::phase0::primitives::ValidatorIndex;

#[derive(Default, Debug)]
pub struct PubkeyCache {
    pubkey2index: DashMap<PublicKeyBytes, ValidatorIndex>,
    index2pubkey: RwLock<Vec<PublicKey>>,
}

impl PubkeyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decompresses and inserts keys of validators not yet in the cache.
    ///
    /// `pubkeys` must yield the public keys of the whole validator registry in order of validator
    /// index. Keys of validators already in the cache are skipped without being inspected. Nothing
    /// is inserted if any of the new keys fails to decompress.
    pub fn sync(&self, pubkeys: impl IntoIterator<Item = PublicKeyBytes>) -> Result<()> {
        let mut index2pubkey = self.index2pubkey.write();

        let forward_length = self.pubkey2index.len();
        let reverse_length = index2pubkey.len();

        ensure!(
            forward_length == reverse_length,
            Error::OutOfSync {
                forward_length,
                reverse_length,
            },
        );

        let old_length = reverse_length;

        let new_keys = pubkeys
            .into_iter()
            .zip(0..)
            .skip(old_length)
            .map(|(pubkey_bytes, validator_index)| {
                let public_key = PublicKey::try_from(pubkey_bytes)?;
                Ok((pubkey_bytes, validator_index, public_key))
            })
            .collect::<Result<Vec<_>>>()?;

        for (pubkey_bytes, validator_index, public_key) in new_keys {
            self.pubkey2index.insert(pubkey_bytes, validator_index);
            index2pubkey.push(public_key);
        }

        let new_length = index2pubkey.len();

        if new_length > old_length {
            debug!("pubkey cache grew from {old_length} to {new_length} keys");
        }

        Ok(())
    }

    /// Inserts a single key, replacing the one previously stored for `validator_index`.
    ///
    /// `validator_index` may be at most the current length of the cache.
    pub fn add_pubkey(
        &self,
        validator_index: ValidatorIndex,
        pubkey_bytes: PublicKeyBytes,
    ) -> Result<()> {
        let public_key = PublicKey::try_from(pubkey_bytes)?;
        let mut index2pubkey = self.index2pubkey.write();
        let length = index2pubkey.len();

        let position = usize::try_from(validator_index)
            .ok()
            .filter(|position| *position <= length)
            .ok_or(Error::ValidatorIndexOutOfBounds {
                validator_index,
                length,
            })?;

        if let Some(old_public_key) = index2pubkey.get_mut(position) {
            if *old_public_key != public_key {
                let old_bytes = old_public_key.to_bytes();

                warn!(
                    "replacing public key of validator {validator_index} \
                     (old: {old_bytes}, new: {pubkey_bytes})",
                );

                self.pubkey2index.remove(&old_bytes);
            }

            *old_public_key = public_key;
        } else {
            index2pubkey.push(public_key);
        }

        self.pubkey2index.insert(pubkey_bytes, validator_index);

        Ok(())
    }

    #[must_use]
    pub fn public_key(&self, validator_index: ValidatorIndex) -> Option<PublicKey> {
        let position = usize::try_from(validator_index).ok()?;
        self.index2pubkey.read().get(position).copied()
    }

    #[must_use]
    pub fn validator_index(&self, pubkey_bytes: &PublicKeyBytes) -> Option<ValidatorIndex> {
        self.pubkey2index.get(pubkey_bytes).map(|entry| *entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index2pubkey.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error(
        "pubkey cache is out of sync \
         (forward map length: {forward_length}, reverse map length: {reverse_length})"
    )]
    OutOfSync {
        forward_length: usize,
        reverse_length: usize,
    },
    #[error("validator index {validator_index} is out of bounds for pubkey cache of length {length}")]
    ValidatorIndexOutOfBounds {
        validator_index: ValidatorIndex,
        length: usize,
    },
}

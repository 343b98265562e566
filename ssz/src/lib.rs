//! Merkleization and persistent collections for consensus containers.
//!
//! Only `hash_tree_root` is implemented. Serialization formats live outside this workspace.

pub use ethereum_types::{H256, H32};
pub use hashing;

pub use crate::{
    bit_list::BitList,
    contiguous_list::ContiguousList,
    error::{IndexError, PushError},
    hc::Hc,
    merkle_tree::{
        container_root, depth_for_limit, merkleize_bytes, merkleize_chunks, mix_in_length,
        pack_chunks,
    },
    persistent_list::{Iter, PersistentList},
    persistent_vector::PersistentVector,
    porcelain::SszHash,
};

mod basic;
mod bit_list;
mod contiguous_list;
mod error;
mod hc;
mod merkle_tree;
mod persistent_list;
mod persistent_vector;
mod porcelain;

use core::{fmt::Debug, hash::Hash, num::NonZeroU64};

use nonzero_ext::nonzero;
use typenum::{NonZero, Prod, Unsigned, U1099511627776, U128, U2048, U32, U64, U65536, U8, U8192};

use crate::phase0::primitives::Gwei;

/// Compile-time configuration variables.
///
/// See [presets in `consensus-specs`](https://github.com/ethereum/consensus-specs/tree/v1.4.0/presets).
/// Only the variables used by epoch processing and committee computation are included.
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    type EpochsPerHistoricalVector: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type EpochsPerSlashingsVector: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type MaxAttestations: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type MaxValidatorsPerCommittee: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type SlotsPerEpoch: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type SlotsPerHistoricalRoot: Unsigned + NonZero + Eq + Debug + Send + Sync;
    type ValidatorRegistryLimit: Unsigned + NonZero + Eq + Debug + Send + Sync;

    // Derived type-level variables
    type MaxAttestationsPerEpoch: Unsigned + NonZero + Eq + Debug + Send + Sync;

    const EFFECTIVE_BALANCE_INCREMENT: NonZeroU64 = nonzero!(1_000_000_000_u64);
    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(64_u64);
    const MAX_EFFECTIVE_BALANCE: Gwei = 32_000_000_000;
    const MAX_SEED_LOOKAHEAD: u64 = 4;
    const MIN_ATTESTATION_INCLUSION_DELAY: NonZeroU64 = NonZeroU64::MIN;
    const MIN_SEED_LOOKAHEAD: u64 = 1;
    const SHUFFLE_ROUND_COUNT: u8 = 90;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(128_u64);
}

/// [Mainnet preset](https://github.com/ethereum/consensus-specs/tree/v1.4.0/presets/mainnet).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {
    type EpochsPerHistoricalVector = U65536;
    type EpochsPerSlashingsVector = U8192;
    type MaxAttestations = U128;
    type MaxValidatorsPerCommittee = U2048;
    type SlotsPerEpoch = U32;
    type SlotsPerHistoricalRoot = U8192;
    type ValidatorRegistryLimit = U1099511627776;

    type MaxAttestationsPerEpoch = Prod<Self::MaxAttestations, Self::SlotsPerEpoch>;
}

/// [Minimal preset](https://github.com/ethereum/consensus-specs/tree/v1.4.0/presets/minimal).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    type EpochsPerHistoricalVector = U64;
    type EpochsPerSlashingsVector = U64;
    type MaxAttestations = <Mainnet as Preset>::MaxAttestations;
    type MaxValidatorsPerCommittee = <Mainnet as Preset>::MaxValidatorsPerCommittee;
    type SlotsPerEpoch = U8;
    type SlotsPerHistoricalRoot = U64;
    type ValidatorRegistryLimit = <Mainnet as Preset>::ValidatorRegistryLimit;

    type MaxAttestationsPerEpoch = Prod<Self::MaxAttestations, Self::SlotsPerEpoch>;

    const MAX_COMMITTEES_PER_SLOT: NonZeroU64 = nonzero!(4_u64);
    const SHUFFLE_ROUND_COUNT: u8 = 10;
    const TARGET_COMMITTEE_SIZE: NonZeroU64 = nonzero!(4_u64);
}

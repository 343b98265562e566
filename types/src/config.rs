use core::num::NonZeroU64;
use std::borrow::Cow;

use hex_literal::hex;
use serde::{Deserialize, Serialize};

use crate::phase0::primitives::{Gwei, Version, H32};

/// Configuration variables customizable at runtime.
///
/// See [configurations in `consensus-specs`](https://github.com/ethereum/consensus-specs/tree/v1.4.0/configs).
/// Variables missing from a deserialized configuration take their mainnet values.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    pub config_name: Cow<'static, str>,

    // Genesis
    pub genesis_fork_version: Version,

    // Validator cycle
    pub churn_limit_quotient: NonZeroU64,
    pub ejection_balance: Gwei,
    pub min_per_epoch_churn_limit: u64,
    pub min_validator_withdrawability_delay: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_name: Cow::Borrowed("default"),
            genesis_fork_version: H32(hex!("00000000")),
            churn_limit_quotient: NonZeroU64::new(1 << 16).expect("1 << 16 is nonzero"),
            ejection_balance: 16_000_000_000,
            min_per_epoch_churn_limit: 4,
            min_validator_withdrawability_delay: 256,
        }
    }
}

impl Config {
    /// [Mainnet configuration](https://github.com/ethereum/consensus-specs/blob/v1.4.0/configs/mainnet.yaml).
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            config_name: Cow::Borrowed("mainnet"),
            ..Self::default()
        }
    }

    /// [Minimal configuration](https://github.com/ethereum/consensus-specs/blob/v1.4.0/configs/minimal.yaml).
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            config_name: Cow::Borrowed("minimal"),
            genesis_fork_version: H32(hex!("00000001")),
            churn_limit_quotient: NonZeroU64::new(32).expect("32 is nonzero"),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_take_mainnet_values() -> Result<(), serde_json::Error> {
        let config = serde_json::from_str::<Config>(
            r#"{"CONFIG_NAME": "custom", "MIN_PER_EPOCH_CHURN_LIMIT": 2, "GENESIS_FORK_VERSION": "0x00000007"}"#,
        )?;

        assert_eq!(config.config_name, "custom");
        assert_eq!(config.min_per_epoch_churn_limit, 2);
        assert_eq!(config.genesis_fork_version, H32(hex!("00000007")));
        assert_eq!(config.churn_limit_quotient, Config::mainnet().churn_limit_quotient);
        assert_eq!(config.ejection_balance, Config::mainnet().ejection_balance);

        Ok(())
    }
}

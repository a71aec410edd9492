//! Issuer configuration from environment variables
//!
//! Built once by the caller and passed into the connector and handler
//! constructors. Defaults to Signet.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::Chain;
use crate::cost::{TransactionCostConstants, ESTIMATE_NUM_INPUTS};
use crate::error::{IssuerError, Result};
use crate::retry::{RetryPolicy, BROADCAST_RETRY_INTERVAL, MAX_BROADCAST_ATTEMPTS};

#[derive(Clone, Debug)]
pub struct IssuerConfig {
    pub chain: Chain,
    /// Address expected to fund issuance and derive from the secret
    pub issuing_address: String,
    /// Esplora API base URL
    pub esplora_url: String,
    /// File holding the issuer WIF
    pub key_file: Option<PathBuf>,
    pub tx_cost_constants: TransactionCostConstants,
    pub retry_policy: RetryPolicy,
}

impl IssuerConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `ISSUER_CHAIN`: `bitcoin_signet` (default), `bitcoin_mainnet`,
    ///   `bitcoin_testnet`, `bitcoin_regtest` or `mockchain`
    /// - `ISSUING_ADDRESS`: required
    /// - `ESPLORA_URL`: optional, defaults per chain
    /// - `ISSUER_KEY_FILE`: path to the WIF file
    /// - `TX_FEE_SATS`, `DUST_THRESHOLD_SATS`, `SATOSHI_PER_BYTE`,
    ///   `ESTIMATE_NUM_INPUTS`: cost model overrides
    /// - `MAX_BROADCAST_ATTEMPTS`, `BROADCAST_RETRY_INTERVAL_SECS`: retry policy
    ///
    /// # Examples
    ///
    /// ```bash
    /// ISSUER_CHAIN=bitcoin_regtest ESPLORA_URL=http://localhost:3000 \
    ///   ISSUING_ADDRESS=mxyz... ISSUER_KEY_FILE=/media/usb/pk_issuer.txt \
    ///   anchor-issuer <payload-hex>
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let chain = match lookup("ISSUER_CHAIN") {
            Some(name) if !name.trim().is_empty() => Chain::from_str(&name)?,
            _ => Chain::BitcoinSignet,
        };
        log::info!("🌐 Using chain {}", chain);

        let issuing_address = lookup("ISSUING_ADDRESS")
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| IssuerError::Configuration("ISSUING_ADDRESS is not set".to_string()))?;

        let esplora_url =
            lookup("ESPLORA_URL").unwrap_or_else(|| chain.default_esplora_url().to_string());
        log::info!("📡 Esplora URL: {}", esplora_url);

        let key_file = lookup("ISSUER_KEY_FILE").map(PathBuf::from);

        let defaults = TransactionCostConstants::default();
        let tx_cost_constants = TransactionCostConstants {
            recommended_tx_fee: parse_or(&lookup, "TX_FEE_SATS", defaults.recommended_tx_fee)?,
            min_per_output: parse_or(&lookup, "DUST_THRESHOLD_SATS", defaults.min_per_output)?,
            satoshi_per_byte: parse_or(&lookup, "SATOSHI_PER_BYTE", defaults.satoshi_per_byte)?,
            default_assumed_inputs: parse_or(&lookup, "ESTIMATE_NUM_INPUTS", ESTIMATE_NUM_INPUTS)?,
        };

        let retry_policy = RetryPolicy::new(
            parse_or(&lookup, "MAX_BROADCAST_ATTEMPTS", MAX_BROADCAST_ATTEMPTS)?,
            Duration::from_secs(parse_or(
                &lookup,
                "BROADCAST_RETRY_INTERVAL_SECS",
                BROADCAST_RETRY_INTERVAL.as_secs(),
            )?),
        );

        Ok(Self {
            chain,
            issuing_address,
            esplora_url,
            key_file,
            tx_cost_constants,
            retry_policy,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| IssuerError::Configuration(format!("{} = {:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

impl Default for IssuerConfig {
    /// Default configuration (Signet)
    fn default() -> Self {
        Self {
            chain: Chain::BitcoinSignet,
            issuing_address: String::new(),
            esplora_url: Chain::BitcoinSignet.default_esplora_url().to_string(),
            key_file: None,
            tx_cost_constants: TransactionCostConstants::default(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_signet() {
        let config = IssuerConfig::default();
        assert_eq!(config.chain, Chain::BitcoinSignet);
        assert_eq!(config.retry_policy.max_attempts, MAX_BROADCAST_ATTEMPTS);
    }

    #[test]
    fn test_requires_issuing_address() {
        let err = IssuerConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, IssuerError::Configuration(_)));
    }

    #[test]
    fn test_overrides() {
        let config = IssuerConfig::from_lookup(lookup_from(&[
            ("ISSUER_CHAIN", "bitcoin_regtest"),
            ("ISSUING_ADDRESS", "mxIssuer"),
            ("SATOSHI_PER_BYTE", "5"),
            ("ESTIMATE_NUM_INPUTS", "2"),
            ("MAX_BROADCAST_ATTEMPTS", "5"),
            ("BROADCAST_RETRY_INTERVAL_SECS", "1"),
        ]))
        .unwrap();

        assert_eq!(config.chain, Chain::BitcoinRegtest);
        assert_eq!(config.esplora_url, "http://localhost:3000");
        assert_eq!(config.tx_cost_constants.satoshi_per_byte, 5);
        assert_eq!(config.tx_cost_constants.default_assumed_inputs, 2);
        assert_eq!(config.retry_policy, RetryPolicy::new(5, Duration::from_secs(1)));
    }

    #[test]
    fn test_bad_number() {
        let err = IssuerConfig::from_lookup(lookup_from(&[
            ("ISSUING_ADDRESS", "mxIssuer"),
            ("TX_FEE_SATS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, IssuerError::Configuration(_)));
    }
}

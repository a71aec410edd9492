//! Target chain selector

use std::fmt;
use std::str::FromStr;

use bitcoin::Network;

use crate::error::IssuerError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chain {
    BitcoinMainnet,
    BitcoinTestnet,
    BitcoinSignet,
    BitcoinRegtest,
    /// No network at all; pairs with the mock connector
    Mockchain,
}

impl Chain {
    /// Network used for address derivation
    ///
    /// Mockchain derives testnet-style addresses so a real WIF can still be
    /// checked against an issuing address in dry runs.
    pub fn network(&self) -> Network {
        match self {
            Chain::BitcoinMainnet => Network::Bitcoin,
            Chain::BitcoinTestnet | Chain::Mockchain => Network::Testnet,
            Chain::BitcoinSignet => Network::Signet,
            Chain::BitcoinRegtest => Network::Regtest,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Chain::Mockchain)
    }

    /// Default Esplora endpoint for the chain
    pub fn default_esplora_url(&self) -> &'static str {
        match self {
            Chain::BitcoinMainnet => "https://mempool.space/api",
            Chain::BitcoinTestnet => "https://mempool.space/testnet/api",
            Chain::BitcoinSignet => "https://mempool.space/signet/api",
            Chain::BitcoinRegtest | Chain::Mockchain => "http://localhost:3000",
        }
    }
}

impl FromStr for Chain {
    type Err = IssuerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitcoin_mainnet" | "mainnet" => Ok(Chain::BitcoinMainnet),
            "bitcoin_testnet" | "testnet" => Ok(Chain::BitcoinTestnet),
            "bitcoin_signet" | "signet" => Ok(Chain::BitcoinSignet),
            "bitcoin_regtest" | "regtest" => Ok(Chain::BitcoinRegtest),
            "mockchain" | "mock" => Ok(Chain::Mockchain),
            other => Err(IssuerError::Configuration(format!("Unknown chain: {}", other))),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Chain::BitcoinMainnet => "bitcoin_mainnet",
            Chain::BitcoinTestnet => "bitcoin_testnet",
            Chain::BitcoinSignet => "bitcoin_signet",
            Chain::BitcoinRegtest => "bitcoin_regtest",
            Chain::Mockchain => "mockchain",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_names() {
        assert_eq!("bitcoin_mainnet".parse::<Chain>().unwrap(), Chain::BitcoinMainnet);
        assert_eq!("Signet".parse::<Chain>().unwrap(), Chain::BitcoinSignet);
        assert_eq!("mockchain".parse::<Chain>().unwrap(), Chain::Mockchain);
        assert!("dogecoin".parse::<Chain>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for chain in [Chain::BitcoinTestnet, Chain::BitcoinRegtest] {
            assert_eq!(chain.to_string().parse::<Chain>().unwrap(), chain);
        }
    }

    #[test]
    fn test_network_mapping() {
        assert_eq!(Chain::BitcoinMainnet.network(), Network::Bitcoin);
        assert_eq!(Chain::BitcoinRegtest.network(), Network::Regtest);
        assert!(Chain::Mockchain.is_mock());
    }
}

//! Blockchain provider backends
//!
//! The wire layer under the live connector. A backend knows how to list an
//! address's spendables and relay a raw transaction; request and response
//! shapes stay inside the implementation.

pub mod esplora;

use bitcoin::Address;

use crate::creator::Spendable;
use crate::error::ProviderError;

pub use esplora::EsploraClient;

pub trait ProviderBackend {
    fn spendables_for_address(&self, address: &Address) -> Result<Vec<Spendable>, ProviderError>;

    /// Relay a hex-encoded signed transaction, returning its txid
    fn broadcast_raw_tx(&self, tx_hex: &str) -> Result<String, ProviderError>;

    /// Sum of everything the address can spend right now
    fn spendable_balance(&self, address: &Address) -> Result<u64, ProviderError> {
        Ok(self
            .spendables_for_address(address)?
            .iter()
            .map(|s| s.value)
            .sum())
    }
}

//! Esplora HTTP backend (mempool.space, electrs, or a local mock)

use std::time::Duration;

use bitcoin::transaction::OutPoint;
use bitcoin::{Address, Txid};
use serde::Deserialize;

use super::ProviderBackend;
use crate::creator::Spendable;
use crate::error::ProviderError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// UTXO entry from /address/{address}/utxo
#[derive(Debug, Clone, Deserialize)]
struct UtxoResponse {
    txid: String,
    vout: u32,
    value: u64,
}

pub struct EsploraClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl EsploraClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rejected(response: reqwest::blocking::Response) -> ProviderError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        ProviderError::Rejected { status, message }
    }
}

impl ProviderBackend for EsploraClient {
    fn spendables_for_address(&self, address: &Address) -> Result<Vec<Spendable>, ProviderError> {
        let url = format!("{}/address/{}/utxo", self.base_url, address);
        log::debug!("Fetching spendables: {}", url);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(Self::rejected(response));
        }

        let body = response.text()?;
        let utxos: Vec<UtxoResponse> = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", e, body)))?;

        utxos
            .into_iter()
            .map(|utxo| {
                let txid: Txid = utxo.txid.parse().map_err(|e| {
                    ProviderError::InvalidResponse(format!("Invalid txid {}: {}", utxo.txid, e))
                })?;
                Ok(Spendable {
                    outpoint: OutPoint::new(txid, utxo.vout),
                    value: utxo.value,
                    address: address.to_string(),
                })
            })
            .collect()
    }

    fn broadcast_raw_tx(&self, tx_hex: &str) -> Result<String, ProviderError> {
        log::debug!("Broadcasting transaction to: {}/tx", self.base_url);

        let response = self
            .client
            .post(format!("{}/tx", self.base_url))
            .body(tx_hex.to_string())
            .send()?;

        if !response.status().is_success() {
            return Err(Self::rejected(response));
        }

        let txid = response.text()?.trim().to_string();
        if txid.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "empty broadcast response".to_string(),
            ));
        }

        Ok(txid)
    }
}

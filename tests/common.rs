//! Common test utilities for issuance tests
//!
//! This module provides shared test infrastructure including:
//! - A recording in-process provider backend (no network)
//! - A secret manager that counts start/stop pairs
//! - Deterministic keys, spendables and cost constants

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anchor_issuer::{
    derive_address, ProviderBackend, ProviderError, Result, RetryPolicy, SecretManager, Spendable,
    TransactionCostConstants, WifSecretManager,
};
use bitcoin::consensus::encode::deserialize;
use bitcoin::hashes::Hash;
use bitcoin::transaction::OutPoint;
use bitcoin::{Address, Network, Transaction, Txid};

/// Private key 1, compressed
pub const ISSUER_WIF: &str = "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn";
pub const WRONG_ADDRESS: &str = "1XyzXyzXyzXyzXyzXyzXyzXyzXyzXyzXy";

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn issuer_address() -> Address {
    derive_address(ISSUER_WIF, Network::Bitcoin).expect("test WIF derives")
}

pub fn test_txid(counter: u8) -> Txid {
    Txid::from_byte_array([counter; 32])
}

pub fn spendable(counter: u8, value: u64) -> Spendable {
    Spendable {
        outpoint: OutPoint::new(test_txid(counter), counter as u32),
        value,
        address: issuer_address().to_string(),
    }
}

/// Cost constants whose pre-flight estimate is exactly `fee`
pub fn flat_fee(fee: u64) -> TransactionCostConstants {
    TransactionCostConstants::new(fee, 546, 1)
}

pub fn no_wait(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::ZERO)
}

pub fn decode_tx(tx_hex: &str) -> Transaction {
    let bytes = hex::decode(tx_hex).expect("valid hex");
    deserialize(&bytes).expect("valid transaction")
}

#[derive(Default)]
struct BackendState {
    spendables: Vec<Spendable>,
    broadcast_failures: VecDeque<ProviderError>,
    lose_next_acceptance: bool,
    accepted: Vec<String>,
    spendable_queries: usize,
    broadcasts: Vec<String>,
    watched_secrets: Option<RecordingSecrets>,
    calls_with_secret_open: usize,
}

impl BackendState {
    fn note_secret_state(&mut self) {
        if self.watched_secrets.as_ref().is_some_and(RecordingSecrets::is_open) {
            self.calls_with_secret_open += 1;
        }
    }

    /// Relay `tx`: its change output becomes the only spendable, the way a
    /// provider reports mempool state after acceptance
    fn accept(&mut self, tx_hex: &str) {
        self.accepted.push(tx_hex.to_string());
        let tx = decode_tx(tx_hex);
        let txid = tx.compute_txid();
        self.spendables = tx
            .output
            .iter()
            .enumerate()
            .filter(|(_, out)| !out.script_pubkey.is_op_return())
            .map(|(vout, out)| Spendable {
                outpoint: OutPoint::new(txid, vout as u32),
                value: out.value.to_sat(),
                address: issuer_address().to_string(),
            })
            .collect();
    }
}

/// In-process backend that records every call
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<BackendState>>,
}

impl RecordingBackend {
    pub fn with_spendables(spendables: Vec<Spendable>) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().spendables = spendables;
        backend
    }

    /// Fail the next broadcasts with these errors, in order
    pub fn fail_broadcasts(self, failures: impl IntoIterator<Item = ProviderError>) -> Self {
        self.state.lock().unwrap().broadcast_failures.extend(failures);
        self
    }

    /// Accept the next new transaction but answer with a timeout
    pub fn lose_first_response(self) -> Self {
        self.state.lock().unwrap().lose_next_acceptance = true;
        self
    }

    /// Count provider calls made while `secrets` exposes a key
    pub fn watch_secrets(self, secrets: &RecordingSecrets) -> Self {
        self.state.lock().unwrap().watched_secrets = Some(secrets.clone());
        self
    }

    pub fn calls_with_secret_open(&self) -> usize {
        self.state.lock().unwrap().calls_with_secret_open
    }

    /// Distinct transactions the provider has relayed
    pub fn accepted(&self) -> Vec<String> {
        self.state.lock().unwrap().accepted.clone()
    }

    pub fn spendable_queries(&self) -> usize {
        self.state.lock().unwrap().spendable_queries
    }

    /// Every raw transaction submitted, including failed submissions
    pub fn broadcasts(&self) -> Vec<String> {
        self.state.lock().unwrap().broadcasts.clone()
    }

    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.spendable_queries + state.broadcasts.len()
    }
}

impl ProviderBackend for RecordingBackend {
    fn spendables_for_address(
        &self,
        _address: &Address,
    ) -> std::result::Result<Vec<Spendable>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.note_secret_state();
        state.spendable_queries += 1;
        Ok(state.spendables.clone())
    }

    fn broadcast_raw_tx(&self, tx_hex: &str) -> std::result::Result<String, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.note_secret_state();
        state.broadcasts.push(tx_hex.to_string());
        if let Some(failure) = state.broadcast_failures.pop_front() {
            return Err(failure);
        }
        if state.accepted.iter().any(|known| known == tx_hex) {
            return Err(ProviderError::Rejected {
                status: 400,
                message: "sendrawtransaction RPC error: txn-already-known".to_string(),
            });
        }

        state.accept(tx_hex);
        if state.lose_next_acceptance {
            state.lose_next_acceptance = false;
            return Err(ProviderError::Http("operation timed out".to_string()));
        }
        Ok(decode_tx(tx_hex).compute_txid().to_string())
    }
}

/// Counts start/stop calls and can refuse to start
#[derive(Clone)]
pub struct RecordingSecrets {
    inner: Arc<Mutex<WifSecretManager>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    fail_start: bool,
    wif_cache: Option<String>,
}

impl RecordingSecrets {
    pub fn new(wif: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WifSecretManager::new(wif))),
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
            fail_start: false,
            wif_cache: None,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_start: true,
            ..Self::new(ISSUER_WIF)
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().unwrap().wif().is_some()
    }
}

impl SecretManager for RecordingSecrets {
    fn start(&mut self) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(anchor_issuer::IssuerError::Secret(
                "secret store unreachable".to_string(),
            ));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.start()?;
        self.wif_cache = inner.wif().map(str::to_string);
        Ok(())
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().unwrap().stop();
        self.wif_cache = None;
    }

    fn wif(&self) -> Option<&str> {
        self.wif_cache.as_deref()
    }
}

//! Scripted connector for exercising the handler without a network

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use super::{BroadcastRequest, ServiceProviderConnector};
use crate::creator::build_op_return_script;
use crate::error::{ProviderError, Result};
use crate::secrets::SecretManager;

pub const MOCK_TXID: &str = "0000000000000000000000000000000000000000000000000000000000000000";

struct MockState {
    balance: std::result::Result<u64, ProviderError>,
    broadcast_results: VecDeque<std::result::Result<String, ProviderError>>,
    default_txid: String,
    balance_queries: usize,
    broadcast_attempts: Vec<Instant>,
    last_payload: Option<Vec<u8>>,
}

/// Clones share state, so a test can keep a handle after handing one to a
/// handler.
#[derive(Clone)]
pub struct MockServiceProviderConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockServiceProviderConnector {
    pub fn new(balance: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                balance: Ok(balance),
                broadcast_results: VecDeque::new(),
                default_txid: MOCK_TXID.to_string(),
                balance_queries: 0,
                broadcast_attempts: Vec::new(),
                last_payload: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn with_balance_failure(self, error: ProviderError) -> Self {
        self.state().balance = Err(error);
        self
    }

    /// Results handed out by successive broadcasts; the default txid follows
    pub fn with_broadcast_results(
        self,
        results: impl IntoIterator<Item = std::result::Result<String, ProviderError>>,
    ) -> Self {
        self.state().broadcast_results.extend(results);
        self
    }

    pub fn with_default_txid(self, txid: impl Into<String>) -> Self {
        self.state().default_txid = txid.into();
        self
    }

    pub fn set_balance(&self, balance: u64) {
        self.state().balance = Ok(balance);
    }

    pub fn balance_queries(&self) -> usize {
        self.state().balance_queries
    }

    pub fn broadcast_attempts(&self) -> usize {
        self.state().broadcast_attempts.len()
    }

    pub fn broadcast_attempt_times(&self) -> Vec<Instant> {
        self.state().broadcast_attempts.clone()
    }

    pub fn last_payload(&self) -> Option<Vec<u8>> {
        self.state().last_payload.clone()
    }
}

impl Default for MockServiceProviderConnector {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

impl ServiceProviderConnector for MockServiceProviderConnector {
    fn get_balance(&self, _issuing_address: &str, _secrets: &mut dyn SecretManager) -> Result<u64> {
        let mut state = self.state();
        state.balance_queries += 1;
        Ok(state.balance.clone()?)
    }

    fn broadcast_op_return(
        &self,
        request: &BroadcastRequest<'_>,
        _secrets: &mut dyn SecretManager,
    ) -> Result<String> {
        build_op_return_script(request.payload)?;

        request.retry_policy.run(|_attempt| {
            let mut state = self.state();
            state.broadcast_attempts.push(Instant::now());
            state.last_payload = Some(request.payload.to_vec());

            match state.broadcast_results.pop_front() {
                Some(result) => Ok(result?),
                None => Ok(state.default_txid.clone()),
            }
        })
    }
}

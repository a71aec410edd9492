//! Service provider connectors
//!
//! The handler talks to a chain only through [`ServiceProviderConnector`].
//! Two variants exist:
//!
//! - [`BitcoinServiceProviderConnector`]: derives the key inside short secret
//!   scopes, builds and signs the OP_RETURN transaction once, then relays it
//!   through a [`ProviderBackend`](crate::provider::ProviderBackend)
//! - [`MockServiceProviderConnector`]: no I/O, scripted results

pub mod live;
pub mod mock;

use crate::cost::TransactionCostConstants;
use crate::creator::{OpReturnTransactionCreator, TransactionCreator};
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::secrets::SecretManager;

pub use live::BitcoinServiceProviderConnector;
pub use mock::MockServiceProviderConnector;

/// Everything one broadcast needs from the handler.
///
/// The handler owns the cost constants, creator and retry policy; connectors
/// only borrow them, so the pre-flight estimate and the fee actually paid come
/// from the same configuration.
pub struct BroadcastRequest<'a> {
    pub issuing_address: &'a str,
    pub payload: &'a [u8],
    pub tx_cost_constants: &'a TransactionCostConstants,
    pub transaction_creator: &'a dyn TransactionCreator,
    pub retry_policy: &'a RetryPolicy,
}

impl<'a> BroadcastRequest<'a> {
    pub fn new(
        issuing_address: &'a str,
        payload: &'a [u8],
        tx_cost_constants: &'a TransactionCostConstants,
        retry_policy: &'a RetryPolicy,
    ) -> Self {
        Self {
            issuing_address,
            payload,
            tx_cost_constants,
            transaction_creator: &OpReturnTransactionCreator,
            retry_policy,
        }
    }

    pub fn with_transaction_creator(mut self, creator: &'a dyn TransactionCreator) -> Self {
        self.transaction_creator = creator;
        self
    }
}

pub trait ServiceProviderConnector {
    /// Spendable balance of `issuing_address` in satoshis.
    ///
    /// Fails with `IssuerError::Config` when the secret does not derive to
    /// `issuing_address`; the provider is not queried in that case.
    fn get_balance(&self, issuing_address: &str, secrets: &mut dyn SecretManager) -> Result<u64>;

    /// Sign one transaction carrying the request payload as OP_RETURN data
    /// and relay it.
    ///
    /// Only the network submission runs under `request.retry_policy`; every
    /// attempt relays the same signed transaction.
    fn broadcast_op_return(
        &self,
        request: &BroadcastRequest<'_>,
        secrets: &mut dyn SecretManager,
    ) -> Result<String>;
}

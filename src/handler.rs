//! Transaction handler: the issuance pipeline's only entry point
//!
//! Issuance is two calls the caller makes in order:
//!
//! 1. [`TransactionHandler::ensure_balance`] fails if the pre-flight cost
//!    estimate exceeds the address balance
//! 2. [`TransactionHandler::issue_transaction`] signs the OP_RETURN
//!    transaction once and relays it with bounded retry
//!
//! The balance is not checked again before signing. Funds spent between the
//! two calls surface as a provider or funds error from the broadcast itself.
//!
//! Every step holds the per-address lock from the shared [`IssuanceLocks`]
//! registry; [`TransactionHandler::issue`] holds it across both steps.
//! The handler's cost constants and creator are the only ones in play: the
//! pre-flight estimate and the fee paid at construction use the same values.

use crate::connector::{BroadcastRequest, ServiceProviderConnector};
use crate::cost::TransactionCostConstants;
use crate::creator::{OpReturnTransactionCreator, TransactionCreator};
use crate::error::{IssuerError, Result};
use crate::locks::IssuanceLocks;
use crate::retry::RetryPolicy;
use crate::secrets::SecretManager;

pub struct TransactionHandler<C> {
    connector: C,
    tx_cost_constants: TransactionCostConstants,
    secret_manager: Box<dyn SecretManager + Send>,
    issuing_address: String,
    transaction_creator: Box<dyn TransactionCreator + Send + Sync>,
    retry_policy: RetryPolicy,
    issuance_locks: IssuanceLocks,
}

impl<C: ServiceProviderConnector> TransactionHandler<C> {
    /// `issuance_locks` must be shared by every handler that can issue from
    /// the same address.
    pub fn new(
        connector: C,
        tx_cost_constants: TransactionCostConstants,
        secret_manager: impl SecretManager + Send + 'static,
        issuing_address: impl Into<String>,
        retry_policy: RetryPolicy,
        issuance_locks: IssuanceLocks,
    ) -> Self {
        Self {
            connector,
            tx_cost_constants,
            secret_manager: Box::new(secret_manager),
            issuing_address: issuing_address.into(),
            transaction_creator: Box::new(OpReturnTransactionCreator),
            retry_policy,
            issuance_locks,
        }
    }

    pub fn with_transaction_creator(
        mut self,
        creator: impl TransactionCreator + Send + Sync + 'static,
    ) -> Self {
        self.transaction_creator = Box::new(creator);
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn issuing_address(&self) -> &str {
        &self.issuing_address
    }

    /// Fail with `InsufficientFunds` if the estimated cost exceeds the balance
    pub fn ensure_balance(&mut self) -> Result<()> {
        let locks = self.issuance_locks.clone();
        let address = self.issuing_address.clone();
        locks.run(&address, || self.check_balance())
    }

    /// Broadcast `blockchain_bytes` as OP_RETURN data and return the txid.
    ///
    /// Call only after a successful [`ensure_balance`](Self::ensure_balance).
    pub fn issue_transaction(&mut self, blockchain_bytes: &[u8]) -> Result<String> {
        let locks = self.issuance_locks.clone();
        let address = self.issuing_address.clone();
        locks.run(&address, || self.broadcast(blockchain_bytes))
    }

    /// `ensure_balance` then `issue_transaction`, holding the address lock
    /// across both
    pub fn issue(&mut self, blockchain_bytes: &[u8]) -> Result<String> {
        let locks = self.issuance_locks.clone();
        let address = self.issuing_address.clone();

        locks.run(&address, || {
            self.check_balance()?;
            self.broadcast(blockchain_bytes)
        })
    }

    fn check_balance(&mut self) -> Result<()> {
        let balance = self
            .connector
            .get_balance(&self.issuing_address, self.secret_manager.as_mut())?;

        let transaction_cost = self
            .transaction_creator
            .estimate_cost_for_certificate_batch(&self.tx_cost_constants);

        log::info!("{} address balance is {} satoshis", self.issuing_address, balance);
        log::info!("Total cost estimate will be {} satoshis", transaction_cost);

        if transaction_cost > balance {
            let err = IssuerError::InsufficientFunds {
                shortfall: transaction_cost - balance,
                address: self.issuing_address.clone(),
            };
            log::error!("{}", err);
            return Err(err);
        }

        Ok(())
    }

    fn broadcast(&mut self, blockchain_bytes: &[u8]) -> Result<String> {
        let request = BroadcastRequest::new(
            &self.issuing_address,
            blockchain_bytes,
            &self.tx_cost_constants,
            &self.retry_policy,
        )
        .with_transaction_creator(&*self.transaction_creator);

        let txid = self
            .connector
            .broadcast_op_return(&request, self.secret_manager.as_mut())?;

        log::info!("Issued transaction {} from {}", txid, self.issuing_address);
        Ok(txid)
    }
}

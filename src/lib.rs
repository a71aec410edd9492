//! Anchor Issuer: OP_RETURN commitment issuance
//!
//! Embeds a commitment (typically a Merkle root over a certificate batch)
//! in a single Bitcoin transaction funded by one issuing address.
//!
//! # Architecture
//!
//! - **Transaction Handler**: balance assurance, then broadcast with bounded retry
//! - **Connectors**: live (local signing, Esplora relay) or mock (no I/O)
//! - **Cost Model / Creator**: deterministic fee and transaction layout
//! - **Secret Access**: key material exposed only inside a scoped start/stop
//!
//! # Example
//!
//! ```ignore
//! use anchor_issuer::{
//!     BitcoinServiceProviderConnector, FileSecretManager, IssuanceLocks, IssuerConfig,
//!     TransactionHandler,
//! };
//!
//! let config = IssuerConfig::from_env()?;
//! let issuance_locks = IssuanceLocks::new();
//! let connector = BitcoinServiceProviderConnector::from_config(&config)?;
//! let mut handler = TransactionHandler::new(
//!     connector,
//!     config.tx_cost_constants.clone(),
//!     FileSecretManager::new("/media/usb/pk_issuer.txt"),
//!     config.issuing_address.clone(),
//!     config.retry_policy.clone(),
//!     issuance_locks.clone(),
//! );
//!
//! handler.ensure_balance()?;
//! let txid = handler.issue_transaction(&merkle_root)?;
//! ```

// Public modules
pub mod chain;
pub mod config;
pub mod connector;
pub mod cost;
pub mod creator;
pub mod error;
pub mod handler;
pub mod locks;
pub mod provider;
pub mod retry;
pub mod secrets;
pub mod signer;

// Re-exports for convenience
pub use chain::Chain;
pub use config::IssuerConfig;
pub use connector::{
    BitcoinServiceProviderConnector, BroadcastRequest, MockServiceProviderConnector,
    ServiceProviderConnector,
};
pub use cost::{estimate_cost, estimate_tx_size, TransactionCostConstants};
pub use creator::{
    build_op_return_script, extract_op_return_payload, IssuanceTransaction,
    OpReturnTransactionCreator, Spendable, TransactionCreator,
};
pub use error::{IssuerError, ProviderError, Result};
pub use handler::TransactionHandler;
pub use locks::IssuanceLocks;
pub use provider::{EsploraClient, ProviderBackend};
pub use retry::{RetryPolicy, BROADCAST_RETRY_INTERVAL, MAX_BROADCAST_ATTEMPTS};
pub use secrets::{FileSecretManager, SecretManager, SecretScope, WifSecretManager};
pub use signer::{derive_address, sign_transaction, DerivedKey};

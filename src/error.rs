//! Error types for anchor issuance
//!
//! `IssuerError` is what the issuance pipeline sees. `ProviderError` covers the
//! wire layer and knows which failures are worth another broadcast attempt.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IssuerError {
    #[error("Derived {derived} address is not the same as issuing {issuing} address")]
    Config { derived: String, issuing: String },

    #[error("Please add {shortfall} satoshis to the address {address}")]
    InsufficientFunds { shortfall: u64, address: String },

    #[error("Broadcast failed after {attempts} attempt(s): {source}")]
    Broadcast {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("Secret access error: {0}")]
    Secret(String),

    #[error("Invalid key material: {0}")]
    Key(String),

    #[error("Invalid OP_RETURN payload: {0}")]
    InvalidPayload(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl IssuerError {
    /// Only transient provider failures are worth another broadcast attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            IssuerError::Provider(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Transport failures, server errors and rate limiting may clear up on
    /// their own. Anything else is a definite answer from the provider.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) => true,
            ProviderError::Rejected { status, .. } => *status >= 500 || *status == 429,
            ProviderError::InvalidResponse(_) => false,
        }
    }

    /// The node already holds this exact transaction, in the mempool or a
    /// block. A resubmission that gets this answer has been relayed.
    pub fn is_already_known(&self) -> bool {
        const MARKERS: [&str; 4] = [
            "txn-already-known",
            "txn-already-in-mempool",
            "already in block chain",
            "outputs already in utxo set",
        ];

        match self {
            ProviderError::Rejected { message, .. } => {
                let message = message.to_ascii_lowercase();
                MARKERS.iter().any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IssuerError>;

//! Error types for wallet actions

use thiserror::Error;

/// Errors from the ledger node HTTP API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger node unreachable at {url}: {message}")]
    Transport { url: String, message: String },

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Malformed ledger node response: {0}")]
    Decode(String),
}

impl LedgerError {
    /// Transport failures are worth trying against the next endpoint
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Transport { .. })
    }
}

/// Errors reported by the signer service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("Transaction signing was cancelled")]
    Cancelled,

    #[error("Wallet connector error: {0}")]
    Connector(String),
}

/// Errors from the verified asset directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Failed to load verified assets")]
    Unavailable { message: String },
}

/// Main error type for wallet actions
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Signing(#[from] SignError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Action {action} is already in progress")]
    Busy { action: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Account {0} is not part of the wallet session")]
    UnknownAccount(String),

    #[error("No wallet account connected")]
    NotConnected,

    #[error("No asset selected")]
    NoAssetSelected,

    #[error("Asset {0} is not in the verified asset list")]
    UnknownAsset(u64),

    #[error("No ledger node configured for {0}")]
    NetworkNotConfigured(String),
}

impl ActionError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::Ledger(e) => e.is_retryable(),
            ActionError::Directory(_) => true,
            _ => false,
        }
    }
}

/// Result type for wallet action operations
pub type ActionResult<T> = Result<T, ActionError>;

//! Wallet connector and signer interfaces
//!
//! Signing is always delegated: the wallet holds the keys, this crate only
//! hands it descriptor groups and receives opaque signed payloads.

mod session;

pub use session::WalletSession;

use crate::error::SignError;
use crate::tx::{SignedPayload, TransactionGroup};

use async_trait::async_trait;

/// External signer service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign every descriptor in the given atomic groups, in order
    async fn sign_transaction(
        &self,
        groups: Vec<TransactionGroup>,
    ) -> Result<Vec<SignedPayload>, SignError>;
}

/// External wallet connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Ask the user to connect; returns the wallet's account addresses
    async fn connect(&self) -> Result<Vec<String>, SignError>;

    /// Restore a previous session without prompting, if there is one
    async fn reconnect_session(&self) -> Result<Vec<String>, SignError>;

    async fn disconnect(&self) -> Result<(), SignError>;
}

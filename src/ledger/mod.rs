//! Ledger node access
//!
//! This module provides:
//! - The `LedgerNode` interface the lifecycle controller talks to
//! - An HTTP client for algod-style nodes with endpoint failover
//! - Bounded confirmation polling keyed to block production

pub mod algod;
pub mod confirmation;

pub use algod::AlgodClient;
pub use confirmation::{wait_for_confirmation, ConfirmationError};

use crate::error::LedgerError;
use crate::tx::{Address, AssetId, SignedPayload, SuggestedParams, TxId};

use async_trait::async_trait;
use serde::Deserialize;

/// Node status at a given round
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

/// State of a submitted transaction in the node's pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PendingTransaction {
    #[serde(rename = "confirmed-round", default)]
    pub confirmed_round: Option<u64>,
    /// Non-empty when the node evicted the transaction from its pool
    #[serde(rename = "pool-error", default)]
    pub pool_error: String,
}

impl PendingTransaction {
    /// Confirmed round, if the transaction made it into a block
    pub fn confirmed(&self) -> Option<u64> {
        self.confirmed_round.filter(|round| *round > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetHolding {
    #[serde(rename = "asset-id")]
    pub asset_id: AssetId,
    pub amount: u64,
    #[serde(rename = "is-frozen", default)]
    pub is_frozen: bool,
}

/// Account balances as reported by the node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInformation {
    pub address: String,
    /// Native currency balance in micro-units
    pub amount: u64,
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
}

impl AccountInformation {
    /// Held amount of an asset; zero when the account does not hold it
    pub fn asset_balance(&self, asset_id: AssetId) -> u64 {
        self.assets
            .iter()
            .find(|holding| holding.asset_id == asset_id)
            .map(|holding| holding.amount)
            .unwrap_or(0)
    }
}

/// Operations the lifecycle controller needs from a ledger node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerNode: Send + Sync {
    /// Suggested parameters required to build any descriptor
    async fn transaction_params(&self) -> Result<SuggestedParams, LedgerError>;

    /// Submit signed payloads; returns the submission identifier
    async fn send_raw_transaction(&self, signed: Vec<SignedPayload>) -> Result<TxId, LedgerError>;

    async fn pending_transaction_information(
        &self,
        tx_id: &TxId,
    ) -> Result<PendingTransaction, LedgerError>;

    async fn status(&self) -> Result<NodeStatus, LedgerError>;

    /// Block until the node has seen a round after `round`
    async fn status_after_block(&self, round: u64) -> Result<NodeStatus, LedgerError>;

    async fn account_information(
        &self,
        address: &Address,
    ) -> Result<AccountInformation, LedgerError>;
}

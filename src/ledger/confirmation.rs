//! Confirmation polling for submitted transactions
//!
//! Each iteration asks the node for the pending transaction and, if it is not
//! yet in a block, blocks on the node until the next round is produced. The
//! number of rounds waited is always bounded by the caller.

use super::LedgerNode;
use crate::error::LedgerError;
use crate::tx::TxId;

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    /// The node dropped the transaction from its pool
    #[error("Transaction rejected by the node: {0}")]
    Rejected(String),

    #[error("Transaction not confirmed after {rounds} rounds")]
    Timeout { rounds: u64 },

    #[error(transparent)]
    Node(#[from] LedgerError),
}

/// A confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub confirmed_round: u64,
    /// Rounds waited on the node before the confirmation was seen
    pub rounds_waited: u64,
}

/// Wait until `tx_id` is confirmed, for at most `max_rounds` rounds past the
/// node's current round
pub async fn wait_for_confirmation(
    node: &dyn LedgerNode,
    tx_id: &TxId,
    max_rounds: u64,
) -> Result<Confirmation, ConfirmationError> {
    let status = node.status().await?;
    let start_round = status.last_round.saturating_add(1);
    let end_round = start_round.saturating_add(max_rounds);
    let mut current_round = start_round;

    while current_round < end_round {
        let pending = node.pending_transaction_information(tx_id).await?;

        if let Some(confirmed_round) = pending.confirmed() {
            let rounds_waited = current_round - start_round;
            info!(
                "Transaction {} confirmed in round {} after {} rounds",
                tx_id, confirmed_round, rounds_waited
            );
            return Ok(Confirmation {
                confirmed_round,
                rounds_waited,
            });
        }

        if !pending.pool_error.is_empty() {
            warn!("Transaction {} rejected: {}", tx_id, pending.pool_error);
            return Err(ConfirmationError::Rejected(pending.pool_error));
        }

        debug!(
            "Transaction {} pending, waiting for round {}",
            tx_id, current_round
        );
        node.status_after_block(current_round).await?;
        current_round += 1;
    }

    warn!("Transaction {} not confirmed after {} rounds", tx_id, max_rounds);
    Err(ConfirmationError::Timeout { rounds: max_rounds })
}

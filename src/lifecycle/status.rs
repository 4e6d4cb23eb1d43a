//! Lifecycle status values and failure reasons

use crate::error::{LedgerError, SignError};
use crate::ledger::ConfirmationError;
use crate::tx::TxId;

use serde::Serialize;
use std::fmt;

/// Where an action is in its lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleStatus {
    #[default]
    Idle,
    Validating,
    AwaitingSignature,
    Submitting,
    Confirming,
    Completed { tx_id: TxId },
    Failed(FailureReason),
}

impl LifecycleStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleStatus::Completed { .. } | LifecycleStatus::Failed(_)
        )
    }

    /// A new attempt may start from here
    pub fn can_start(&self) -> bool {
        matches!(self, LifecycleStatus::Idle) || self.is_terminal()
    }

    pub fn is_in_flight(&self) -> bool {
        !self.can_start()
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleStatus::Idle => "idle",
            LifecycleStatus::Validating => "validating",
            LifecycleStatus::AwaitingSignature => "awaiting_signature",
            LifecycleStatus::Submitting => "submitting",
            LifecycleStatus::Confirming => "confirming",
            LifecycleStatus::Completed { .. } => "completed",
            LifecycleStatus::Failed(_) => "failed",
        }
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            LifecycleStatus::Completed { tx_id } => Some(tx_id),
            LifecycleStatus::Failed(reason) => reason.tx_id.as_ref(),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            LifecycleStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::Failed(reason) => write!(f, "failed: {}", reason),
            LifecycleStatus::Completed { tx_id } => write!(f, "completed: {}", tx_id),
            other => f.write_str(other.name()),
        }
    }
}

/// Discriminates why an action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input; nothing was sent anywhere
    Validation,
    InsufficientBalance,
    /// The balance lookup itself failed
    BalanceUnavailable,
    /// The user declined in the wallet
    SigningCancelled,
    SigningFailed,
    Network,
    /// The node refused the transaction
    Submission,
    /// Submitted but not seen in a block within the round limit
    ConfirmationTimeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::InsufficientBalance => "insufficient_balance",
            FailureKind::BalanceUnavailable => "balance_unavailable",
            FailureKind::SigningCancelled => "signing_cancelled",
            FailureKind::SigningFailed => "signing_failed",
            FailureKind::Network => "network",
            FailureKind::Submission => "submission",
            FailureKind::ConfirmationTimeout => "confirmation_timeout",
        }
    }
}

/// Terminal failure of one attempt, with a message fit for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
    /// Set when the failure happened after the node accepted the transaction
    pub tx_id: Option<TxId>,
    /// False when the transaction may still land on-chain
    pub definitive: bool,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tx_id: None,
            definitive: true,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn insufficient_balance(available: u64, requested: u64) -> Self {
        Self::new(
            FailureKind::InsufficientBalance,
            format!(
                "Insufficient balance. Available: {}, Requested: {}",
                available, requested
            ),
        )
    }

    pub fn balance_unavailable(err: &LedgerError) -> Self {
        Self::new(
            FailureKind::BalanceUnavailable,
            format!("Could not read account balance: {}", err),
        )
    }

    pub fn network(err: &LedgerError) -> Self {
        Self::new(FailureKind::Network, err.to_string())
    }

    pub fn signing(err: &SignError) -> Self {
        match err {
            SignError::Cancelled => Self::new(FailureKind::SigningCancelled, err.to_string()),
            SignError::Connector(_) => Self::new(FailureKind::SigningFailed, err.to_string()),
        }
    }

    /// Node answered the submission with an error; its message is kept as-is.
    /// Without an answer the node may still have accepted the payload.
    pub fn submission(err: &LedgerError) -> Self {
        match err {
            LedgerError::Api { message, .. } => Self::new(FailureKind::Submission, message.clone()),
            other => Self::network(other).outcome_unknown(),
        }
    }

    pub fn confirmation(err: &ConfirmationError, tx_id: TxId) -> Self {
        let reason = match err {
            ConfirmationError::Rejected(message) => {
                Self::new(FailureKind::Submission, message.clone())
            }
            ConfirmationError::Timeout { rounds } => Self::new(
                FailureKind::ConfirmationTimeout,
                format!(
                    "Transaction {} was submitted but not confirmed within {} rounds; it may still confirm",
                    tx_id, rounds
                ),
            )
            .outcome_unknown(),
            ConfirmationError::Node(e) => Self::network(e).outcome_unknown(),
        };
        reason.with_tx_id(tx_id)
    }

    pub fn with_tx_id(mut self, tx_id: TxId) -> Self {
        self.tx_id = Some(tx_id);
        self
    }

    pub fn outcome_unknown(mut self) -> Self {
        self.definitive = false;
        self
    }

    pub fn is_user_cancellation(&self) -> bool {
        self.kind == FailureKind::SigningCancelled
    }

    /// False when the transaction was submitted and may still land on-chain
    pub fn is_definitive(&self) -> bool {
        self.definitive
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

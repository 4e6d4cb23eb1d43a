//! Drives one action from validation to a terminal status

use super::board::ActionBoard;
use super::plan::ActionPlan;
use super::status::{FailureReason, LifecycleStatus};
use crate::config::{BalanceFetchPolicy, LifecycleConfig};
use crate::error::{ActionResult, SignError};
use crate::ledger::confirmation::Confirmation;
use crate::ledger::{wait_for_confirmation, LedgerNode};
use crate::signer::Signer;
use crate::tx::{single_group, ActionId, ActionRequest, TxId};

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs donate, opt-in and transfer actions against one ledger node and signer
pub struct LifecycleController {
    node: Arc<dyn LedgerNode>,
    signer: Arc<dyn Signer>,
    board: Arc<ActionBoard>,
    config: LifecycleConfig,
}

impl LifecycleController {
    pub fn new(
        node: Arc<dyn LedgerNode>,
        signer: Arc<dyn Signer>,
        board: Arc<ActionBoard>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            node,
            signer,
            board,
            config,
        }
    }

    pub fn board(&self) -> &Arc<ActionBoard> {
        &self.board
    }

    /// Run one attempt of `request` and return its terminal status.
    ///
    /// Fails with `Busy` without touching anything if the same action is
    /// still in flight. Every other failure ends as `LifecycleStatus::Failed`.
    pub async fn execute(&self, request: ActionRequest) -> ActionResult<LifecycleStatus> {
        let action = request.action_id();
        let kind = request.kind;
        let attempt = self.board.begin(action)?;
        let started = Instant::now();

        info!("Action {} started (attempt {})", action, attempt);
        crate::metrics::record_action_started(kind);

        let terminal = match self.run(&request, action, attempt).await {
            Ok((tx_id, confirmation)) => {
                info!(
                    "Action {} completed: {} in round {}",
                    action, tx_id, confirmation.confirmed_round
                );
                crate::metrics::record_action_completed(kind, confirmation.rounds_waited);
                LifecycleStatus::Completed { tx_id }
            }
            Err(reason) => {
                if reason.is_user_cancellation() {
                    info!("Action {} cancelled by user", action);
                } else if reason.is_definitive() {
                    warn!("Action {} failed: {}", action, reason);
                } else {
                    error!("Action {} outcome unknown: {}", action, reason);
                }
                crate::metrics::record_action_failed(kind, reason.kind);
                LifecycleStatus::Failed(reason)
            }
        };

        crate::metrics::record_action_latency(kind, started.elapsed().as_secs_f64());
        self.board.transition(action, attempt, terminal.clone());

        if matches!(terminal, LifecycleStatus::Completed { .. }) {
            self.schedule_reset(action, attempt);
        }

        Ok(terminal)
    }

    async fn run(
        &self,
        request: &ActionRequest,
        action: ActionId,
        attempt: Uuid,
    ) -> Result<(TxId, Confirmation), FailureReason> {
        let plan = ActionPlan::from_request(request)?;
        self.check_balance(&plan).await?;

        let params = self
            .node
            .transaction_params()
            .await
            .map_err(|e| FailureReason::network(&e))?;
        let txn = plan.descriptor(params);
        debug!("Action {} built descriptor {:?}", action, txn.body);

        self.board
            .transition(action, attempt, LifecycleStatus::AwaitingSignature);
        let signed = self
            .signer
            .sign_transaction(vec![single_group(txn)])
            .await
            .map_err(|e| FailureReason::signing(&e))?;
        if signed.is_empty() {
            return Err(FailureReason::signing(&SignError::Connector(
                "Transaction was not signed".to_string(),
            )));
        }

        self.board
            .transition(action, attempt, LifecycleStatus::Submitting);
        let tx_id = self
            .node
            .send_raw_transaction(signed)
            .await
            .map_err(|e| FailureReason::submission(&e))?;
        info!("Action {} submitted as {}", action, tx_id);

        self.board
            .transition(action, attempt, LifecycleStatus::Confirming);
        let confirmation = wait_for_confirmation(
            self.node.as_ref(),
            &tx_id,
            self.config.max_confirmation_rounds,
        )
        .await
        .map_err(|e| FailureReason::confirmation(&e, tx_id.clone()))?;

        Ok((tx_id, confirmation))
    }

    /// Advisory balance check for transfers; the ledger enforces the real one
    async fn check_balance(&self, plan: &ActionPlan) -> Result<(), FailureReason> {
        let ActionPlan::Transfer {
            sender,
            asset_id,
            amount,
            ..
        } = plan
        else {
            return Ok(());
        };

        let balance = match self.node.account_information(sender).await {
            Ok(info) => info.asset_balance(*asset_id),
            Err(e) => match self.config.balance_fetch_policy {
                BalanceFetchPolicy::TreatAsZero => {
                    warn!("Balance lookup for {} failed, assuming 0: {}", sender.short(), e);
                    0
                }
                BalanceFetchPolicy::Surface => {
                    return Err(FailureReason::balance_unavailable(&e));
                }
            },
        };

        if balance < *amount {
            return Err(FailureReason::insufficient_balance(balance, *amount));
        }
        Ok(())
    }

    fn schedule_reset(&self, action: ActionId, attempt: Uuid) {
        if self.config.completed_reset_ms == 0 {
            return;
        }

        let board = self.board.clone();
        let delay = Duration::from_millis(self.config.completed_reset_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if board.reset_completed(action, attempt) {
                debug!("Action {} returned to idle", action);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::ledger::{AccountInformation, AssetHolding, MockLedgerNode, NodeStatus, PendingTransaction};
    use crate::lifecycle::FailureKind;
    use crate::signer::MockSigner;
    use crate::tx::{SignedPayload, SuggestedParams, DONATION_AMOUNT, DONATION_RECEIVER};

    const SENDER: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const RECEIVER: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    fn params() -> SuggestedParams {
        SuggestedParams::from_last_round(100, 0, 1000, "testnet-v1.0".into(), "hash".into())
    }

    fn config() -> LifecycleConfig {
        LifecycleConfig {
            completed_reset_ms: 0,
            ..LifecycleConfig::default()
        }
    }

    /// Node that accepts everything and confirms on the first poll
    fn confirming_node() -> MockLedgerNode {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| Ok(params()));
        node.expect_send_raw_transaction()
            .returning(|_| Ok(TxId("TXID".to_string())));
        node.expect_status()
            .returning(|| Ok(NodeStatus { last_round: 100 }));
        node.expect_pending_transaction_information()
            .returning(|_| {
                Ok(PendingTransaction {
                    confirmed_round: Some(101),
                    pool_error: String::new(),
                })
            });
        node
    }

    fn signing_signer() -> MockSigner {
        let mut signer = MockSigner::new();
        signer
            .expect_sign_transaction()
            .returning(|_| Ok(vec![SignedPayload(vec![1, 2, 3])]));
        signer
    }

    fn controller(node: MockLedgerNode, signer: MockSigner) -> LifecycleController {
        LifecycleController::new(
            Arc::new(node),
            Arc::new(signer),
            Arc::new(ActionBoard::default()),
            config(),
        )
    }

    fn holding(asset_id: u64, amount: u64) -> AccountInformation {
        AccountInformation {
            address: SENDER.to_string(),
            amount: 0,
            assets: vec![AssetHolding {
                asset_id,
                amount,
                is_frozen: false,
            }],
        }
    }

    #[tokio::test]
    async fn donation_signs_fixed_receiver_and_amount() {
        let mut signer = MockSigner::new();
        signer
            .expect_sign_transaction()
            .withf(|groups| {
                groups.len() == 1
                    && groups[0].len() == 1
                    && groups[0][0].txn.receiver().as_str() == DONATION_RECEIVER
                    && groups[0][0].txn.amount() == DONATION_AMOUNT
                    && groups[0][0].signers.iter().map(|s| s.as_str()).eq([SENDER])
            })
            .times(1)
            .returning(|_| Ok(vec![SignedPayload(vec![9])]));

        let status = controller(confirming_node(), signer)
            .execute(ActionRequest::donate(SENDER))
            .await
            .unwrap();
        assert_eq!(
            status,
            LifecycleStatus::Completed {
                tx_id: TxId("TXID".to_string())
            }
        );
    }

    #[tokio::test]
    async fn opt_in_signs_zero_self_transfer() {
        let mut signer = MockSigner::new();
        signer
            .expect_sign_transaction()
            .withf(|groups| {
                let txn = &groups[0][0].txn;
                txn.receiver() == &txn.sender && txn.amount() == 0 && txn.asset_id() == Some(77)
            })
            .times(1)
            .returning(|_| Ok(vec![SignedPayload(vec![9])]));

        let status = controller(confirming_node(), signer)
            .execute(ActionRequest::opt_in(SENDER, 77))
            .await
            .unwrap();
        assert_eq!(status.name(), "completed");
    }

    #[tokio::test]
    async fn insufficient_balance_never_reaches_signer() {
        let mut node = MockLedgerNode::new();
        node.expect_account_information()
            .returning(|_| Ok(holding(5, 10)));
        node.expect_transaction_params().never();
        let mut signer = MockSigner::new();
        signer.expect_sign_transaction().never();

        let status = controller(node, signer)
            .execute(ActionRequest::transfer(SENDER, RECEIVER, 5, 11))
            .await
            .unwrap();
        let reason = status.failure().unwrap();
        assert_eq!(reason.kind, FailureKind::InsufficientBalance);
    }

    #[tokio::test]
    async fn balance_lookup_failure_follows_policy() {
        let lookup_fails = || {
            let mut node = MockLedgerNode::new();
            node.expect_account_information().returning(|_| {
                Err(LedgerError::Transport {
                    url: "http://node".to_string(),
                    message: "timed out".to_string(),
                })
            });
            node
        };
        let no_signer = || {
            let mut signer = MockSigner::new();
            signer.expect_sign_transaction().never();
            signer
        };

        let status = controller(lookup_fails(), no_signer())
            .execute(ActionRequest::transfer(SENDER, RECEIVER, 5, 1))
            .await
            .unwrap();
        assert_eq!(status.failure().unwrap().kind, FailureKind::InsufficientBalance);

        let surfacing = LifecycleController::new(
            Arc::new(lookup_fails()),
            Arc::new(no_signer()),
            Arc::new(ActionBoard::default()),
            LifecycleConfig {
                balance_fetch_policy: BalanceFetchPolicy::Surface,
                ..config()
            },
        );
        let status = surfacing
            .execute(ActionRequest::transfer(SENDER, RECEIVER, 5, 1))
            .await
            .unwrap();
        assert_eq!(status.failure().unwrap().kind, FailureKind::BalanceUnavailable);
    }

    #[tokio::test]
    async fn transfer_within_balance_completes() {
        let mut node = confirming_node();
        node.expect_account_information()
            .returning(|_| Ok(holding(5, 10)));

        let status = controller(node, signing_signer())
            .execute(ActionRequest::transfer(SENDER, RECEIVER, 5, 10))
            .await
            .unwrap();
        assert_eq!(status.name(), "completed");
    }

    #[tokio::test]
    async fn user_cancellation_is_tagged() {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| Ok(params()));
        node.expect_send_raw_transaction().never();
        let mut signer = MockSigner::new();
        signer
            .expect_sign_transaction()
            .returning(|_| Err(SignError::Cancelled));

        let status = controller(node, signer)
            .execute(ActionRequest::donate(SENDER))
            .await
            .unwrap();
        let reason = status.failure().unwrap();
        assert_eq!(reason.kind, FailureKind::SigningCancelled);
        assert!(reason.is_user_cancellation());
    }

    #[tokio::test]
    async fn empty_signature_set_fails_signing() {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| Ok(params()));
        node.expect_send_raw_transaction().never();
        let mut signer = MockSigner::new();
        signer.expect_sign_transaction().returning(|_| Ok(vec![]));

        let status = controller(node, signer)
            .execute(ActionRequest::donate(SENDER))
            .await
            .unwrap();
        assert_eq!(status.failure().unwrap().kind, FailureKind::SigningFailed);
    }

    #[tokio::test]
    async fn node_rejection_is_reported_verbatim() {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| Ok(params()));
        node.expect_send_raw_transaction().returning(|_| {
            Err(LedgerError::Api {
                status: 400,
                message: "TransactionPool.Remember: transaction ABC: overspend".to_string(),
            })
        });
        node.expect_status().never();

        let status = controller(node, signing_signer())
            .execute(ActionRequest::donate(SENDER))
            .await
            .unwrap();
        let reason = status.failure().unwrap();
        assert_eq!(reason.kind, FailureKind::Submission);
        assert_eq!(
            reason.message,
            "TransactionPool.Remember: transaction ABC: overspend"
        );
        assert!(reason.tx_id.is_none());
    }

    #[tokio::test]
    async fn lost_submission_response_is_not_definitive() {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| Ok(params()));
        node.expect_send_raw_transaction().times(1).returning(|_| {
            Err(LedgerError::Transport {
                url: "http://node/v2/transactions".to_string(),
                message: "operation timed out".to_string(),
            })
        });
        node.expect_status().never();

        let status = controller(node, signing_signer())
            .execute(ActionRequest::donate(SENDER))
            .await
            .unwrap();
        let reason = status.failure().unwrap();
        assert_eq!(reason.kind, FailureKind::Network);
        assert!(!reason.is_definitive());
    }

    #[tokio::test]
    async fn params_failure_is_a_network_failure() {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| {
            Err(LedgerError::Transport {
                url: "http://node".to_string(),
                message: "connection refused".to_string(),
            })
        });
        let mut signer = MockSigner::new();
        signer.expect_sign_transaction().never();

        let status = controller(node, signer)
            .execute(ActionRequest::opt_in(SENDER, 1))
            .await
            .unwrap();
        let reason = status.failure().unwrap();
        assert_eq!(reason.kind, FailureKind::Network);
        assert!(reason.is_definitive());
    }

    #[tokio::test]
    async fn validation_failure_makes_no_network_calls() {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().never();
        node.expect_account_information().never();
        let mut signer = MockSigner::new();
        signer.expect_sign_transaction().never();

        let status = controller(node, signer)
            .execute(ActionRequest::transfer(SENDER, "not-an-address", 5, 1))
            .await
            .unwrap();
        assert_eq!(status.failure().unwrap().kind, FailureKind::Validation);
    }

    #[tokio::test]
    async fn completed_widget_resets_after_delay() {
        let board = Arc::new(ActionBoard::default());
        let controller = LifecycleController::new(
            Arc::new(confirming_node()),
            Arc::new(signing_signer()),
            board.clone(),
            LifecycleConfig {
                completed_reset_ms: 20,
                ..LifecycleConfig::default()
            },
        );

        controller.execute(ActionRequest::donate(SENDER)).await.unwrap();
        assert_eq!(board.status(ActionId::Donate).name(), "completed");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(board.status(ActionId::Donate), LifecycleStatus::Idle);
    }
}

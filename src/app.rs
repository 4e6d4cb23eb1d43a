//! Wallet app: one connected wallet, one network, three actions

use crate::assets::{AssetDirectory, AssetListing};
use crate::config::{Network, Settings};
use crate::error::{ActionError, ActionResult};
use crate::ledger::LedgerNode;
use crate::lifecycle::{ActionBoard, LifecycleController, LifecycleStatus};
use crate::signer::{Signer, WalletConnector, WalletSession};
use crate::tx::{ActionId, ActionRequest, Address, AssetId};

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Composes the wallet session, a controller per network, the asset
/// directory and the shared action board
pub struct WalletApp {
    settings: Settings,
    network: Network,
    connector: Arc<dyn WalletConnector>,
    controllers: HashMap<Network, LifecycleController>,
    directory: Arc<dyn AssetDirectory>,
    board: Arc<ActionBoard>,
    session: WalletSession,
    listing: AssetListing,
}

impl WalletApp {
    pub fn new(
        settings: Settings,
        connector: Arc<dyn WalletConnector>,
        signer: Arc<dyn Signer>,
        nodes: HashMap<Network, Arc<dyn LedgerNode>>,
        directory: Arc<dyn AssetDirectory>,
        board: Arc<ActionBoard>,
    ) -> Self {
        let controllers = nodes
            .into_iter()
            .map(|(network, node)| {
                let controller = LifecycleController::new(
                    node,
                    signer.clone(),
                    board.clone(),
                    settings.lifecycle.clone(),
                );
                (network, controller)
            })
            .collect();

        Self {
            network: settings.network,
            listing: AssetListing::new(Vec::new(), settings.assets.page_size),
            settings,
            connector,
            controllers,
            directory,
            board,
            session: WalletSession::new(),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn board(&self) -> &Arc<ActionBoard> {
        &self.board
    }

    pub fn listing(&self) -> &AssetListing {
        &self.listing
    }

    pub fn listing_mut(&mut self) -> &mut AssetListing {
        &mut self.listing
    }

    pub async fn connect(&mut self) -> ActionResult<()> {
        self.session.connect(self.connector.as_ref()).await
    }

    /// Restore a previous wallet session; `false` if there was none
    pub async fn reconnect(&mut self) -> ActionResult<bool> {
        match self.session.reconnect(self.connector.as_ref()).await {
            Ok(restored) => Ok(restored),
            Err(e) => {
                // A stale session is dropped rather than kept half-open
                warn!("Reconnect failed: {}", e);
                self.session.clear();
                Ok(false)
            }
        }
    }

    pub async fn disconnect(&mut self) -> ActionResult<()> {
        self.session.disconnect(self.connector.as_ref()).await
    }

    /// Switch ledgers; the wallet session does not carry over
    pub async fn switch_network(&mut self, network: Network) -> ActionResult<()> {
        if network == self.network {
            return Ok(());
        }
        if !self.controllers.contains_key(&network) {
            return Err(ActionError::NetworkNotConfigured(network.to_string()));
        }

        if self.session.is_connected() {
            self.disconnect().await?;
        }
        info!("Switched network {} -> {}", self.network, network);
        self.network = network;
        Ok(())
    }

    pub fn select_account(&mut self, address: &str) -> ActionResult<&Address> {
        self.session.select_account(address)
    }

    /// Reload the verified asset list, keeping the selection if it is still listed
    pub async fn verified_assets(&mut self) -> ActionResult<&AssetListing> {
        let assets = self.directory.verified_assets().await?;
        let selected = self.listing.selected();

        let mut listing = AssetListing::new(assets, self.settings.assets.page_size);
        if let Some(asset_id) = selected {
            listing.select(asset_id);
        }
        self.listing = listing;
        Ok(&self.listing)
    }

    pub fn select_asset(&mut self, asset_id: AssetId) -> ActionResult<()> {
        if self.listing.select(asset_id) {
            Ok(())
        } else {
            Err(ActionError::UnknownAsset(asset_id))
        }
    }

    /// Send the fixed donation from the active account
    pub async fn donate(&self) -> ActionResult<LifecycleStatus> {
        let sender = self.sender()?;
        self.controller()?
            .execute(ActionRequest::donate(sender))
            .await
    }

    pub async fn opt_in(&self, asset_id: AssetId) -> ActionResult<LifecycleStatus> {
        let sender = self.sender()?;
        self.controller()?
            .execute(ActionRequest::opt_in(sender, asset_id))
            .await
    }

    /// Transfer `amount` base units of the selected asset to `receiver`
    pub async fn transfer(&self, receiver: &str, amount: u64) -> ActionResult<LifecycleStatus> {
        let sender = self.sender()?;
        let asset_id = self.listing.selected().ok_or(ActionError::NoAssetSelected)?;
        self.controller()?
            .execute(ActionRequest::transfer(sender, receiver, asset_id, amount))
            .await
    }

    /// Clear a finished action's status
    pub fn dismiss(&self, action: ActionId) -> ActionResult<()> {
        self.board.dismiss(action)
    }

    fn sender(&self) -> ActionResult<String> {
        self.session
            .active()
            .map(|address| address.as_str().to_string())
            .ok_or(ActionError::NotConnected)
    }

    fn controller(&self) -> ActionResult<&LifecycleController> {
        self.controllers
            .get(&self.network)
            .ok_or_else(|| ActionError::NetworkNotConfigured(self.network.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MockAssetDirectory, TrustTier, VerifiedAsset};
    use crate::config::LifecycleConfig;
    use crate::error::{DirectoryError, SignError};
    use crate::ledger::{MockLedgerNode, NodeStatus, PendingTransaction};
    use crate::signer::{MockSigner, MockWalletConnector};
    use crate::tx::{SignedPayload, SuggestedParams, TxId};

    const ALICE: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const BOB: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    fn settings() -> Settings {
        Settings {
            lifecycle: LifecycleConfig {
                completed_reset_ms: 0,
                ..LifecycleConfig::default()
            },
            ..Settings::default()
        }
    }

    fn connector(accounts: &'static [&'static str]) -> MockWalletConnector {
        let mut connector = MockWalletConnector::new();
        connector
            .expect_connect()
            .returning(move || Ok(accounts.iter().map(|a| a.to_string()).collect()));
        connector.expect_disconnect().returning(|| Ok(()));
        connector
    }

    fn node() -> MockLedgerNode {
        let mut node = MockLedgerNode::new();
        node.expect_transaction_params().returning(|| {
            Ok(SuggestedParams::from_last_round(
                10,
                0,
                1000,
                "testnet-v1.0".into(),
                "hash".into(),
            ))
        });
        node.expect_send_raw_transaction()
            .returning(|_| Ok(TxId("TX1".to_string())));
        node.expect_status()
            .returning(|| Ok(NodeStatus { last_round: 10 }));
        node.expect_pending_transaction_information().returning(|_| {
            Ok(PendingTransaction {
                confirmed_round: Some(11),
                pool_error: String::new(),
            })
        });
        node
    }

    fn directory() -> MockAssetDirectory {
        let mut directory = MockAssetDirectory::new();
        directory.expect_verified_assets().returning(|| {
            Ok(vec![VerifiedAsset {
                asset_id: Some(31566704),
                name: Some("USDC".to_string()),
                unit_name: Some("USDC".to_string()),
                logo: None,
                verification_tier: TrustTier::Trusted,
            }])
        });
        directory
    }

    fn app(connector: MockWalletConnector, signer: MockSigner) -> WalletApp {
        let testnet: Arc<dyn LedgerNode> = Arc::new(node());
        let mainnet: Arc<dyn LedgerNode> = Arc::new(node());
        let nodes = HashMap::from([(Network::TestNet, testnet), (Network::MainNet, mainnet)]);
        WalletApp::new(
            settings(),
            Arc::new(connector),
            Arc::new(signer),
            nodes,
            Arc::new(directory()),
            Arc::new(ActionBoard::default()),
        )
    }

    fn signer() -> MockSigner {
        let mut signer = MockSigner::new();
        signer
            .expect_sign_transaction()
            .returning(|_| Ok(vec![SignedPayload(vec![1])]));
        signer
    }

    #[tokio::test]
    async fn actions_need_an_active_account() {
        let mut signer = MockSigner::new();
        signer.expect_sign_transaction().never();
        let app = app(connector(&[ALICE]), signer);

        assert!(matches!(app.donate().await, Err(ActionError::NotConnected)));
        assert!(matches!(app.opt_in(1).await, Err(ActionError::NotConnected)));
    }

    #[tokio::test]
    async fn single_account_donates_after_connect() {
        let mut app = app(connector(&[ALICE]), signer());
        app.connect().await.unwrap();
        assert_eq!(app.session().active().unwrap().as_str(), ALICE);

        let status = app.donate().await.unwrap();
        assert_eq!(status.name(), "completed");
        assert_eq!(app.board().status(ActionId::Donate).name(), "completed");

        app.dismiss(ActionId::Donate).unwrap();
        assert_eq!(app.board().status(ActionId::Donate), LifecycleStatus::Idle);
    }

    #[tokio::test]
    async fn several_accounts_require_selection() {
        let mut app = app(connector(&[ALICE, BOB]), signer());
        app.connect().await.unwrap();
        assert!(matches!(app.donate().await, Err(ActionError::NotConnected)));

        app.select_account(BOB).unwrap();
        assert_eq!(app.session().active().unwrap().as_str(), BOB);
        assert!(app.donate().await.is_ok());
    }

    #[tokio::test]
    async fn transfer_uses_selected_asset() {
        let mut app = app(connector(&[ALICE]), signer());
        app.connect().await.unwrap();

        assert!(matches!(
            app.transfer(BOB, 1).await,
            Err(ActionError::NoAssetSelected)
        ));

        app.verified_assets().await.unwrap();
        assert!(matches!(
            app.select_asset(42),
            Err(ActionError::UnknownAsset(42))
        ));
        app.select_asset(31566704).unwrap();
        assert_eq!(app.listing().selected(), Some(31566704));
    }

    #[tokio::test]
    async fn switching_network_disconnects() {
        let mut app = app(connector(&[ALICE]), signer());
        app.connect().await.unwrap();
        assert_eq!(app.network(), Network::TestNet);

        app.switch_network(Network::MainNet).await.unwrap();
        assert_eq!(app.network(), Network::MainNet);
        assert!(!app.session().is_connected());
        assert!(matches!(app.donate().await, Err(ActionError::NotConnected)));
    }

    #[tokio::test]
    async fn failed_reconnect_leaves_session_empty() {
        let mut connector = MockWalletConnector::new();
        connector
            .expect_reconnect_session()
            .returning(|| Err(SignError::Connector("session expired".to_string())));

        let mut app = app(connector, MockSigner::new());
        assert!(!app.reconnect().await.unwrap());
        assert!(!app.session().is_connected());
    }

    #[tokio::test]
    async fn directory_failure_is_reported() {
        let mut failing = MockAssetDirectory::new();
        failing.expect_verified_assets().returning(|| {
            Err(DirectoryError::Unavailable {
                message: "HTTP error! status: 500".to_string(),
            })
        });
        let mut app = WalletApp::new(
            settings(),
            Arc::new(connector(&[ALICE])),
            Arc::new(MockSigner::new()),
            HashMap::new(),
            Arc::new(failing),
            Arc::new(ActionBoard::default()),
        );

        let err = app.verified_assets().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load verified assets");
    }
}

//! Accounts exposed by the connected wallet

use super::WalletConnector;
use crate::error::{ActionError, ActionResult};
use crate::tx::Address;

use serde::Serialize;
use tracing::{info, warn};

/// Accounts of the connected wallet and the one actions are sent from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    accounts: Vec<Address>,
    active: Option<Address>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect through the wallet; a single account becomes active right away
    pub async fn connect(&mut self, connector: &dyn WalletConnector) -> ActionResult<()> {
        let raw = connector.connect().await?;
        self.accounts = parse_accounts(raw);
        self.active = match self.accounts.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        info!(
            "Wallet connected with {} account(s){}",
            self.accounts.len(),
            self.active
                .as_ref()
                .map(|a| format!(", active {}", a.short()))
                .unwrap_or_default()
        );
        Ok(())
    }

    /// Restore a previous session; the first account becomes active
    pub async fn reconnect(&mut self, connector: &dyn WalletConnector) -> ActionResult<bool> {
        let raw = connector.reconnect_session().await?;
        let accounts = parse_accounts(raw);
        if accounts.is_empty() {
            return Ok(false);
        }
        self.active = accounts.first().cloned();
        self.accounts = accounts;
        info!("Wallet session restored with {} account(s)", self.accounts.len());
        Ok(true)
    }

    pub async fn disconnect(&mut self, connector: &dyn WalletConnector) -> ActionResult<()> {
        self.clear();
        connector.disconnect().await?;
        info!("Wallet disconnected");
        Ok(())
    }

    /// Drop local session state, e.g. when the connector reports a disconnect
    pub fn clear(&mut self) {
        self.accounts.clear();
        self.active = None;
    }

    /// Make one of the session's accounts active
    pub fn select_account(&mut self, address: &str) -> ActionResult<&Address> {
        let chosen = self
            .accounts
            .iter()
            .find(|a| a.as_str() == address)
            .cloned()
            .ok_or_else(|| ActionError::UnknownAccount(address.to_string()))?;
        info!("Active account switched to {}", chosen.short());
        let active = self.active.insert(chosen);
        Ok(&*active)
    }

    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn active(&self) -> Option<&Address> {
        self.active.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        !self.accounts.is_empty()
    }

    /// Several accounts to choose from
    pub fn can_switch_account(&self) -> bool {
        self.accounts.len() > 1
    }
}

fn parse_accounts(raw: Vec<String>) -> Vec<Address> {
    raw.into_iter()
        .filter_map(|account| match Address::parse(&account) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!("Ignoring wallet account: {}", e);
                None
            }
        })
        .collect()
}

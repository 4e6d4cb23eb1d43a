//! User action requests

use super::descriptor::AssetId;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Receiver of every donation
pub const DONATION_RECEIVER: &str = "Y4532MAF7R46EHON24GMDKPZAD4RK7B3QYQ22KXAVZMPXYL7YF475E2CIU";

/// One unit of the native currency, in micro-units
pub const DONATION_AMOUNT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Donate,
    OptIn,
    Transfer,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Donate => "donate",
            ActionKind::OptIn => "opt_in",
            ActionKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the widget an action runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "asset_id", rename_all = "snake_case")]
pub enum ActionId {
    Donate,
    OptIn(AssetId),
    Transfer(AssetId),
}

impl ActionId {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionId::Donate => ActionKind::Donate,
            ActionId::OptIn(_) => ActionKind::OptIn,
            ActionId::Transfer(_) => ActionKind::Transfer,
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::Donate => write!(f, "donate"),
            ActionId::OptIn(asset_id) => write!(f, "opt_in:{}", asset_id),
            ActionId::Transfer(asset_id) => write!(f, "transfer:{}", asset_id),
        }
    }
}

/// Raw user input for one action, validated by the lifecycle controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub sender: String,
    pub receiver: Option<String>,
    pub asset_id: Option<AssetId>,
    /// Smallest unit of the native currency or asset
    pub amount: u64,
}

impl ActionRequest {
    /// Donation of the fixed amount to the fixed receiver
    pub fn donate(sender: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Donate,
            sender: sender.into(),
            receiver: None,
            asset_id: None,
            amount: DONATION_AMOUNT,
        }
    }

    pub fn opt_in(sender: impl Into<String>, asset_id: AssetId) -> Self {
        Self {
            kind: ActionKind::OptIn,
            sender: sender.into(),
            receiver: None,
            asset_id: Some(asset_id),
            amount: 0,
        }
    }

    pub fn transfer(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        asset_id: AssetId,
        amount: u64,
    ) -> Self {
        Self {
            kind: ActionKind::Transfer,
            sender: sender.into(),
            receiver: Some(receiver.into()),
            asset_id: Some(asset_id),
            amount,
        }
    }

    /// Board key for this request; asset actions without an asset share id 0
    pub fn action_id(&self) -> ActionId {
        match self.kind {
            ActionKind::Donate => ActionId::Donate,
            ActionKind::OptIn => ActionId::OptIn(self.asset_id.unwrap_or_default()),
            ActionKind::Transfer => ActionId::Transfer(self.asset_id.unwrap_or_default()),
        }
    }
}

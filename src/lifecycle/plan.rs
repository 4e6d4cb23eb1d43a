//! Input validation and descriptor construction for each action kind

use super::status::FailureReason;
use crate::tx::{
    ActionKind, ActionRequest, Address, AssetId, SuggestedParams, TransactionDescriptor,
    DONATION_AMOUNT, DONATION_RECEIVER,
};

/// A request whose inputs passed the offline checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPlan {
    Donate {
        sender: Address,
        receiver: Address,
    },
    OptIn {
        sender: Address,
        asset_id: AssetId,
    },
    Transfer {
        sender: Address,
        receiver: Address,
        asset_id: AssetId,
        amount: u64,
    },
}

impl ActionPlan {
    /// Check addresses, amount and asset before anything touches the network.
    /// Donations ignore the request's receiver and amount.
    pub fn from_request(request: &ActionRequest) -> Result<Self, FailureReason> {
        let sender = Address::parse(&request.sender)
            .map_err(|_| FailureReason::validation("Invalid sender address"))?;

        match request.kind {
            ActionKind::Donate => {
                let receiver = Address::parse(DONATION_RECEIVER)
                    .map_err(|_| FailureReason::validation("Invalid donation receiver"))?;
                Ok(ActionPlan::Donate { sender, receiver })
            }
            ActionKind::OptIn => {
                let asset_id = require_asset(request.asset_id)?;
                if request.amount != 0 {
                    return Err(FailureReason::validation("Opt-in amount must be 0"));
                }
                Ok(ActionPlan::OptIn { sender, asset_id })
            }
            ActionKind::Transfer => {
                let (receiver, asset_id) = match (&request.receiver, request.asset_id) {
                    (Some(receiver), Some(asset_id))
                        if !receiver.trim().is_empty() && asset_id != 0 =>
                    {
                        (receiver, asset_id)
                    }
                    _ => return Err(FailureReason::validation("Please fill in all fields")),
                };
                let receiver = Address::parse(receiver)
                    .map_err(|_| FailureReason::validation("Invalid receiver address"))?;
                if request.amount == 0 {
                    return Err(FailureReason::validation("Amount must be greater than 0"));
                }
                Ok(ActionPlan::Transfer {
                    sender,
                    receiver,
                    asset_id,
                    amount: request.amount,
                })
            }
        }
    }

    pub fn sender(&self) -> &Address {
        match self {
            ActionPlan::Donate { sender, .. } => sender,
            ActionPlan::OptIn { sender, .. } => sender,
            ActionPlan::Transfer { sender, .. } => sender,
        }
    }

    /// The unsigned descriptor for this plan
    pub fn descriptor(&self, params: SuggestedParams) -> TransactionDescriptor {
        match self {
            ActionPlan::Donate { sender, receiver } => TransactionDescriptor::payment(
                sender.clone(),
                receiver.clone(),
                DONATION_AMOUNT,
                params,
            ),
            ActionPlan::OptIn { sender, asset_id } => {
                TransactionDescriptor::opt_in(sender.clone(), *asset_id, params)
            }
            ActionPlan::Transfer {
                sender,
                receiver,
                asset_id,
                amount,
            } => TransactionDescriptor::asset_transfer(
                sender.clone(),
                receiver.clone(),
                *asset_id,
                *amount,
                params,
            ),
        }
    }
}

fn require_asset(asset_id: Option<AssetId>) -> Result<AssetId, FailureReason> {
    match asset_id {
        Some(id) if id != 0 => Ok(id),
        _ => Err(FailureReason::validation("An asset must be selected")),
    }
}

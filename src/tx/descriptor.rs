//! Unsigned transaction descriptors and the signing group handed to the wallet

use super::address::Address;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger asset identifier
pub type AssetId = u64;

/// Rounds a descriptor stays valid after the node's last round
pub const VALIDITY_WINDOW: u64 = 1000;

/// Network parameters a descriptor must carry to be accepted by the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    /// Fee per byte, or the flat fee when `flat_fee` is set
    pub fee: u64,
    pub min_fee: u64,
    pub flat_fee: bool,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: String,
}

impl SuggestedParams {
    /// Params valid from the node's last round for the standard window
    pub fn from_last_round(
        last_round: u64,
        fee: u64,
        min_fee: u64,
        genesis_id: String,
        genesis_hash: String,
    ) -> Self {
        Self {
            fee,
            min_fee,
            flat_fee: false,
            first_valid: last_round,
            last_valid: last_round.saturating_add(VALIDITY_WINDOW),
            genesis_id,
            genesis_hash,
        }
    }
}

/// What a descriptor moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DescriptorBody {
    /// Native currency payment
    Pay { receiver: Address, amount: u64 },
    /// Asset transfer; a zero-amount self transfer is an opt-in
    Axfer {
        receiver: Address,
        asset_id: AssetId,
        amount: u64,
    },
}

/// An unsigned record describing one proposed ledger state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescriptor {
    pub sender: Address,
    #[serde(flatten)]
    pub body: DescriptorBody,
    pub params: SuggestedParams,
}

impl TransactionDescriptor {
    /// Native currency payment
    pub fn payment(
        sender: Address,
        receiver: Address,
        amount: u64,
        params: SuggestedParams,
    ) -> Self {
        Self {
            sender,
            body: DescriptorBody::Pay { receiver, amount },
            params,
        }
    }

    /// Asset transfer from sender to receiver
    pub fn asset_transfer(
        sender: Address,
        receiver: Address,
        asset_id: AssetId,
        amount: u64,
        params: SuggestedParams,
    ) -> Self {
        Self {
            sender,
            body: DescriptorBody::Axfer {
                receiver,
                asset_id,
                amount,
            },
            params,
        }
    }

    /// Zero-amount self transfer registering the sender as a holder of the asset
    pub fn opt_in(sender: Address, asset_id: AssetId, params: SuggestedParams) -> Self {
        let receiver = sender.clone();
        Self::asset_transfer(sender, receiver, asset_id, 0, params)
    }

    pub fn receiver(&self) -> &Address {
        match &self.body {
            DescriptorBody::Pay { receiver, .. } => receiver,
            DescriptorBody::Axfer { receiver, .. } => receiver,
        }
    }

    pub fn amount(&self) -> u64 {
        match &self.body {
            DescriptorBody::Pay { amount, .. } => *amount,
            DescriptorBody::Axfer { amount, .. } => *amount,
        }
    }

    pub fn asset_id(&self) -> Option<AssetId> {
        match &self.body {
            DescriptorBody::Pay { .. } => None,
            DescriptorBody::Axfer { asset_id, .. } => Some(*asset_id),
        }
    }
}

/// One descriptor and the addresses expected to sign it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerTransaction {
    pub txn: TransactionDescriptor,
    pub signers: Vec<Address>,
}

/// Descriptors the ledger applies all or none of
pub type TransactionGroup = Vec<SignerTransaction>;

/// Wrap a single descriptor into its own atomic group, signed by its sender
pub fn single_group(txn: TransactionDescriptor) -> TransactionGroup {
    let signers = vec![txn.sender.clone()];
    vec![SignerTransaction { txn, signers }]
}

/// Opaque signed bytes returned by the signer
#[derive(Clone, PartialEq, Eq)]
pub struct SignedPayload(pub Vec<u8>);

impl SignedPayload {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SignedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignedPayload({} bytes)", self.0.len())
    }
}

/// Submission identifier assigned by the ledger node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

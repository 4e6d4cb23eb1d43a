//! Transaction inputs: addresses, action requests and unsigned descriptors

mod address;
mod descriptor;
mod request;

pub use address::Address;
pub use descriptor::{
    single_group, AssetId, DescriptorBody, SignedPayload, SignerTransaction, SuggestedParams,
    TransactionDescriptor, TransactionGroup, TxId, VALIDITY_WINDOW,
};
pub use request::{ActionId, ActionKind, ActionRequest, DONATION_AMOUNT, DONATION_RECEIVER};

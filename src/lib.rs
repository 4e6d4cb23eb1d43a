//! Wallet actions: donations, asset opt-ins and asset transfers
//!
//! Each action is validated, built into an unsigned descriptor, handed to an
//! external signer, submitted to a ledger node and watched for a bounded
//! number of rounds. Progress is published per action on an [`ActionBoard`].

pub mod api;
pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod metrics;
pub mod signer;
pub mod tx;

pub use app::WalletApp;
pub use config::{BalanceFetchPolicy, Network, Settings};
pub use error::{ActionError, ActionResult};
pub use lifecycle::{
    ActionBoard, FailureKind, FailureReason, LifecycleController, LifecycleStatus, TransitionEvent,
};
pub use tx::{ActionId, ActionKind, ActionRequest};

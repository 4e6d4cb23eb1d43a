//! Transaction lifecycle for wallet actions
//!
//! Every action goes through the same steps:
//! 1. Validate the request offline (plus an advisory balance read for transfers)
//! 2. Build one unsigned descriptor from fresh network parameters
//! 3. Hand it to the signer as a single atomic group
//! 4. Submit the signed payload to the ledger node
//! 5. Wait, for a bounded number of rounds, until it is confirmed

pub mod board;
pub mod controller;
pub mod plan;
pub mod status;

pub use board::{ActionBoard, ActionSnapshot, TransitionEvent};
pub use controller::LifecycleController;
pub use plan::ActionPlan;
pub use status::{FailureKind, FailureReason, LifecycleStatus};

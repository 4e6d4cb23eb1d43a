//! Per-widget lifecycle state, keyed by action id
//!
//! Every change goes through a discrete transition that is published on a
//! broadcast channel, so a UI can render each step even if it polls late.

use super::status::LifecycleStatus;
use crate::error::{ActionError, ActionResult};
use crate::tx::ActionId;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// One status change of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    pub action: ActionId,
    /// Execution attempt that caused the change
    pub attempt: Uuid,
    pub from: LifecycleStatus,
    pub to: LifecycleStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BoardEntry {
    status: LifecycleStatus,
    attempt: Uuid,
}

/// Current status of one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSnapshot {
    pub action: ActionId,
    pub status: LifecycleStatus,
}

/// Lifecycle status of every action widget
pub struct ActionBoard {
    /// Actions that are not idle
    entries: DashMap<ActionId, BoardEntry>,
    events: broadcast::Sender<TransitionEvent>,
}

impl ActionBoard {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        Self {
            entries: DashMap::new(),
            events,
        }
    }

    /// Subscribe to transition events of all actions
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events.subscribe()
    }

    pub fn status(&self, action: ActionId) -> LifecycleStatus {
        self.entries
            .get(&action)
            .map(|e| e.status.clone())
            .unwrap_or_default()
    }

    /// Start a new attempt; refused while the previous one is in flight
    pub fn begin(&self, action: ActionId) -> ActionResult<Uuid> {
        let attempt = Uuid::new_v4();

        match self.entries.entry(action) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().status.is_in_flight() {
                    return Err(ActionError::Busy {
                        action: action.to_string(),
                    });
                }
                let from = std::mem::replace(
                    occupied.get_mut(),
                    BoardEntry {
                        status: LifecycleStatus::Validating,
                        attempt,
                    },
                )
                .status;
                self.publish(action, attempt, from, LifecycleStatus::Validating);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(BoardEntry {
                    status: LifecycleStatus::Validating,
                    attempt,
                });
                self.publish(
                    action,
                    attempt,
                    LifecycleStatus::Idle,
                    LifecycleStatus::Validating,
                );
            }
        }

        Ok(attempt)
    }

    /// Move an attempt to its next status; ignored if a newer attempt owns the action
    pub fn transition(&self, action: ActionId, attempt: Uuid, to: LifecycleStatus) -> bool {
        let Some(mut entry) = self.entries.get_mut(&action) else {
            return false;
        };
        if entry.attempt != attempt {
            return false;
        }

        let from = std::mem::replace(&mut entry.status, to.clone());
        self.publish(action, attempt, from, to);
        true
    }

    /// Return a widget to idle; refused while its action is in flight
    pub fn dismiss(&self, action: ActionId) -> ActionResult<()> {
        match self.entries.entry(action) {
            Entry::Occupied(occupied) => {
                if occupied.get().status.is_in_flight() {
                    return Err(ActionError::Busy {
                        action: action.to_string(),
                    });
                }
                let removed = occupied.remove();
                self.publish(action, removed.attempt, removed.status, LifecycleStatus::Idle);
                Ok(())
            }
            Entry::Vacant(_) => Ok(()),
        }
    }

    /// Return a completed attempt to idle if nothing happened since
    pub fn reset_completed(&self, action: ActionId, attempt: Uuid) -> bool {
        let removed = self.entries.remove_if(&action, |_, entry| {
            entry.attempt == attempt && matches!(entry.status, LifecycleStatus::Completed { .. })
        });

        match removed {
            Some((_, entry)) => {
                self.publish(action, attempt, entry.status, LifecycleStatus::Idle);
                true
            }
            None => false,
        }
    }

    /// All non-idle actions, ordered by id
    pub fn snapshot(&self) -> Vec<ActionSnapshot> {
        let mut actions: Vec<_> = self
            .entries
            .iter()
            .map(|e| ActionSnapshot {
                action: *e.key(),
                status: e.value().status.clone(),
            })
            .collect();
        actions.sort_by_key(|a| a.action);
        actions
    }

    pub fn in_flight_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.value().status.is_in_flight())
            .count()
    }

    fn publish(&self, action: ActionId, attempt: Uuid, from: LifecycleStatus, to: LifecycleStatus) {
        debug!("Action {} {} -> {}", action, from.name(), to.name());

        let event = TransitionEvent {
            action,
            attempt,
            from,
            to,
            at: Utc::now(),
        };
        // Err only means nobody is subscribed
        let _ = self.events.send(event);
    }
}

impl Default for ActionBoard {
    fn default() -> Self {
        Self::new(1024)
    }
}

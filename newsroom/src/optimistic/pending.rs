//! Pending mutations and the in-flight registry
//!
//! A [`PendingMutation`] lives from the moment an action is dispatched until
//! the collaborator answers. It carries the predicted state and the state
//! at dispatch. On failure [`Revert`] undoes only that mutation's own change,
//! so confirmed changes that landed on the same view meanwhile survive.
//!
//! [`InFlight`] enforces at most one outstanding mutation per
//! `(entity, kind)` pair. Acquiring a slot returns an [`InFlightGuard`];
//! the slot is freed when the guard drops, including when the future that
//! owns it is dropped before the collaborator answers.

use crate::types::{CommentThread, FeaturedBoard, LikeState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Kind of user-visible mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Like,
    Comment,
    Feature,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Like => f.write_str("like"),
            MutationKind::Comment => f.write_str("comment"),
            MutationKind::Feature => f.write_str("feature"),
        }
    }
}

/// A dispatched action awaiting its collaborator result
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation<S> {
    pub kind: MutationKind,
    pub entity_id: String,
    /// State shown while the call is outstanding
    pub predicted: S,
    /// State the view showed at dispatch
    pub rollback: S,
}

/// Undo a failed mutation on the state a view shows now
pub trait Revert: Clone {
    fn revert(&mut self, pending: &PendingMutation<Self>);
}

impl Revert for LikeState {
    // A like view holds one article, so the snapshot is exact
    fn revert(&mut self, pending: &PendingMutation<Self>) {
        *self = pending.rollback.clone();
    }
}

impl Revert for CommentThread {
    /// Drop the temporary comments the prediction added
    fn revert(&mut self, pending: &PendingMutation<Self>) {
        let added = pending
            .predicted
            .comments
            .iter()
            .filter(|c| c.id.is_temporary() && pending.rollback.get(&c.id).is_none());
        for comment in added {
            self.remove(&comment.id);
        }
    }
}

impl Revert for FeaturedBoard {
    /// Put the target's flag back; other flags are left as they are now
    fn revert(&mut self, pending: &PendingMutation<Self>) {
        if let Some(featured) = pending.rollback.is_featured(&pending.entity_id) {
            self.set(&pending.entity_id, featured);
        }
    }
}

type SlotKey = (String, MutationKind);

/// Registry of outstanding `(entity, kind)` pairs
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    slots: Arc<Mutex<HashSet<SlotKey>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `(entity_id, kind)`.
    ///
    /// Returns `None` while another mutation holds it.
    pub fn try_acquire(&self, entity_id: &str, kind: MutationKind) -> Option<InFlightGuard> {
        let key = (entity_id.to_string(), kind);
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !slots.insert(key.clone()) {
            debug!(entity = entity_id, %kind, "Mutation already in flight");
            return None;
        }
        Some(InFlightGuard {
            slots: Arc::clone(&self.slots),
            key,
        })
    }

    pub fn is_pending(&self, entity_id: &str, kind: MutationKind) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.contains(&(entity_id.to_string(), kind)))
            .unwrap_or(false)
    }

    /// Number of outstanding mutations
    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds one in-flight slot; releases it on drop
#[derive(Debug)]
pub struct InFlightGuard {
    slots: Arc<Mutex<HashSet<SlotKey>>>,
    key: SlotKey,
}

impl InFlightGuard {
    pub fn kind(&self) -> MutationKind {
        self.key.1
    }

    pub fn entity_id(&self) -> &str {
        &self.key.0
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut slots = match self.slots.lock() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots.remove(&self.key);
    }
}

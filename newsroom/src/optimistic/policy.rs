//! Reconciliation policy
//!
//! Decides, per mutation kind, how the view recovers the truth after the
//! collaborator confirms a mutation:
//!
//! | Kind    | On success                                               |
//! |---------|----------------------------------------------------------|
//! | Like    | keep the prediction; re-fetch only to serve a pending   |
//! |         | refresh request or when the answer disagrees             |
//! | Comment | swap the temporary comment for the returned record      |
//! | Feature | always re-fetch the featured flags of every article      |
//!
//! Failures are not a policy decision: the controller always rolls back.

use crate::backend::LikeToggled;
use crate::error::{NewsError, Result};
use crate::types::{FeaturedBoard, LikeState};
use serde::{Deserialize, Serialize};

/// What to do with a confirmed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// The predicted state is final
    KeepPredicted,
    /// Replace the temporary identity with the authoritative record, in place
    ReplaceIdentity,
    /// Replace the predicted state with an authoritative read
    Refetch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationPolicy {
    /// Re-fetch likes when the collaborator's `liked` differs from the prediction
    #[serde(default = "default_true")]
    pub refetch_on_like_divergence: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            refetch_on_like_divergence: true,
        }
    }
}

impl ReconciliationPolicy {
    /// Like toggles move the count by one, so the prediction is trusted.
    ///
    /// `refresh_pending` is true when someone asked for a re-fetch while the
    /// toggle was outstanding; that request is served here instead of
    /// issuing a second read.
    pub fn like(
        &self,
        predicted: &LikeState,
        result: LikeToggled,
        refresh_pending: bool,
    ) -> Reconciliation {
        if refresh_pending {
            return Reconciliation::Refetch;
        }
        if self.refetch_on_like_divergence && result.liked != predicted.viewer_has_liked {
            return Reconciliation::Refetch;
        }
        Reconciliation::KeepPredicted
    }

    pub fn comment(&self) -> Reconciliation {
        Reconciliation::ReplaceIdentity
    }

    /// Which other article lost the flag is only known remotely
    pub fn feature(&self) -> Reconciliation {
        Reconciliation::Refetch
    }
}

/// Check the at-most-one-featured rule on an authoritative board.
///
/// A violation is reported, never repaired: the rule belongs to the
/// collaborator.
pub fn check_featured(board: &FeaturedBoard) -> Result<()> {
    let featured = board.featured_ids();
    if featured.len() > 1 {
        return Err(NewsError::InvariantViolation(format!(
            "{} articles featured: {}",
            featured.len(),
            featured.join(", ")
        )));
    }
    Ok(())
}

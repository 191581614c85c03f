//! Optimistic mutation with server reconciliation
//!
//! Likes, comments and the featured flag all update the view before the
//! collaborator answers:
//!
//! ```text
//! action ──► predict ──► view shows prediction ──► MutationClient call
//!                                                     │
//!                       ┌─────────────────────────────┴──────────────┐
//!                    success                                       failure
//!                       │                                             │
//!           ReconciliationPolicy decides:                   revert this mutation,
//!           keep / replace identity / re-fetch              raise a notice
//! ```
//!
//! - [`predict`]: pure functions producing a [`PendingMutation`]
//! - [`ReconciliationPolicy`]: per-kind truth recovery
//! - [`InFlight`]: one outstanding mutation per `(entity, kind)`
//! - [`ViewState`]: the state cell a view owns
//! - [`OptimisticController`]: ties them to a [`SocialBackend`](crate::backend::SocialBackend)

mod controller;
mod pending;
mod policy;
pub mod predict;
mod view;

pub use controller::{OptimisticController, Outcome};
pub use pending::{InFlight, InFlightGuard, MutationKind, PendingMutation, Revert};
pub use policy::{check_featured, Reconciliation, ReconciliationPolicy};
pub use view::{Notice, ViewState};

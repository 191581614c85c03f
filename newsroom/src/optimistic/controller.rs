//! Optimistic state controller
//!
//! Applies the predicted state to a view as soon as an action is dispatched,
//! then reconciles with the collaborator's answer or rolls back.
//!
//! Flow for every optimistic action:
//!
//! 1. Local checks (text, viewer). Failures raise an `Invalid` notice and
//!    return before any state changes or network I/O.
//! 2. Claim the `(entity, kind)` slot. If it is taken the action is
//!    ignored and the view is untouched.
//! 3. Show the prediction, call the collaborator.
//! 4. Success: apply the [`ReconciliationPolicy`] decision.
//!    Failure: revert this mutation's own change and raise a notice.

use super::pending::{InFlight, MutationKind, PendingMutation, Revert};
use super::policy::{check_featured, Reconciliation, ReconciliationPolicy};
use super::predict;
use super::view::ViewState;
use crate::backend::SocialBackend;
use crate::error::{NewsError, Result};
use crate::types::{CommentId, CommentThread, FeaturedBoard, LikeState, ViewerActivity};
use crate::viewer::Viewer;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// How a dispatched action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The collaborator confirmed; the prediction (or identity swap) is final
    Confirmed,
    /// The collaborator confirmed and the view now shows an authoritative read
    Refetched,
    /// Dropped because the same kind of mutation is already in flight
    Ignored,
}

pub struct OptimisticController<B: SocialBackend + ?Sized> {
    backend: Arc<B>,
    viewer: Option<Viewer>,
    policy: ReconciliationPolicy,
    in_flight: InFlight,
    /// Articles with a like re-fetch waiting on an outstanding toggle
    refresh_requested: Mutex<HashSet<String>>,
    /// Kept in step with every confirmed like, comment and delete
    activity: Option<Arc<ViewState<ViewerActivity>>>,
}

impl<B: SocialBackend + ?Sized> OptimisticController<B> {
    /// `viewer` is `None` for anonymous visitors
    pub fn new(backend: Arc<B>, viewer: Option<Viewer>) -> Self {
        Self {
            backend,
            viewer,
            policy: ReconciliationPolicy::default(),
            in_flight: InFlight::new(),
            refresh_requested: Mutex::new(HashSet::new()),
            activity: None,
        }
    }

    pub fn with_policy(mut self, policy: ReconciliationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Track the viewer's likes and comments in `activity`
    pub fn with_activity(mut self, activity: Arc<ViewState<ViewerActivity>>) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn activity(&self) -> Option<&ViewState<ViewerActivity>> {
        self.activity.as_deref()
    }

    fn track(&self, f: impl FnOnce(&mut ViewerActivity)) {
        if let Some(activity) = &self.activity {
            activity.update(f);
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    fn require_viewer<S: Clone>(&self, view: &ViewState<S>) -> Result<&Viewer> {
        match self.viewer.as_ref() {
            Some(viewer) => Ok(viewer),
            None => {
                let err = NewsError::MissingViewer;
                view.raise_for(&err);
                Err(err)
            }
        }
    }

    fn roll_back<S: Revert>(
        &self,
        view: &ViewState<S>,
        pending: PendingMutation<S>,
        err: NewsError,
    ) -> NewsError {
        warn!(
            kind = %pending.kind,
            entity = %pending.entity_id,
            error = %err,
            "Mutation failed, rolling back"
        );
        view.update(|state| state.revert(&pending));
        view.raise_for(&err);
        err
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Toggle the viewer's like on the view's article
    pub async fn toggle_like(&self, view: &ViewState<LikeState>) -> Result<Outcome> {
        let viewer = self.require_viewer(view)?;
        let current = view.get();

        let Some(_slot) = self.in_flight.try_acquire(&current.article_id, MutationKind::Like) else {
            return Ok(Outcome::Ignored);
        };

        let pending = predict::like(&current);
        view.set(pending.predicted.clone());
        view.dismiss();
        debug!(
            article_id = %pending.entity_id,
            liked = pending.predicted.viewer_has_liked,
            count = pending.predicted.like_count,
            "Like predicted"
        );

        let answer = self.backend.toggle_like(&viewer.id, &pending.entity_id).await;
        // A refresh requested during the call is served by this reconciliation, or dropped with it
        let refresh = self.take_refresh(&pending.entity_id);
        let result = match answer {
            Ok(result) => result,
            Err(err) => return Err(self.roll_back(view, pending, err)),
        };
        self.track(|activity| activity.record_like(&pending.entity_id, result.liked));

        match self.policy.like(&pending.predicted, result, refresh) {
            Reconciliation::Refetch => match self.load_likes(view).await {
                Ok(()) => {
                    info!(article_id = %pending.entity_id, "Like confirmed, counts re-fetched");
                    Ok(Outcome::Refetched)
                }
                Err(err) => {
                    warn!(
                        article_id = %pending.entity_id,
                        error = %err,
                        "Like re-fetch failed, keeping prediction"
                    );
                    Ok(Outcome::Confirmed)
                }
            },
            _ => {
                info!(article_id = %pending.entity_id, liked = result.liked, "Like confirmed");
                Ok(Outcome::Confirmed)
            }
        }
    }

    /// Ask for an authoritative like re-fetch.
    ///
    /// While a toggle is outstanding the request is recorded and served by
    /// that toggle's reconciliation; otherwise the read happens now.
    pub async fn request_like_refresh(&self, view: &ViewState<LikeState>) -> Result<Outcome> {
        let article_id = view.get().article_id;
        if self.in_flight.is_pending(&article_id, MutationKind::Like) {
            if let Ok(mut requested) = self.refresh_requested.lock() {
                requested.insert(article_id.clone());
            }
            debug!(article_id = %article_id, "Like refresh deferred to outstanding toggle");
            return Ok(Outcome::Ignored);
        }
        self.load_likes(view).await?;
        Ok(Outcome::Refetched)
    }

    fn take_refresh(&self, article_id: &str) -> bool {
        self.refresh_requested
            .lock()
            .map(|mut requested| requested.remove(article_id))
            .unwrap_or(false)
    }

    /// Replace the view with the authoritative count and, for a signed-in
    /// viewer, whether they have liked
    pub async fn load_likes(&self, view: &ViewState<LikeState>) -> Result<()> {
        let article_id = view.get().article_id;
        let like_count = self.backend.like_count(&article_id).await?;
        let viewer_has_liked = match &self.viewer {
            Some(viewer) => self.backend.has_liked(&viewer.id, &article_id).await?,
            None => false,
        };
        view.set(LikeState {
            article_id,
            viewer_has_liked,
            like_count,
        });
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Post a comment, showing it at the top of the thread right away
    pub async fn submit_comment(
        &self,
        view: &ViewState<CommentThread>,
        text: &str,
    ) -> Result<Outcome> {
        let text = match predict::comment_text(text) {
            Ok(text) => text,
            Err(err) => {
                view.raise_for(&err);
                return Err(err);
            }
        };
        let viewer = self.require_viewer(view)?;
        let current = view.get();

        let Some(_slot) = self
            .in_flight
            .try_acquire(&current.article_id, MutationKind::Comment)
        else {
            return Ok(Outcome::Ignored);
        };

        let temp_id = CommentId::temporary();
        let pending = predict::comment(&current, viewer, text, temp_id.clone());
        view.set(pending.predicted.clone());
        view.dismiss();
        debug!(article_id = %pending.entity_id, temp_id = %temp_id, "Comment predicted");

        let confirmed = match self.backend.submit_comment(viewer, &pending.entity_id, text).await {
            Ok(comment) => comment,
            Err(err) => return Err(self.roll_back(view, pending, err)),
        };

        info!(article_id = %pending.entity_id, comment_id = %confirmed.id, "Comment confirmed");
        self.track(|activity| activity.record_comment(confirmed.clone()));
        match self.policy.comment() {
            Reconciliation::Refetch => {
                self.load_comments(view).await?;
                Ok(Outcome::Refetched)
            }
            Reconciliation::KeepPredicted => Ok(Outcome::Confirmed),
            Reconciliation::ReplaceIdentity => {
                view.update(|thread| {
                    if thread.get(&confirmed.id).is_some() {
                        // A reload already brought the stored record in
                        thread.remove(&temp_id);
                    } else if !thread.replace(&temp_id, confirmed.clone()) {
                        thread.prepend(confirmed);
                    }
                });
                Ok(Outcome::Confirmed)
            }
        }
    }

    /// Delete one of the viewer's comments.
    ///
    /// Not optimistic: the comment leaves the list only once the
    /// collaborator confirms, so a refusal leaves the list as it was.
    pub async fn delete_comment(
        &self,
        view: &ViewState<CommentThread>,
        comment_id: &CommentId,
    ) -> Result<Outcome> {
        let viewer = self.require_viewer(view)?;
        if comment_id.is_temporary() {
            let err = NewsError::invalid("comment", "Comment is still being posted");
            view.raise_for(&err);
            return Err(err);
        }

        let Some(_slot) = self
            .in_flight
            .try_acquire(&comment_id.to_string(), MutationKind::Comment)
        else {
            return Ok(Outcome::Ignored);
        };

        if let Err(err) = self.backend.delete_comment(comment_id, &viewer.id).await {
            warn!(comment_id = %comment_id, error = %err, "Comment delete refused");
            view.raise_for(&err);
            return Err(err);
        }

        view.update(|thread| {
            thread.remove(comment_id);
        });
        self.track(|activity| activity.forget_comment(comment_id));
        view.dismiss();
        info!(comment_id = %comment_id, "Comment deleted");
        Ok(Outcome::Confirmed)
    }

    /// Replace `view` with the viewer's liked articles and own comments
    pub async fn load_activity(&self, view: &ViewState<ViewerActivity>) -> Result<()> {
        let viewer = self.require_viewer(view)?;
        let liked_articles = self.backend.liked_articles(&viewer.id).await?;
        let comments = self.backend.comments_by(&viewer.id).await?;
        view.set(ViewerActivity {
            liked_articles: liked_articles.into_iter().collect(),
            comments,
        });
        Ok(())
    }

    pub async fn load_comments(&self, view: &ViewState<CommentThread>) -> Result<()> {
        let article_id = view.get().article_id;
        let comments = self.backend.list_comments(&article_id).await?;
        view.set(CommentThread::from_comments(article_id, comments));
        Ok(())
    }

    // =========================================================================
    // Featured flag
    // =========================================================================

    /// Flip the featured flag of `article_id` as the board currently shows it
    pub async fn toggle_featured(
        &self,
        view: &ViewState<FeaturedBoard>,
        article_id: &str,
    ) -> Result<Outcome> {
        let featured = view
            .get()
            .is_featured(article_id)
            .ok_or_else(|| NewsError::NotFound(format!("article {}", article_id)))?;
        self.apply_featured(view, article_id, !featured).await
    }

    pub async fn set_featured(
        &self,
        view: &ViewState<FeaturedBoard>,
        article_id: &str,
    ) -> Result<Outcome> {
        self.apply_featured(view, article_id, true).await
    }

    pub async fn unset_featured(
        &self,
        view: &ViewState<FeaturedBoard>,
        article_id: &str,
    ) -> Result<Outcome> {
        self.apply_featured(view, article_id, false).await
    }

    async fn apply_featured(
        &self,
        view: &ViewState<FeaturedBoard>,
        article_id: &str,
        featured: bool,
    ) -> Result<Outcome> {
        let Some(_slot) = self.in_flight.try_acquire(article_id, MutationKind::Feature) else {
            return Ok(Outcome::Ignored);
        };

        let pending = predict::feature(&view.get(), article_id, featured);
        view.set(pending.predicted.clone());
        view.dismiss();
        debug!(article_id, featured, "Featured flag predicted");

        let result = if featured {
            self.backend.set_featured(article_id).await
        } else {
            self.backend.unset_featured(article_id).await
        };
        if let Err(err) = result {
            return Err(self.roll_back(view, pending, err));
        }

        if self.policy.feature() != Reconciliation::Refetch {
            info!(article_id, featured, "Featured flag confirmed");
            return Ok(Outcome::Confirmed);
        }
        match self.load_featured(view).await {
            Ok(()) => {
                info!(article_id, featured, "Featured flag confirmed, board re-fetched");
                Ok(Outcome::Refetched)
            }
            Err(err) => {
                warn!(article_id, error = %err, "Featured re-fetch failed, keeping prediction");
                Ok(Outcome::Confirmed)
            }
        }
    }

    /// Replace the board with the authoritative flags.
    ///
    /// More than one featured article is logged, not repaired.
    pub async fn load_featured(&self, view: &ViewState<FeaturedBoard>) -> Result<()> {
        let board = self.backend.featured_board().await?;
        if let Err(violation) = check_featured(&board) {
            error!(error = %violation, "Featured exclusivity broken by collaborator");
        }
        view.set(board);
        Ok(())
    }
}

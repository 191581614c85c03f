//! Predicted-state functions
//!
//! Each function takes the state a view currently shows and returns the
//! [`PendingMutation`] for one action. None of them touch the network or
//! the view; the controller applies `predicted` and keeps `rollback`.

use super::pending::{MutationKind, PendingMutation};
use crate::error::{NewsError, Result};
use crate::types::{Comment, CommentId, CommentThread, FeaturedBoard, LikeState};
use crate::viewer::Viewer;
use chrono::Utc;

/// Flip the viewer's like and move the count by exactly one.
///
/// The count never goes below zero.
pub fn like(current: &LikeState) -> PendingMutation<LikeState> {
    let mut predicted = current.clone();
    predicted.viewer_has_liked = !current.viewer_has_liked;
    predicted.like_count = if predicted.viewer_has_liked {
        current.like_count.saturating_add(1)
    } else {
        current.like_count.saturating_sub(1)
    };

    PendingMutation {
        kind: MutationKind::Like,
        entity_id: current.article_id.clone(),
        predicted,
        rollback: current.clone(),
    }
}

/// Trimmed comment text, or a validation error when nothing is left
pub fn comment_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(NewsError::invalid("text", "Comment cannot be empty"));
    }
    Ok(trimmed)
}

/// Put a locally built comment, marked with `temp_id`, at the front
pub fn comment(
    current: &CommentThread,
    viewer: &Viewer,
    text: &str,
    temp_id: CommentId,
) -> PendingMutation<CommentThread> {
    let mut predicted = current.clone();
    predicted.prepend(Comment {
        id: temp_id,
        article_id: current.article_id.clone(),
        author_id: viewer.id.clone(),
        author_display_name: viewer.display_name.clone(),
        text: text.to_string(),
        created_at: Utc::now(),
    });

    PendingMutation {
        kind: MutationKind::Comment,
        entity_id: current.article_id.clone(),
        predicted,
        rollback: current.clone(),
    }
}

/// Set the target's flag only; other articles are corrected on re-fetch
pub fn feature(
    current: &FeaturedBoard,
    article_id: &str,
    featured: bool,
) -> PendingMutation<FeaturedBoard> {
    let mut predicted = current.clone();
    predicted.set(article_id, featured);

    PendingMutation {
        kind: MutationKind::Feature,
        entity_id: article_id.to_string(),
        predicted,
        rollback: current.clone(),
    }
}

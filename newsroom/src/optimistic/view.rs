//! Per-view state cells
//!
//! Every view owns the state it displays. There is no cross-view
//! synchronization: two views of the same article may disagree until each
//! re-fetches. Renderers subscribe to the cell and redraw on change.

use crate::error::{ErrorClass, NewsError};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// User-visible feedback attached to a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    /// Inline validation message; nothing was sent
    Invalid(String),
    /// The action failed and was undone; it may be tried again
    Retryable(String),
    /// The collaborator refused the action for this viewer
    NotPermitted(String),
}

impl Notice {
    /// Notice for a failure, if it is one the viewer should see.
    ///
    /// Invariant violations are logged only.
    pub fn for_error(err: &NewsError) -> Option<Self> {
        match err.class() {
            ErrorClass::Validation => Some(Notice::Invalid(err.to_string())),
            ErrorClass::Transient => Some(Notice::Retryable(err.to_string())),
            ErrorClass::Authorization => Some(Notice::NotPermitted(err.to_string())),
            ErrorClass::Invariant => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Invalid(m) | Notice::Retryable(m) | Notice::NotPermitted(m) => m,
        }
    }
}

/// State cell for one view plus its notice
#[derive(Debug)]
pub struct ViewState<S> {
    state: watch::Sender<S>,
    notice: watch::Sender<Option<Notice>>,
}

impl<S: Clone> ViewState<S> {
    pub fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        let (notice, _) = watch::channel(None);
        Self { state, notice }
    }

    /// Snapshot of the displayed state
    pub fn get(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    pub fn set(&self, state: S) {
        self.state.send_replace(state);
    }

    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.state.send_modify(f);
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.borrow().clone()
    }

    pub fn subscribe_notice(&self) -> watch::Receiver<Option<Notice>> {
        self.notice.subscribe()
    }

    pub fn raise(&self, notice: Notice) {
        self.notice.send_replace(Some(notice));
    }

    /// Raise the notice matching `err`, if any
    pub fn raise_for(&self, err: &NewsError) {
        if let Some(notice) = Notice::for_error(err) {
            self.raise(notice);
        }
    }

    pub fn dismiss(&self) {
        self.notice.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LikeState;

    #[test]
    fn test_set_and_update() {
        let view = ViewState::new(LikeState::new("a1", false, 3));
        view.update(|s| s.like_count += 1);
        assert_eq!(view.get().like_count, 4);

        view.set(LikeState::new("a1", true, 9));
        assert_eq!(view.get(), LikeState::new("a1", true, 9));
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let view = ViewState::new(LikeState::new("a1", false, 0));
        let mut rx = view.subscribe();

        view.update(|s| s.viewer_has_liked = true);
        rx.changed().await.unwrap();
        assert!(rx.borrow().viewer_has_liked);
    }

    #[test]
    fn test_notice_lifecycle() {
        let view = ViewState::new(0u8);
        assert!(view.notice().is_none());

        view.raise_for(&NewsError::Transient("timeout".into()));
        assert!(matches!(view.notice(), Some(Notice::Retryable(_))));

        view.dismiss();
        assert!(view.notice().is_none());

        view.raise_for(&NewsError::InvariantViolation("two featured".into()));
        assert!(view.notice().is_none());
    }

    #[test]
    fn test_notice_kinds() {
        assert!(matches!(
            Notice::for_error(&NewsError::MissingViewer),
            Some(Notice::Invalid(_))
        ));
        assert!(matches!(
            Notice::for_error(&NewsError::Authorization("not yours".into())),
            Some(Notice::NotPermitted(m)) if m.contains("not yours")
        ));
    }
}

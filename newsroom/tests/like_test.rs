//! Optimistic like toggling against the in-memory collaborator

use newsroom::{
    InMemoryBackend, LikeState, MutationKind, NewsError, Notice, OptimisticController, Operation,
    Outcome, ViewState, Viewer,
};
use std::sync::Arc;
use std::time::Duration;

/// "a1" liked by three other readers, not by u1
fn backend() -> InMemoryBackend {
    InMemoryBackend::new().with_likes([("u2", "a1"), ("u3", "a1"), ("u4", "a1")])
}

fn controller(backend: &Arc<InMemoryBackend>) -> OptimisticController<InMemoryBackend> {
    OptimisticController::new(Arc::clone(backend), Some(Viewer::new("u1", "Ada")))
}

fn view() -> ViewState<LikeState> {
    ViewState::new(LikeState::new("a1", false, 3))
}

#[tokio::test]
async fn test_toggle_confirmed_without_refetch() {
    let backend = Arc::new(backend().with_latency(Duration::from_millis(50)));
    let controller = controller(&backend);
    let view = view();

    let (outcome, shown) = tokio::join!(controller.toggle_like(&view), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        view.get()
    });

    // Prediction visible while the call is outstanding
    assert_eq!(shown, LikeState::new("a1", true, 4));

    assert_eq!(outcome.unwrap(), Outcome::Confirmed);
    assert_eq!(view.get(), LikeState::new("a1", true, 4));
    assert!(view.notice().is_none());
    assert_eq!(backend.calls(Operation::ToggleLike).await, 1);
    assert_eq!(backend.calls(Operation::LikeCount).await, 0);
    assert_eq!(backend.calls(Operation::HasLiked).await, 0);
}

#[tokio::test]
async fn test_toggle_parity() {
    for n in 0..6u64 {
        let backend = Arc::new(backend());
        let controller = controller(&backend);
        let view = view();

        for _ in 0..n {
            controller.toggle_like(&view).await.unwrap();
        }

        let liked = n % 2 == 1;
        assert_eq!(view.get().viewer_has_liked, liked, "after {} toggles", n);
        assert_eq!(view.get().like_count, 3 + n % 2);

        // View and collaborator agree
        controller.load_likes(&view).await.unwrap();
        assert_eq!(view.get(), LikeState::new("a1", liked, 3 + n % 2));
    }
}

#[tokio::test]
async fn test_transient_failure_rolls_back_exactly() {
    let backend = Arc::new(backend());
    backend
        .fail_next(Operation::ToggleLike, NewsError::Transient("connection reset".into()))
        .await;
    let controller = controller(&backend);
    let view = view();

    let err = controller.toggle_like(&view).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(view.get(), LikeState::new("a1", false, 3));
    assert!(matches!(view.notice(), Some(Notice::Retryable(_))));
    assert!(controller.in_flight().is_empty());

    // The notice is dismissible and the action can be retried
    view.dismiss();
    assert_eq!(controller.toggle_like(&view).await.unwrap(), Outcome::Confirmed);
    assert_eq!(view.get(), LikeState::new("a1", true, 4));
}

#[tokio::test]
async fn test_refused_toggle_shows_not_permitted() {
    let backend = Arc::new(backend());
    backend
        .fail_next(Operation::ToggleLike, NewsError::Authorization("row-level security".into()))
        .await;
    let controller = controller(&backend);
    let view = view();

    controller.toggle_like(&view).await.unwrap_err();

    assert_eq!(view.get(), LikeState::new("a1", false, 3));
    assert!(matches!(view.notice(), Some(Notice::NotPermitted(_))));
}

#[tokio::test]
async fn test_anonymous_viewer_never_reaches_collaborator() {
    let backend = Arc::new(backend());
    let controller = OptimisticController::new(Arc::clone(&backend), None);
    let view = view();

    let err = controller.toggle_like(&view).await.unwrap_err();

    assert!(matches!(err, NewsError::MissingViewer));
    assert_eq!(view.get(), LikeState::new("a1", false, 3));
    assert_eq!(backend.calls(Operation::ToggleLike).await, 0);
}

#[tokio::test]
async fn test_second_toggle_while_pending_is_ignored() {
    let backend = Arc::new(backend().with_latency(Duration::from_millis(50)));
    let controller = controller(&backend);
    let view = view();

    let (first, second) =
        tokio::join!(controller.toggle_like(&view), controller.toggle_like(&view));

    assert_eq!(first.unwrap(), Outcome::Confirmed);
    assert_eq!(second.unwrap(), Outcome::Ignored);
    assert_eq!(backend.calls(Operation::ToggleLike).await, 1);
    assert_eq!(view.get(), LikeState::new("a1", true, 4));
}

#[tokio::test]
async fn test_other_articles_are_not_debounced() {
    let backend = Arc::new(backend().with_latency(Duration::from_millis(30)));
    let controller = controller(&backend);
    let a1 = view();
    let a2 = ViewState::new(LikeState::new("a2", false, 0));

    let (first, second) = tokio::join!(controller.toggle_like(&a1), controller.toggle_like(&a2));

    assert_eq!(first.unwrap(), Outcome::Confirmed);
    assert_eq!(second.unwrap(), Outcome::Confirmed);
    assert_eq!(a2.get(), LikeState::new("a2", true, 1));
}

#[tokio::test]
async fn test_refresh_during_toggle_is_coalesced() {
    let backend = Arc::new(backend().with_latency(Duration::from_millis(50)));
    let controller = controller(&backend);
    let view = view();

    let (toggled, refreshed) = tokio::join!(controller.toggle_like(&view), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.in_flight().is_pending("a1", MutationKind::Like));
        controller.request_like_refresh(&view).await
    });

    assert_eq!(refreshed.unwrap(), Outcome::Ignored);
    assert_eq!(toggled.unwrap(), Outcome::Refetched);
    assert_eq!(backend.calls(Operation::LikeCount).await, 1);
    assert_eq!(view.get(), LikeState::new("a1", true, 4));

    // The request was served; the next toggle trusts its prediction again
    assert_eq!(controller.toggle_like(&view).await.unwrap(), Outcome::Confirmed);
    assert_eq!(backend.calls(Operation::LikeCount).await, 1);
}

#[tokio::test]
async fn test_dropped_toggle_releases_slot() {
    let backend = Arc::new(backend().with_latency(Duration::from_millis(200)));
    let controller = controller(&backend);
    let view = view();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), controller.toggle_like(&view)).await;
    assert!(abandoned.is_err());
    assert!(controller.in_flight().is_empty());

    // The abandoned call never reached the table, so the next toggle's
    // answer disagrees with the stale prediction and is re-read
    let outcome = controller.toggle_like(&view).await.unwrap();
    assert_eq!(outcome, Outcome::Refetched);
    assert_eq!(view.get(), LikeState::new("a1", true, 4));
}

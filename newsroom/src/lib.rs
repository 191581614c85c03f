//! Newsroom - client core for the TCoEFS news site
//!
//! Social interactions, admin content management and the public feed for
//! a news site whose persistence, auth and image processing all live in
//! hosted services.
//!
//! # Architecture
//!
//! - **Optimistic core**: likes, comments and the featured flag update the
//!   view immediately, then reconcile with the collaborator or roll back
//! - **Collaborator boundary**: [`MutationClient`], [`QueryClient`] and
//!   [`ArticleStore`] traits, with a REST implementation for the hosted
//!   database and an in-memory one for tests and previews
//! - **Thin wrappers**: auth provider, image host
//!
//! The signed-in viewer is passed explicitly to everything that needs it.
//!
//! # Example
//!
//! ```rust,ignore
//! use newsroom::{OptimisticController, RestClient, ViewState, LikeState};
//! use std::sync::Arc;
//!
//! let rest = RestClient::new(config.database)?.with_access_token(session.access_token);
//! let backend = Arc::new(rest);
//! let controller = OptimisticController::new(backend, Some(session.viewer()));
//!
//! let likes = ViewState::new(LikeState::new("news4", false, 0));
//! controller.load_likes(&likes).await?;
//!
//! // Shows the new count at once; rolls back if the call fails
//! controller.toggle_like(&likes).await?;
//! ```

// Optimistic mutation with reconciliation
pub mod optimistic;

// Collaborator traits and implementations
pub mod backend;

// Data model
pub mod types;

// Explicit identity context
pub mod viewer;

// Thin wrappers over hosted services
pub mod auth;
pub mod media;

// Admin editor and public feed
pub mod editor;
pub mod feed;

pub mod config;

// Error types
pub mod error;

// Re-export core traits
pub use backend::{ArticleStore, LikeToggled, MutationClient, QueryClient, SocialBackend};

// Re-export collaborator implementations
pub use backend::{InMemoryBackend, Operation, RestClient};

// Re-export optimistic core
pub use optimistic::{
    check_featured, InFlight, MutationKind, Notice, OptimisticController, Outcome,
    PendingMutation, Reconciliation, ReconciliationPolicy, Revert, ViewState,
};

// Re-export data model
pub use types::{
    Article, ArticleImage, ArticlePage, Category, CategoryFilter, Comment, CommentId,
    CommentThread, FeaturedBoard, FeaturedFlag, LikeState, ViewerActivity,
};

pub use viewer::{Role, Viewer, ViewerId};
pub use auth::{AuthClient, Session};
pub use media::{ImageHost, ImageTransform, UploadedImage};
pub use editor::{next_article_id, save_draft, ArticleDraft};
pub use feed::{filter_articles, format_latest, latest_news, FeedItem, LatestNews};
pub use config::{DatabaseConfig, MediaConfig, NewsConfig, SiteConfig};

// Re-export error types
pub use error::{ErrorClass, FieldError, NewsError, Result};

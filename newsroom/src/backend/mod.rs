//! Collaborator boundary
//!
//! All network I/O for the site goes through the traits in this module:
//! - [`MutationClient`]: the single logical state changes (like, comment, feature)
//! - [`QueryClient`]: authoritative reads used for loading and reconciliation
//! - [`ArticleStore`]: admin article CRUD and image records
//!
//! [`RestClient`] talks to the hosted database over its REST API;
//! [`InMemoryBackend`] keeps everything in process.

mod memory;
mod rest;

pub use memory::{InMemoryBackend, Operation};
pub use rest::RestClient;

use crate::error::Result;
use crate::types::{
    Article, ArticleImage, ArticlePage, CategoryFilter, Comment, CommentId, FeaturedBoard,
};
use crate::viewer::{Viewer, ViewerId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Authoritative answer to a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggled {
    /// Whether the viewer likes the article after the toggle
    pub liked: bool,
}

/// Single logical state changes against the collaborator.
///
/// Every method returns a [`Result`]; callers match both branches.
#[async_trait]
pub trait MutationClient: Send + Sync {
    /// Flip the viewer's like on an article
    async fn toggle_like(&self, viewer: &ViewerId, article_id: &str) -> Result<LikeToggled>;

    /// Post a comment. `text` must be non-empty after trimming.
    async fn submit_comment(
        &self,
        viewer: &Viewer,
        article_id: &str,
        text: &str,
    ) -> Result<Comment>;

    /// Delete a comment. Fails with `Authorization` unless `viewer` wrote it.
    async fn delete_comment(&self, comment_id: &CommentId, viewer: &ViewerId) -> Result<()>;

    /// Mark an article featured; the collaborator clears any other flag
    async fn set_featured(&self, article_id: &str) -> Result<()>;

    async fn unset_featured(&self, article_id: &str) -> Result<()>;
}

/// Authoritative reads
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn like_count(&self, article_id: &str) -> Result<u64>;

    async fn has_liked(&self, viewer: &ViewerId, article_id: &str) -> Result<bool>;

    /// Comments on an article, newest first
    async fn list_comments(&self, article_id: &str) -> Result<Vec<Comment>>;

    /// Featured flags of the whole article collection
    async fn featured_board(&self) -> Result<FeaturedBoard>;

    /// Ids of every article the viewer has liked
    async fn liked_articles(&self, viewer: &ViewerId) -> Result<Vec<String>>;

    /// The viewer's own comments across all articles, newest first
    async fn comments_by(&self, viewer: &ViewerId) -> Result<Vec<Comment>>;
}

/// Admin article management
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles by publish date, newest first. `page` is 1-based.
    async fn list_articles(&self, page: u32, limit: u32) -> Result<ArticlePage>;

    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    async fn create_article(&self, article: &Article, author: &ViewerId) -> Result<Article>;

    async fn update_article(
        &self,
        id: &str,
        article: &Article,
        editor: &ViewerId,
    ) -> Result<Article>;

    /// Refuses (`Conflict`) while the article is featured
    async fn delete_article(&self, id: &str) -> Result<()>;

    async fn featured_article(&self) -> Result<Option<Article>>;

    /// Case-insensitive match on title or excerpt
    async fn search_articles(&self, query: &str, category: CategoryFilter) -> Result<Vec<Article>>;

    /// The `limit` most recently published articles
    async fn latest_articles(&self, limit: u32) -> Result<Vec<Article>>;

    /// Id of the most recently created article, if any
    async fn last_article_id(&self) -> Result<Option<String>>;

    async fn save_article_image(
        &self,
        image: &ArticleImage,
        uploader: &ViewerId,
    ) -> Result<ArticleImage>;

    async fn list_article_images(&self, article_id: &str) -> Result<Vec<ArticleImage>>;

    async fn delete_article_image(&self, image_id: &str) -> Result<()>;
}

/// Everything a social-interaction view needs from the collaborator
pub trait SocialBackend: MutationClient + QueryClient {}

impl<T: MutationClient + QueryClient> SocialBackend for T {}

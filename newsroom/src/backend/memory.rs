//! In-process collaborator
//!
//! Keeps the four logical tables in memory behind one lock. Used by tests
//! and local previews; supports scripted failures, per-operation call
//! counts and artificial latency on mutations.

use super::{ArticleStore, LikeToggled, MutationClient, QueryClient};
use crate::error::{NewsError, Result};
use crate::types::{
    Article, ArticleImage, ArticlePage, CategoryFilter, Comment, CommentId, FeaturedBoard,
};
use crate::viewer::{Viewer, ViewerId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Operations the backend counts and can be scripted to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ToggleLike,
    SubmitComment,
    DeleteComment,
    SetFeatured,
    UnsetFeatured,
    LikeCount,
    HasLiked,
    ListComments,
    FeaturedBoard,
    LikedArticles,
    CommentsBy,
    /// Any [`ArticleStore`] method
    Articles,
}

impl Operation {
    fn is_mutation(&self) -> bool {
        matches!(
            self,
            Operation::ToggleLike
                | Operation::SubmitComment
                | Operation::DeleteComment
                | Operation::SetFeatured
                | Operation::UnsetFeatured
        )
    }
}

#[derive(Default)]
struct Tables {
    /// Creation order
    articles: Vec<Article>,
    likes: HashSet<(ViewerId, String)>,
    /// Creation order
    comments: Vec<Comment>,
    images: Vec<ArticleImage>,
    next_comment: u64,
    next_image: u64,
}

#[derive(Default)]
struct Script {
    calls: HashMap<Operation, u32>,
    failures: HashMap<Operation, VecDeque<NewsError>>,
}

/// In-memory implementation of every collaborator trait
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
    script: Mutex<Script>,
    latency: Option<Duration>,
    op_latency: HashMap<Operation, Duration>,
    /// When false, `set_featured` only sets the target flag
    exclusive_featured: bool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            script: Mutex::new(Script::default()),
            latency: None,
            op_latency: HashMap::new(),
            exclusive_featured: true,
        }
    }

    /// Seed the article table (creation order = slice order)
    pub fn with_articles(mut self, articles: Vec<Article>) -> Self {
        self.tables.get_mut().articles = articles;
        self
    }

    /// Seed likes as `(viewer, article)` pairs
    pub fn with_likes<'a>(mut self, likes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let tables = self.tables.get_mut();
        for (viewer, article) in likes {
            tables.likes.insert((ViewerId::new(viewer), article.to_string()));
        }
        self
    }

    /// Seed comments, oldest first
    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        let tables = self.tables.get_mut();
        tables.next_comment += comments.len() as u64;
        tables.comments = comments;
        self
    }

    /// Delay every mutation by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delay `op` by `latency`, overriding [`with_latency`](Self::with_latency)
    pub fn with_latency_for(mut self, op: Operation, latency: Duration) -> Self {
        self.op_latency.insert(op, latency);
        self
    }

    /// Let `set_featured` leave other flags alone, the way a plain column
    /// update would
    pub fn without_featured_exclusivity(mut self) -> Self {
        self.exclusive_featured = false;
        self
    }

    /// Make the next call of `op` fail with `error`
    pub async fn fail_next(&self, op: Operation, error: NewsError) {
        let mut script = self.script.lock().await;
        script.failures.entry(op).or_default().push_back(error);
    }

    /// Number of times `op` has been called
    pub async fn calls(&self, op: Operation) -> u32 {
        let script = self.script.lock().await;
        script.calls.get(&op).copied().unwrap_or(0)
    }

    /// Flip a featured flag directly, bypassing exclusivity
    pub async fn force_featured(&self, article_id: &str, featured: bool) {
        let mut tables = self.tables.lock().await;
        if let Some(article) = tables.articles.iter_mut().find(|a| a.id == article_id) {
            article.featured = featured;
        }
    }

    fn latency_of(&self, op: Operation) -> Option<Duration> {
        self.op_latency
            .get(&op)
            .copied()
            .or_else(|| self.latency.filter(|_| op.is_mutation()))
    }

    async fn record(&self, op: Operation) -> Result<()> {
        let failure = {
            let mut script = self.script.lock().await;
            *script.calls.entry(op).or_insert(0) += 1;
            script.failures.get_mut(&op).and_then(VecDeque::pop_front)
        };
        if let Some(latency) = self.latency_of(op) {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = failure {
            debug!(?op, %error, "Scripted failure");
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl MutationClient for InMemoryBackend {
    async fn toggle_like(&self, viewer: &ViewerId, article_id: &str) -> Result<LikeToggled> {
        self.record(Operation::ToggleLike).await?;
        let mut tables = self.tables.lock().await;
        let key = (viewer.clone(), article_id.to_string());
        let liked = if tables.likes.remove(&key) {
            false
        } else {
            tables.likes.insert(key);
            true
        };
        Ok(LikeToggled { liked })
    }

    async fn submit_comment(
        &self,
        viewer: &Viewer,
        article_id: &str,
        text: &str,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NewsError::invalid("text", "Comment cannot be empty"));
        }
        self.record(Operation::SubmitComment).await?;
        let mut tables = self.tables.lock().await;
        tables.next_comment += 1;
        let comment = Comment {
            id: CommentId::confirmed(format!("c{}", tables.next_comment)),
            article_id: article_id.to_string(),
            author_id: viewer.id.clone(),
            author_display_name: viewer.display_name.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: &CommentId, viewer: &ViewerId) -> Result<()> {
        self.record(Operation::DeleteComment).await?;
        let mut tables = self.tables.lock().await;
        let idx = tables
            .comments
            .iter()
            .position(|c| &c.id == comment_id)
            .ok_or_else(|| NewsError::NotFound(format!("comment {}", comment_id)))?;
        if !tables.comments[idx].is_authored_by(viewer) {
            return Err(NewsError::Authorization(format!(
                "comment {} belongs to another user",
                comment_id
            )));
        }
        tables.comments.remove(idx);
        Ok(())
    }

    async fn set_featured(&self, article_id: &str) -> Result<()> {
        self.record(Operation::SetFeatured).await?;
        let mut tables = self.tables.lock().await;
        if !tables.articles.iter().any(|a| a.id == article_id) {
            return Err(NewsError::NotFound(format!("article {}", article_id)));
        }
        let exclusive = self.exclusive_featured;
        for article in tables.articles.iter_mut() {
            if article.id == article_id {
                article.featured = true;
            } else if exclusive {
                article.featured = false;
            }
        }
        Ok(())
    }

    async fn unset_featured(&self, article_id: &str) -> Result<()> {
        self.record(Operation::UnsetFeatured).await?;
        let mut tables = self.tables.lock().await;
        let article = tables
            .articles
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or_else(|| NewsError::NotFound(format!("article {}", article_id)))?;
        article.featured = false;
        Ok(())
    }
}

#[async_trait]
impl QueryClient for InMemoryBackend {
    async fn like_count(&self, article_id: &str) -> Result<u64> {
        self.record(Operation::LikeCount).await?;
        let tables = self.tables.lock().await;
        Ok(tables.likes.iter().filter(|(_, a)| a == article_id).count() as u64)
    }

    async fn has_liked(&self, viewer: &ViewerId, article_id: &str) -> Result<bool> {
        self.record(Operation::HasLiked).await?;
        let tables = self.tables.lock().await;
        Ok(tables.likes.contains(&(viewer.clone(), article_id.to_string())))
    }

    async fn list_comments(&self, article_id: &str) -> Result<Vec<Comment>> {
        self.record(Operation::ListComments).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect())
    }

    async fn featured_board(&self) -> Result<FeaturedBoard> {
        self.record(Operation::FeaturedBoard).await?;
        let tables = self.tables.lock().await;
        Ok(FeaturedBoard::from_articles(&by_publish_date(&tables.articles)))
    }

    async fn liked_articles(&self, viewer: &ViewerId) -> Result<Vec<String>> {
        self.record(Operation::LikedArticles).await?;
        let tables = self.tables.lock().await;
        let mut liked: Vec<String> = tables
            .likes
            .iter()
            .filter(|(v, _)| v == viewer)
            .map(|(_, article)| article.clone())
            .collect();
        liked.sort();
        Ok(liked)
    }

    async fn comments_by(&self, viewer: &ViewerId) -> Result<Vec<Comment>> {
        self.record(Operation::CommentsBy).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.is_authored_by(viewer))
            .cloned()
            .collect())
    }
}

/// Newest publish date first; creation order breaks ties, newest first
fn by_publish_date(articles: &[Article]) -> Vec<Article> {
    let mut sorted: Vec<(usize, &Article)> = articles.iter().enumerate().collect();
    sorted.sort_by(|(ia, a), (ib, b)| {
        b.published_date
            .cmp(&a.published_date)
            .then_with(|| ib.cmp(ia))
    });
    sorted.into_iter().map(|(_, a)| a.clone()).collect()
}

#[async_trait]
impl ArticleStore for InMemoryBackend {
    async fn list_articles(&self, page: u32, limit: u32) -> Result<ArticlePage> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        let sorted = by_publish_date(&tables.articles);
        let from = (page.max(1) as usize - 1).saturating_mul(limit as usize);
        Ok(ArticlePage {
            total: sorted.len() as u64,
            articles: sorted.into_iter().skip(from).take(limit as usize).collect(),
            page: page.max(1),
            limit,
        })
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        Ok(tables.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn create_article(&self, article: &Article, author: &ViewerId) -> Result<Article> {
        self.record(Operation::Articles).await?;
        let mut tables = self.tables.lock().await;
        if tables.articles.iter().any(|a| a.id == article.id) {
            return Err(NewsError::Conflict(format!("article {} already exists", article.id)));
        }
        let mut created = article.clone();
        created.created_by = Some(author.to_string());
        created.updated_by = Some(author.to_string());
        created.created_at = Some(Utc::now());
        tables.articles.push(created.clone());
        Ok(created)
    }

    async fn update_article(
        &self,
        id: &str,
        article: &Article,
        editor: &ViewerId,
    ) -> Result<Article> {
        self.record(Operation::Articles).await?;
        let mut tables = self.tables.lock().await;
        let existing = tables
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| NewsError::NotFound(format!("article {}", id)))?;
        let created_at = existing.created_at;
        let created_by = existing.created_by.clone();
        *existing = Article {
            id: id.to_string(),
            created_at,
            created_by,
            updated_by: Some(editor.to_string()),
            ..article.clone()
        };
        Ok(existing.clone())
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        self.record(Operation::Articles).await?;
        let mut tables = self.tables.lock().await;
        let idx = tables
            .articles
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| NewsError::NotFound(format!("article {}", id)))?;
        if tables.articles[idx].featured {
            return Err(NewsError::Conflict(
                "Cannot delete featured article. Unfeature it first.".into(),
            ));
        }
        tables.articles.remove(idx);
        tables.likes.retain(|(_, a)| a != id);
        tables.comments.retain(|c| c.article_id != id);
        tables.images.retain(|i| i.article_id != id);
        Ok(())
    }

    async fn featured_article(&self) -> Result<Option<Article>> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        Ok(tables.articles.iter().find(|a| a.featured).cloned())
    }

    async fn search_articles(&self, query: &str, category: CategoryFilter) -> Result<Vec<Article>> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        let needle = query.trim().to_lowercase();
        Ok(tables
            .articles
            .iter()
            .rev()
            .filter(|a| category.matches(a.category))
            .filter(|a| {
                a.title.to_lowercase().contains(&needle)
                    || a.excerpt.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn latest_articles(&self, limit: u32) -> Result<Vec<Article>> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        Ok(by_publish_date(&tables.articles)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn last_article_id(&self) -> Result<Option<String>> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        Ok(tables.articles.last().map(|a| a.id.clone()))
    }

    async fn save_article_image(
        &self,
        image: &ArticleImage,
        _uploader: &ViewerId,
    ) -> Result<ArticleImage> {
        self.record(Operation::Articles).await?;
        let mut tables = self.tables.lock().await;
        tables.next_image += 1;
        let saved = ArticleImage {
            id: Some(format!("img{}", tables.next_image)),
            ..image.clone()
        };
        tables.images.push(saved.clone());
        Ok(saved)
    }

    async fn list_article_images(&self, article_id: &str) -> Result<Vec<ArticleImage>> {
        self.record(Operation::Articles).await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .images
            .iter()
            .rev()
            .filter(|i| i.article_id == article_id)
            .cloned()
            .collect())
    }

    async fn delete_article_image(&self, image_id: &str) -> Result<()> {
        self.record(Operation::Articles).await?;
        let mut tables = self.tables.lock().await;
        let before = tables.images.len();
        tables.images.retain(|i| i.id.as_deref() != Some(image_id));
        if tables.images.len() == before {
            return Err(NewsError::NotFound(format!("image {}", image_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use chrono::NaiveDate;

    pub(crate) fn article(id: &str, day: u32, featured: bool) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            excerpt: format!("Excerpt for {}", id),
            content: "<p>Body</p>".into(),
            category: Category::News,
            card_image_url: Some(format!("/img/{}.png", id)),
            date: None,
            published_date: NaiveDate::from_ymd_opt(2025, 1, day),
            read_time: Some("5 min read".into()),
            featured,
            created_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let backend = InMemoryBackend::new();
        let u1 = ViewerId::new("u1");

        assert!(backend.toggle_like(&u1, "a1").await.unwrap().liked);
        assert_eq!(backend.like_count("a1").await.unwrap(), 1);
        assert!(!backend.toggle_like(&u1, "a1").await.unwrap().liked);
        assert_eq!(backend.like_count("a1").await.unwrap(), 0);
        assert_eq!(backend.calls(Operation::ToggleLike).await, 2);
    }

    #[tokio::test]
    async fn test_set_featured_is_exclusive() {
        let backend = InMemoryBackend::new()
            .with_articles(vec![article("news1", 1, true), article("news2", 2, false)]);

        backend.set_featured("news2").await.unwrap();

        let board = backend.featured_board().await.unwrap();
        assert_eq!(board.featured_ids(), vec!["news2"]);
    }

    #[tokio::test]
    async fn test_delete_featured_article_refused() {
        let backend = InMemoryBackend::new().with_articles(vec![article("news1", 1, true)]);

        let err = backend.delete_article("news1").await.unwrap_err();
        assert!(matches!(err, NewsError::Conflict(_)));

        backend.unset_featured("news1").await.unwrap();
        backend.delete_article("news1").await.unwrap();
        assert!(backend.get_article("news1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scripted_failure_consumed_once() {
        let backend = InMemoryBackend::new();
        backend
            .fail_next(Operation::LikeCount, NewsError::Transient("timeout".into()))
            .await;

        assert!(backend.like_count("a1").await.is_err());
        assert_eq!(backend.like_count("a1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_articles_paginates_by_publish_date() {
        let backend = InMemoryBackend::new().with_articles(vec![
            article("news1", 1, false),
            article("news2", 3, false),
            article("news3", 2, false),
        ]);

        let page = backend.list_articles(1, 2).await.unwrap();
        let ids: Vec<_> = page.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["news2", "news3"]);
        assert_eq!(page.total, 3);

        let page = backend.list_articles(2, 2).await.unwrap();
        assert_eq!(page.articles.len(), 1);
        assert_eq!(page.articles[0].id, "news1");
    }

    #[tokio::test]
    async fn test_far_page_is_empty() {
        let backend = InMemoryBackend::new().with_articles(vec![article("news1", 1, false)]);

        let page = backend.list_articles(u32::MAX, u32::MAX).await.unwrap();
        assert!(page.articles.is_empty());
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_viewer_activity_reads() {
        let backend = InMemoryBackend::new().with_likes([
            ("u1", "news2"),
            ("u1", "news1"),
            ("u2", "news3"),
        ]);
        let u1 = ViewerId::new("u1");
        let viewer = Viewer::new("u1", "Ada");

        assert_eq!(backend.liked_articles(&u1).await.unwrap(), vec!["news1", "news2"]);

        backend.submit_comment(&viewer, "news1", "first").await.unwrap();
        backend.submit_comment(&Viewer::new("u2", "Bola"), "news1", "other").await.unwrap();
        backend.submit_comment(&viewer, "news2", "second").await.unwrap();

        let mine = backend.comments_by(&u1).await.unwrap();
        let texts: Vec<_> = mine.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }
}

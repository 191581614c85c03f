//! REST client for the hosted database
//!
//! Speaks the PostgREST dialect the hosted service exposes under
//! `/rest/v1`: one path per table, filters as `column=op.value` query
//! parameters, `Prefer` headers for counts and returned rows.

use super::{ArticleStore, LikeToggled, MutationClient, QueryClient};
use crate::config::DatabaseConfig;
use crate::error::{NewsError, Result};
use crate::types::{
    Article, ArticleImage, ArticlePage, CategoryFilter, Comment, CommentId, FeaturedBoard,
    FeaturedFlag, RawId,
};
use crate::viewer::{Viewer, ViewerId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const ARTICLE_ORDER: &str = "published_date.desc,created_at.desc";

/// HTTP client for the hosted database
///
/// Requests are signed with the project's anon key; once a viewer signs in,
/// [`RestClient::with_access_token`] makes row-level security see them.
///
/// # Example
///
/// ```rust,no_run
/// use newsroom::{DatabaseConfig, QueryClient, RestClient};
///
/// # async fn example() -> newsroom::Result<()> {
/// let client = RestClient::new(DatabaseConfig {
///     base_url: "https://project.supabase.co".into(),
///     anon_key: "public-anon-key".into(),
///     ..Default::default()
/// })?;
///
/// let likes = client.like_count("news4").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestClient {
    config: DatabaseConfig,
    http: Client,
    access_token: Option<String>,
}

impl RestClient {
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            http,
            access_token: None,
        })
    }

    /// Act as the signed-in user holding `token`
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    // ==================== Request plumbing ====================

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);

        self.http
            .request(method, self.url(path))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            debug!(status, body = %body, "Collaborator returned an error");
            return Err(NewsError::from_status(status, body));
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    /// Rows touched by a write, via `Prefer: return=representation`
    async fn write_rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        self.fetch(request.header("Prefer", "return=representation"))
            .await
    }

    // ==================== Likes ====================

    async fn find_like(&self, viewer: &ViewerId, article_id: &str) -> Result<Option<String>> {
        let rows: Vec<IdRow> = self
            .fetch(self.request(Method::GET, "likes").query(&[
                ("select", "id".to_string()),
                ("user_id", eq(viewer.as_str())),
                ("post_id", eq(article_id)),
                ("limit", "1".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next().map(|r| r.id.to_string()))
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Total row count from a `Content-Range: 0-24/3573` (or `*/0`) header
fn total_from_content_range(response: &Response) -> Result<u64> {
    response
        .headers()
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('/').next())
        .and_then(|total| total.parse().ok())
        .ok_or_else(|| NewsError::Transient("response carried no exact row count".into()))
}

/// Drop characters that would break out of a PostgREST `or=(...)` filter
fn sanitize_search(query: &str) -> String {
    query
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"' | '\\'))
        .collect()
}

#[derive(Deserialize)]
struct IdRow {
    id: RawId,
}

#[derive(Deserialize)]
struct LikedRow {
    post_id: String,
}

#[derive(Deserialize)]
struct FeaturedRow {
    id: String,
    #[serde(default)]
    featured: bool,
}

#[derive(Deserialize)]
struct CommentRow {
    id: RawId,
    post_id: String,
    user_id: String,
    #[serde(default)]
    user_name: Option<String>,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: CommentId::confirmed(row.id.to_string()),
            article_id: row.post_id,
            author_id: ViewerId::new(row.user_id),
            author_display_name: row.user_name.unwrap_or_else(|| "Anonymous".to_string()),
            text: row.text,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MutationClient for RestClient {
    async fn toggle_like(&self, viewer: &ViewerId, article_id: &str) -> Result<LikeToggled> {
        match self.find_like(viewer, article_id).await? {
            Some(like_id) => {
                self.send(
                    self.request(Method::DELETE, "likes")
                        .query(&[("id", eq(&like_id))]),
                )
                .await?;
                Ok(LikeToggled { liked: false })
            }
            None => {
                self.send(self.request(Method::POST, "likes").json(&serde_json::json!({
                    "user_id": viewer.as_str(),
                    "post_id": article_id,
                })))
                .await?;
                Ok(LikeToggled { liked: true })
            }
        }
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

        let rows: Vec<CommentRow> = self
            .write_rows(self.request(Method::POST, "comments").json(&serde_json::json!({
                "user_id": viewer.id.as_str(),
                "post_id": article_id,
                "text": text,
                "user_name": viewer.display_name,
                "user_email": viewer.email,
            })))
            .await?;

        rows.into_iter()
            .next()
            .map(Comment::from)
            .ok_or_else(|| NewsError::Transient("comment insert returned no row".into()))
    }

    async fn delete_comment(&self, comment_id: &CommentId, viewer: &ViewerId) -> Result<()> {
        let id = match comment_id {
            CommentId::Confirmed(id) => id,
            CommentId::Temporary(_) => {
                return Err(NewsError::invalid("comment", "Comment has not been saved yet"))
            }
        };

        // Filtering on the author too means a foreign comment matches no row
        let rows: Vec<IdRow> = self
            .write_rows(self.request(Method::DELETE, "comments").query(&[
                ("id", eq(id)),
                ("user_id", eq(viewer.as_str())),
            ]))
            .await?;

        if rows.is_empty() {
            return Err(NewsError::Authorization(format!(
                "comment {} was not deleted for viewer {}",
                id, viewer
            )));
        }
        Ok(())
    }

    async fn set_featured(&self, article_id: &str) -> Result<()> {
        // Clears every other flag and sets this one in a single transaction
        self.send(
            self.request(Method::POST, "rpc/set_featured_article")
                .json(&serde_json::json!({ "target_id": article_id })),
        )
        .await?;
        Ok(())
    }

    async fn unset_featured(&self, article_id: &str) -> Result<()> {
        let rows: Vec<IdRow> = self
            .write_rows(
                self.request(Method::PATCH, "articles")
                    .query(&[("id", eq(article_id)), ("select", "id".to_string())])
                    .json(&serde_json::json!({ "featured": false })),
            )
            .await?;
        if rows.is_empty() {
            return Err(NewsError::NotFound(format!("article {}", article_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryClient for RestClient {
    async fn like_count(&self, article_id: &str) -> Result<u64> {
        let response = self
            .send(
                self.request(Method::HEAD, "likes")
                    .query(&[("select", "id".to_string()), ("post_id", eq(article_id))])
                    .header("Prefer", "count=exact"),
            )
            .await?;
        total_from_content_range(&response)
    }

    async fn has_liked(&self, viewer: &ViewerId, article_id: &str) -> Result<bool> {
        Ok(self.find_like(viewer, article_id).await?.is_some())
    }

    async fn list_comments(&self, article_id: &str) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = self
            .fetch(self.request(Method::GET, "comments").query(&[
                ("select", "*".to_string()),
                ("post_id", eq(article_id)),
                ("order", "created_at.desc".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn featured_board(&self) -> Result<FeaturedBoard> {
        let rows: Vec<FeaturedRow> = self
            .fetch(self.request(Method::GET, "articles").query(&[
                ("select", "id,featured".to_string()),
                ("order", ARTICLE_ORDER.to_string()),
            ]))
            .await?;
        Ok(FeaturedBoard::new(
            rows.into_iter()
                .map(|r| FeaturedFlag {
                    article_id: r.id,
                    featured: r.featured,
                })
                .collect(),
        ))
    }

    async fn liked_articles(&self, viewer: &ViewerId) -> Result<Vec<String>> {
        let rows: Vec<LikedRow> = self
            .fetch(self.request(Method::GET, "likes").query(&[
                ("select", "post_id".to_string()),
                ("user_id", eq(viewer.as_str())),
            ]))
            .await?;
        Ok(rows.into_iter().map(|r| r.post_id).collect())
    }

    async fn comments_by(&self, viewer: &ViewerId) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRow> = self
            .fetch(self.request(Method::GET, "comments").query(&[
                ("select", "*".to_string()),
                ("user_id", eq(viewer.as_str())),
                ("order", "created_at.desc".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}

#[async_trait]
impl ArticleStore for RestClient {
    async fn list_articles(&self, page: u32, limit: u32) -> Result<ArticlePage> {
        let page = page.max(1);
        let offset = u64::from(page - 1) * u64::from(limit);
        let response = self
            .send(
                self.request(Method::GET, "articles")
                    .query(&[
                        ("select", "*".to_string()),
                        ("order", ARTICLE_ORDER.to_string()),
                        ("offset", offset.to_string()),
                        ("limit", limit.to_string()),
                    ])
                    .header("Prefer", "count=exact"),
            )
            .await?;
        let total = total_from_content_range(&response)?;
        let articles: Vec<Article> = response.json().await?;

        Ok(ArticlePage {
            articles,
            total,
            page,
            limit,
        })
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let rows: Vec<Article> = self
            .fetch(
                self.request(Method::GET, "articles")
                    .query(&[("select", "*".to_string()), ("id", eq(id))]),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_article(&self, article: &Article, author: &ViewerId) -> Result<Article> {
        let mut row = article.clone();
        row.created_by = Some(author.to_string());
        row.updated_by = Some(author.to_string());

        let rows: Vec<Article> = self
            .write_rows(self.request(Method::POST, "articles").json(&row))
            .await?;

        // Row-level security turns a refused insert into an empty result
        rows.into_iter().next().ok_or_else(|| {
            NewsError::Authorization(format!("article {} was not created", article.id))
        })
    }

    async fn update_article(
        &self,
        id: &str,
        article: &Article,
        editor: &ViewerId,
    ) -> Result<Article> {
        let mut row = article.clone();
        row.id = id.to_string();
        row.created_by = None;
        row.created_at = None;
        row.updated_by = Some(editor.to_string());

        let rows: Vec<Article> = self
            .write_rows(
                self.request(Method::PATCH, "articles")
                    .query(&[("id", eq(id))])
                    .json(&row),
            )
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            NewsError::Authorization(format!("article {} was not updated", id))
        })
    }

    async fn delete_article(&self, id: &str) -> Result<()> {
        let article = self
            .get_article(id)
            .await?
            .ok_or_else(|| NewsError::NotFound(format!("article {}", id)))?;
        if article.featured {
            return Err(NewsError::Conflict(
                "Cannot delete featured article. Unfeature it first.".into(),
            ));
        }

        self.send(
            self.request(Method::DELETE, "articles")
                .query(&[("id", eq(id))]),
        )
        .await?;
        Ok(())
    }

    async fn featured_article(&self) -> Result<Option<Article>> {
        let rows: Vec<Article> = self
            .fetch(self.request(Method::GET, "articles").query(&[
                ("select", "*".to_string()),
                ("featured", "is.true".to_string()),
                ("limit", "1".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn search_articles(&self, query: &str, category: CategoryFilter) -> Result<Vec<Article>> {
        let needle = sanitize_search(query);
        let mut params = vec![
            ("select", "*".to_string()),
            (
                "or",
                format!("(title.ilike.*{}*,excerpt.ilike.*{}*)", needle, needle),
            ),
            ("order", "created_at.desc".to_string()),
        ];
        if let CategoryFilter::Only(category) = category {
            params.push(("category", eq(category.as_str())));
        }

        self.fetch(self.request(Method::GET, "articles").query(&params))
            .await
    }

    async fn latest_articles(&self, limit: u32) -> Result<Vec<Article>> {
        self.fetch(self.request(Method::GET, "articles").query(&[
            ("select", "*".to_string()),
            ("order", "published_date.desc".to_string()),
            ("limit", limit.to_string()),
        ]))
        .await
    }

    async fn last_article_id(&self) -> Result<Option<String>> {
        let rows: Vec<IdRow> = self
            .fetch(self.request(Method::GET, "articles").query(&[
                ("select", "id".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ]))
            .await?;
        Ok(rows.into_iter().next().map(|r| r.id.to_string()))
    }

    async fn save_article_image(
        &self,
        image: &ArticleImage,
        uploader: &ViewerId,
    ) -> Result<ArticleImage> {
        let rows: Vec<ArticleImage> = self
            .write_rows(self.request(Method::POST, "article_images").json(&serde_json::json!({
                "article_id": image.article_id,
                "image_url": image.image_url,
                "image_type": image.image_type,
                "cloudinary_public_id": image.public_id,
                "uploaded_by": uploader.as_str(),
            })))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| NewsError::Authorization("image record was not saved".into()))
    }

    async fn list_article_images(&self, article_id: &str) -> Result<Vec<ArticleImage>> {
        self.fetch(self.request(Method::GET, "article_images").query(&[
            ("select", "*".to_string()),
            ("article_id", eq(article_id)),
            ("order", "created_at.desc".to_string()),
        ]))
        .await
    }

    async fn delete_article_image(&self, image_id: &str) -> Result<()> {
        self.send(
            self.request(Method::DELETE, "article_images")
                .query(&[("id", eq(image_id))]),
        )
        .await?;
        Ok(())
    }
}

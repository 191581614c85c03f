//! Data model shared by the controllers and the collaborator clients

use crate::viewer::ViewerId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Articles
// =============================================================================

/// Article category as stored in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    #[default]
    News,
    Training,
    Research,
    Partnership,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::News,
        Category::Training,
        Category::Research,
        Category::Partnership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "News",
            Category::Training => "Training",
            Category::Research => "Research",
            Category::Partnership => "Partnership",
        }
    }

    /// Parse a category name, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category selector used by listings; `All` disables the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Some(CategoryFilter::All)
        } else {
            Category::parse(s).map(CategoryFilter::Only)
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

/// A published (or draft) news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub card_image_url: Option<String>,
    /// Display date, e.g. "March 4, 2025"
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub read_time: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// One page of the admin article listing
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    /// Total rows across all pages
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Image attached to an article, hosted by the image CDN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleImage {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub article_id: String,
    pub image_url: String,
    /// "card" for the listing image, "inline" for body images
    pub image_type: String,
    #[serde(rename = "cloudinary_public_id", default)]
    pub public_id: Option<String>,
}

/// Row ids arrive as numbers or strings depending on the column type
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| id.to_string()))
}

// =============================================================================
// Likes
// =============================================================================

/// Like state of one article as seen by one view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub article_id: String,
    /// Only meaningful when a viewer is signed in
    pub viewer_has_liked: bool,
    pub like_count: u64,
}

impl LikeState {
    pub fn new(article_id: impl Into<String>, viewer_has_liked: bool, like_count: u64) -> Self {
        Self {
            article_id: article_id.into(),
            viewer_has_liked,
            like_count,
        }
    }
}

// =============================================================================
// Comments
// =============================================================================

/// Comment identity: temporary until the collaborator assigns the real one
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentId {
    Temporary(Uuid),
    Confirmed(String),
}

impl CommentId {
    pub fn temporary() -> Self {
        CommentId::Temporary(Uuid::new_v4())
    }

    pub fn confirmed(id: impl Into<String>) -> Self {
        CommentId::Confirmed(id.into())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, CommentId::Temporary(_))
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentId::Temporary(id) => write!(f, "tmp-{}", id),
            CommentId::Confirmed(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub article_id: String,
    pub author_id: ViewerId,
    pub author_display_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_authored_by(&self, viewer: &ViewerId) -> bool {
        &self.author_id == viewer
    }
}

/// Comments on one article, newest first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentThread {
    pub article_id: String,
    pub comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(article_id: impl Into<String>) -> Self {
        Self {
            article_id: article_id.into(),
            comments: Vec::new(),
        }
    }

    /// Build from an unordered list; sorts newest first
    pub fn from_comments(article_id: impl Into<String>, mut comments: Vec<Comment>) -> Self {
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            article_id: article_id.into(),
            comments,
        }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    pub fn position(&self, id: &CommentId) -> Option<usize> {
        self.comments.iter().position(|c| &c.id == id)
    }

    pub fn prepend(&mut self, comment: Comment) {
        self.comments.insert(0, comment);
    }

    /// Swap the comment at `id`'s slot for `replacement`, keeping its position.
    /// Returns false when `id` is not in the thread.
    pub fn replace(&mut self, id: &CommentId, replacement: Comment) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.comments[idx] = replacement;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &CommentId) -> Option<Comment> {
        self.position(id).map(|idx| self.comments.remove(idx))
    }
}

// =============================================================================
// Viewer activity
// =============================================================================

/// What the signed-in viewer has liked and written across the site
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewerActivity {
    pub liked_articles: BTreeSet<String>,
    /// The viewer's own comments, newest first
    pub comments: Vec<Comment>,
}

impl ViewerActivity {
    pub fn has_liked(&self, article_id: &str) -> bool {
        self.liked_articles.contains(article_id)
    }

    pub fn record_like(&mut self, article_id: &str, liked: bool) {
        if liked {
            self.liked_articles.insert(article_id.to_string());
        } else {
            self.liked_articles.remove(article_id);
        }
    }

    pub fn record_comment(&mut self, comment: Comment) {
        if !self.comments.iter().any(|c| c.id == comment.id) {
            self.comments.insert(0, comment);
        }
    }

    pub fn forget_comment(&mut self, id: &CommentId) {
        self.comments.retain(|c| &c.id != id);
    }
}

// =============================================================================
// Featured flag
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedFlag {
    pub article_id: String,
    pub featured: bool,
}

/// Featured flags of the article collection, in listing order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeaturedBoard {
    pub entries: Vec<FeaturedFlag>,
}

impl FeaturedBoard {
    pub fn new(entries: Vec<FeaturedFlag>) -> Self {
        Self { entries }
    }

    pub fn from_articles(articles: &[Article]) -> Self {
        Self {
            entries: articles
                .iter()
                .map(|a| FeaturedFlag {
                    article_id: a.id.clone(),
                    featured: a.featured,
                })
                .collect(),
        }
    }

    pub fn is_featured(&self, article_id: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.article_id == article_id)
            .map(|e| e.featured)
    }

    /// Set the flag on one article only. Returns false if it is not listed.
    pub fn set(&mut self, article_id: &str, featured: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.article_id == article_id) {
            Some(entry) => {
                entry.featured = featured;
                true
            }
            None => false,
        }
    }

    pub fn featured_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.featured)
            .map(|e| e.article_id.as_str())
            .collect()
    }
}

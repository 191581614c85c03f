//! Article editor model
//!
//! [`ArticleDraft`] is the admin form as a typed struct. Validation reports
//! every missing field at once. [`save_draft`] runs the whole save: admin
//! check, validation, id assignment, create or update, and the card image
//! record.

use crate::backend::ArticleStore;
use crate::error::{FieldError, NewsError, Result};
use crate::media::UploadedImage;
use crate::types::{Article, ArticleImage, Category};
use crate::viewer::Viewer;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_READ_TIME: &str = "5 min read";

/// Admin article form
///
/// Missing fields deserialize to the form's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleDraft {
    /// Empty for a new article; assigned on save
    pub id: String,
    pub title: String,
    pub excerpt: String,
    /// HTML body
    pub content: String,
    pub category: Category,
    pub card_image_url: String,
    /// Human-readable date shown on the article, e.g. "March 4, 2025"
    pub date: String,
    pub published_date: NaiveDate,
    pub read_time: String,
    pub featured: bool,
}

impl Default for ArticleDraft {
    fn default() -> Self {
        Self::dated(Local::now().date_naive())
    }
}

impl ArticleDraft {
    /// Empty draft published on `day`
    pub fn dated(day: NaiveDate) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            excerpt: String::new(),
            content: String::new(),
            category: Category::News,
            card_image_url: String::new(),
            date: long_date(day),
            published_date: day,
            read_time: DEFAULT_READ_TIME.to_string(),
            featured: false,
        }
    }

    /// Load a stored article into the form
    pub fn from_article(article: &Article) -> Self {
        let published_date = article
            .published_date
            .unwrap_or_else(|| Local::now().date_naive());
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            content: article.content.clone(),
            category: article.category,
            card_image_url: article.card_image_url.clone().unwrap_or_default(),
            date: article
                .date
                .clone()
                .unwrap_or_else(|| long_date(published_date)),
            published_date,
            read_time: article
                .read_time
                .clone()
                .unwrap_or_else(|| DEFAULT_READ_TIME.to_string()),
            featured: article.featured,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Check required fields, collecting every failure
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let required = [
            ("title", &self.title, "Title is required"),
            ("excerpt", &self.excerpt, "Excerpt is required"),
            ("content", &self.content, "Content is required"),
            ("card_image_url", &self.card_image_url, "Card image is required"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NewsError::Validation(errors))
        }
    }

    /// The article row this draft saves as
    pub fn to_article(&self) -> Article {
        Article {
            id: self.id.trim().to_string(),
            title: self.title.trim().to_string(),
            excerpt: self.excerpt.trim().to_string(),
            content: self.content.clone(),
            category: self.category,
            card_image_url: Some(self.card_image_url.trim().to_string()),
            date: Some(self.date.clone()),
            published_date: Some(self.published_date),
            read_time: Some(self.read_time.clone()),
            featured: self.featured,
            created_at: None,
            created_by: None,
            updated_by: None,
        }
    }
}

/// "March 4, 2025"
pub fn long_date(day: NaiveDate) -> String {
    day.format("%B %-d, %Y").to_string()
}

/// Next id in the `newsN` sequence after `last`
pub fn next_article_id(last: Option<&str>) -> String {
    let Some(last) = last else {
        return "news1".to_string();
    };
    let digits = last.len() - last.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let n: u64 = last[last.len() - digits..].parse().unwrap_or(0);
    format!("news{}", n + 1)
}

/// Save a draft through `store` as `editor`.
///
/// New drafts get the next id in sequence. When `card_image` is the upload
/// behind the draft's card image, its record is stored with the article.
pub async fn save_draft<S: ArticleStore + ?Sized>(
    store: &S,
    editor: &Viewer,
    draft: &ArticleDraft,
    card_image: Option<&UploadedImage>,
) -> Result<Article> {
    editor.require_admin()?;
    draft.validate()?;

    let mut article = draft.to_article();
    let saved = if draft.is_new() {
        let last = store.last_article_id().await?;
        article.id = next_article_id(last.as_deref());
        let created = store.create_article(&article, &editor.id).await?;
        info!(article_id = %created.id, "Article created");
        created
    } else {
        let updated = store.update_article(&article.id, &article, &editor.id).await?;
        info!(article_id = %updated.id, "Article updated");
        updated
    };

    if let Some(image) = card_image {
        store
            .save_article_image(
                &ArticleImage {
                    id: None,
                    article_id: saved.id.clone(),
                    image_url: image.url.clone(),
                    image_type: "card".to_string(),
                    public_id: Some(image.public_id.clone()),
                },
                &editor.id,
            )
            .await?;
    }

    Ok(saved)
}

//! Public feed formatting
//!
//! The main institute site embeds the latest articles from the news site.
//! This module shapes those articles into the JSON the embed expects and
//! provides the listing filter the homepage and admin list share.

use crate::backend::ArticleStore;
use crate::config::SiteConfig;
use crate::error::Result;
use crate::types::{Article, Category, CategoryFilter};
use serde::{Deserialize, Serialize};

/// One article as the embed renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub category: Category,
    pub date: Option<String>,
    /// Always absolute
    pub image: String,
    #[serde(rename = "readTime")]
    pub read_time: Option<String>,
    pub url: String,
}

/// Latest-news response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestNews {
    pub success: bool,
    pub count: usize,
    pub articles: Vec<FeedItem>,
}

impl FeedItem {
    pub fn from_article(article: &Article, site: &SiteConfig) -> Self {
        let base = site.public_base_url.trim_end_matches('/');
        let image = article
            .card_image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(site.fallback_card_image.as_str());
        let image = if image.starts_with('/') {
            format!("{}{}", base, image)
        } else {
            image.to_string()
        };

        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            category: article.category,
            date: article.date.clone(),
            image,
            read_time: article.read_time.clone(),
            url: format!("{}/news/{}", base, article.id),
        }
    }
}

/// Shape already-ordered articles into the feed body
pub fn format_latest(articles: &[Article], site: &SiteConfig) -> LatestNews {
    let items: Vec<FeedItem> = articles
        .iter()
        .map(|a| FeedItem::from_article(a, site))
        .collect();
    LatestNews {
        success: true,
        count: items.len(),
        articles: items,
    }
}

/// Fetch and format the `site.latest_limit` most recently published articles
pub async fn latest_news<S: ArticleStore + ?Sized>(
    store: &S,
    site: &SiteConfig,
) -> Result<LatestNews> {
    let articles = store.latest_articles(site.latest_limit).await?;
    Ok(format_latest(&articles, site))
}

/// Articles in `category` whose title or excerpt contains `query`,
/// ignoring case. An empty query matches everything.
pub fn filter_articles<'a>(
    articles: &'a [Article],
    category: CategoryFilter,
    query: &str,
) -> Vec<&'a Article> {
    let needle = query.trim().to_lowercase();
    articles
        .iter()
        .filter(|a| category.matches(a.category))
        .filter(|a| {
            needle.is_empty()
                || a.title.to_lowercase().contains(&needle)
                || a.excerpt.to_lowercase().contains(&needle)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use chrono::NaiveDate;

    fn article(id: &str, category: Category, image: Option<&str>, day: u32) -> Article {
        Article {
            id: id.into(),
            title: format!("Story {}", id),
            excerpt: "Researchers in Jos".into(),
            content: String::new(),
            category,
            card_image_url: image.map(str::to_string),
            date: Some(format!("March {}, 2025", day)),
            published_date: NaiveDate::from_ymd_opt(2025, 3, day),
            read_time: Some("4 min read".into()),
            featured: false,
            created_at: None,
            created_by: None,
            updated_by: None,
        }
    }

    #[test]
    fn test_images_made_absolute() {
        let site = SiteConfig::default();
        let feed = format_latest(
            &[
                article("news1", Category::News, Some("/uploads/a.png"), 1),
                article("news2", Category::News, None, 2),
                article("news3", Category::News, Some("https://res.cloudinary.com/t/x.png"), 3),
            ],
            &site,
        );

        assert!(feed.success);
        assert_eq!(feed.count, 3);
        assert_eq!(feed.articles[0].image, "https://blog.tcoefs-unijos.org/uploads/a.png");
        assert_eq!(feed.articles[1].image, "https://blog.tcoefs-unijos.org/news-collage.png");
        assert_eq!(feed.articles[2].image, "https://res.cloudinary.com/t/x.png");
        assert_eq!(feed.articles[0].url, "https://blog.tcoefs-unijos.org/news/news1");
    }

    #[test]
    fn test_wire_names() {
        let feed = format_latest(
            &[article("news1", Category::Research, None, 1)],
            &SiteConfig::default(),
        );
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["articles"][0]["readTime"], "4 min read");
        assert_eq!(json["articles"][0]["category"], "Research");
        assert!(json["articles"][0].get("read_time").is_none());
    }

    #[test]
    fn test_filter_articles() {
        let articles = vec![
            article("news1", Category::News, None, 1),
            article("news2", Category::Training, None, 2),
            Article {
                title: "Soil workshop".into(),
                excerpt: "Hands-on".into(),
                ..article("news3", Category::Training, None, 3)
            },
        ];

        assert_eq!(filter_articles(&articles, CategoryFilter::All, "").len(), 3);
        assert_eq!(
            filter_articles(&articles, CategoryFilter::Only(Category::Training), "").len(),
            2
        );
        let hits = filter_articles(&articles, CategoryFilter::All, "SOIL");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "news3");
        let news = CategoryFilter::Only(Category::News);
        assert!(filter_articles(&articles, news, "soil").is_empty());
    }

    #[tokio::test]
    async fn test_latest_news_takes_newest_three() {
        let store = InMemoryBackend::new().with_articles(vec![
            article("news1", Category::News, None, 1),
            article("news2", Category::News, None, 4),
            article("news3", Category::News, None, 2),
            article("news4", Category::News, None, 3),
        ]);

        let feed = latest_news(&store, &SiteConfig::default()).await.unwrap();
        let ids: Vec<_> = feed.articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["news2", "news4", "news3"]);
    }
}

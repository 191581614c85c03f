//! Client configuration
//!
//! Connection settings for the hosted database/auth service and the image
//! host, plus the public site settings used when formatting the feed.
//! Values come from the environment; the variable names match the ones the
//! site's deployment already sets.

use crate::error::{NewsError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Hosted database / auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Project URL, e.g. "https://xyzcompany.supabase.co"
    pub base_url: String,
    /// Public (anon) API key
    pub anon_key: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Image host (unsigned uploads)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Upload timeout in seconds
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            upload_preset: None,
            folder: default_folder(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

/// Public site settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL article links and relative images are resolved against
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// Card image used when an article has none
    #[serde(default = "default_fallback_image")]
    pub fallback_card_image: String,
    /// Number of articles in the latest-news feed
    #[serde(default = "default_latest_limit")]
    pub latest_limit: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_base_url: default_public_base_url(),
            fallback_card_image: default_fallback_image(),
            latest_limit: default_latest_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_upload_timeout() -> u64 {
    120
}

fn default_folder() -> String {
    "tcoefs-news".to_string()
}

fn default_public_base_url() -> String {
    "https://blog.tcoefs-unijos.org".to_string()
}

fn default_fallback_image() -> String {
    "/news-collage.png".to_string()
}

fn default_latest_limit() -> u32 {
    3
}

impl NewsConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset.
    ///
    /// Server-side names win over the `VITE_`-prefixed browser names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .find(|v| !v.trim().is_empty())
        };

        let base_url = get(&["SUPABASE_URL", "VITE_SUPABASE_URL"]);
        let anon_key = get(&["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]);

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push("SUPABASE_URL");
        }
        if anon_key.is_none() {
            missing.push("SUPABASE_ANON_KEY");
        }
        if !missing.is_empty() {
            return Err(NewsError::Config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }

        let timeout_secs = match get(&["NEWS_TIMEOUT_SECS"]) {
            Some(raw) => raw
                .parse()
                .map_err(|_| {
                    NewsError::Config(format!("NEWS_TIMEOUT_SECS is not a number: {}", raw))
                })?,
            None => default_timeout(),
        };

        let mut site = SiteConfig::default();
        if let Some(url) = get(&["NEWS_SITE_URL"]) {
            site.public_base_url = url;
        }

        let config = Self {
            database: DatabaseConfig {
                base_url: base_url.unwrap_or_default(),
                anon_key: anon_key.unwrap_or_default(),
                timeout_secs,
            },
            media: MediaConfig {
                cloud_name: get(&["CLOUDINARY_CLOUD_NAME", "VITE_CLOUDINARY_CLOUD_NAME"]),
                upload_preset: get(&["CLOUDINARY_UPLOAD_PRESET", "VITE_CLOUDINARY_UPLOAD_PRESET"]),
                folder: get(&["CLOUDINARY_FOLDER"]).unwrap_or_else(default_folder),
                timeout_secs: default_upload_timeout(),
            },
            site,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every setting and report all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if !is_http_url(&self.database.base_url) {
            problems.push(format!("database url must be http(s): {}", self.database.base_url));
        }
        if self.database.anon_key.trim().is_empty() {
            problems.push("database anon key is empty".to_string());
        }
        if self.database.timeout_secs == 0 {
            problems.push("timeout must be at least 1 second".to_string());
        }
        if self.media.timeout_secs == 0 {
            problems.push("upload timeout must be at least 1 second".to_string());
        }
        if !is_http_url(&self.site.public_base_url) {
            problems.push(format!("site url must be http(s): {}", self.site.public_base_url));
        }
        if self.site.latest_limit == 0 {
            problems.push("latest feed limit must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(NewsError::Config(problems.join("; ")))
        }
    }
}

impl MediaConfig {
    /// Whether uploads can be attempted
    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.upload_preset.is_some()
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

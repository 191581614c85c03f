//! Image host wrapper
//!
//! Uploads go straight to the image CDN with an unsigned preset; the CDN
//! returns a stable URL and a public id. Transformations are requested by
//! URL, so building delivery URLs needs no network.

use crate::config::MediaConfig;
use crate::error::{NewsError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Largest upload accepted, in bytes
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub public_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Delivery transformation; `auto` lets the CDN choose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: String,
    pub format: String,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: "auto".to_string(),
            format: "auto".to_string(),
        }
    }
}

impl ImageTransform {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    fn segment(&self) -> String {
        let mut segment = format!("f_{},q_{}", self.format, self.quality);
        if let Some(w) = self.width {
            segment.push_str(&format!(",w_{}", w));
        }
        if let Some(h) = self.height {
            segment.push_str(&format!(",h_{}", h));
        }
        segment
    }
}

/// Infer an image MIME type from the file name
pub fn image_mime_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

pub struct ImageHost {
    config: MediaConfig,
    api_base: String,
    http: Client,
}

impl ImageHost {
    pub fn new(config: MediaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            api_base: DEFAULT_API_BASE.to_string(),
            http,
        })
    }

    /// Point uploads at another API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (&self.config.cloud_name, &self.config.upload_preset) {
            (Some(cloud), Some(preset)) => Ok((cloud.as_str(), preset.as_str())),
            _ => Err(NewsError::Config(
                "image host credentials not configured".into(),
            )),
        }
    }

    /// Upload raw image bytes into the configured folder
    pub async fn upload(&self, bytes: Vec<u8>, file_name: &str) -> Result<UploadedImage> {
        let (cloud, preset) = self.credentials()?;

        let mime = image_mime_type(file_name)
            .ok_or_else(|| NewsError::invalid("file", "Please select an image file"))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(NewsError::invalid("file", "Image size must be less than 10MB"));
        }

        let size = bytes.len();
        let file = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new()
            .part("file", file)
            .text("upload_preset", preset.to_string())
            .text("folder", self.config.folder.clone());

        let url = format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            cloud
        );
        let response = self.http.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NewsError::from_status(status, format!("Upload failed: {}", body)));
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(public_id = %uploaded.public_id, bytes = size, "Image uploaded");

        Ok(UploadedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            width: uploaded.width,
            height: uploaded.height,
        })
    }

    /// Delivery URL with transformations applied by the CDN
    pub fn optimized_url(&self, public_id: &str, transform: &ImageTransform) -> Result<String> {
        let (cloud, _) = self.credentials()?;
        Ok(format!(
            "{}/{}/image/upload/{}/{}",
            DELIVERY_BASE,
            cloud,
            transform.segment(),
            public_id
        ))
    }

    /// Square thumbnail, 200px unless told otherwise
    pub fn thumbnail_url(&self, public_id: &str, size: Option<u32>) -> Result<String> {
        let size = size.unwrap_or(200);
        self.optimized_url(public_id, &ImageTransform::sized(size, size))
    }
}

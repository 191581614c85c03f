//! Auth provider wrapper
//!
//! Email one-time codes and Google sign-in are handled entirely by the
//! hosted auth service. This client only forwards the calls and turns the
//! returned user record into a [`Viewer`].

use crate::config::DatabaseConfig;
use crate::error::{NewsError, Result};
use crate::viewer::{display_name_for, Role, Viewer, ViewerId};
use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Metadata the auth service stores next to each user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// User record as the auth service returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    pub fn to_viewer(&self) -> Viewer {
        Viewer {
            id: ViewerId::new(&self.id),
            email: self.email.clone(),
            display_name: display_name_for(
                self.user_metadata.full_name.as_deref(),
                self.email.as_deref(),
            ),
            role: Role::from_metadata(self.user_metadata.role.as_deref()),
        }
    }
}

/// A signed-in session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

impl Session {
    pub fn viewer(&self) -> Viewer {
        self.user.to_viewer()
    }
}

pub struct AuthClient {
    config: DatabaseConfig,
    http: Client,
    /// Where email links and OAuth flows send the user back to
    redirect_to: String,
}

impl AuthClient {
    pub fn new(config: DatabaseConfig, redirect_to: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            http,
            redirect_to: redirect_to.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn post(&self, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let bearer = bearer.unwrap_or(&self.config.anon_key);
        self.http
            .post(self.url(path))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        // The auth service answers bad codes with 400/422
        if matches!(status, 400 | 422) {
            return Err(NewsError::Authorization(body));
        }
        Err(NewsError::from_status(status, body))
    }

    /// Email a one-time sign-in code
    pub async fn send_otp(&self, email: &str) -> Result<()> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(NewsError::invalid("email", "Enter a valid email address"));
        }

        let response = self
            .post("otp", None)
            .query(&[("redirect_to", self.redirect_to.as_str())])
            .json(&serde_json::json!({ "email": email, "create_user": true }))
            .send()
            .await?;
        Self::check(response).await?;

        debug!(email, "One-time code sent");
        Ok(())
    }

    /// Exchange an emailed code for a session
    pub async fn verify_otp(&self, email: &str, token: &str) -> Result<Session> {
        let token = token.trim();
        if token.is_empty() {
            return Err(NewsError::invalid("token", "Enter the code from your email"));
        }

        let response = self
            .post("verify", None)
            .json(&serde_json::json!({
                "type": "email",
                "email": email.trim(),
                "token": token,
            }))
            .send()
            .await?;
        let session: Session = Self::check(response).await?.json().await?;

        info!(user_id = %session.user.id, "Viewer signed in");
        Ok(session)
    }

    /// URL that starts the Google sign-in flow
    pub fn google_sign_in_url(&self) -> String {
        format!(
            "{}?provider=google&redirect_to={}",
            self.url("authorize"),
            urlencoding::encode(&self.redirect_to)
        )
    }

    /// Look up the user behind an access token
    pub async fn current_viewer(&self, access_token: &str) -> Result<Viewer> {
        let response = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;
        let user: AuthUser = Self::check(response).await?.json().await?;
        Ok(user.to_viewer())
    }

    pub async fn sign_out(&self, session: &Session) -> Result<()> {
        let response = self
            .post("logout", Some(&session.access_token))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AuthClient {
        AuthClient::new(
            DatabaseConfig {
                base_url: "https://project.supabase.co".into(),
                anon_key: "anon".into(),
                timeout_secs: 5,
            },
            "https://blog.tcoefs-unijos.org",
        )
        .unwrap()
    }

    #[test]
    fn test_google_url() {
        assert_eq!(
            client().google_sign_in_url(),
            "https://project.supabase.co/auth/v1/authorize?provider=google&redirect_to=https%3A%2F%2Fblog.tcoefs-unijos.org"
        );
    }

    #[test]
    fn test_user_to_viewer() {
        let user: AuthUser = serde_json::from_value(serde_json::json!({
            "id": "0b6c",
            "email": "editor@unijos.edu.ng",
            "user_metadata": { "role": "admin" }
        }))
        .unwrap();

        let viewer = user.to_viewer();
        assert!(viewer.is_admin());
        assert_eq!(viewer.display_name, "editor");
        assert_eq!(viewer.id, ViewerId::new("0b6c"));
    }

    #[tokio::test]
    async fn test_send_otp_rejects_bad_email_locally() {
        let err = client().send_otp("not-an-email").await.unwrap_err();
        assert!(matches!(err, NewsError::Validation(_)));
    }
}

//! Viewer identity
//!
//! The authenticated end user is handed to controllers and clients
//! explicitly. Identity itself comes from the hosted auth provider; this
//! module only shapes what it returns.

use crate::error::{NewsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier the auth provider assigns to a user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewerId(String);

impl ViewerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Role attribute carried in the provider's user metadata.
///
/// Ordered so that `role >= Role::Admin` reads as "at least admin".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Reader,
    Admin,
}

impl Role {
    pub fn from_metadata(role: Option<&str>) -> Self {
        match role {
            Some("admin") => Role::Admin,
            _ => Role::Reader,
        }
    }
}

/// The currently authenticated end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: ViewerId,
    pub email: Option<String>,
    /// Name shown next to the viewer's comments
    pub display_name: String,
    pub role: Role,
}

impl Viewer {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ViewerId::new(id),
            email: None,
            display_name: display_name.into(),
            role: Role::Reader,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role >= Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(NewsError::Authorization(format!(
                "viewer {} is not an admin",
                self.id
            )))
        }
    }
}

/// Pick the name a comment is signed with: the profile's full name, else
/// the local part of the email, else "Anonymous".
pub fn display_name_for(full_name: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Anonymous".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name_for(Some("Ada Obi"), Some("ada@unijos.edu.ng")), "Ada Obi");
        assert_eq!(display_name_for(Some("  "), Some("ada@unijos.edu.ng")), "ada");
        assert_eq!(display_name_for(None, Some("@nowhere")), "Anonymous");
        assert_eq!(display_name_for(None, None), "Anonymous");
    }

    #[test]
    fn test_role_from_metadata() {
        assert_eq!(Role::from_metadata(Some("admin")), Role::Admin);
        assert_eq!(Role::from_metadata(Some("editor")), Role::Reader);
        assert_eq!(Role::from_metadata(None), Role::Reader);
    }

    #[test]
    fn test_require_admin() {
        let reader = Viewer::new("u1", "Reader");
        assert!(matches!(reader.require_admin(), Err(NewsError::Authorization(_))));

        let admin = Viewer::new("u2", "Editor").with_role(Role::Admin);
        assert!(admin.require_admin().is_ok());
    }
}

//! User, organization, and project records.
//!
//! These arrive from the backend as JSON and are validated at the boundary
//! with [`validator::Validate`] before anything stores them.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct User {
    /// Backend user ID.
    #[validate(length(min = 1))]
    pub id: String,
    /// Primary email address.
    #[validate(email)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub is_email_verified: bool,
    /// Avatar image URL.
    #[serde(default)]
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// An organization the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Organization {
    /// Backend organization ID.
    #[validate(length(min = 1))]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[validate(length(min = 1, max = 64))]
    pub slug: String,
    /// Subscription plan, if reported.
    #[serde(default)]
    pub plan: Option<String>,
}

/// A project inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Project {
    /// Backend project ID.
    #[validate(length(min = 1))]
    pub id: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[validate(length(min = 1, max = 64))]
    pub slug: String,
    /// Owning organization ID.
    #[validate(length(min = 1))]
    pub organization_id: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

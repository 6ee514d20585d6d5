//! Types for authentication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// The user ID
    pub id: Uuid,

    /// The user's email address
    pub email: Option<String>,

    /// The user's role
    #[serde(default)]
    pub role: Option<String>,

    /// The app metadata
    #[serde(default)]
    pub app_metadata: serde_json::Value,

    /// The user metadata
    #[serde(default)]
    pub user_metadata: serde_json::Value,

    /// The creation time
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Email/password sign-in payload
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

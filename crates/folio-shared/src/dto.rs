//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Authentication ---

/// Request to obtain a token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Access and refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Request to exchange a refresh token for a new access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// The caller as seen through their access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityResponse {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

// --- Blog ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    /// Username of the post's author.
    pub author: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub category: CategoryResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment with its post embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post: PostResponse,
    /// The commenter's display name.
    pub author: Option<String>,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A visitor's comment. `body` is accepted as an alias of `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCommentRequest {
    pub post: i64,
    pub name: String,
    pub email: String,
    #[serde(alias = "body")]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentListParams {
    pub post: Option<i64>,
}

// --- Moderation ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkApproveRequest {
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkApproveResponse {
    /// Comments that moved from pending to approved.
    pub approved: u64,
}

// --- Portfolio ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub body: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillResponse {
    pub id: i64,
    pub name: String,
    pub proficiency: i32,
    pub order: i32,
}

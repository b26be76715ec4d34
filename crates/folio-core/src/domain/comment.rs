use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PostDetail, PostId};
use crate::error::DomainError;

pub type CommentId = i64;

/// Longest commenter display name accepted on submission.
pub const MAX_NAME_LEN: usize = 80;

/// Comment entity - one visitor comment on one post.
///
/// Comments are born pending and only become publicly visible once a staff
/// member approves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub name: String,
    pub email: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn state(&self) -> ModerationState {
        ModerationState::from_flag(self.is_approved)
    }

    /// Display string for the commenter, `None` when they left no name.
    pub fn author_display(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Moderation state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationState {
    Pending,
    Approved,
}

impl ModerationState {
    pub fn from_flag(is_approved: bool) -> Self {
        if is_approved {
            ModerationState::Approved
        } else {
            ModerationState::Pending
        }
    }

    pub fn is_approved(self) -> bool {
        matches!(self, ModerationState::Approved)
    }

    /// The single transition: pending <-> approved.
    pub fn toggled(self) -> Self {
        match self {
            ModerationState::Pending => ModerationState::Approved,
            ModerationState::Approved => ModerationState::Pending,
        }
    }
}

/// A comment with its post denormalized for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDetail {
    pub comment: Comment,
    pub post: PostDetail,
}

/// A visitor's comment submission.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: PostId,
    pub name: String,
    pub email: String,
    pub content: String,
}

impl NewComment {
    pub fn new(
        post_id: PostId,
        name: impl Into<String>,
        email: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            post_id,
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("name is required".to_string());
        } else if self.name.chars().count() > MAX_NAME_LEN {
            errors.push(format!("name must be at most {} characters", MAX_NAME_LEN));
        }
        if !is_plausible_email(&self.email) {
            errors.push("email must be a valid address".to_string());
        }
        if self.content.trim().is_empty() {
            errors.push("content is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors.join(", ")))
        }
    }
}

/// Email address safe for logs: `ann@example.com` becomes `a***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

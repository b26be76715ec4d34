use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slug::is_valid_slug;
use super::{Category, CategoryId, UserId};
use crate::error::DomainError;

pub type PostId = i64;

/// Post entity - a blog article. Addressable by id or by its unique slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post together with the records it references, ready for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub post: Post,
    pub category: Category,
    /// Display name of the author (their username).
    pub author: String,
}

/// Fields required to create a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub published: bool,
    pub published_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl NewPost {
    /// Draft post with no excerpt or tags.
    pub fn new(
        author_id: UserId,
        category_id: CategoryId,
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author_id,
            category_id,
            title: title.into(),
            slug: slug.into(),
            excerpt: String::new(),
            content: content.into(),
            published: false,
            published_date: None,
            tags: Vec::new(),
        }
    }

    /// Mark the post as published now.
    pub fn published(mut self) -> Self {
        self.published = true;
        self.published_date = Some(Utc::now());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() || self.title.chars().count() > 200 {
            return Err(DomainError::Validation(
                "Post title must be 1-200 characters".to_string(),
            ));
        }
        if !is_valid_slug(&self.slug) {
            return Err(DomainError::Validation(format!(
                "Invalid post slug: {}",
                self.slug
            )));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::Validation(
                "Post content is required".to_string(),
            ));
        }
        Ok(())
    }
}

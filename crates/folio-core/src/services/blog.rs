//! Public blog reads and comment submission.

use std::sync::Arc;

use crate::domain::{Category, CommentDetail, NewComment, PostDetail, PostId, mask_email};
use crate::error::DomainError;
use crate::ports::{CategoryRepository, CommentRepository, PostQuery, PostRepository};

use super::attach_posts;

#[derive(Clone)]
pub struct BlogService {
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl BlogService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            categories,
            posts,
            comments,
        }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.categories.list().await?)
    }

    pub async fn published_posts(&self, query: &PostQuery) -> Result<Vec<PostDetail>, DomainError> {
        let posts = self.posts.list_published(query).await?;
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();

        // `details` does not keep order; restore the listing's.
        let mut details = self.posts.details(&ids).await?;
        details.sort_by_key(|d| ids.iter().position(|id| *id == d.post.id));
        Ok(details)
    }

    /// A published post by slug. Drafts are reported as missing.
    pub async fn post_by_slug(&self, slug: &str) -> Result<PostDetail, DomainError> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .filter(|p| p.published)
            .ok_or_else(|| DomainError::not_found("Post", slug))?;

        self.posts
            .details(&[post.id])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found("Post", slug))
    }

    /// Approved comments, oldest first.
    pub async fn approved_comments(
        &self,
        post_id: Option<PostId>,
    ) -> Result<Vec<CommentDetail>, DomainError> {
        let approved = self.comments.list_approved(post_id).await?;
        Ok(attach_posts(self.posts.as_ref(), approved).await?)
    }

    /// Accept a visitor comment; it starts out pending.
    pub async fn submit_comment(&self, comment: NewComment) -> Result<CommentDetail, DomainError> {
        comment.validate()?;

        let post_id = comment.post_id;
        let email = mask_email(&comment.email);
        let created = self
            .comments
            .create(comment)
            .await
            .map_err(|e| e.or_not_found("Post", post_id))?;

        tracing::info!(
            comment_id = created.id,
            post_id,
            email = %email,
            "Comment submitted for moderation"
        );

        attach_posts(self.posts.as_ref(), vec![created])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }
}

//! Comment moderation: the pending queue, the approval toggle and the bulk
//! approve action. Every operation checks the caller before reading.

use std::sync::Arc;

use crate::access::{Caller, require_staff};
use crate::domain::{CommentDetail, CommentId};
use crate::error::DomainError;
use crate::ports::{CommentRepository, PostRepository};

use super::attach_posts;

#[derive(Clone)]
pub struct ModerationService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl ModerationService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Pending comments, newest first.
    pub async fn pending(&self, caller: &Caller) -> Result<Vec<CommentDetail>, DomainError> {
        require_staff(caller)?;

        let pending = self.comments.list_pending().await?;
        Ok(attach_posts(self.posts.as_ref(), pending).await?)
    }

    /// Flip one comment between pending and approved.
    pub async fn toggle_approval(
        &self,
        caller: &Caller,
        id: CommentId,
    ) -> Result<CommentDetail, DomainError> {
        let moderator = require_staff(caller)?;

        let current = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", id))?;

        let next = current.state().toggled();
        let updated = self
            .comments
            .set_approved(id, next.is_approved())
            .await
            .map_err(|e| e.or_not_found("Comment", id))?;

        tracing::info!(
            comment_id = id,
            moderator = %moderator.username,
            state = ?next,
            "Comment approval toggled"
        );

        attach_posts(self.posts.as_ref(), vec![updated])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found("Comment", id))
    }

    /// Approve several comments at once; returns how many changed.
    pub async fn approve_selected(
        &self,
        caller: &Caller,
        ids: &[CommentId],
    ) -> Result<u64, DomainError> {
        let moderator = require_staff(caller)?;

        if ids.is_empty() {
            return Ok(0);
        }

        let approved = self.comments.approve_many(ids).await?;
        tracing::info!(
            requested = ids.len(),
            approved,
            moderator = %moderator.username,
            "Comments approved in bulk"
        );
        Ok(approved)
    }
}

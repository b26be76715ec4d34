//! Application services - the use cases the HTTP layer calls into.

mod blog;
mod moderation;

pub use blog::BlogService;
pub use moderation::ModerationService;

use std::collections::HashMap;

use crate::domain::{Comment, CommentDetail, PostId};
use crate::error::RepoError;
use crate::ports::PostRepository;

/// Resolve the post of every comment, preserving the comments' order.
pub(crate) async fn attach_posts(
    posts: &dyn PostRepository,
    comments: Vec<Comment>,
) -> Result<Vec<CommentDetail>, RepoError> {
    let mut ids: Vec<PostId> = comments.iter().map(|c| c.post_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let by_id: HashMap<PostId, _> = posts
        .details(&ids)
        .await?
        .into_iter()
        .map(|detail| (detail.post.id, detail))
        .collect();

    Ok(comments
        .into_iter()
        .filter_map(|comment| match by_id.get(&comment.post_id) {
            Some(post) => Some(CommentDetail {
                post: post.clone(),
                comment,
            }),
            None => {
                tracing::warn!(
                    comment_id = comment.id,
                    post_id = comment.post_id,
                    "Comment references a missing post"
                );
                None
            }
        })
        .collect())
}

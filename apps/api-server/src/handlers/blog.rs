//! Public blog endpoints.

use actix_web::{HttpResponse, web};

use folio_core::domain::NewComment;
use folio_core::ports::{PostOrdering, PostQuery};
use folio_shared::dto::{CommentListParams, PostListParams, SubmitCommentRequest};

use super::present;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/categories/
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let categories = state.blog.categories().await?;

    Ok(HttpResponse::Ok().json(categories.iter().map(present::category).collect::<Vec<_>>()))
}

/// GET /api/posts/
pub async fn list_posts(
    state: web::Data<AppState>,
    params: web::Query<PostListParams>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();

    let ordering = match params.ordering.as_deref() {
        None | Some("") => PostOrdering::default(),
        Some(value) => PostOrdering::parse(value)
            .ok_or_else(|| AppError::BadRequest(format!("Unsupported ordering '{}'", value)))?,
    };

    let query = PostQuery {
        category: params.category.filter(|c| !c.is_empty()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        ordering,
    };

    let posts = state.blog.published_posts(&query).await?;

    Ok(HttpResponse::Ok().json(posts.iter().map(present::post).collect::<Vec<_>>()))
}

/// GET /api/posts/{slug}/
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.blog.post_by_slug(&path).await?;

    Ok(HttpResponse::Ok().json(present::post(&post)))
}

/// GET /api/comments/
pub async fn list_comments(
    state: web::Data<AppState>,
    params: web::Query<CommentListParams>,
) -> AppResult<HttpResponse> {
    let comments = state.blog.approved_comments(params.post).await?;

    Ok(HttpResponse::Ok().json(present::comments(&comments)))
}

/// POST /api/comments/add/
pub async fn submit_comment(
    state: web::Data<AppState>,
    body: web::Json<SubmitCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let created = state
        .blog
        .submit_comment(NewComment::new(req.post, req.name, req.email, req.content))
        .await?;

    Ok(HttpResponse::Created().json(present::comment(&created)))
}

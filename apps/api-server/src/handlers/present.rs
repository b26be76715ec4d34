//! Domain records to wire DTOs.

use folio_core::domain::{Category, CommentDetail, PostDetail, Project, Skill};
use folio_shared::dto::{
    CategoryResponse, CommentResponse, PostResponse, ProjectResponse, SkillResponse,
};

pub fn category(category: &Category) -> CategoryResponse {
    CategoryResponse {
        id: category.id,
        name: category.name.clone(),
        slug: category.slug.clone(),
    }
}

pub fn post(detail: &PostDetail) -> PostResponse {
    let post = &detail.post;
    PostResponse {
        id: post.id,
        author: detail.author.clone(),
        title: post.title.clone(),
        slug: post.slug.clone(),
        excerpt: post.excerpt.clone(),
        content: post.content.clone(),
        published: post.published,
        published_date: post.published_date,
        tags: post.tags.clone(),
        category: category(&detail.category),
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// The commenter's email never leaves the server.
pub fn comment(detail: &CommentDetail) -> CommentResponse {
    let comment = &detail.comment;
    CommentResponse {
        id: comment.id,
        post: post(&detail.post),
        author: comment.author_display().map(str::to_string),
        content: comment.content.clone(),
        is_approved: comment.is_approved,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

pub fn comments(details: &[CommentDetail]) -> Vec<CommentResponse> {
    details.iter().map(comment).collect()
}

pub fn project(project: &Project) -> ProjectResponse {
    ProjectResponse {
        id: project.id,
        title: project.title.clone(),
        slug: project.slug.clone(),
        short_description: project.short_description.clone(),
        body: project.body.clone(),
        github_url: project.github_url.clone(),
        demo_url: project.demo_url.clone(),
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

pub fn skill(skill: &Skill) -> SkillResponse {
    SkillResponse {
        id: skill.id,
        name: skill.name.clone(),
        proficiency: skill.proficiency,
        order: skill.order,
    }
}

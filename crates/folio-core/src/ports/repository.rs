use async_trait::async_trait;

use crate::domain::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewPost, NewProject,
    NewSkill, NewUser, Post, PostDetail, PostId, Project, ProjectId, Skill, User, UserId,
};
use crate::error::RepoError;

/// Lookup by primary key, shared by every repository.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, UserId> {
    /// Find a user by their login name.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Fails with `Constraint` when the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, CategoryId> {
    /// All categories, by name.
    async fn list(&self) -> Result<Vec<Category>, RepoError>;

    async fn create(&self, category: NewCategory) -> Result<Category, RepoError>;

    /// Delete a category, its posts and their comments in one transaction.
    async fn delete(&self, id: CategoryId) -> Result<(), RepoError>;
}

/// Sort order for published post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    CreatedAsc,
    #[default]
    CreatedDesc,
    UpdatedAsc,
    UpdatedDesc,
}

impl PostOrdering {
    /// Parse an `ordering` query value such as `-created_at`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(PostOrdering::CreatedAsc),
            "-created_at" => Some(PostOrdering::CreatedDesc),
            "updated_at" => Some(PostOrdering::UpdatedAsc),
            "-updated_at" => Some(PostOrdering::UpdatedDesc),
            _ => None,
        }
    }
}

/// Filters for published post listings.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Exact category name.
    pub category: Option<String>,
    /// Case-insensitive match against title or content.
    pub search: Option<String>,
    pub ordering: PostOrdering,
}

#[async_trait]
pub trait PostRepository: BaseRepository<Post, PostId> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Published posts matching the query.
    async fn list_published(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError>;

    /// Fails with `NotFound` when the category or author does not exist and
    /// with `Constraint` when the slug is taken.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Posts with their category and author resolved. Unknown ids are skipped.
    async fn details(&self, ids: &[PostId]) -> Result<Vec<PostDetail>, RepoError>;

    /// Delete a post and its comments in one transaction.
    async fn delete(&self, id: PostId) -> Result<(), RepoError>;
}

/// The comment store.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, CommentId> {
    /// Persist a pending comment. Fails with `NotFound` if the post is absent.
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Approved comments, oldest first, optionally for a single post.
    async fn list_approved(&self, post_id: Option<PostId>) -> Result<Vec<Comment>, RepoError>;

    /// The moderation queue: pending comments, newest first.
    async fn list_pending(&self) -> Result<Vec<Comment>, RepoError>;

    /// Set the approval flag and bump `updated_at` as one row update.
    async fn set_approved(&self, id: CommentId, value: bool) -> Result<Comment, RepoError>;

    /// Approve every listed comment; returns the number of rows changed.
    async fn approve_many(&self, ids: &[CommentId]) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait PortfolioRepository: BaseRepository<Project, ProjectId> {
    /// Projects, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>, RepoError>;

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>, RepoError>;

    async fn create_project(&self, project: NewProject) -> Result<Project, RepoError>;

    /// Skills by display order.
    async fn list_skills(&self) -> Result<Vec<Skill>, RepoError>;

    async fn create_skill(&self, skill: NewSkill) -> Result<Skill, RepoError>;
}

//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use folio_core::domain::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewPost, NewProject,
    NewSkill, NewUser, Post, PostDetail, PostId, Project, Skill, User,
};
use folio_core::error::RepoError;
use folio_core::ports::{
    CategoryRepository, CommentRepository, PortfolioRepository, PostOrdering, PostQuery,
    PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::project::{self, Entity as ProjectEntity};
use super::entity::skill::{self, Entity as SkillEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// `LIKE` pattern matching `term` literally anywhere in the value.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment store.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL portfolio repository (projects and skills).
pub type PostgresPortfolioRepository = PostgresBaseRepository<ProjectEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let active: user::ActiveModel = new_user.into();
        let model = active.insert(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, new_category: NewCategory) -> Result<Category, RepoError> {
        let active: category::ActiveModel = new_category.into();
        let model = active.insert(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }

    async fn delete(&self, id: CategoryId) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(query_error)?;

        let post_ids: Vec<PostId> = PostEntity::find()
            .filter(post::Column::CategoryId.eq(id))
            .all(&txn)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|p| p.id)
            .collect();

        if !post_ids.is_empty() {
            CommentEntity::delete_many()
                .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
                .exec(&txn)
                .await
                .map_err(query_error)?;
            PostEntity::delete_many()
                .filter(post::Column::CategoryId.eq(id))
                .exec(&txn)
                .await
                .map_err(query_error)?;
        }

        let result = CategoryEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(query_error)?;
        if result.rows_affected == 0 {
            // Dropping the transaction rolls it back.
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(query_error)?;
        tracing::info!(category_id = id, posts = post_ids.len(), "Category deleted");
        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_published(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let mut select = PostEntity::find().filter(post::Column::Published.eq(true));

        if let Some(name) = &query.category {
            select = select
                .inner_join(CategoryEntity)
                .filter(category::Column::Name.eq(name.as_str()));
        }

        if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
            let pattern = contains_pattern(&term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((PostEntity, post::Column::Title))))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((PostEntity, post::Column::Content))))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }

        select = match query.ordering {
            PostOrdering::CreatedAsc => select
                .order_by_asc(post::Column::CreatedAt)
                .order_by_asc(post::Column::Id),
            PostOrdering::CreatedDesc => select
                .order_by_desc(post::Column::CreatedAt)
                .order_by_desc(post::Column::Id),
            PostOrdering::UpdatedAsc => select
                .order_by_asc(post::Column::UpdatedAt)
                .order_by_asc(post::Column::Id),
            PostOrdering::UpdatedDesc => select
                .order_by_desc(post::Column::UpdatedAt)
                .order_by_desc(post::Column::Id),
        };

        let result = select.all(&self.db).await.map_err(query_error)?;
        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let active: post::ActiveModel = new_post.into();
        let model = active.insert(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }

    async fn details(&self, ids: &[PostId]) -> Result<Vec<PostDetail>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = PostEntity::find()
            .filter(post::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(query_error)?;

        let category_ids: Vec<i64> = posts.iter().map(|p| p.category_id).collect();
        let author_ids: Vec<i64> = posts.iter().map(|p| p.author_id).collect();

        let categories: HashMap<i64, Category> = CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|c| (c.id, c.into()))
            .collect();

        let authors: HashMap<i64, String> = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids))
            .all(&self.db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(posts
            .into_iter()
            .filter_map(|model| {
                let category = categories.get(&model.category_id).cloned()?;
                let author = authors.get(&model.author_id).cloned().unwrap_or_default();
                Some(PostDetail {
                    post: model.into(),
                    category,
                    author,
                })
            })
            .collect())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(query_error)?;

        let comments = CommentEntity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(query_error)?;

        let result = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(query_error)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(query_error)?;
        tracing::info!(
            post_id = id,
            comments = comments.rows_affected,
            "Post deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let post_exists = PostEntity::find_by_id(new_comment.post_id)
            .select_only()
            .column(post::Column::Id)
            .into_tuple::<i64>()
            .one(&self.db)
            .await
            .map_err(query_error)?
            .is_some();
        if !post_exists {
            return Err(RepoError::NotFound);
        }

        let active: comment::ActiveModel = new_comment.into();
        let model = active.insert(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }

    async fn list_approved(&self, post_id: Option<PostId>) -> Result<Vec<Comment>, RepoError> {
        let mut select = CommentEntity::find().filter(comment::Column::IsApproved.eq(true));
        if let Some(post_id) = post_id {
            select = select.filter(comment::Column::PostId.eq(post_id));
        }

        let result = select
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn list_pending(&self) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::IsApproved.eq(false))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn set_approved(&self, id: CommentId, value: bool) -> Result<Comment, RepoError> {
        // UPDATE .. WHERE id = $1 RETURNING *; a missing row surfaces as RecordNotUpdated.
        let active = comment::ActiveModel {
            id: ActiveValue::Unchanged(id),
            is_approved: Set(value),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active.update(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }

    async fn approve_many(&self, ids: &[CommentId]) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = CommentEntity::update_many()
            .col_expr(comment::Column::IsApproved, Expr::value(true))
            .col_expr(comment::Column::UpdatedAt, Expr::value(now))
            .filter(comment::Column::Id.is_in(ids.iter().copied()))
            .filter(comment::Column::IsApproved.eq(false))
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl PortfolioRepository for PostgresPortfolioRepository {
    async fn list_projects(&self) -> Result<Vec<Project>, RepoError> {
        let result = ProjectEntity::find()
            .order_by_desc(project::Column::CreatedAt)
            .order_by_desc(project::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>, RepoError> {
        let result = ProjectEntity::find()
            .filter(project::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn create_project(&self, new_project: NewProject) -> Result<Project, RepoError> {
        let active: project::ActiveModel = new_project.into();
        let model = active.insert(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, RepoError> {
        let result = SkillEntity::find()
            .order_by_asc(skill::Column::DisplayOrder)
            .order_by_asc(skill::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create_skill(&self, new_skill: NewSkill) -> Result<Skill, RepoError> {
        let active: skill::ActiveModel = new_skill.into();
        let model = active.insert(&self.db).await.map_err(query_error)?;
        Ok(model.into())
    }
}

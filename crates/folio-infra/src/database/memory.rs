//! In-memory store - used when no database is configured, and in tests.
//!
//! Every table lives behind one async `RwLock`, so each repository call,
//! including the cascading deletes, is a single critical section.
//! Note: Data is lost on process restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use folio_core::domain::{
    Category, CategoryId, Comment, CommentId, NewCategory, NewComment, NewPost, NewProject,
    NewSkill, NewUser, Post, PostDetail, PostId, Project, ProjectId, Skill, SkillId, User, UserId,
};
use folio_core::error::RepoError;
use folio_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, PortfolioRepository, PostOrdering,
    PostQuery, PostRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    projects: BTreeMap<ProjectId, Project>,
    skills: BTreeMap<SkillId, Skill>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// All repositories over a single in-process store.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn taken(what: &str, value: &str) -> RepoError {
    RepoError::Constraint(format!("{} '{}' already exists", what, value))
}

#[async_trait]
impl BaseRepository<User, UserId> for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(taken("username", &new_user.username));
        }

        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_staff: new_user.is_staff,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BaseRepository<Category, CategoryId> for InMemoryStore {
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create(&self, new_category: NewCategory) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .values()
            .any(|c| c.slug == new_category.slug)
        {
            return Err(taken("category slug", &new_category.slug));
        }

        let category = Category {
            id: tables.next_id(),
            name: new_category.name,
            slug: new_category.slug,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: CategoryId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let post_ids: Vec<PostId> = tables
            .posts
            .values()
            .filter(|p| p.category_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in &post_ids {
            tables.posts.remove(post_id);
        }
        tables.comments.retain(|_, c| !post_ids.contains(&c.post_id));

        tracing::info!(category_id = id, posts = post_ids.len(), "Category deleted");
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Post, PostId> for InMemoryStore {
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn list_published(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        let term = query
            .search
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.published)
            .filter(|p| match &query.category {
                Some(name) => tables
                    .categories
                    .get(&p.category_id)
                    .is_some_and(|c| &c.name == name),
                None => true,
            })
            .filter(|p| match &term {
                Some(term) => {
                    p.title.to_lowercase().contains(term.as_str())
                        || p.content.to_lowercase().contains(term.as_str())
                }
                None => true,
            })
            .cloned()
            .collect();

        match query.ordering {
            PostOrdering::CreatedAsc => posts.sort_by_key(|p| (p.created_at, p.id)),
            PostOrdering::CreatedDesc => {
                posts.sort_by_key(|p| std::cmp::Reverse((p.created_at, p.id)))
            }
            PostOrdering::UpdatedAsc => posts.sort_by_key(|p| (p.updated_at, p.id)),
            PostOrdering::UpdatedDesc => {
                posts.sort_by_key(|p| std::cmp::Reverse((p.updated_at, p.id)))
            }
        }
        Ok(posts)
    }

    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&new_post.category_id)
            || !tables.users.contains_key(&new_post.author_id)
        {
            return Err(RepoError::NotFound);
        }
        if tables.posts.values().any(|p| p.slug == new_post.slug) {
            return Err(taken("post slug", &new_post.slug));
        }

        let now = Utc::now();
        let post = Post {
            id: tables.next_id(),
            author_id: new_post.author_id,
            category_id: new_post.category_id,
            title: new_post.title,
            slug: new_post.slug,
            excerpt: new_post.excerpt,
            content: new_post.content,
            published: new_post.published,
            published_date: new_post.published_date,
            tags: new_post.tags,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn details(&self, ids: &[PostId]) -> Result<Vec<PostDetail>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.posts.get(id))
            .filter_map(|post| {
                let category = tables.categories.get(&post.category_id)?.clone();
                let author = tables
                    .users
                    .get(&post.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default();
                Some(PostDetail {
                    post: post.clone(),
                    category,
                    author,
                })
            })
            .collect())
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let before = tables.comments.len();
        tables.comments.retain(|_, c| c.post_id != id);
        tracing::info!(
            post_id = id,
            comments = before - tables.comments.len(),
            "Post deleted"
        );
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Comment, CommentId> for InMemoryStore {
    async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&new_comment.post_id) {
            return Err(RepoError::NotFound);
        }

        let now = Utc::now();
        let comment = Comment {
            id: tables.next_id(),
            post_id: new_comment.post_id,
            name: new_comment.name,
            email: new_comment.email,
            content: new_comment.content,
            is_approved: false,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_approved(&self, post_id: Option<PostId>) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.is_approved)
            .filter(|c| post_id.is_none_or(|id| c.post_id == id))
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn list_pending(&self) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| !c.is_approved)
            .cloned()
            .collect();
        comments.sort_by_key(|c| std::cmp::Reverse((c.created_at, c.id)));
        Ok(comments)
    }

    async fn set_approved(&self, id: CommentId, value: bool) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        let comment = tables.comments.get_mut(&id).ok_or(RepoError::NotFound)?;
        comment.is_approved = value;
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn approve_many(&self, ids: &[CommentId]) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for id in ids {
            if let Some(comment) = tables.comments.get_mut(id) {
                if !comment.is_approved {
                    comment.is_approved = true;
                    comment.updated_at = now;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl BaseRepository<Project, ProjectId> for InMemoryStore {
    async fn find_by_id(&self, id: ProjectId) -> Result<Option<Project>, RepoError> {
        Ok(self.tables.read().await.projects.get(&id).cloned())
    }
}

#[async_trait]
impl PortfolioRepository for InMemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, RepoError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables.projects.values().cloned().collect();
        projects.sort_by_key(|p| std::cmp::Reverse((p.created_at, p.id)));
        Ok(projects)
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.values().find(|p| p.slug == slug).cloned())
    }

    async fn create_project(&self, new_project: NewProject) -> Result<Project, RepoError> {
        let mut tables = self.tables.write().await;
        let slug = new_project.effective_slug();
        if tables
            .projects
            .values()
            .any(|p| p.slug == slug || p.title == new_project.title)
        {
            return Err(taken("project", &new_project.title));
        }

        let now = Utc::now();
        let project = Project {
            id: tables.next_id(),
            title: new_project.title,
            slug,
            short_description: new_project.short_description,
            body: new_project.body,
            github_url: new_project.github_url,
            demo_url: new_project.demo_url,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, RepoError> {
        let tables = self.tables.read().await;
        let mut skills: Vec<Skill> = tables.skills.values().cloned().collect();
        skills.sort_by_key(|s| (s.order, s.id));
        Ok(skills)
    }

    async fn create_skill(&self, new_skill: NewSkill) -> Result<Skill, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.skills.values().any(|s| s.name == new_skill.name) {
            return Err(taken("skill", &new_skill.name));
        }

        let skill = Skill {
            id: tables.next_id(),
            name: new_skill.name,
            proficiency: new_skill.proficiency,
            order: new_skill.order,
        };
        tables.skills.insert(skill.id, skill.clone());
        Ok(skill)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct Fixture {
        store: Arc<InMemoryStore>,
        post: Post,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let author = UserRepository::create(
            &*store,
            NewUser {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password_hash: "hash".to_string(),
                is_staff: true,
            },
        )
        .await
        .unwrap();
        let category = CategoryRepository::create(&*store, NewCategory::new("Rust", "rust"))
            .await
            .unwrap();
        let post = PostRepository::create(
            &*store,
            NewPost::new(author.id, category.id, "Hello", "hello-world", "Body").published(),
        )
        .await
        .unwrap();
        Fixture { store, post }
    }

    fn comments(store: &Arc<InMemoryStore>) -> Arc<dyn CommentRepository> {
        store.clone()
    }

    #[tokio::test]
    async fn test_comment_is_born_pending() {
        let fx = fixture().await;
        let comments = comments(&fx.store);

        let comment = comments
            .create(NewComment::new(fx.post.id, "Ann", "ann@x.com", "Nice post"))
            .await
            .unwrap();

        assert!(!comment.is_approved);
        assert_eq!(comment.created_at, comment.updated_at);
        assert_eq!(comments.find_by_id(comment.id).await.unwrap(), Some(comment));
    }

    #[tokio::test]
    async fn test_create_on_missing_post_fails() {
        let fx = fixture().await;
        let comments = comments(&fx.store);

        let result = comments
            .create(NewComment::new(9999, "Ann", "ann@x.com", "Hi"))
            .await;

        assert!(matches!(result, Err(RepoError::NotFound)));
        assert!(comments.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_newest_first_and_approved_oldest_first() {
        let fx = fixture().await;
        let comments = comments(&fx.store);

        let mut ids = Vec::new();
        for n in 0..3 {
            let c = comments
                .create(NewComment::new(fx.post.id, "Ann", "ann@x.com", format!("#{n}")))
                .await
                .unwrap();
            ids.push(c.id);
        }

        let pending: Vec<CommentId> = comments
            .list_pending()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(pending, vec![ids[2], ids[1], ids[0]]);

        comments.set_approved(ids[0], true).await.unwrap();
        comments.set_approved(ids[2], true).await.unwrap();

        let approved: Vec<CommentId> = comments
            .list_approved(Some(fx.post.id))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(approved, vec![ids[0], ids[2]]);

        let pending = comments.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending.iter().all(|c| !c.is_approved));
    }

    #[tokio::test]
    async fn test_set_approved_missing_comment() {
        let fx = fixture().await;
        let comments = comments(&fx.store);

        let result = comments.set_approved(42, true).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
        assert!(comments.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_approve_many_counts_only_changes() {
        let fx = fixture().await;
        let comments = comments(&fx.store);

        let a = comments
            .create(NewComment::new(fx.post.id, "Ann", "ann@x.com", "a"))
            .await
            .unwrap();
        let b = comments
            .create(NewComment::new(fx.post.id, "Bob", "bob@x.com", "b"))
            .await
            .unwrap();
        comments.set_approved(a.id, true).await.unwrap();

        let changed = comments.approve_many(&[a.id, b.id, 777]).await.unwrap();
        assert_eq!(changed, 1);
        assert!(comments.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_post_cascades_to_comments() {
        let fx = fixture().await;
        let comments = comments(&fx.store);
        let posts: Arc<dyn PostRepository> = fx.store.clone();

        let c = comments
            .create(NewComment::new(fx.post.id, "Ann", "ann@x.com", "a"))
            .await
            .unwrap();

        posts.delete(fx.post.id).await.unwrap();

        assert!(posts.find_by_id(fx.post.id).await.unwrap().is_none());
        assert!(comments.find_by_id(c.id).await.unwrap().is_none());
        assert!(matches!(
            posts.delete(fx.post.id).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_category_cascades_to_posts_and_comments() {
        let fx = fixture().await;
        let comments = comments(&fx.store);
        let posts: Arc<dyn PostRepository> = fx.store.clone();
        let categories: Arc<dyn CategoryRepository> = fx.store.clone();

        let c = comments
            .create(NewComment::new(fx.post.id, "Ann", "ann@x.com", "a"))
            .await
            .unwrap();

        categories.delete(fx.post.category_id).await.unwrap();

        assert!(categories.list().await.unwrap().is_empty());
        assert!(posts.find_by_slug("hello-world").await.unwrap().is_none());
        assert!(comments.find_by_id(c.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_slug_is_unique() {
        let fx = fixture().await;
        let posts: Arc<dyn PostRepository> = fx.store.clone();

        let dup = NewPost::new(fx.post.author_id, fx.post.category_id, "Again", "hello-world", "x");
        assert!(matches!(
            posts.create(dup).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_list_published_filters() {
        let fx = fixture().await;
        let posts: Arc<dyn PostRepository> = fx.store.clone();

        posts
            .create(NewPost::new(
                fx.post.author_id,
                fx.post.category_id,
                "Draft",
                "draft",
                "hidden",
            ))
            .await
            .unwrap();

        let all = posts.list_published(&PostQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].slug, "hello-world");

        let query = PostQuery {
            search: Some("HELLO".to_string()),
            ..Default::default()
        };
        assert_eq!(posts.list_published(&query).await.unwrap().len(), 1);

        let query = PostQuery {
            category: Some("Go".to_string()),
            ..Default::default()
        };
        assert!(posts.list_published(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_portfolio_ordering() {
        let store = InMemoryStore::new();

        store
            .create_skill(NewSkill::new("SQL", 70, 2))
            .await
            .unwrap();
        store
            .create_skill(NewSkill::new("Rust", 90, 1))
            .await
            .unwrap();
        let names: Vec<String> = store
            .list_skills()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Rust", "SQL"]);

        let project = store
            .create_project(NewProject::new("Folio Site", "My site", "Body"))
            .await
            .unwrap();
        assert_eq!(project.slug, "folio-site");
        assert_eq!(
            store.find_project_by_slug("folio-site").await.unwrap(),
            Some(project)
        );
    }
}

//! Domain entities - the core business objects.

mod category;
mod comment;
mod portfolio;
mod post;
pub mod slug;
mod user;

pub use category::{Category, CategoryId, NewCategory};
pub use comment::{Comment, CommentDetail, CommentId, ModerationState, NewComment, mask_email};
pub use portfolio::{NewProject, NewSkill, Project, ProjectId, Skill, SkillId};
pub use post::{NewPost, Post, PostDetail, PostId};
pub use user::{NewUser, User, UserId};

//! SeaORM entities, one per table.

pub mod category;
pub mod comment;
pub mod post;
pub mod project;
pub mod skill;
pub mod user;

//! Portfolio project entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub short_description: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for folio_core::domain::Project {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            short_description: model.short_description,
            body: model.body,
            github_url: model.github_url,
            demo_url: model.demo_url,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<folio_core::domain::NewProject> for ActiveModel {
    fn from(project: folio_core::domain::NewProject) -> Self {
        let now = chrono::Utc::now();
        Self {
            slug: Set(project.effective_slug()),
            title: Set(project.title),
            short_description: Set(project.short_description),
            body: Set(project.body),
            github_url: Set(project.github_url),
            demo_url: Set(project.demo_url),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
    }
}

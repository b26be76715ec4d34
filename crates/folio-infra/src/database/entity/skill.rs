//! Skill entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "skills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub proficiency: i32,
    pub display_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for folio_core::domain::Skill {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            proficiency: model.proficiency,
            order: model.display_order,
        }
    }
}

impl From<folio_core::domain::NewSkill> for ActiveModel {
    fn from(skill: folio_core::domain::NewSkill) -> Self {
        Self {
            name: Set(skill.name),
            proficiency: Set(skill.proficiency),
            display_order: Set(skill.order),
            ..Default::default()
        }
    }
}

use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_blog_tables::{pk, timestamp};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(pk(Projects::Id))
                    .col(
                        ColumnDef::new(Projects::Title)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Projects::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Projects::ShortDescription)
                            .string_len(300)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Projects::Body).text().not_null())
                    .col(ColumnDef::new(Projects::GithubUrl).string())
                    .col(ColumnDef::new(Projects::DemoUrl).string())
                    .col(timestamp(Projects::CreatedAt))
                    .col(timestamp(Projects::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Skills::Table)
                    .if_not_exists()
                    .col(pk(Skills::Id))
                    .col(
                        ColumnDef::new(Skills::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Skills::Proficiency).integer().not_null())
                    .col(
                        ColumnDef::new(Skills::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .check(Expr::col(Skills::Proficiency).between(1, 100))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Skills::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    Title,
    Slug,
    ShortDescription,
    Body,
    GithubUrl,
    DemoUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Skills {
    Table,
    Id,
    Name,
    Proficiency,
    DisplayOrder,
}

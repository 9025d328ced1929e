//! Create lots table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lots::Name).string().not_null())
                    .col(ColumnDef::new(Lots::Address).string().not_null())
                    .col(ColumnDef::new(Lots::PostalCode).string().not_null())
                    .col(
                        ColumnDef::new(Lots::PricePerHourCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Lots::Capacity).integer().not_null())
                    .col(
                        ColumnDef::new(Lots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Lots {
    Table,
    Id,
    Name,
    Address,
    PostalCode,
    PricePerHourCents,
    Capacity,
    CreatedAt,
}

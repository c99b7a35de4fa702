use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("seasons")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("series_id").integer().not_null())
                    .col(ColumnDef::new("season_number").integer().not_null())
                    .col(ColumnDef::new("created_at").timestamp().not_null())
                    .col(ColumnDef::new("updated_at").timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seasons_series_id")
                            .from("seasons", "series_id")
                            .to("series", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_seasons_series_number")
                    .table("seasons")
                    .col("series_id")
                    .col("season_number")
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("episodes")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("season_id").integer().not_null())
                    .col(ColumnDef::new("episode_number").integer().not_null())
                    .col(ColumnDef::new("episode_title").string_len(255).not_null())
                    .col(ColumnDef::new("content").text())
                    .col(ColumnDef::new("created_at").timestamp().not_null())
                    .col(ColumnDef::new("updated_at").timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_episodes_season_id")
                            .from("episodes", "season_id")
                            .to("seasons", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_episodes_season_number")
                    .table("episodes")
                    .col("season_id")
                    .col("episode_number")
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order
        manager
            .drop_table(Table::drop().table("episodes").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("seasons").to_owned())
            .await?;

        Ok(())
    }
}

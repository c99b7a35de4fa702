use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table("series")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new("title").string_len(255).not_null())
                    .col(ColumnDef::new("description").text())
                    .col(ColumnDef::new("photo").string())
                    .col(ColumnDef::new("created_at").timestamp().not_null())
                    .col(ColumnDef::new("updated_at").timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Series are looked up by title on every import
        manager
            .create_index(
                Index::create()
                    .name("idx_series_title")
                    .table("series")
                    .col("title")
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("genres")
                    .if_not_exists()
                    .col(
                        ColumnDef::new("id")
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new("name")
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new("created_at").timestamp().not_null())
                    .col(ColumnDef::new("updated_at").timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create series_genres junction table
        manager
            .create_table(
                Table::create()
                    .table("series_genres")
                    .if_not_exists()
                    .col(ColumnDef::new("series_id").integer().not_null())
                    .col(ColumnDef::new("genre_id").integer().not_null())
                    .primary_key(Index::create().col("series_id").col("genre_id"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_series_genres_series_id")
                            .from("series_genres", "series_id")
                            .to("series", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_series_genres_genre_id")
                            .from("series_genres", "genre_id")
                            .to("genres", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table("series_genres").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("genres").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table("series").to_owned())
            .await?;

        Ok(())
    }
}

use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "series_genres")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub series_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub genre_id: i64,

    #[sea_orm(belongs_to, from = "series_id", to = "id")]
    pub series: Option<super::series::Entity>,
    #[sea_orm(belongs_to, from = "genre_id", to = "id")]
    pub genre: Option<super::genre::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

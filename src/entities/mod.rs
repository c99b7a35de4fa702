pub mod episode;
pub mod genre;
pub mod season;
pub mod series;
pub mod series_genre;

//! Query layer. Every function takes the pool last and reports failures as
//! [`crate::error::Error`]; functions taking a [`crate::jwt::SessionData`]
//! check the caller's permissions before touching the store.

mod cooking;
mod favorites;
mod images;
mod ingredients;
mod points;
mod recipes;
mod tags;
mod users;

pub use cooking::*;
pub use favorites::*;
pub use images::*;
pub use ingredients::*;
pub use points::*;
pub use recipes::*;
pub use tags::*;
pub use users::*;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{
    config::Config,
    error::{Error, QueryError},
};

pub async fn connect(config: &Config) -> Result<Pool<Postgres>, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(QueryError::from)?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations applied");
    }

    Ok(pool)
}

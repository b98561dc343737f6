use sqlx::{Executor, Pool, Postgres};

use crate::error::{Error, QueryError};

pub async fn get_user_points(user_id: &str, pool: &Pool<Postgres>) -> Result<i64, Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT points FROM user_points WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.map(|row| row.0).unwrap_or(0))
}

/// Adds to the running total and returns the new total. Totals never go below zero.
pub async fn add_points<'e, E>(user_id: &str, points: i64, executor: E) -> Result<i64, Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: (i64,) = sqlx::query_as(
        "
        INSERT INTO user_points (user_id, points) VALUES ($1, GREATEST($2, 0))
        ON CONFLICT (user_id) DO UPDATE
        SET points = GREATEST(user_points.points + $2, 0), updated_at = now()
        RETURNING points
    ",
    )
    .bind(user_id)
    .bind(points)
    .fetch_one(executor)
    .await
    .map_err(QueryError::from)?;

    Ok(row.0)
}

use serde::Serialize;
use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::USER_COUNT_PER_PAGE,
    error::{Error, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    progress::points::level_for_points,
    schema::{UserPoints, UserSummaryRow},
};

use super::recipes::contains_pattern;

/// A user as the admin pages list them.
#[derive(Debug, Clone, Serialize)]
pub struct UserOverview {
    pub user_id: String,
    pub points: i64,
    pub level: u32,
    pub recipe_count: i64,
    pub session_count: i64,
}

impl From<UserSummaryRow> for UserOverview {
    fn from(row: UserSummaryRow) -> Self {
        Self {
            level: level_for_points(row.points),
            user_id: row.user_id,
            points: row.points,
            recipe_count: row.recipe_count,
            session_count: row.session_count,
        }
    }
}

/// Every user that has authored, cooked or earned anything.
pub async fn list_users(
    session: &SessionData,
    search: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserOverview>, Error> {
    session.authenticate(ActionType::ManageUsers)?;

    let rows: Vec<UserSummaryRow> = sqlx::query_as(
        "
        WITH ids AS (
            SELECT user_id FROM user_points
            UNION SELECT author_id FROM recipes
            UNION SELECT user_id FROM cooking_sessions
        )
        SELECT ids.user_id AS user_id,
            COALESCE(p.points, 0) AS points,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = ids.user_id) AS recipe_count,
            (SELECT COUNT(*) FROM cooking_sessions c WHERE c.user_id = ids.user_id) AS session_count,
            COUNT(*) OVER() AS count
        FROM ids
        LEFT JOIN user_points p ON p.user_id = ids.user_id
        WHERE ids.user_id ILIKE $1
        ORDER BY points DESC, ids.user_id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(contains_pattern(search))
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset.max(0))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(
        PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset.max(0))
            .map(UserOverview::from),
    )
}

/// Overwrites a user's point total from the admin points editor.
pub async fn set_user_points(
    session: &SessionData,
    user_id: &str,
    points: i64,
    pool: &Pool<Postgres>,
) -> Result<UserPoints, Error> {
    session.authenticate(ActionType::ManageUsers)?;

    let row: UserPoints = sqlx::query_as(
        "
        INSERT INTO user_points (user_id, points) VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE SET points = $2, updated_at = now()
        RETURNING *
    ",
    )
    .bind(user_id)
    .bind(points.max(0))
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!(
        "Points of {} set to {} by {}",
        user_id,
        row.points,
        session.user_id
    );
    Ok(row)
}

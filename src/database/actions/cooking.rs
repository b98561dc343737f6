use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    authentication::permissions::ActionType,
    constants::{HISTORY_COUNT_PER_PAGE, MAX_COOKING_MINUTES},
    error::{Error, HtmlError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    progress::{
        badges::{earned_badges, Badge, CookingTotals},
        points::{session_points, LevelProgress},
        streak::{streak, Streak},
    },
    schema::{CookingHistoryRow, CookingSession, Rating},
};

use super::{add_points, ensure_visible, get_recipe_by_id, get_user_points};

#[derive(Debug, Clone)]
pub struct NewCookingSession {
    pub rating: Rating,
    pub time_spent: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedSession {
    pub session: CookingSession,
    pub points_awarded: i64,
    pub total_points: i64,
    pub level: LevelProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct BadgeView {
    pub badge: Badge,
    pub title: &'static str,
    pub description: &'static str,
}

impl From<Badge> for BadgeView {
    fn from(badge: Badge) -> Self {
        Self {
            badge,
            title: badge.title(),
            description: badge.description(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CookingStats {
    pub totals: CookingTotals,
    pub streak: Streak,
    pub level: LevelProgress,
    pub badges: Vec<BadgeView>,
}

pub async fn log_cooking_session(
    recipe_id: Uuid,
    session: &SessionData,
    entry: NewCookingSession,
    pool: &Pool<Postgres>,
) -> Result<LoggedSession, Error> {
    session.authenticate(ActionType::LogCookingSessions)?;

    if !(0..=MAX_COOKING_MINUTES).contains(&entry.time_spent) {
        return Err(HtmlError::InvalidRequest.new("Invalid time spent"));
    }
    let notes = entry
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let recipe = get_recipe_by_id(recipe_id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Recipe not found"))?;
    ensure_visible(&recipe, Some(session))?;

    let rating = entry.rating.value();
    let points_awarded = session_points(rating > 0.0, notes.is_some(), entry.time_spent);

    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let logged: Option<CookingSession> = sqlx::query_as(
        "
        INSERT INTO cooking_sessions (id, recipe_id, user_id, rating, time_spent, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
    ",
    )
    .bind(Uuid::new_v4())
    .bind(recipe_id)
    .bind(&session.user_id)
    .bind(rating)
    .bind(entry.time_spent)
    .bind(notes)
    .fetch_optional(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    let logged =
        logged.ok_or_else(|| HtmlError::InternalServerError.new("Failed to log cooking session"))?;
    let total_points = add_points(&session.user_id, points_awarded, &mut *tx).await?;

    tx.commit().await.map_err(QueryError::from)?;

    log::info!(
        "{} cooked {} for {} points",
        session.user_id,
        recipe.slug,
        points_awarded
    );

    Ok(LoggedSession {
        session: logged,
        points_awarded,
        total_points,
        level: LevelProgress::from_points(total_points),
    })
}

pub async fn list_cooking_history(
    user_id: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<CookingHistoryRow>, Error> {
    let rows: Vec<CookingHistoryRow> = sqlx::query_as(
        "
        SELECT c.id, c.recipe_id, r.name AS recipe_name, r.slug AS recipe_slug, c.rating,
            c.time_spent, c.notes, c.created_at, COUNT(*) OVER() AS count
        FROM cooking_sessions c
        INNER JOIN recipes r ON r.id = c.recipe_id
        WHERE c.user_id = $1
        ORDER BY c.created_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(HISTORY_COUNT_PER_PAGE)
    .bind(offset.max(0))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        HISTORY_COUNT_PER_PAGE,
        offset.max(0),
    ))
}

pub async fn cooking_stats(user_id: &str, pool: &Pool<Postgres>) -> Result<CookingStats, Error> {
    let (sessions, rated_sessions): (i64, i64) = sqlx::query_as(
        "
        SELECT COUNT(*), COUNT(*) FILTER (WHERE rating > 0)
        FROM cooking_sessions
        WHERE user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    let days: Vec<(NaiveDate,)> = sqlx::query_as(
        "SELECT DISTINCT (created_at AT TIME ZONE 'UTC')::date FROM cooking_sessions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let totals = CookingTotals {
        sessions,
        rated_sessions,
        points: get_user_points(user_id, pool).await?,
    };
    let streak = streak(
        days.into_iter().map(|day| day.0),
        Utc::now().date_naive(),
    );

    Ok(CookingStats {
        badges: earned_badges(&totals, &streak)
            .into_iter()
            .map(BadgeView::from)
            .collect(),
        level: LevelProgress::from_points(totals.points),
        totals,
        streak,
    })
}

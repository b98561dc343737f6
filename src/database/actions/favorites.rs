use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::{Error, HtmlError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    schema::RecipeRow,
};

use super::{ensure_visible, get_recipe_by_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
    Add,
    Remove,
}

impl FavoriteChange {
    pub fn from_current(is_favorite: bool) -> Self {
        if is_favorite {
            FavoriteChange::Remove
        } else {
            FavoriteChange::Add
        }
    }

    /// Favorite state after the change is applied.
    pub fn apply(self) -> bool {
        self == FavoriteChange::Add
    }
}

pub async fn is_favorite(
    recipe_id: Uuid,
    user_id: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    let result: Option<(Uuid,)> =
        sqlx::query_as("SELECT recipe_id FROM favorites WHERE recipe_id = $1 AND user_id = $2")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(result.is_some())
}

/// Adds the recipe to the caller's favorites, or removes it if already there.
/// Returns whether the recipe is a favorite afterwards.
pub async fn toggle_favorite(
    recipe_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<bool, Error> {
    session.authenticate(ActionType::ManageOwnFavorites)?;

    let recipe = get_recipe_by_id(recipe_id, pool)
        .await?
        .ok_or_else(|| HtmlError::NotFound.new("Recipe not found"))?;
    ensure_visible(&recipe, Some(session))?;

    let change = FavoriteChange::from_current(is_favorite(recipe_id, &session.user_id, pool).await?);
    match change {
        FavoriteChange::Add => {
            sqlx::query(
                "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(&session.user_id)
            .bind(recipe_id)
            .execute(pool)
            .await
            .map_err(QueryError::from)?;
        }
        FavoriteChange::Remove => {
            sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
                .bind(&session.user_id)
                .bind(recipe_id)
                .execute(pool)
                .await
                .map_err(QueryError::from)?;
        }
    }

    Ok(change.apply())
}

pub async fn fetch_favorites(
    user_id: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.id, r.author_id, r.name, r.slug, r.description, i.url AS image_url, r.published,
            r.prep_time, r.cook_time, r.difficulty,
            (SELECT AVG(c.rating) FROM cooking_sessions c WHERE c.recipe_id = r.id AND c.rating > 0) AS average_rating,
            (SELECT COUNT(*) FROM favorites ff WHERE ff.recipe_id = r.id) AS favorite_count,
            COUNT(*) OVER() AS count
        FROM favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        LEFT JOIN images i ON i.id = r.image_id
        WHERE f.user_id = $1
        ORDER BY f.created_at DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset.max(0))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset.max(0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_state() {
        for start in [true, false] {
            let once = FavoriteChange::from_current(start).apply();
            let twice = FavoriteChange::from_current(once).apply();
            assert_ne!(once, start);
            assert_eq!(twice, start);
        }
    }
}

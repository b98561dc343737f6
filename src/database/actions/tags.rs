use std::collections::HashSet;

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    authentication::permissions::ActionType,
    error::{Error, HtmlError, QueryError},
    jwt::SessionData,
    schema::{RecipeTag, Tag, TagType},
};

pub async fn create_tag(
    session: &SessionData,
    name: &str,
    tag_type: TagType,
    pool: &Pool<Postgres>,
) -> Result<Tag, Error> {
    session.authenticate(ActionType::ManageTags)?;

    let name = name.trim();
    if name.is_empty() {
        return Err(HtmlError::InvalidRequest.new("Tag name is required"));
    }

    let tag: Tag = sqlx::query_as(
        "
        INSERT INTO tags (id, name, tag_type) VALUES ($1, $2, $3)
        ON CONFLICT (name, tag_type) DO UPDATE SET name = EXCLUDED.name
        RETURNING *
    ",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(tag_type)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, Error> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(tag)
}

pub async fn list_tags(
    tag_type: Option<TagType>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Tag>, Error> {
    let list: Vec<Tag> = match tag_type {
        Some(tag_type) => {
            sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE tag_type = $1 ORDER BY name")
                .bind(tag_type)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY tag_type, name")
                .fetch_all(pool)
                .await
        }
    }
    .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn delete_tag(session: &SessionData, id: Uuid, pool: &Pool<Postgres>) -> Result<(), Error> {
    session.authenticate(ActionType::ManageTags)?;

    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(HtmlError::NotFound.new("Tag not found"));
    }
    Ok(())
}

pub async fn list_recipe_tags(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeTag>, Error> {
    let list: Vec<RecipeTag> = sqlx::query_as(
        "
        SELECT rt.recipe_id AS recipe_id, t.id AS tag_id, t.name AS name, t.tag_type AS tag_type
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.tag_type, t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

/// Drops repeated ids while keeping the submitted order.
pub fn normalize_tag_ids(tag_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    tag_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Deletes the current tag links of a recipe and inserts `tag_ids`.
/// Runs on the caller's connection so it can share a transaction.
pub(crate) async fn replace_recipe_tags(
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    conn: &mut PgConnection,
) -> Result<(), Error> {
    let tag_ids = normalize_tag_ids(tag_ids);

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    if !tag_ids.is_empty() {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(tag_ids.iter(), |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(QueryError::from)?;
    }

    Ok(())
}

/// Replaces the full tag set of a recipe.
///
/// Permission checks are the caller's job (see `get_recipe_mut`).
pub async fn set_recipe_tags(
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeTag>, Error> {
    let mut tx = pool.begin().await.map_err(QueryError::from)?;
    replace_recipe_tags(recipe_id, tag_ids, &mut tx).await?;
    tx.commit().await.map_err(QueryError::from)?;

    list_recipe_tags(recipe_id, pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_ids_collapse() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(normalize_tag_ids(&[a, b, a, a]), vec![a, b]);
        assert!(normalize_tag_ids(&[]).is_empty());
    }
}

use std::collections::HashSet;

use serde::Serialize;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    authentication::permissions::ActionType,
    constants::{MAX_COOKING_MINUTES, MAX_RECIPE_NAME_LENGTH, RECIPE_COUNT_PER_PAGE},
    error::{Error, HtmlError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    recipe::{
        cook_mode::extract_steps,
        slug::{slugify, unique_slug},
    },
    schema::{
        Difficulty, Image, Recipe, RecipeDraft, RecipeIngredient, RecipeOrder, RecipeRow,
        RecipeTag,
    },
};

use super::{
    get_image, is_favorite, list_recipe_ingredients, list_recipe_tags, tags::replace_recipe_tags,
};

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub search: String,
    pub tag: Option<Uuid>,
    pub difficulty: Option<Difficulty>,
    pub author: Option<String>,
    pub order: RecipeOrder,
}

/// What a recipe form does to the recipe's image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageChange {
    #[default]
    Keep,
    Set(Uuid),
    Remove,
}

/// Tags and image posted together with a [`RecipeDraft`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeLinks {
    /// `None` leaves the tag set alone.
    pub tags: Option<Vec<Uuid>>,
    pub image: ImageChange,
}

/// Everything the recipe page shows.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub image: Option<Image>,
    pub ingredients: Vec<RecipeIngredient>,
    pub tags: Vec<RecipeTag>,
    pub steps: Vec<String>,
    pub average_rating: Option<f64>,
    pub is_favorite: bool,
    pub can_edit: bool,
}

pub fn validate_draft(draft: &RecipeDraft) -> Result<(), Error> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(HtmlError::InvalidRequest.new("Recipe name is required"));
    }
    if name.chars().count() > MAX_RECIPE_NAME_LENGTH {
        return Err(HtmlError::InvalidRequest.new("Recipe name is too long"));
    }
    if slugify(name).is_empty() {
        return Err(HtmlError::InvalidRequest.new("Recipe name needs at least one letter or digit"));
    }
    for minutes in [draft.prep_time, draft.cook_time] {
        if !(0..=MAX_COOKING_MINUTES).contains(&minutes) {
            return Err(HtmlError::InvalidRequest.new("Invalid preparation or cooking time"));
        }
    }
    Ok(())
}

/// Unpublished recipes are only shown to signed-in callers.
pub fn ensure_visible(recipe: &Recipe, session: Option<&SessionData>) -> Result<(), Error> {
    if !recipe.published && session.is_none() {
        return Err(HtmlError::Unauthorized.new("Recipe is not published"));
    }
    Ok(())
}

pub fn can_manage(recipe: &Recipe, session: &SessionData) -> bool {
    if ActionType::ManageAllRecipes.authenticate(session) {
        return true;
    }
    ActionType::ManageOwnRecipes.authenticate(session) && recipe.author_id == session.user_id
}

pub(crate) fn escape_like(search: &str) -> String {
    search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `ILIKE` pattern matching `search` anywhere, wildcards in it taken literally.
pub(crate) fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search.trim()))
}

async fn check_image_owner(
    image_id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let image = get_image(image_id, pool).await?;
    if image.user_id != session.user_id && !session.is_admin {
        return Err(HtmlError::Forbidden.new("Image belongs to another user"));
    }
    Ok(())
}

async fn taken_slugs(base: &str, pool: &Pool<Postgres>) -> Result<HashSet<String>, Error> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT slug FROM recipes WHERE slug = $1 OR slug LIKE $2")
            .bind(base)
            .bind(format!("{}-%", escape_like(base)))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Inserts the recipe together with its tags and image. Nothing is stored
/// when any part fails.
pub async fn create_recipe(
    session: &SessionData,
    draft: RecipeDraft,
    links: RecipeLinks,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::CreateRecipes)?;
    validate_draft(&draft)?;

    let image_id = match links.image {
        ImageChange::Set(image_id) => {
            check_image_owner(image_id, session, pool).await?;
            Some(image_id)
        }
        ImageChange::Keep | ImageChange::Remove => None,
    };

    let base = slugify(draft.name.trim());
    let slug = unique_slug(&base, &taken_slugs(&base, pool).await?);

    let mut tx = pool.begin().await.map_err(QueryError::from)?;
    let recipe: Option<Recipe> = sqlx::query_as(
        "
        INSERT INTO recipes (id, author_id, name, slug, description, steps, prep_time, cook_time, difficulty, image_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
    ",
    )
    .bind(Uuid::new_v4())
    .bind(&session.user_id)
    .bind(draft.name.trim())
    .bind(&slug)
    .bind(draft.description.trim())
    .bind(&draft.steps)
    .bind(draft.prep_time)
    .bind(draft.cook_time)
    .bind(draft.difficulty)
    .bind(image_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    let recipe =
        recipe.ok_or_else(|| HtmlError::InternalServerError.new("Failed to create recipe"))?;
    if let Some(tag_ids) = &links.tags {
        replace_recipe_tags(recipe.id, tag_ids, &mut tx).await?;
    }
    tx.commit().await.map_err(QueryError::from)?;

    log::info!("Recipe {} created by {}", recipe.slug, session.user_id);
    Ok(recipe)
}

pub async fn get_recipe_by_id(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe(
    slug: &str,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    let recipe = row.ok_or_else(|| HtmlError::NotFound.new("Recipe not found"))?;
    ensure_visible(&recipe, session)?;

    Ok(recipe)
}

/// Fetches a recipe the caller is allowed to change.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    let recipe = get_recipe_by_id(id, pool).await?;

    match recipe {
        Some(recipe) if can_manage(&recipe, session) => Ok(recipe),
        Some(_) => Err(HtmlError::Forbidden.default()),
        None => Err(HtmlError::NotFound.new("Recipe not found")),
    }
}

pub async fn get_recipe_detail(
    slug: &str,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, Error> {
    let recipe = get_recipe(slug, session, pool).await?;

    let image = match recipe.image_id {
        Some(image_id) => Some(get_image(image_id, pool).await?),
        None => None,
    };
    let is_favorite = match session {
        Some(session) => is_favorite(recipe.id, &session.user_id, pool).await?,
        None => false,
    };

    Ok(RecipeDetail {
        image,
        ingredients: list_recipe_ingredients(recipe.id, pool).await?,
        tags: list_recipe_tags(recipe.id, pool).await?,
        steps: extract_steps(&recipe.steps),
        average_rating: average_rating(recipe.id, pool).await?,
        is_favorite,
        can_edit: session.is_some_and(|session| can_manage(&recipe, session)),
        recipe,
    })
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    session: Option<&SessionData>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "
        SELECT r.id, r.author_id, r.name, r.slug, r.description, i.url AS image_url, r.published,
            r.prep_time, r.cook_time, r.difficulty,
            (SELECT AVG(c.rating) FROM cooking_sessions c WHERE c.recipe_id = r.id AND c.rating > 0) AS average_rating,
            (SELECT COUNT(*) FROM favorites f WHERE f.recipe_id = r.id) AS favorite_count,
            COUNT(*) OVER() AS count
        FROM recipes r
        LEFT JOIN images i ON i.id = r.image_id
        WHERE (r.published",
    );

    if let Some(session) = session {
        query.push(" OR r.author_id = ").push_bind(session.user_id.clone());
    }
    query
        .push(") AND r.name ILIKE ")
        .push_bind(contains_pattern(&filter.search));

    if let Some(tag) = filter.tag {
        query
            .push(" AND EXISTS (SELECT 1 FROM recipe_tags t WHERE t.recipe_id = r.id AND t.tag_id = ")
            .push_bind(tag)
            .push(")");
    }
    if let Some(difficulty) = filter.difficulty {
        query.push(" AND r.difficulty = ").push_bind(difficulty);
    }
    if let Some(author) = &filter.author {
        query.push(" AND r.author_id = ").push_bind(author.clone());
    }

    query
        .push(format!(" ORDER BY {}, r.id LIMIT ", filter.order.sql()))
        .push_bind(RECIPE_COUNT_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(offset.max(0));

    let rows: Vec<RecipeRow> = query
        .build_query_as()
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

/// Edits the recipe, its tags and image in one transaction. The slug stays
/// what it was when the recipe was created.
pub async fn update_recipe(
    id: Uuid,
    session: &SessionData,
    draft: RecipeDraft,
    links: RecipeLinks,
    pool: &Pool<Postgres>,
) -> Result<Recipe, Error> {
    let current = get_recipe_mut(id, session, pool).await?;
    validate_draft(&draft)?;

    let image_id = match links.image {
        ImageChange::Keep => current.image_id,
        ImageChange::Remove => None,
        ImageChange::Set(image_id) => {
            if current.image_id != Some(image_id) {
                check_image_owner(image_id, session, pool).await?;
            }
            Some(image_id)
        }
    };

    let mut tx = pool.begin().await.map_err(QueryError::from)?;
    if let Some(tag_ids) = &links.tags {
        replace_recipe_tags(id, tag_ids, &mut tx).await?;
    }

    let recipe: Option<Recipe> = sqlx::query_as(
        "
        UPDATE recipes
        SET name = $2, description = $3, steps = $4, prep_time = $5, cook_time = $6, difficulty = $7,
            image_id = $8, updated_at = now()
        WHERE id = $1
        RETURNING *
    ",
    )
    .bind(id)
    .bind(draft.name.trim())
    .bind(draft.description.trim())
    .bind(&draft.steps)
    .bind(draft.prep_time)
    .bind(draft.cook_time)
    .bind(draft.difficulty)
    .bind(image_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    let recipe = recipe.ok_or_else(|| HtmlError::NotFound.new("Recipe not found"))?;
    tx.commit().await.map_err(QueryError::from)?;

    Ok(recipe)
}

pub async fn set_published(
    id: Uuid,
    session: &SessionData,
    published: bool,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    get_recipe_mut(id, session, pool).await?;

    sqlx::query("UPDATE recipes SET published = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(published)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

pub async fn set_recipe_image(
    id: Uuid,
    session: &SessionData,
    image_id: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    get_recipe_mut(id, session, pool).await?;
    if let Some(image_id) = image_id {
        check_image_owner(image_id, session, pool).await?;
    }

    sqlx::query("UPDATE recipes SET image_id = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(image_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

pub async fn delete_recipe(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    log::info!("Recipe {} deleted by {}", recipe.slug, session.user_id);
    Ok(())
}

pub async fn average_rating(recipe_id: Uuid, pool: &Pool<Postgres>) -> Result<Option<f64>, Error> {
    let row: (Option<f64>,) = sqlx::query_as(
        "SELECT AVG(rating) FROM cooking_sessions WHERE recipe_id = $1 AND rating > 0",
    )
    .bind(recipe_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row.0)
}

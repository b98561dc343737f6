use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{Error, HtmlError, QueryError},
    recipe::scaling::scale_quantity,
    schema::{Ingredient, RecipeIngredient},
};

use super::recipes::contains_pattern;

#[derive(Debug, Clone, Serialize)]
pub struct ScaledIngredient {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: String,
    pub original: String,
}

pub fn scale_ingredients(ingredients: &[RecipeIngredient], factor: f64) -> Vec<ScaledIngredient> {
    ingredients
        .iter()
        .map(|ingredient| ScaledIngredient {
            ingredient_id: ingredient.ingredient_id,
            name: ingredient.name.to_owned(),
            quantity: scale_quantity(&ingredient.quantity, factor),
            original: ingredient.quantity.to_owned(),
        })
        .collect()
}

/// Creates the ingredient, or returns the existing one with the same name
/// in any letter case.
pub async fn create_ingredient(
    name: &str,
    description: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HtmlError::InvalidRequest.new("Ingredient name is required"));
    }

    let ingredient: Ingredient = sqlx::query_as(
        "
        INSERT INTO ingredients (id, name, description) VALUES ($1, $2, $3)
        ON CONFLICT ((LOWER(name))) DO UPDATE SET description = COALESCE(EXCLUDED.description, ingredients.description)
        RETURNING *
    ",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(ingredient)
}

pub async fn find_ingredient(
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<Ingredient>, Error> {
    let row: Option<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE LOWER(name) = LOWER($1)")
            .bind(name.trim())
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_ingredients(
    search: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, Error> {
    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name LIMIT 50")
            .bind(contains_pattern(search))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn add_ingredient_to_recipe(
    recipe_id: Uuid,
    ingredient_id: Uuid,
    quantity: &str,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    sqlx::query(
        "
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (recipe_id, ingredient_id) DO UPDATE
        SET quantity = $3;
    ",
    )
    .bind(recipe_id)
    .bind(ingredient_id)
    .bind(quantity.trim())
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(())
}

pub async fn remove_ingredient_from_recipe(
    recipe_id: Uuid,
    ingredient_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1 AND ingredient_id = $2")
        .bind(recipe_id)
        .bind(ingredient_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, Error> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, ri.quantity AS quantity, i.name AS name
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_every_ingredient() {
        let recipe_id = Uuid::new_v4();
        let ingredients = vec![
            RecipeIngredient {
                recipe_id,
                ingredient_id: Uuid::new_v4(),
                quantity: String::from("1/2 cup"),
                name: String::from("Milk"),
            },
            RecipeIngredient {
                recipe_id,
                ingredient_id: Uuid::new_v4(),
                quantity: String::from("to taste"),
                name: String::from("Salt"),
            },
        ];

        let scaled = scale_ingredients(&ingredients, 3.0);
        assert_eq!(scaled[0].quantity, "1 1/2 cup");
        assert_eq!(scaled[0].original, "1/2 cup");
        assert_eq!(scaled[1].quantity, "to taste");
    }
}

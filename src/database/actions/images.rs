use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    authentication::permissions::ActionType,
    error::{Error, HtmlError, QueryError},
    jwt::SessionData,
    schema::Image,
};

pub async fn create_image(
    user_id: &str,
    url: &str,
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Image, Error> {
    let image: Option<Image> = sqlx::query_as(
        "INSERT INTO images (id, url, name, user_id) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(url)
    .bind(name)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    image.ok_or_else(|| HtmlError::InternalServerError.new("Failed to store image"))
}

pub async fn get_image(id: Uuid, pool: &Pool<Postgres>) -> Result<Image, Error> {
    let image: Option<Image> = sqlx::query_as("SELECT * FROM images WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    image.ok_or_else(|| HtmlError::NotFound.new("Image not found"))
}

pub async fn list_user_images(user_id: &str, pool: &Pool<Postgres>) -> Result<Vec<Image>, Error> {
    let images: Vec<Image> =
        sqlx::query_as("SELECT * FROM images WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(images)
}

pub async fn delete_image(id: Uuid, session: &SessionData, pool: &Pool<Postgres>) -> Result<(), Error> {
    session.authenticate(ActionType::UploadImages)?;
    let image = get_image(id, pool).await?;
    if image.user_id != session.user_id && !session.is_admin {
        return Err(HtmlError::Forbidden.default());
    }

    sqlx::query("DELETE FROM images WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

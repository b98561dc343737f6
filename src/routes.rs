//! HTTP surface of the application. Every page is served as a JSON document,
//! server actions take posted form fields as a JSON object.

use std::{collections::BTreeSet, convert::Infallible, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use warp::{
    hyper::body::Bytes,
    http::StatusCode,
    reject::Rejection,
    reply::{self, Reply},
    Filter,
};

use crate::{
    actions::{
        self, cooking_stats, create_recipe, delete_recipe, ensure_visible, fetch_favorites,
        fetch_recipes, get_recipe, get_recipe_by_id, get_recipe_detail, get_recipe_mut, list_cooking_history,
        list_recipe_ingredients, list_tags, list_user_images, list_users, log_cooking_session,
        scale_ingredients, set_published, set_recipe_image, set_recipe_tags, set_user_points,
        toggle_favorite, update_recipe, CookingStats, ImageChange, NewCookingSession, RecipeFilter,
        RecipeLinks,
    },
    config::Config,
    constants::{
        ADMIN_PREFIXES, DIFFICULTIES, PROTECTED_PREFIXES, RECIPE_ORDERS, TAG_TYPES,
        UPLOAD_SIGNATURE_HEADER,
    },
    error::{handle_rejection, Error, HtmlError},
    form::{Form, FormData},
    jwt::{SessionData, SessionKeys},
    middleware::{protect, with_auth, with_possible_session, with_session},
    pagination::PageContext,
    permissions::ActionType,
    recipe::cook_mode::CookMode,
    schema::{CookingHistoryRow, Difficulty, Image, Rating, RecipeDraft, RecipeOrder, RecipeRow, TagType},
    upload::{store_upload, UploadCallback},
};

const MAX_FORM_BYTES: u64 = 64 * 1024;

/// Shared handles every route needs.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub keys: Arc<SessionKeys>,
    pub upload_secret: Arc<str>,
    pub sign_in_path: String,
}

impl Context {
    pub fn new(config: &Config, pool: Pool<Postgres>) -> Result<Self, Error> {
        Ok(Self {
            pool,
            keys: Arc::new(SessionKeys::new(&config.session_secret)?),
            upload_secret: Arc::from(config.upload_secret.as_str()),
            sign_in_path: config.sign_in_path.clone(),
        })
    }
}

fn with_context(context: Context) -> impl Filter<Extract = (Context,), Error = Infallible> + Clone {
    warp::any().map(move || context.clone())
}

fn form_body() -> impl Filter<Extract = (Form,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_FORM_BYTES)
        .and(warp::body::json::<FormData>())
        .map(Form::from_data)
}

/// All routes behind the identity gate, with rejections turned into responses.
pub fn routes(context: Context) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let gate = protect(
        PROTECTED_PREFIXES,
        ADMIN_PREFIXES,
        context.sign_in_path.clone(),
        context.keys.clone(),
    );

    let recipes = list_recipes_route(context.clone())
        .or(new_recipe_route(context.clone()))
        .or(recipe_detail_route(context.clone()))
        .or(edit_recipe_route(context.clone()))
        .or(publish_recipe_route(context.clone()))
        .or(delete_recipe_route(context.clone()))
        .or(recipe_tags_route(context.clone()))
        .or(recipe_ingredients_route(context.clone()))
        .or(favorite_route(context.clone()))
        .or(cook_route(context.clone()))
        .or(scale_route(context.clone()))
        .or(cook_mode_route(context.clone()))
        .or(recipe_image_route(context.clone()))
        .boxed();

    let admin = admin_users_route(context.clone())
        .or(admin_points_route(context.clone()))
        .or(admin_tags_route(context.clone()))
        .or(admin_delete_tag_route(context.clone()))
        .or(admin_ingredients_route(context.clone()))
        .boxed();

    let lookups = tags_route(context.clone())
        .or(tag_route(context.clone()))
        .or(ingredients_route(context.clone()))
        .or(options_route())
        .boxed();

    let api = health_route()
        .or(recipes)
        .or(lookups)
        .or(delete_image_route(context.clone()))
        .or(dashboard_route(context.clone()))
        .or(admin)
        .or(upload_route(context));

    gate.and(api)
        .with(warp::log("hyper_recipes"))
        .recover(handle_rejection)
}

fn health_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("health").and(warp::get()).map(|| {
        reply::json(&json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }))
    })
}

// Recipes

#[derive(Debug, Default, Deserialize)]
struct RecipeQuery {
    search: Option<String>,
    tag: Option<Uuid>,
    difficulty: Option<Difficulty>,
    author: Option<String>,
    order: Option<RecipeOrder>,
    offset: Option<i64>,
}

impl From<RecipeQuery> for RecipeFilter {
    fn from(query: RecipeQuery) -> Self {
        RecipeFilter {
            search: query.search.unwrap_or_default(),
            tag: query.tag,
            difficulty: query.difficulty,
            author: query.author.filter(|author| !author.trim().is_empty()),
            order: query.order.unwrap_or_default(),
        }
    }
}

fn list_recipes_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes")
        .and(warp::get())
        .and(with_possible_session(context.keys.clone()))
        .and(warp::query::<RecipeQuery>())
        .and(with_context(context))
        .and_then(handle_list_recipes)
}

async fn handle_list_recipes(
    session: Option<SessionData>,
    query: RecipeQuery,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let offset = query.offset.unwrap_or(0);
    let filter = RecipeFilter::from(query);
    let page = fetch_recipes(&filter, session.as_ref(), offset, &context.pool).await?;
    Ok(reply::json(&page))
}

fn recipe_detail_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / String)
        .and(warp::get())
        .and(with_possible_session(context.keys.clone()))
        .and(with_context(context))
        .and_then(handle_recipe_detail)
}

async fn handle_recipe_detail(
    slug: String,
    session: Option<SessionData>,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let detail = get_recipe_detail(&slug, session.as_ref(), &context.pool).await?;
    Ok(reply::json(&detail))
}

fn read_draft(form: &Form) -> Result<RecipeDraft, Error> {
    let difficulty = match form.get_optional_str("difficulty")? {
        Some(value) => value.parse()?,
        None => Difficulty::Easy,
    };

    Ok(RecipeDraft {
        name: form.get_str("name")?,
        description: form.get_optional_str("description")?.unwrap_or_default(),
        steps: form.get_optional_str("steps")?.unwrap_or_default(),
        prep_time: form.get_optional_number("prep_time")?.unwrap_or(0),
        cook_time: form.get_optional_number("cook_time")?.unwrap_or(0),
        difficulty,
    })
}

/// Tags are replaced only when the form carries a `tags` field.
fn read_links(form: &Form) -> Result<RecipeLinks, Error> {
    let tags = if form.contains("tags") {
        Some(form.get_uuid_list("tags")?)
    } else {
        None
    };
    let image = if form.get_bool("remove_image")? {
        ImageChange::Remove
    } else {
        match form.get_optional_str("image_id")? {
            Some(_) => ImageChange::Set(form.get_uuid("image_id")?),
            None => ImageChange::Keep,
        }
    };

    Ok(RecipeLinks { tags, image })
}

fn new_recipe_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / "new")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_new_recipe)
}

async fn handle_new_recipe(
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let draft = read_draft(&form)?;
    let links = read_links(&form)?;

    let recipe = create_recipe(&session, draft, links, &context.pool).await?;
    Ok(reply::with_status(reply::json(&recipe), StatusCode::CREATED))
}

fn edit_recipe_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "edit")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_edit_recipe)
}

async fn handle_edit_recipe(
    id: Uuid,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let draft = read_draft(&form)?;
    let links = read_links(&form)?;

    let recipe = update_recipe(id, &session, draft, links, &context.pool).await?;
    Ok(reply::json(&recipe))
}

fn recipe_image_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "image")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_recipe_image)
}

/// A blank `image_id` clears the image.
async fn handle_recipe_image(
    id: Uuid,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let image_id = match form.get_optional_str("image_id")? {
        Some(_) => Some(form.get_uuid("image_id")?),
        None => None,
    };

    set_recipe_image(id, &session, image_id, &context.pool).await?;
    Ok(reply::json(&json!({ "id": id, "image_id": image_id })))
}

fn publish_recipe_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "publish")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_publish_recipe)
}

async fn handle_publish_recipe(
    id: Uuid,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let published = form.get_bool("published")?;
    set_published(id, &session, published, &context.pool).await?;
    Ok(reply::json(&json!({ "id": id, "published": published })))
}

fn delete_recipe_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "delete")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(with_context(context))
        .and_then(handle_delete_recipe)
}

async fn handle_delete_recipe(
    id: Uuid,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    delete_recipe(id, &session, &context.pool).await?;
    Ok(reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

fn recipe_tags_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "tags")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_recipe_tags)
}

async fn handle_recipe_tags(
    id: Uuid,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let tag_ids = form.get_uuid_list("tags")?;
    get_recipe_mut(id, &session, &context.pool).await?;

    let tags = set_recipe_tags(id, &tag_ids, &context.pool).await?;
    Ok(reply::json(&tags))
}

fn recipe_ingredients_route(
    context: Context,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "ingredients")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_recipe_ingredients)
}

/// Adds or updates one ingredient line, or removes it when `remove` is set.
async fn handle_recipe_ingredients(
    id: Uuid,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let name = form.get_str("name")?;
    let remove = form.get_bool("remove")?;
    get_recipe_mut(id, &session, &context.pool).await?;

    if remove {
        let ingredient = actions::find_ingredient(&name, &context.pool)
            .await?
            .ok_or_else(|| Rejection::from(HtmlError::NotFound.new("Ingredient not found")))?;
        actions::remove_ingredient_from_recipe(id, ingredient.id, &context.pool).await?;
    } else {
        let quantity = form.get_optional_str("quantity")?.unwrap_or_default();
        let ingredient = actions::create_ingredient(&name, None, &context.pool).await?;
        actions::add_ingredient_to_recipe(id, ingredient.id, quantity.trim(), &context.pool)
            .await?;
    }

    let ingredients = list_recipe_ingredients(id, &context.pool).await?;
    Ok(reply::json(&ingredients))
}

fn favorite_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "favorite")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(with_context(context))
        .and_then(handle_favorite)
}

async fn handle_favorite(
    id: Uuid,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let favorite = toggle_favorite(id, &session, &context.pool).await?;
    Ok(reply::json(&json!({ "id": id, "favorite": favorite })))
}

fn cook_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "cook")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_cook)
}

async fn handle_cook(
    id: Uuid,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let rating = match form.get_optional_number::<Rating>("rating")? {
        Some(rating) => rating,
        None => Rating::new(0.0).map_err(Error::from)?,
    };
    let entry = NewCookingSession {
        rating,
        time_spent: form.get_optional_number("time_spent")?.unwrap_or(0),
        notes: form.get_optional_str("notes")?,
    };

    let logged = log_cooking_session(id, &session, entry, &context.pool).await?;
    Ok(reply::with_status(reply::json(&logged), StatusCode::CREATED))
}

#[derive(Debug, Deserialize)]
struct ScaleQuery {
    factor: f64,
}

fn scale_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / Uuid / "scale")
        .and(warp::get())
        .and(with_possible_session(context.keys.clone()))
        .and(warp::query::<ScaleQuery>())
        .and(with_context(context))
        .and_then(handle_scale)
}

async fn handle_scale(
    id: Uuid,
    session: Option<SessionData>,
    query: ScaleQuery,
    context: Context,
) -> Result<impl Reply, Rejection> {
    if !query.factor.is_finite() || query.factor <= 0.0 {
        return Err(HtmlError::InvalidRequest.new("Scale factor must be positive").into());
    }

    let recipe = get_recipe_by_id(id, &context.pool)
        .await?
        .ok_or_else(|| Rejection::from(HtmlError::NotFound.new("Recipe not found")))?;
    ensure_visible(&recipe, session.as_ref())?;

    let ingredients = list_recipe_ingredients(id, &context.pool).await?;
    Ok(reply::json(&json!({
        "id": id,
        "factor": query.factor,
        "ingredients": scale_ingredients(&ingredients, query.factor),
    })))
}

#[derive(Debug, Default, Deserialize)]
struct CookModeQuery {
    step: Option<usize>,
    /// Comma separated indices of finished steps.
    done: Option<String>,
}

impl CookModeQuery {
    fn done_steps(&self) -> BTreeSet<usize> {
        self.done
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter_map(|index| index.trim().parse().ok())
            .collect()
    }
}

fn cook_mode_for(steps: &str, query: &CookModeQuery) -> CookMode {
    let mut mode = CookMode::from_rich_text(steps);
    for index in query.done_steps() {
        if mode.go_to(index) {
            mode.toggle_completed();
        }
    }
    mode.go_to(query.step.unwrap_or(0));
    mode
}

fn cook_mode_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("recipes" / String / "cook")
        .and(warp::get())
        .and(with_possible_session(context.keys.clone()))
        .and(warp::query::<CookModeQuery>())
        .and(with_context(context))
        .and_then(handle_cook_mode)
}

async fn handle_cook_mode(
    slug: String,
    session: Option<SessionData>,
    query: CookModeQuery,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let recipe = get_recipe(&slug, session.as_ref(), &context.pool).await?;
    let mode = cook_mode_for(&recipe.steps, &query);

    Ok(reply::json(&json!({
        "recipe_id": recipe.id,
        "name": recipe.name,
        "total_time": recipe.total_time(),
        "step": mode.index(),
        "total": mode.len(),
        "current": mode.current(),
        "progress": mode.progress(),
        "finished": mode.is_finished(),
        "mode": mode,
    })))
}

// Lookups

#[derive(Debug, Deserialize)]
struct TagQuery {
    tag_type: Option<TagType>,
}

fn tags_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("tags")
        .and(warp::get())
        .and(warp::query::<TagQuery>())
        .and(with_context(context))
        .and_then(handle_tags)
}

async fn handle_tags(query: TagQuery, context: Context) -> Result<impl Reply, Rejection> {
    let tags = list_tags(query.tag_type, &context.pool).await?;
    Ok(reply::json(&tags))
}

fn tag_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_context(context))
        .and_then(handle_tag)
}

async fn handle_tag(id: Uuid, context: Context) -> Result<impl Reply, Rejection> {
    let tag = actions::get_tag(id, &context.pool)
        .await?
        .ok_or_else(|| Rejection::from(HtmlError::NotFound.new("Tag not found")))?;
    Ok(reply::json(&tag))
}

#[derive(Debug, Default, Deserialize)]
struct IngredientQuery {
    search: Option<String>,
}

fn ingredients_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("ingredients")
        .and(warp::get())
        .and(with_auth(context.keys.clone()))
        .and(warp::query::<IngredientQuery>())
        .and(with_context(context))
        .and_then(handle_ingredients)
}

async fn handle_ingredients(
    query: IngredientQuery,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let ingredients =
        actions::list_ingredients(query.search.as_deref().unwrap_or(""), &context.pool).await?;
    Ok(reply::json(&ingredients))
}

/// Choices offered by the recipe and tag forms.
fn options_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    fn choices(list: &[(&str, &str)]) -> Vec<serde_json::Value> {
        list.iter()
            .map(|(value, label)| json!({ "value": value, "label": label }))
            .collect()
    }

    warp::path!("options").and(warp::get()).map(|| {
        reply::json(&json!({
            "tag_types": choices(TAG_TYPES),
            "difficulties": choices(DIFFICULTIES),
            "orders": choices(RECIPE_ORDERS),
        }))
    })
}

// Images

fn delete_image_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("images" / Uuid / "delete")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(with_context(context))
        .and_then(handle_delete_image)
}

async fn handle_delete_image(
    id: Uuid,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    actions::delete_image(id, &session, &context.pool).await?;
    Ok(reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

// Dashboard

#[derive(Serialize)]
struct Dashboard {
    user_id: String,
    stats: CookingStats,
    history: PageContext<CookingHistoryRow>,
    favorites: PageContext<RecipeRow>,
    recipes: PageContext<RecipeRow>,
    images: Vec<Image>,
}

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    history_offset: Option<i64>,
    favorites_offset: Option<i64>,
    recipes_offset: Option<i64>,
}

fn dashboard_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("dashboard")
        .and(warp::get())
        .and(with_session(context.keys.clone()))
        .and(warp::query::<DashboardQuery>())
        .and(with_context(context))
        .and_then(handle_dashboard)
}

async fn handle_dashboard(
    session: SessionData,
    query: DashboardQuery,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let user_id = session.user_id.as_str();
    let own_recipes = RecipeFilter {
        author: Some(session.user_id.clone()),
        ..RecipeFilter::default()
    };

    let dashboard = Dashboard {
        stats: cooking_stats(user_id, &context.pool).await?,
        history: list_cooking_history(user_id, query.history_offset.unwrap_or(0), &context.pool)
            .await?,
        favorites: fetch_favorites(user_id, query.favorites_offset.unwrap_or(0), &context.pool)
            .await?,
        recipes: fetch_recipes(
            &own_recipes,
            Some(&session),
            query.recipes_offset.unwrap_or(0),
            &context.pool,
        )
        .await?,
        images: list_user_images(user_id, &context.pool).await?,
        user_id: session.user_id.clone(),
    };
    Ok(reply::json(&dashboard))
}

// Admin

#[derive(Debug, Default, Deserialize)]
struct UserQuery {
    search: Option<String>,
    offset: Option<i64>,
}

fn admin_users_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "users")
        .and(warp::get())
        .and(with_session(context.keys.clone()))
        .and(warp::query::<UserQuery>())
        .and(with_context(context))
        .and_then(handle_admin_users)
}

async fn handle_admin_users(
    session: SessionData,
    query: UserQuery,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let page = list_users(
        &session,
        query.search.as_deref().unwrap_or(""),
        query.offset.unwrap_or(0),
        &context.pool,
    )
    .await?;
    Ok(reply::json(&page))
}

fn admin_points_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "users" / String / "points")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_admin_points)
}

async fn handle_admin_points(
    user_id: String,
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let points: i64 = form.get_number("points")?;
    if points < 0 {
        return Err(HtmlError::InvalidRequest.new("Points can't be negative").into());
    }

    let row = set_user_points(&session, &user_id, points, &context.pool).await?;
    Ok(reply::json(&row))
}

fn admin_tags_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "tags")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_admin_tags)
}

async fn handle_admin_tags(
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let name = form.get_str("name")?;
    let tag_type: TagType = form.get_value("tag_type")?;

    let tag = actions::create_tag(&session, &name, tag_type, &context.pool).await?;
    Ok(reply::with_status(reply::json(&tag), StatusCode::CREATED))
}

fn admin_delete_tag_route(
    context: Context,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "tags" / Uuid / "delete")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(with_context(context))
        .and_then(handle_admin_delete_tag)
}

async fn handle_admin_delete_tag(
    id: Uuid,
    session: SessionData,
    context: Context,
) -> Result<impl Reply, Rejection> {
    actions::delete_tag(&session, id, &context.pool).await?;
    Ok(reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

fn admin_ingredients_route(
    context: Context,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("admin" / "ingredients")
        .and(warp::post())
        .and(with_session(context.keys.clone()))
        .and(form_body())
        .and(with_context(context))
        .and_then(handle_admin_ingredients)
}

async fn handle_admin_ingredients(
    session: SessionData,
    form: Form,
    context: Context,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageIngredients)?;
    let name = form.get_str("name")?;
    let description = form.get_optional_str("description")?;

    let ingredient =
        actions::create_ingredient(&name, description.as_deref(), &context.pool).await?;
    Ok(reply::json(&ingredient))
}

// Upload callback

fn upload_route(context: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("api" / "upload")
        .and(warp::post())
        .and(warp::header::optional::<String>(UPLOAD_SIGNATURE_HEADER))
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::bytes())
        .and(with_context(context))
        .and_then(handle_upload)
}

async fn handle_upload(
    signature: Option<String>,
    body: Bytes,
    context: Context,
) -> Result<impl Reply, Rejection> {
    let callback = UploadCallback::from_signed(&context.upload_secret, &body, signature.as_deref())?;
    let image = store_upload(callback, &context.pool).await?;
    Ok(reply::with_status(reply::json(&image), StatusCode::CREATED))
}

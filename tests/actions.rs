//! Query layer tests against a real Postgres. Run with
//! `DATABASE_URL=postgres://... cargo test -- --include-ignored`;
//! the CI workflow does this against a Postgres service container.

use hyper_recipes::{
    actions::{
        create_image, create_ingredient, create_recipe, create_tag, fetch_recipes, find_ingredient,
        get_recipe, get_recipe_by_id, is_favorite, list_ingredients, list_recipe_tags,
        log_cooking_session, set_published, set_recipe_tags, toggle_favorite, update_recipe,
        ImageChange, NewCookingSession, RecipeFilter, RecipeLinks,
    },
    jwt::SessionData,
    schema::{Difficulty, Rating, RecipeDraft, TagType, UserRole},
};
use sqlx::PgPool;
use uuid::Uuid;

fn user(id: &str) -> SessionData {
    SessionData {
        user_id: id.to_string(),
        role: UserRole::User,
        is_admin: false,
    }
}

fn admin() -> SessionData {
    SessionData {
        user_id: "admin".to_string(),
        role: UserRole::Admin,
        is_admin: true,
    }
}

fn draft(name: &str) -> RecipeDraft {
    RecipeDraft {
        name: name.to_string(),
        description: String::new(),
        steps: "<ol><li>Mix</li><li>Bake</li></ol>".to_string(),
        prep_time: 10,
        cook_time: 20,
        difficulty: Difficulty::Easy,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unpublished_recipes_are_hidden_from_anonymous(pool: PgPool) {
    let author = user("author");
    let recipe = create_recipe(&author, draft("Banana Bread"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    assert_eq!(recipe.slug, "banana-bread");

    let error = get_recipe(&recipe.slug, None, &pool).await.unwrap_err();
    assert_eq!(error.code, 401);
    assert!(get_recipe(&recipe.slug, Some(&author), &pool).await.is_ok());
    assert_eq!(get_recipe("missing", None, &pool).await.unwrap_err().code, 404);

    set_published(recipe.id, &author, true, &pool).await.unwrap();
    assert!(get_recipe(&recipe.slug, None, &pool).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn colliding_names_get_numbered_slugs(pool: PgPool) {
    let author = user("author");
    let first = create_recipe(&author, draft("Pancakes"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    let second = create_recipe(&author, draft("Pancakes!"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    assert_eq!(first.slug, "pancakes");
    assert_eq!(second.slug, "pancakes-2");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn favorite_toggle_is_its_own_inverse(pool: PgPool) {
    let author = user("author");
    let recipe = create_recipe(&author, draft("Soup"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    set_published(recipe.id, &author, true, &pool).await.unwrap();

    let fan = user("fan");
    assert!(!is_favorite(recipe.id, &fan.user_id, &pool).await.unwrap());
    assert!(toggle_favorite(recipe.id, &fan, &pool).await.unwrap());
    assert!(is_favorite(recipe.id, &fan.user_id, &pool).await.unwrap());
    assert!(!toggle_favorite(recipe.id, &fan, &pool).await.unwrap());
    assert!(!is_favorite(recipe.id, &fan.user_id, &pool).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn replacing_tags_leaves_exactly_the_new_set(pool: PgPool) {
    let admin = admin();
    let italian = create_tag(&admin, "Italian", TagType::Cuisine, &pool)
        .await
        .unwrap();
    let dinner = create_tag(&admin, "Dinner", TagType::Meal, &pool)
        .await
        .unwrap();
    let vegan = create_tag(&admin, "Vegan", TagType::Diet, &pool).await.unwrap();

    let recipe = create_recipe(&admin, draft("Risotto"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    set_recipe_tags(recipe.id, &[italian.id, dinner.id], &pool)
        .await
        .unwrap();
    set_recipe_tags(recipe.id, &[vegan.id, dinner.id, vegan.id], &pool)
        .await
        .unwrap();

    let mut tag_ids: Vec<_> = list_recipe_tags(recipe.id, &pool)
        .await
        .unwrap()
        .into_iter()
        .map(|tag| tag.tag_id)
        .collect();
    tag_ids.sort();
    let mut expected = vec![vegan.id, dinner.id];
    expected.sort();
    assert_eq!(tag_ids, expected);

    set_recipe_tags(recipe.id, &[], &pool).await.unwrap();
    assert!(list_recipe_tags(recipe.id, &pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn drafts_are_listed_only_for_their_author(pool: PgPool) {
    let author = user("author");
    create_recipe(&author, draft("Secret Stew"), RecipeLinks::default(), &pool)
        .await
        .unwrap();

    let filter = RecipeFilter::default();
    let anonymous = fetch_recipes(&filter, None, 0, &pool).await.unwrap();
    assert!(anonymous.rows.is_empty());

    let own = fetch_recipes(&filter, Some(&author), 0, &pool).await.unwrap();
    assert_eq!(own.rows.len(), 1);
    assert_eq!(own.total_rows, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn cooking_sessions_award_points(pool: PgPool) {
    let author = user("author");
    let recipe = create_recipe(&author, draft("Curry"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    set_published(recipe.id, &author, true, &pool).await.unwrap();

    let cook = user("cook");
    let logged = log_cooking_session(
        recipe.id,
        &cook,
        NewCookingSession {
            rating: Rating::new(4.5).unwrap(),
            time_spent: 30,
            notes: Some("More chili".to_string()),
        },
        &pool,
    )
    .await
    .unwrap();

    // base 10, rating 5, notes 5, three 10 minute blocks
    assert_eq!(logged.points_awarded, 23);
    assert_eq!(logged.total_points, 23);
    assert_eq!(logged.level.level, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn unknown_tag_leaves_no_recipe_behind(pool: PgPool) {
    let author = user("author");
    let links = RecipeLinks {
        tags: Some(vec![Uuid::new_v4()]),
        image: ImageChange::Keep,
    };
    let error = create_recipe(&author, draft("Flatbread"), links, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 400);

    let own = fetch_recipes(&RecipeFilter::default(), Some(&author), 0, &pool)
        .await
        .unwrap();
    assert!(own.rows.is_empty());

    let retry = create_recipe(&author, draft("Flatbread"), RecipeLinks::default(), &pool)
        .await
        .unwrap();
    assert_eq!(retry.slug, "flatbread");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn edits_apply_tags_and_refuse_foreign_images(pool: PgPool) {
    let author = user("author");
    let admin = admin();
    let dinner = create_tag(&admin, "Dinner", TagType::Meal, &pool)
        .await
        .unwrap();
    let recipe = create_recipe(&author, draft("Lasagne"), RecipeLinks::default(), &pool)
        .await
        .unwrap();

    let links = RecipeLinks {
        tags: Some(vec![dinner.id]),
        image: ImageChange::Keep,
    };
    update_recipe(recipe.id, &author, draft("Lasagne al forno"), links, &pool)
        .await
        .unwrap();
    let tags = list_recipe_tags(recipe.id, &pool).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].tag_id, dinner.id);

    let foreign = create_image("someone-else", "https://files.test/a.jpg", "a.jpg", &pool)
        .await
        .unwrap();
    let links = RecipeLinks {
        tags: Some(vec![]),
        image: ImageChange::Set(foreign.id),
    };
    let error = update_recipe(recipe.id, &author, draft("Renamed"), links, &pool)
        .await
        .unwrap_err();
    assert_eq!(error.code, 403);

    let stored = get_recipe_by_id(recipe.id, &pool).await.unwrap().unwrap();
    assert_eq!(stored.name, "Lasagne al forno");
    assert_eq!(stored.image_id, None);
    assert_eq!(list_recipe_tags(recipe.id, &pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn ingredient_names_ignore_case(pool: PgPool) {
    let salt = create_ingredient("Salt", None, &pool).await.unwrap();
    let again = create_ingredient("salt", Some("Fine"), &pool).await.unwrap();
    assert_eq!(salt.id, again.id);

    let found = find_ingredient("SALT", &pool).await.unwrap().unwrap();
    assert_eq!(found.id, salt.id);

    create_ingredient("100% rye", None, &pool).await.unwrap();
    let matches = list_ingredients("%", &pool).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "100% rye");
}

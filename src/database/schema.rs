use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::TypeError;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Eq, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl FromStr for UserRole {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(TypeError::new("Invalid variant")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash)]
#[sqlx(type_name = "tag_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Cuisine,
    Meal,
    Diet,
    Occasion,
    Method,
}

impl FromStr for TagType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cuisine" => Ok(Self::Cuisine),
            "meal" => Ok(Self::Meal),
            "diet" => Ok(Self::Diet),
            "occasion" => Ok(Self::Occasion),
            "method" => Ok(Self::Method),
            _ => Err(TypeError::new("Invalid variant")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Deserialize, Eq, Ord, Hash)]
#[sqlx(type_name = "difficulty", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(TypeError::new("Invalid variant")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecipeOrder {
    #[default]
    Newest,
    Alphabetical,
    QuickestFirst,
    TopRated,
    MostFavorited,
}

impl RecipeOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            RecipeOrder::Newest => "r.created_at DESC",
            RecipeOrder::Alphabetical => "r.name",
            RecipeOrder::QuickestFirst => "(r.prep_time + r.cook_time)",
            RecipeOrder::TopRated => "average_rating DESC NULLS LAST",
            RecipeOrder::MostFavorited => "favorite_count DESC",
        }
    }
}

impl FromStr for RecipeOrder {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "alphabetical" => Ok(Self::Alphabetical),
            "quickest_first" => Ok(Self::QuickestFirst),
            "top_rated" => Ok(Self::TopRated),
            "most_favorited" => Ok(Self::MostFavorited),
            _ => Err(TypeError::new("Invalid variant")),
        }
    }
}

macro_rules! try_from_value {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = TypeError;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match value.as_str() {
                        Some(value) => value.parse(),
                        None => Err(TypeError::new("Failed to parse value as string")),
                    }
                }
            }
        )*
    };
}

try_from_value!(UserRole, TagType, Difficulty, RecipeOrder);

/// Star rating in half-star steps between 0 and 5.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
pub struct Rating(f64);

impl Rating {
    pub const MAX: f64 = 5.0;

    pub fn new(value: f64) -> Result<Self, TypeError> {
        if !value.is_finite() || !(0.0..=Self::MAX).contains(&value) {
            return Err(TypeError::new("Rating must be between 0 and 5"));
        }
        if (value * 2.0).fract() != 0.0 {
            return Err(TypeError::new("Rating must be given in half stars"));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl FromStr for Rating {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| TypeError::new("Invalid rating"))?;
        Self::new(value)
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_id: Option<Uuid>,
    pub published: bool,
    pub steps: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn total_time(&self) -> i32 {
        self.prep_time + self.cook_time
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub prep_time: i32,
    pub cook_time: i32,
    pub difficulty: Difficulty,
    pub average_rating: Option<f64>,
    pub favorite_count: i64,

    pub count: i64,
}

/// Fields a caller supplies when creating or editing a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub description: String,
    pub steps: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub difficulty: Difficulty,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity: String,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub tag_type: TagType,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeTag {
    pub recipe_id: Uuid,
    pub tag_id: Uuid,
    pub name: String,
    pub tag_type: TagType,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Image {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CookingSession {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: String,
    pub rating: f64,
    pub time_spent: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct CookingHistoryRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub recipe_name: String,
    pub recipe_slug: String,
    pub rating: f64,
    pub time_spent: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserPoints {
    pub user_id: String,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserSummaryRow {
    pub user_id: String,
    pub points: i64,
    pub recipe_count: i64,
    pub session_count: i64,

    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_half_stars() {
        assert_eq!(Rating::new(0.0).unwrap().value(), 0.0);
        assert_eq!(Rating::new(3.5).unwrap().value(), 3.5);
        assert_eq!(Rating::new(5.0).unwrap().value(), 5.0);
    }

    #[test]
    fn rating_rejects_out_of_range_and_fractions() {
        assert!(Rating::new(-0.5).is_err());
        assert!(Rating::new(5.5).is_err());
        assert!(Rating::new(2.25).is_err());
        assert!(Rating::new(f64::NAN).is_err());
        assert!("four".parse::<Rating>().is_err());
    }

    #[test]
    fn enums_parse_from_form_values() {
        let tag: TagType = Value::from("cuisine").try_into().unwrap();
        assert_eq!(tag, TagType::Cuisine);

        let difficulty: Result<Difficulty, _> = Value::from(3).try_into();
        assert!(difficulty.is_err());

        let order: RecipeOrder = Value::from("top_rated").try_into().unwrap();
        assert_eq!(order, RecipeOrder::TopRated);
    }
}

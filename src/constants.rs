pub const RECIPE_COUNT_PER_PAGE: i64 = 12;
pub const HISTORY_COUNT_PER_PAGE: i64 = 20;
pub const USER_COUNT_PER_PAGE: i64 = 25;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;
pub const UPLOAD_SIGNATURE_HEADER: &str = "x-upload-signature";

/// Path prefixes that require a signed-in caller.
pub const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/recipes/new", "/admin"];
/// Path prefixes that additionally require the admin role.
pub const ADMIN_PREFIXES: &[&str] = &["/admin"];

pub const TAG_TYPES: &[(&str, &str)] = &[
    ("cuisine", "Cuisine"),
    ("meal", "Meal"),
    ("diet", "Diet"),
    ("occasion", "Occasion"),
    ("method", "Method"),
];

pub const DIFFICULTIES: &[(&str, &str)] = &[("easy", "Easy"), ("medium", "Medium"), ("hard", "Hard")];

pub const RECIPE_ORDERS: &[(&str, &str)] = &[
    ("newest", "Newest"),
    ("alphabetical", "Name"),
    ("quickest_first", "Quickest first"),
    ("top_rated", "Top rated"),
    ("most_favorited", "Most favorited"),
];

pub const MAX_RECIPE_NAME_LENGTH: usize = 120;
pub const MAX_COOKING_MINUTES: i32 = 24 * 60;

pub const POINTS_PER_LEVEL_STEP: i64 = 25;
pub const SESSION_BASE_POINTS: i64 = 10;
pub const SESSION_RATING_BONUS: i64 = 5;
pub const SESSION_NOTES_BONUS: i64 = 5;
pub const SESSION_TIME_BONUS_MINUTES: i64 = 10;
pub const SESSION_TIME_BONUS_CAP: i64 = 10;

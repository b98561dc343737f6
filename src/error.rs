use std::{
    convert::Infallible,
    fmt::{self, Display},
};

use serde::Serialize;
use thiserror::Error as ThisError;
use warp::{
    http::StatusCode,
    reject::{self, Rejection},
    reply::Response,
    Reply,
};

/// Error value returned by every query and action.
///
/// `redirect` is set when the caller should be sent elsewhere instead of
/// seeing an error body, e.g. the sign-in page for protected routes.
#[derive(Debug, Clone, Serialize)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
    pub redirect: Option<String>,
}

/// How an [`Error`] is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    NotAuthorized,
    Invalid,
    Unexpected,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self.code {
            404 => ErrorClass::NotFound,
            401 | 403 | 303 => ErrorClass::NotAuthorized,
            400..=499 => ErrorClass::Invalid,
            _ => ErrorClass::Unexpected,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> &str {
        self.info.as_deref().unwrap_or("Unknown error")
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code)
    }
}

impl std::error::Error for Error {}
impl reject::Reject for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlError {
    InvalidRequest,
    Unauthorized,
    InvalidSession,
    Forbidden,
    NotFound,
    Redirect,
    InternalServerError,
}

impl HtmlError {
    pub fn code(&self) -> u16 {
        match self {
            HtmlError::InvalidRequest => 400,
            HtmlError::Unauthorized => 401,
            HtmlError::InvalidSession => 401,
            HtmlError::Forbidden => 403,
            HtmlError::NotFound => 404,
            HtmlError::Redirect => 303,
            HtmlError::InternalServerError => 500,
        }
    }

    fn default_info(&self) -> &'static str {
        match self {
            HtmlError::InvalidRequest => "Invalid request",
            HtmlError::Unauthorized => "You must be signed in to perform this action",
            HtmlError::InvalidSession => "Invalid session",
            HtmlError::Forbidden => "You don't have permission to perform this action",
            HtmlError::NotFound => "Not found",
            HtmlError::Redirect => "Redirecting",
            HtmlError::InternalServerError => "Internal server error",
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
            redirect: None,
        }
    }

    pub fn default(self) -> Error {
        self.new(self.default_info())
    }

    pub fn redirect(self, location: &str) -> Error {
        Error {
            code: HtmlError::Redirect.code(),
            info: Some(self.default_info().to_string()),
            redirect: Some(location.to_string()),
        }
    }
}

/// Wraps driver failures so that only a readable message leaves the query layer.
pub struct QueryError {
    code: u16,
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { code: 500, info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self {
                code: 404,
                info: String::from("Row not found"),
            },
            sqlx::Error::Database(e) => {
                log::error!("Database error: {e}");
                match e.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => Self {
                        code: 400,
                        info: String::from("Entry already exists"),
                    },
                    sqlx::error::ErrorKind::ForeignKeyViolation => Self {
                        code: 400,
                        info: String::from("Referenced entry doesn't exist"),
                    },
                    _ => Self::new(format!("{e}")),
                }
            }
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            e => {
                log::error!("Query failed: {e}");
                Self::new(format!("{e}"))
            }
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        Error {
            code: value.code,
            info: Some(value.info),
            redirect: None,
        }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        log::error!("Migration failed: {value}");
        HtmlError::InternalServerError.new(&format!("{value}"))
    }
}

#[derive(Debug, ThisError)]
#[error("({info})")]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HtmlError::InvalidRequest.new(&value.info)
    }
}

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {info}")]
    Invalid { key: &'static str, info: String },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    message: &'a str,
}

fn error_reply(code: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        code: code.as_u16(),
        message,
    };
    warp::reply::with_status(warp::reply::json(&body), code).into_response()
}

impl Reply for Error {
    fn into_response(self) -> Response {
        match &self.redirect {
            Some(location) => warp::reply::with_header(
                warp::reply::with_status(warp::reply(), StatusCode::SEE_OTHER),
                "location",
                location.as_str(),
            )
            .into_response(),
            None => error_reply(self.status(), self.message()),
        }
    }
}

/// Turns rejections into JSON error bodies, or redirects when one was requested.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(e) = err.find::<Error>() {
        if e.class() == ErrorClass::Unexpected {
            log::error!("Request failed: {e}");
        }
        return Ok(e.clone().into_response());
    }

    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not found"));
    }
    if err.find::<warp::reject::MissingCookie>().is_some() {
        return Ok(error_reply(
            StatusCode::UNAUTHORIZED,
            HtmlError::Unauthorized.default_info(),
        ));
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, &e.to_string()));
    }
    if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, &e.to_string()));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        ));
    }

    log::warn!("Unhandled rejection: {err:?}");
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error",
    ))
}

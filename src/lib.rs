mod database {
    pub mod actions;
    pub mod form;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod recipe {
    pub mod cook_mode;
    pub mod scaling;
    pub mod slug;
}
pub mod progress {
    pub mod badges;
    pub mod points;
    pub mod streak;
}
mod constants;

pub mod config;
pub mod error;
pub mod routes;
pub mod upload;

pub use authentication::*;
pub use constants::*;
pub use database::*;

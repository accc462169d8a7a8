pub mod api;
pub mod auth;
pub mod config;
pub mod cookie_store;
pub mod prompt;
pub mod rank;
pub mod schema;
pub mod score;

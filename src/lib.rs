//! Blogicum: a multi-user blog with scheduled posts, categories, locations
//! and comments, served as server-rendered HTML.

pub mod access;
pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod forms;
pub mod handler;
pub mod mail;
pub mod media;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod render;
pub mod routes;
pub mod tracing_config;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::DBClient;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub env: Arc<Config>,
    pub db_client: DBClient,
}

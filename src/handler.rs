pub mod admin;
pub mod auth;
pub mod comment;
pub mod pages;
pub mod post;
pub mod users;

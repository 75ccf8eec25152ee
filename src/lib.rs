//! Chirpy: a small social feed served over HTTP and stored in a single JSON
//! file, with JWT sessions.

pub mod auth;
pub mod config;
pub mod dto;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod states;
pub mod store;

pub use states::AppState;

//! # Recetario Gateway
//! HTTP API: recipe and reminder CRUD, ingredient search, and the
//! cron-triggered reminder endpoints behind a shared-secret guard.

pub mod auth;
pub mod db;
pub mod error;
pub mod routes;
pub mod server;

pub use db::RecetarioDb;
pub use server::{AppState, build_router, serve};

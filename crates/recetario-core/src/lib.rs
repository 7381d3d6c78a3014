//! # Recetario Core
//!
//! Shared building blocks for the recipe book: configuration, the error
//! taxonomy, entity types, ingredient search, and the seams (storage and
//! email transport traits) the other crates plug into.

pub mod config;
pub mod error;
pub mod search;
pub mod traits;
pub mod types;

pub use config::RecetarioConfig;
pub use error::{RecetarioError, Result};
pub use traits::{EmailSender, RecipeStore, ReminderStore};
pub use types::{NewRecipe, NewReminder, OutgoingEmail, Recipe, Reminder};

//! Seams between the application and its external collaborators.
//!
//! Storage is synchronous (the SQLite store holds a mutex-guarded
//! connection); email transport is async because every provider is remote.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{NewRecipe, NewReminder, OutgoingEmail, Recipe, Reminder};

/// Recipe collection.
pub trait RecipeStore: Send + Sync {
    /// Persist a recipe; the store assigns `id` and `created_at`.
    fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe>;

    fn get_recipe(&self, id: &str) -> Result<Recipe>;

    /// All recipes, newest first.
    fn list_recipes(&self) -> Result<Vec<Recipe>>;
}

/// Reminder subscription collection.
pub trait ReminderStore: Send + Sync {
    fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder>;

    /// All subscriptions, newest first. No server-side filtering.
    fn list_reminders(&self) -> Result<Vec<Reminder>>;

    /// Hard delete. `NotFound` when no subscription has this id.
    fn delete_reminder(&self, id: &str) -> Result<()>;
}

/// Outbound email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

//! Entity types and the form parsing that produces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RecetarioError, Result};

/// A stored recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    /// Preparation time in minutes.
    pub prep_time: u32,
    pub servings: u32,
    pub created_at: DateTime<Utc>,
}

/// A validated recipe, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub prep_time: u32,
    pub servings: u32,
}

/// Ingredients as submitted: free text or an already split list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientsInput {
    List(Vec<String>),
    Text(String),
}

impl Default for IngredientsInput {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Raw recipe submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeForm {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "ingredientsText")]
    pub ingredients: IngredientsInput,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub prep_time: Option<serde_json::Value>,
    #[serde(default)]
    pub servings: Option<serde_json::Value>,
}

/// Split free-text ingredients on line breaks or commas, dropping blanks.
/// Order and duplicates are preserved.
pub fn parse_ingredients(text: &str) -> Vec<String> {
    text.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl NewRecipe {
    /// Validate a submission. Name, instructions and at least one ingredient
    /// are required; numeric fields fall back to their defaults.
    pub fn from_form(form: RecipeForm) -> Result<Self> {
        let name = form.name.trim().to_string();
        let instructions = form.instructions.trim().to_string();
        let ingredients = match form.ingredients {
            IngredientsInput::Text(text) => parse_ingredients(&text),
            IngredientsInput::List(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        if name.is_empty() {
            return Err(RecetarioError::Validation("Recipe name is required".into()));
        }
        if ingredients.is_empty() {
            return Err(RecetarioError::Validation(
                "At least one ingredient is required".into(),
            ));
        }
        if instructions.is_empty() {
            return Err(RecetarioError::Validation("Instructions are required".into()));
        }

        Ok(Self {
            name,
            ingredients,
            instructions,
            prep_time: lenient_int(form.prep_time.as_ref()).unwrap_or(0),
            servings: lenient_int(form.servings.as_ref())
                .filter(|&n| n >= 1)
                .unwrap_or(1),
        })
    }
}

/// Read a non-negative integer from a JSON number or a string with a leading
/// number ("20", "20 min"). Anything else is `None`.
fn lenient_int(value: Option<&serde_json::Value>) -> Option<u32> {
    match value? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => {
            let digits: String = s
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// A reminder subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Cadence label (free text, e.g. "weekly" or "semanal").
    pub frequency: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated subscription, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    pub name: String,
    pub email: String,
    pub frequency: String,
    pub active: bool,
}

/// Raw subscription submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub active: Option<bool>,
}

impl NewReminder {
    pub fn from_form(form: ReminderForm) -> Result<Self> {
        let name = form.name.trim().to_string();
        let email = form.email.trim().to_string();
        let frequency = form.frequency.trim().to_string();
        if name.is_empty() || email.is_empty() || frequency.is_empty() {
            return Err(RecetarioError::Validation(
                "Name, email and frequency are required".into(),
            ));
        }
        Ok(Self {
            name,
            email,
            frequency,
            active: form.active.unwrap_or(true),
        })
    }
}

/// A rendered message handed to an email transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

//! API route handlers for the gateway.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use recetario_core::search::search_by_ingredients;
use recetario_core::types::{NewRecipe, NewReminder, RecipeForm, ReminderForm};
use recetario_scheduler::dispatch_reminders;

use super::error::ApiError;
use super::server::AppState;

type ApiResult<T = Json<Value>> = Result<T, ApiError>;

/// Mask a secret for display: first 4 chars + •••
fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    match s.char_indices().nth(4) {
        Some((cut, _)) => format!("{}••••", &s[..cut]),
        None => "••••".to_string(),
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn environment_info(state: &AppState) -> Value {
    json!({
        "label": state.config.environment,
        "hasCronSecret": state.config.cron_secret().is_some(),
        "hasEmailKey": state.mailer.is_configured(),
    })
}

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "recetario-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Unprotected liveness probe for the scheduler.
pub async fn cron_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Cron service is running",
        "timestamp": now_rfc3339(),
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "environment": environment_info(&state),
    }))
}

/// Local diagnostics for the bearer setup. Hidden in production.
pub async fn cron_debug(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    if state.config.environment.eq_ignore_ascii_case("production") {
        return Err(ApiError::not_found());
    }

    let secret = state.config.cron_secret().unwrap_or_default();
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "environment": state.config.environment,
        "cronSecret": {
            "configured": !secret.is_empty(),
            "length": secret.len(),
            "preview": mask_secret(secret),
        },
        "request": {
            "authorization": mask_secret(auth),
            "authorizationMatches": !secret.is_empty() && auth == format!("Bearer {secret}"),
            "userAgent": user_agent,
        },
        "timestamp": now_rfc3339(),
    })))
}

/// Protected ping: reaching this handler proves the bearer secret is right.
pub async fn cron_test(State(state): State<Arc<AppState>>) -> Json<Value> {
    tracing::info!("⏰ Cron test endpoint called");
    Json(json!({
        "success": true,
        "message": "🎉 Cron endpoint working perfectly!",
        "timestamp": now_rfc3339(),
        "environment": environment_info(&state),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkQuery {
    pub frequency: Option<String>,
}

/// Send the reminder for one cadence to every matching subscriber.
pub async fn send_bulk_reminders(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BulkQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let label = query
        .frequency
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| state.config.reminders.default_frequency.clone());

    let summary = dispatch_reminders(
        state.reminders.as_ref(),
        &state.mailer,
        &state.runner,
        &label,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Sent {} of {} '{}' reminders", summary.sent, summary.total, label),
        "sent": summary.sent,
        "errors": summary.errors,
        "total": summary.total,
        "frequency": label,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SendReminderRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frequency: String,
}

/// Send one reminder right away. Only `email` is required: a missing name
/// gets a plain greeting and a missing or unknown frequency the generic copy.
pub async fn send_reminder(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SendReminderRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = body?;
    let (email, name, frequency) = (req.email.trim(), req.name.trim(), req.frequency.trim());
    if email.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "email is required"));
    }

    state.mailer.send_reminder(email, name, frequency).await?;
    tracing::info!("📧 Reminder sent to {email} ({frequency})");
    Ok(Json(json!({
        "success": true,
        "message": format!("Reminder sent to {email}"),
    })))
}

// ═══ Recipes ═══

#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub q: Option<String>,
}

pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RecipeQuery>, QueryRejection>,
) -> ApiResult {
    let Query(query) = query?;
    let all = state.recipes.list_recipes()?;
    let q = query.q.unwrap_or_default();
    let recipes = search_by_ingredients(&all, &q);
    Ok(Json(json!({
        "success": true,
        "total": recipes.len(),
        "recipes": recipes,
    })))
}

pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RecipeForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(form) = body?;
    let recipe = state.recipes.create_recipe(&NewRecipe::from_form(form)?)?;
    tracing::info!("🍳 Recipe created: '{}'", recipe.name);
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "recipe": recipe})),
    ))
}

pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    let recipe = state.recipes.get_recipe(&id)?;
    Ok(Json(json!({"success": true, "recipe": recipe})))
}

// ═══ Reminder subscriptions ═══

pub async fn list_reminders(State(state): State<Arc<AppState>>) -> ApiResult {
    let reminders = state.reminders.list_reminders()?;
    Ok(Json(json!({
        "success": true,
        "total": reminders.len(),
        "reminders": reminders,
    })))
}

pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReminderForm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(form) = body?;
    let reminder = state.reminders.create_reminder(&NewReminder::from_form(form)?)?;
    tracing::info!("🔔 Reminder subscription: {} ({})", reminder.email, reminder.frequency);
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "reminder": reminder})),
    ))
}

pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    state.reminders.delete_reminder(&id)?;
    tracing::info!("🗑️ Reminder deleted: {id}");
    Ok(Json(json!({"success": true})))
}

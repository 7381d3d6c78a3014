//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{delete, get, post},
};
use recetario_channels::ReminderMailer;
use recetario_core::config::RecetarioConfig;
use recetario_core::traits::{RecipeStore, ReminderStore};
use recetario_scheduler::SequentialRunner;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::db::RecetarioDb;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RecetarioConfig>,
    pub recipes: Arc<dyn RecipeStore>,
    pub reminders: Arc<dyn ReminderStore>,
    /// Built once at startup; unconfigured when the email credential is missing.
    pub mailer: Arc<ReminderMailer>,
    /// Paces bulk sends.
    pub runner: SequentialRunner,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// State backed by one database for both collections.
    pub fn new(config: RecetarioConfig, db: Arc<RecetarioDb>, mailer: ReminderMailer) -> Self {
        let runner = SequentialRunner::from_millis(config.reminders.send_delay_ms);
        Self {
            config: Arc::new(config),
            recipes: db.clone(),
            reminders: db,
            mailer: Arc::new(mailer),
            runner,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

/// Build router from a pre-wrapped Arc<AppState>.
pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    // Scheduler-triggered routes: bearer secret checked before any handler runs
    let protected = Router::new()
        .route("/api/cron/test", get(super::routes::cron_test))
        .route(
            "/api/send-bulk-reminders",
            get(super::routes::send_bulk_reminders).post(super::routes::send_bulk_reminders),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            shared.clone(),
            super::auth::require_cron_secret,
        ));

    let public = Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/cron/status", get(super::routes::cron_status))
        .route("/api/cron/debug", get(super::routes::cron_debug))
        .route("/api/send-reminder", post(super::routes::send_reminder))
        .route(
            "/api/recipes",
            get(super::routes::list_recipes).post(super::routes::create_recipe),
        )
        .route("/api/recipes/{id}", get(super::routes::get_recipe))
        .route(
            "/api/reminders",
            get(super::routes::list_reminders).post(super::routes::create_reminder),
        )
        .route("/api/reminders/{id}", delete(super::routes::delete_reminder));

    protected
        .merge(public)
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(3600));

            // Example: RECETARIO_CORS_ORIGINS=https://recetario.app,https://www.recetario.app
            if let Ok(origins_str) = std::env::var("RECETARIO_CORS_ORIGINS") {
                let origins: Vec<_> = origins_str
                    .split(',')
                    .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            } else {
                cors.allow_origin(Any)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.gateway.host, state.config.gateway.port);

    if state.config.cron_secret().is_none() {
        tracing::warn!("⚠️ CRON_SECRET not set: protected cron routes will answer 500");
    }
    if !state.mailer.is_configured() {
        tracing::warn!("⚠️ Email not configured: reminder sends will fail");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Recetario listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use recetario_core::error::Result;
    use recetario_core::traits::EmailSender;
    use recetario_core::types::{NewReminder, OutgoingEmail, Reminder};
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const SECRET: &str = "right";

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, email: &OutgoingEmail) -> Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    /// Counts how often subscriptions are listed.
    struct CountingStore {
        inner: Arc<RecetarioDb>,
        lists: AtomicUsize,
    }

    impl ReminderStore for CountingStore {
        fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder> {
            self.inner.create_reminder(reminder)
        }

        fn list_reminders(&self) -> Result<Vec<Reminder>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list_reminders()
        }

        fn delete_reminder(&self, id: &str) -> Result<()> {
            self.inner.delete_reminder(id)
        }
    }

    struct Harness {
        state: Arc<AppState>,
        db: Arc<RecetarioDb>,
        sender: Arc<RecordingSender>,
        store: Arc<CountingStore>,
    }

    impl Harness {
        fn new(secret: Option<&str>, configured_mail: bool) -> Self {
            let mut config = RecetarioConfig::default();
            config.cron_secret = secret.map(String::from);

            let db = Arc::new(RecetarioDb::open(&PathBuf::from(":memory:")).unwrap());
            let sender = Arc::new(RecordingSender::default());
            let mailer = if configured_mail {
                ReminderMailer::new(sender.clone(), "http://localhost:3000")
            } else {
                let app_url = "http://localhost:3000";
                ReminderMailer::unconfigured("Email service not configured", app_url)
            };
            let store = Arc::new(CountingStore {
                inner: db.clone(),
                lists: AtomicUsize::new(0),
            });

            let state = AppState {
                config: Arc::new(config),
                recipes: db.clone(),
                reminders: store.clone(),
                mailer: Arc::new(mailer),
                runner: SequentialRunner::new(std::time::Duration::ZERO),
                start_time: std::time::Instant::now(),
            };
            Self {
                state: Arc::new(state),
                db,
                sender,
                store,
            }
        }

        fn subscribe(&self, email: &str, frequency: &str) {
            self.db
                .create_reminder(&NewReminder {
                    name: "Ana".into(),
                    email: email.into(),
                    frequency: frequency.into(),
                    active: true,
                })
                .unwrap();
        }

        async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
            let resp = build_router_from_arc(self.state.clone())
                .oneshot(req)
                .await
                .unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, body)
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bulk(frequency: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/send-bulk-reminders?frequency={frequency}"));
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h.call(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_wrong_bearer_rejected_before_selection() {
        let h = Harness::new(Some(SECRET), true);
        h.subscribe("a@x.com", "semanal");

        let (status, body) = h.call(bulk("semanal", Some("Bearer wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"success": false, "error": "Unauthorized"}));
        assert_eq!(h.store.lists.load(Ordering::SeqCst), 0);
        assert!(h.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let h = Harness::new(Some(SECRET), true);
        let (status, _) = h.call(bulk("semanal", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = h.call(get("/api/cron/test")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(h.store.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_secret_is_server_error() {
        let h = Harness::new(None, true);
        let (status, body) = h.call(bulk("semanal", Some("Bearer "))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server misconfigured");
        assert_eq!(h.store.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bulk_weekly_scenario() {
        let h = Harness::new(Some(SECRET), true);
        for i in 1..=3 {
            h.subscribe(&format!("s{i}@x.com"), "semanal");
        }
        h.subscribe("m1@x.com", "mensual");
        h.subscribe("m2@x.com", "mensual");

        let (status, body) = h.call(bulk("semanal", Some("Bearer right"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["sent"], 3);
        assert_eq!(body["errors"], 0);
        assert_eq!(body["total"], 3);
        assert_eq!(body["frequency"], "semanal");

        let sent = h.sender.sent.lock().unwrap();
        let mut to: Vec<_> = sent.iter().map(|m| m.to.as_str()).collect();
        to.sort();
        assert_eq!(to, vec!["s1@x.com", "s2@x.com", "s3@x.com"]);
    }

    #[tokio::test]
    async fn test_bulk_without_frequency_uses_default_label() {
        let h = Harness::new(Some(SECRET), true);
        h.subscribe("w@x.com", "weekly");
        h.subscribe("d@x.com", "daily");

        let req = Request::builder()
            .uri("/api/send-bulk-reminders")
            .header("authorization", "Bearer right")
            .body(Body::empty())
            .unwrap();
        let (status, body) = h.call(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["frequency"], "weekly");
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_bulk_unconfigured_mail_is_server_error() {
        let h = Harness::new(Some(SECRET), false);
        h.subscribe("a@x.com", "semanal");
        let (status, body) = h.call(bulk("semanal", Some("Bearer right"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Email service not configured");
    }

    #[tokio::test]
    async fn test_cron_test_with_correct_bearer() {
        let h = Harness::new(Some(SECRET), true);
        let req = Request::builder()
            .uri("/api/cron/test")
            .header("authorization", "Bearer right")
            .body(Body::empty())
            .unwrap();
        let (status, body) = h.call(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["environment"]["hasCronSecret"], true);
    }

    #[tokio::test]
    async fn test_cron_status_is_public() {
        let h = Harness::new(None, false);
        let (status, body) = h.call(get("/api/cron/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["environment"]["hasCronSecret"], false);
        assert_eq!(body["environment"]["hasEmailKey"], false);
    }

    #[tokio::test]
    async fn test_debug_hidden_in_production() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h.call(get("/api/cron/debug")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cronSecret"]["length"], 5);

        let mut config = (*h.state.config).clone();
        config.environment = "production".into();
        let state = AppState {
            config: Arc::new(config),
            ..(*h.state).clone()
        };
        let resp = build_router(state).oneshot(get("/api/cron/debug")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_reminder_single() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h
            .call(post_json(
                "/api/send-reminder",
                json!({"email": "ana@x.com", "name": "Ana", "frequency": "semanal"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let sent = h.sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@x.com");
    }

    #[tokio::test]
    async fn test_send_reminder_requires_email() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h
            .call(post_json("/api/send-reminder", json!({"name": "Ana", "email": "  "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "email is required"}));
        assert!(h.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_reminder_email_only_uses_generic_copy() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h
            .call(post_json("/api/send-reminder", json!({"email": "ana@x.com"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let sent = h.sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@x.com");
        assert_eq!(sent[0].subject, "¿Comiste algo delicioso hoy? 🍽️");
        assert!(sent[0].html.contains("¡Hola! 👋"));
    }

    #[tokio::test]
    async fn test_bad_query_string_gets_json_error() {
        let h = Harness::new(Some(SECRET), true);
        h.subscribe("a@x.com", "semanal");

        let (status, body) = h
            .call(bulk("semanal&frequency=mensual", Some("Bearer right")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Invalid query parameters"}));
        assert_eq!(h.store.lists.load(Ordering::SeqCst), 0);
        assert!(h.sender.sent.lock().unwrap().is_empty());

        let (status, body) = h.call(get("/api/recipes?q=a&q=b")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_bad_path_segment_gets_json_error() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h.call(get("/api/recipes/%FF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Invalid path parameter"}));

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/reminders/%FF")
            .body(Body::empty())
            .unwrap();
        let (status, body) = h.call(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid path parameter");
    }

    #[tokio::test]
    async fn test_send_reminder_unconfigured() {
        let h = Harness::new(Some(SECRET), false);
        let (status, body) = h
            .call(post_json(
                "/api/send-reminder",
                json!({"email": "ana@x.com", "name": "Ana", "frequency": "semanal"}),
            ))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Email service not configured"}));
    }

    #[tokio::test]
    async fn test_recipe_create_and_fetch() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h
            .call(post_json(
                "/api/recipes",
                json!({
                    "name": "Tostada",
                    "ingredients": "Pan\nHuevo, Sal",
                    "instructions": "Tostar el pan",
                    "prepTime": "5",
                    "servings": 0
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let recipe = &body["recipe"];
        assert_eq!(recipe["ingredients"], json!(["Pan", "Huevo", "Sal"]));
        assert_eq!(recipe["prepTime"], 5);
        assert_eq!(recipe["servings"], 1);

        let id = recipe["id"].as_str().unwrap();
        let (status, body) = h.call(get(&format!("/api/recipes/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipe"]["ingredients"], json!(["Pan", "Huevo", "Sal"]));
        assert_eq!(body["recipe"]["name"], "Tostada");
    }

    #[tokio::test]
    async fn test_recipe_validation_and_bad_body() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h
            .call(post_json("/api/recipes", json!({"name": "Sin nada"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let req = Request::builder()
            .method("POST")
            .uri("/api/recipes")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = h.call(req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_missing_recipe_is_404() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h.call(get("/api/recipes/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_recipe_search() {
        let h = Harness::new(Some(SECRET), true);
        for (name, ingredients) in [
            ("Pizza", json!(["Tomate", "Queso", "Harina"])),
            ("Ensalada", json!(["tomate", "lechuga"])),
            ("Fondue", json!(["queso gruyère"])),
        ] {
            let (status, _) = h
                .call(post_json(
                    "/api/recipes",
                    json!({"name": name, "ingredients": ingredients, "instructions": "..."}),
                ))
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = h.call(get("/api/recipes?q=tomate,%20queso")).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["recipes"][0]["name"], "Pizza");

        let (_, body) = h.call(get("/api/recipes")).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["recipes"][0]["name"], "Fondue");
    }

    #[tokio::test]
    async fn test_reminder_subscription_crud() {
        let h = Harness::new(Some(SECRET), true);
        let (status, body) = h
            .call(post_json(
                "/api/reminders",
                json!({"name": "Ana", "email": "ana@x.com", "frequency": "semanal"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["reminder"]["active"], true);
        let id = body["reminder"]["id"].as_str().unwrap().to_string();

        let (_, body) = h.call(get("/api/reminders")).await;
        assert_eq!(body["total"], 1);

        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/reminders/{id}"))
                .body(Body::empty())
                .unwrap()
        };
        let (status, _) = h.call(delete(&id)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = h.call(delete(&id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reminder_subscription_requires_fields() {
        let h = Harness::new(Some(SECRET), true);
        let (status, _) = h
            .call(post_json("/api/reminders", json!({"name": "Ana", "email": ""})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(h.db.list_reminders().unwrap().is_empty());
    }
}

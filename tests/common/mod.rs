use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use sea_orm::{ActiveValue::Set, ConnectOptions, Database, EntityTrait};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use devfolio_api::{
    app_router,
    auth::AuthService,
    config::AppConfig,
    db::StoreHandle,
    entities::user::{self, UserRole},
    migrator::Migrator,
    AppState,
};
use sea_orm_migration::MigratorTrait;

/// Test harness backed by an in-memory SQLite database and temp directories
/// for settings and uploads.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// Fresh application with a migrated, empty store.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");

        // A single connection keeps every query on the same in-memory db.
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options
            .max_connections(1)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(5));
        let pool = Database::connect(options)
            .await
            .expect("connect test database");
        Migrator::up(&pool, None).await.expect("run migrations");

        let store = StoreHandle::Live(Arc::new(pool));
        Self::with_store(store, dir)
    }

    /// Application with no configured store; public reads fall back to the
    /// built-in catalog and writes fail.
    pub fn unconfigured() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        Self::with_store(StoreHandle::Unconfigured, dir)
    }

    fn with_store(store: StoreHandle, dir: tempfile::TempDir) -> Self {
        let config = AppConfig {
            database_url: String::new(),
            jwt_secret: "test_secret_key_for_testing_purposes_only_32chars".into(),
            jwt_expiration: 3600,
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            log_level: "error".into(),
            log_json: false,
            auto_migrate: false,
            upload_dir: dir.path().join("uploads").display().to_string(),
            upload_base_url: "/uploads".into(),
            settings_path: dir.path().join("settings.json").display().to_string(),
            fallback_admin: None,
        };
        let state = Arc::new(AppState::new(config, store));
        Self {
            router: app_router(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub fn db(&self) -> &devfolio_api::db::DbPool {
        self.state.store.db().expect("test app has a live store")
    }

    pub fn auth(&self) -> &AuthService {
        &self.state.auth
    }

    /// Insert a user row and return its id.
    pub async fn seed_user(&self, email: &str, password: &str, role: UserRole) -> Uuid {
        let id = Uuid::new_v4();
        let row = user::ActiveModel {
            id: Set(id),
            email: Set(email.to_string()),
            password_hash: Set(AuthService::hash_password(password)),
            name: Set(Some("Test User".to_string())),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now()),
        };
        user::Entity::insert(row)
            .exec(self.db())
            .await
            .expect("seed user");
        id
    }

    /// Bearer token for an admin identity, without touching the store.
    pub fn admin_token(&self) -> String {
        let principal = devfolio_api::auth::Principal {
            id: Uuid::new_v4(),
            email: "admin@test.local".to_string(),
            name: Some("Admin".to_string()),
            role: UserRole::Admin,
        };
        self.state
            .auth
            .generate_token(&principal)
            .expect("sign token")
    }

    pub fn user_token(&self) -> String {
        let principal = devfolio_api::auth::Principal {
            id: Uuid::new_v4(),
            email: "user@test.local".to_string(),
            name: None,
            role: UserRole::User,
        };
        self.state
            .auth
            .generate_token(&principal)
            .expect("sign token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("dispatch request")
    }
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse response body")
}

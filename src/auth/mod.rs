use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::FallbackAdmin;
use crate::db::StoreHandle;
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;

/// Authenticated caller identity, injected into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService {
    store: StoreHandle,
    fallback_admin: Option<FallbackAdmin>,
    jwt_secret: String,
    token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(
        store: StoreHandle,
        fallback_admin: Option<FallbackAdmin>,
        jwt_secret: String,
        token_ttl_secs: i64,
    ) -> Self {
        Self {
            store,
            fallback_admin,
            jwt_secret,
            token_ttl_secs,
        }
    }

    /// Hex-encoded SHA-256 digest, matching the stored credential format.
    pub fn hash_password(password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify credentials against active users. Unknown email and wrong
    /// password are indistinguishable to the caller. Without a configured
    /// store the env-provided fallback admin, if any, is the only account.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Principal>, ServiceError> {
        let db = match self.store.db() {
            Some(db) => db,
            None => return Ok(self.authenticate_fallback(email, password)),
        };

        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::IsActive.eq(true))
            .one(db)
            .await?;

        let Some(account) = found else {
            return Ok(None);
        };
        if account.password_hash != Self::hash_password(password) {
            return Ok(None);
        }
        Ok(Some(Principal {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
        }))
    }

    fn authenticate_fallback(&self, email: &str, password: &str) -> Option<Principal> {
        let admin = self.fallback_admin.as_ref()?;
        if admin.email != email || admin.password != password {
            return None;
        }
        warn!("Authenticated via fallback admin credentials; no user store is configured");
        Some(Principal {
            id: Uuid::nil(),
            email: admin.email.clone(),
            name: Some("Administrator".to_string()),
            role: UserRole::Admin,
        })
    }

    pub fn generate_token(&self, principal: &Principal) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            name: principal.name.clone(),
            role: principal.role,
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Principal, ServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))?;

        let id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;
        Ok(Principal {
            id,
            email: data.claims.email,
            name: data.claims.name,
            role: data.claims.role,
        })
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl_secs
    }

    /// Rotate a user's password after re-verifying the current one.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if new_password.len() < 8 {
            return Err(ServiceError::ValidationError(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        let db = self.store.db_for_write()?;
        let account = user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        if account.password_hash != Self::hash_password(current_password) {
            return Err(ServiceError::InvalidCredentials);
        }

        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(Self::hash_password(new_password));
        active.update(db).await?;
        info!(%user_id, "Password changed");
        Ok(())
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Require a valid bearer token and stash the caller's [`Principal`] in the
/// request extensions for downstream handlers and guards.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(&req)
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))?;
    let principal = auth.validate_token(token)?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Reject callers whose role does not match. Must run after
/// [`auth_middleware`] on the same route stack.
pub async fn role_middleware(
    State(required): State<UserRole>,
    req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".to_string()))?;
    if principal.role != required {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }
    Ok(next.run(req).await)
}

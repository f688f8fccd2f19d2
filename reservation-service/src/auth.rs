//! Password hashing, bearer tokens and the request guards built on them.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::ROLE_ADMIN;
use tracing::debug;

use crate::api::AppState;
use crate::error::{AppError, AuthFailure, ForbiddenKind, Result};
use crate::models::User;
use crate::store::Store;

pub fn hash_password(password: &str) -> Result<String> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub roles: Vec<String>,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Identity of the caller, placed in request extensions by the guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}

pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.username.clone(),
            roles: user.roles.clone(),
            exp: (now + self.ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String> {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("JWT validation failed: {e}");
            AppError::Unauthorized(AuthFailure::InvalidToken)
        })
    }
}

fn bearer_token(request: &Request) -> Result<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized(AuthFailure::MissingToken))?;
    header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized(AuthFailure::InvalidToken))
}

/// Loads the token subject from the user table. Roles come from the row, not
/// the claims, and a disabled account is turned away.
async fn resolve<S: Store>(store: &S, claims: Claims) -> Result<AuthUser> {
    let username = claims.sub;
    let user = store
        .transaction(move |tx| Box::pin(async move { tx.find_user_by_username(&username).await }))
        .await?;

    match user {
        Some(user) if user.enabled => Ok(AuthUser {
            username: user.username,
            roles: user.roles,
        }),
        Some(user) => {
            debug!("Rejected token of disabled user {}", user.username);
            Err(AppError::Unauthorized(AuthFailure::AccountDisabled))
        }
        None => Err(AppError::Unauthorized(AuthFailure::InvalidToken)),
    }
}

pub async fn require_user<S: Store>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let claims = state.tokens.verify(bearer_token(&request)?)?;
    let user = resolve(state.store.as_ref(), claims).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_admin<S: Store>(
    State(state): State<AppState<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let claims = state.tokens.verify(bearer_token(&request)?)?;
    let user = resolve(state.store.as_ref(), claims).await?;
    if !user.is_admin() {
        return Err(AppError::Forbidden(ForbiddenKind::AdminRequired));
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use shared::ROLE_CUSTOMER;
    use uuid::Uuid;

    fn user(roles: &[&str]) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            enabled: true,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn claims_for(username: &str, roles: &[&str]) -> Claims {
        let now = Utc::now();
        Claims {
            sub: username.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: (now + Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        }
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_carries_username_and_roles() {
        let tokens = TokenService::new("test-secret", 1);
        let token = tokens.issue(&user(&[ROLE_CUSTOMER])).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec![ROLE_CUSTOMER.to_string()]);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let token = TokenService::new("one", 1).issue(&user(&[])).unwrap();
        let err = TokenService::new("two", 1).verify(&token).unwrap_err();
        assert!(matches!(
            err,
            AppError::Unauthorized(AuthFailure::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new("test-secret", 1);
        let issued = Utc::now() - Duration::hours(3);
        let token = tokens
            .encode(&Claims {
                sub: "alice".to_string(),
                roles: vec![],
                exp: (issued + Duration::hours(1)).timestamp() as usize,
                iat: issued.timestamp() as usize,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn admin_flag_follows_roles() {
        let admin = AuthUser {
            username: "root".to_string(),
            roles: vec![ROLE_CUSTOMER.to_string(), ROLE_ADMIN.to_string()],
        };
        let customer = AuthUser {
            username: "alice".to_string(),
            roles: vec![ROLE_CUSTOMER.to_string()],
        };
        assert!(admin.is_admin());
        assert!(!customer.is_admin());
    }

    #[tokio::test]
    async fn resolved_roles_come_from_the_stored_user() {
        let store = MemoryStore::new();
        store.seed_user("alice", "secret", &[ROLE_CUSTOMER]).await;

        let resolved = resolve(&store, claims_for("alice", &[ROLE_ADMIN]))
            .await
            .unwrap();
        assert_eq!(resolved.username, "alice");
        assert_eq!(resolved.roles, vec![ROLE_CUSTOMER.to_string()]);
        assert!(!resolved.is_admin());
    }

    #[tokio::test]
    async fn unknown_subject_is_an_invalid_token() {
        let store = MemoryStore::new();
        let err = resolve(&store, claims_for("ghost", &[ROLE_CUSTOMER]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Unauthorized(AuthFailure::InvalidToken)
        ));
    }
}

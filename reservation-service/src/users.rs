use chrono::Utc;
use shared::{LoginRequest, RegisterRequest, UserUpdate, KNOWN_ROLES, ROLE_ADMIN, ROLE_CUSTOMER};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, verify_password, TokenService};
use crate::error::{AppError, AuthFailure, ConflictKind, InvalidArgument, Resource, Result};
use crate::models::{NewUser, User, UserChanges};
use crate::store::Store;

pub struct UserService<S> {
    store: Arc<S>,
}

impl<S: Store> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        request.validate()?;
        let user = self
            .create_account(
                request.username.trim().to_string(),
                request.email.trim().to_string(),
                &request.password,
                vec![ROLE_CUSTOMER.to_string()],
            )
            .await?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    pub async fn login(&self, tokens: &TokenService, request: LoginRequest) -> Result<(String, User)> {
        let username = request.username;
        let user = self
            .store
            .transaction(move |tx| Box::pin(async move { tx.find_user_by_username(&username).await }))
            .await?;

        let user = match user {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            _ => return Err(AppError::Unauthorized(AuthFailure::InvalidCredentials)),
        };
        if !user.enabled {
            warn!("Login attempt for disabled user {}", user.username);
            return Err(AppError::Unauthorized(AuthFailure::AccountDisabled));
        }

        let token = tokens.issue(&user)?;
        info!("User {} logged in", user.username);
        Ok((token, user))
    }

    pub async fn me(&self, username: &str) -> Result<User> {
        let username = username.to_string();
        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.find_user_by_username(&username)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))
                })
            })
            .await
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        self.store
            .transaction(|tx| Box::pin(async move { tx.list_users().await }))
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.find_user(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))
                })
            })
            .await
    }

    /// Admin edit of profile, enabled flag and roles. The password hash is never touched.
    pub async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User> {
        update.validate()?;
        let roles = normalize_roles(update.roles)?;
        let username = update.username.trim().to_string();
        let email = update.email.trim().to_string();
        let enabled = update.enabled;

        let user = self
            .store
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.lock_user(id)
                        .await?
                        .ok_or(AppError::NotFound(Resource::User))?;
                    if tx.username_taken(&username, Some(id)).await? {
                        return Err(AppError::Conflict(ConflictKind::UsernameTaken));
                    }
                    if tx.email_taken(&email, Some(id)).await? {
                        return Err(AppError::Conflict(ConflictKind::EmailTaken));
                    }
                    tx.update_user(
                        id,
                        UserChanges {
                            username,
                            email,
                            enabled,
                            roles,
                        },
                    )
                    .await?
                    .ok_or(AppError::NotFound(Resource::User))
                })
            })
            .await?;

        info!("User {} updated (roles {:?})", user.username, user.roles);
        Ok(user)
    }

    /// Creates the bootstrap administrator unless the username already exists.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let name = username.to_string();
        let exists = self
            .store
            .transaction(move |tx| Box::pin(async move { tx.username_taken(&name, None).await }))
            .await?;
        if exists {
            info!("Admin account {} already present", username);
            return Ok(());
        }

        self.create_account(
            username.to_string(),
            email.to_string(),
            password,
            vec![ROLE_ADMIN.to_string(), ROLE_CUSTOMER.to_string()],
        )
        .await?;
        info!("Created admin account {}", username);
        Ok(())
    }

    async fn create_account(
        &self,
        username: String,
        email: String,
        password: &str,
        roles: Vec<String>,
    ) -> Result<User> {
        let password_hash = hash_password(password)?;

        self.store
            .transaction(move |tx| {
                Box::pin(async move {
                    if tx.username_taken(&username, None).await? {
                        return Err(AppError::Conflict(ConflictKind::UsernameTaken));
                    }
                    if tx.email_taken(&email, None).await? {
                        return Err(AppError::Conflict(ConflictKind::EmailTaken));
                    }
                    tx.insert_user(NewUser {
                        id: Uuid::new_v4(),
                        username,
                        email,
                        password_hash,
                        enabled: true,
                        roles,
                        created_at: Utc::now(),
                    })
                    .await
                })
            })
            .await
    }
}

fn normalize_roles(roles: Vec<String>) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(roles.len());
    for role in roles {
        let role = role.trim().to_string();
        if !KNOWN_ROLES.contains(&role.as_str()) {
            return Err(AppError::InvalidArgument(InvalidArgument::Role(role)));
        }
        if !normalized.contains(&role) {
            normalized.push(role);
        }
    }
    if normalized.is_empty() {
        return Err(AppError::InvalidArgument(InvalidArgument::Validation(
            "At least one role is required".to_string(),
        )));
    }
    Ok(normalized)
}

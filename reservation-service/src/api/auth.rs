use axum::{extract::State, Extension};
use shared::{AuthResponse, LoginRequest, RegisterRequest, UserView};

use super::extract::Json;
use super::AppState;
use crate::auth::AuthUser;
use crate::error::Result;
use crate::store::Store;
use crate::users::UserService;

pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserView>> {
    let user = UserService::new(state.store).register(request).await?;
    Ok(Json(UserView::from(&user)))
}

pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (token, user) = UserService::new(state.store)
        .login(&state.tokens, request)
        .await?;
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

pub async fn me<S: Store>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserView>> {
    let user = UserService::new(state.store).me(&user.username).await?;
    Ok(Json(UserView::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use shared::{AuthResponse, UserView, ROLE_CUSTOMER};

    #[tokio::test]
    async fn register_login_and_me() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "carol", "email": "carol@example.com", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let registered: UserView = serde_json::from_value(body).unwrap();
        assert_eq!(registered.roles, vec![ROLE_CUSTOMER.to_string()]);

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "carol", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let auth: AuthResponse = serde_json::from_value(body).unwrap();
        assert_eq!(auth.user, registered);

        let (status, body) = app
            .send("GET", "/api/auth/me", Some(&auth.token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let me: UserView = serde_json::from_value(body).unwrap();
        assert_eq!(me.username, "carol");
    }

    #[tokio::test]
    async fn bad_credentials_and_duplicates_are_reported() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"username": "alice", "password": "nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");

        let (status, body) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "alice", "email": "new@example.com", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "USERNAME_TAKEN");

        let (status, body): (_, Value) = app
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"username": "dave", "email": "not-an-email", "password": "pw"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }
}

//! Authentication and profile endpoints.

use super::MessageBody;
use crate::error::ApiError;
use crate::http::{Auth, HttpClient, send_empty, send_json};
use reqwest::Method;
use riskdash_cache::DomainCaches;
use riskdash_cache::keys;
use riskdash_domain::ValidationError;
use riskdash_domain::entities::user::check_password_policy;
use riskdash_domain::entities::{AuthSession, Credentials, RegisterRequest, User};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Deserialize)]
struct AccessTokenBody {
    access_token: String,
}

/// Service for `/api/auth`.
#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
    caches: Arc<DomainCaches>,
}

impl AuthService {
    /// Creates a new AuthService.
    pub(crate) fn new(http: HttpClient, caches: Arc<DomainCaches>) -> Self {
        Self { http, caches }
    }

    /// Signs in, stores both tokens and caches the profile.
    ///
    /// # Errors
    /// Returns a validation error for blank credentials, or the backend's
    /// rejection.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, ApiError> {
        let credentials = Credentials {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        credentials.validate()?;

        let request = self
            .http
            .request(Method::POST, "/api/auth/login", Auth::None)
            .json(&credentials);
        let session: AuthSession = send_json(request).await?;

        self.http
            .tokens()
            .store(&session.access_token, Some(&session.refresh_token))?;
        self.caches.users.set(
            keys::CURRENT_USER,
            session.user.clone(),
            self.caches.users_ttl(),
        );
        info!(user_id = %session.user.id, username = %session.user.username, "Signed in");
        Ok(session)
    }

    /// Creates an account. Does not sign in.
    ///
    /// # Errors
    /// Returns a validation error before sending, or the backend's rejection.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;
        let builder = self
            .http
            .request(Method::POST, "/api/auth/register", Auth::None)
            .json(request);
        let body: UserBody = send_json(builder).await?;
        info!(user_id = %body.user.id, "Account registered");
        Ok(body.user)
    }

    /// Signs out. Local tokens and the cached profile are dropped even when
    /// the backend call fails.
    ///
    /// # Errors
    /// Returns the backend or storage error after clearing local state.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let remote = if self.http.tokens().access_token().is_some() {
            send_empty(self.http.post("/api/auth/logout")).await
        } else {
            Ok(())
        };
        if let Err(e) = &remote {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }

        let cleared = self.http.tokens().clear();
        self.caches.users.remove(keys::CURRENT_USER);
        info!("Signed out");
        remote.and(cleared)
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthorized`] when no refresh token is stored.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        if self.http.tokens().refresh_token().is_none() {
            return Err(ApiError::Unauthorized("No refresh token stored".to_string()));
        }
        let request = self
            .http
            .request(Method::POST, "/api/auth/refresh", Auth::Refresh);
        let body: AccessTokenBody = send_json(request).await?;
        self.http.tokens().store(&body.access_token, None)?;
        info!("Access token refreshed");
        Ok(body.access_token)
    }

    /// Profile of the signed-in user, cached under `user:me`.
    ///
    /// # Errors
    /// Returns the backend's error; failures are not cached.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.caches
            .users
            .get_or_set(keys::CURRENT_USER, self.caches.users_ttl(), || async {
                let body: UserBody = send_json(self.http.get("/api/auth/me")).await?;
                Ok::<_, ApiError>(body.user)
            })
            .await
    }

    /// Changes the signed-in user's password.
    ///
    /// # Errors
    /// Returns a validation error for a weak or missing password, or the
    /// backend's rejection.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ApiError> {
        if current.is_empty() {
            return Err(ValidationError::missing("current_password").into());
        }
        if new.is_empty() {
            return Err(ValidationError::missing("new_password").into());
        }
        check_password_policy("new_password", new)?;

        let request = self
            .http
            .post("/api/auth/change-password")
            .json(&json!({ "current_password": current, "new_password": new }));
        send_empty(request).await?;
        info!("Password changed");
        Ok(())
    }

    /// Asks the backend to email a reset link.
    ///
    /// # Errors
    /// Returns a validation error for a blank email, or the backend's error.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, ApiError> {
        if email.trim().is_empty() {
            return Err(ValidationError::missing("email").into());
        }
        let request = self
            .http
            .request(Method::POST, "/api/auth/reset-password", Auth::None)
            .json(&json!({ "email": email.trim() }));
        let body: MessageBody = send_json(request).await?;
        Ok(body.message)
    }

    /// Sets a new password using a reset token.
    ///
    /// # Errors
    /// Returns a validation error for a weak password, or the backend's error
    /// for an invalid or expired token.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<String, ApiError> {
        check_password_policy("password", password)?;
        let request = self
            .http
            .request_segments(
                Method::POST,
                &["api", "auth", "reset-password", token],
                Auth::None,
            )?
            .json(&json!({ "password": password }));
        let body: MessageBody = send_json(request).await?;
        Ok(body.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Hits, bearer, serve};
    use crate::tokens::TokenStore;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;

    fn user_json() -> Value {
        json!({
            "id": "0b7d9c57-3c0e-4b0e-8d5b-9f6f3a4c2e10",
            "username": "analyst",
            "email": "analyst@example.com",
            "role": "analyst"
        })
    }

    fn router(hits: Hits) -> Router {
        Router::new()
            .route(
                "/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret123" {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "access_token": "access-1",
                                "refresh_token": "refresh-1",
                                "user": user_json()
                            })),
                        )
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "error": { "message": "Invalid username or password" } })),
                        )
                    }
                }),
            )
            .route(
                "/api/auth/me",
                get(move |headers: HeaderMap| async move {
                    hits.bump();
                    match bearer(&headers).as_deref() {
                        Some("access-1") | Some("access-2") => {
                            (StatusCode::OK, Json(json!({ "user": user_json() })))
                        }
                        _ => (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "msg": "Missing Authorization Header" })),
                        ),
                    }
                }),
            )
            .route(
                "/api/auth/refresh",
                post(|headers: HeaderMap| async move {
                    if bearer(&headers).as_deref() == Some("refresh-1") {
                        (StatusCode::OK, Json(json!({ "access_token": "access-2" })))
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "bad refresh" })))
                    }
                }),
            )
            .route(
                "/api/auth/logout",
                post(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": { "message": "blocklist unavailable" } })),
                    )
                }),
            )
    }

    #[tokio::test]
    async fn test_login_stores_tokens_and_caches_profile() {
        let hits = Hits::default();
        let (client, tokens) = serve(router(hits.clone())).await;
        let auth = client.auth();

        let session = auth.login("analyst", "secret123").await.unwrap();
        assert_eq!(session.user.username, "analyst");
        assert_eq!(tokens.access_token().as_deref(), Some("access-1"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("refresh-1"));

        // Served from the cache populated by login.
        let me = auth.me().await.unwrap();
        assert_eq!(me.email, "analyst@example.com");
        assert_eq!(hits.count(), 0);
    }

    #[tokio::test]
    async fn test_me_fetches_once_then_caches() {
        let hits = Hits::default();
        let (client, tokens) = serve(router(hits.clone())).await;
        tokens.store("access-1", None).unwrap();

        client.auth().me().await.unwrap();
        client.auth().me().await.unwrap();
        assert_eq!(hits.count(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_me_is_not_cached() {
        let hits = Hits::default();
        let (client, _tokens) = serve(router(hits.clone())).await;

        let err = client.auth().me().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(client.auth().me().await.is_err());
        assert_eq!(hits.count(), 2);
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let (client, tokens) = serve(router(Hits::default())).await;
        let err = client.auth().login("analyst", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Invalid username or password");
        assert!(tokens.access_token().is_none());
    }

    #[tokio::test]
    async fn test_blank_credentials_never_sent() {
        // Empty router: any request would 404.
        let (client, _) = serve(Router::new()).await;
        let err = client.auth().login("  ", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Username and password are required");
    }

    #[tokio::test]
    async fn test_refresh_rotates_access_token() {
        let (client, tokens) = serve(router(Hits::default())).await;
        assert!(client.auth().refresh().await.unwrap_err().is_unauthorized());

        tokens.store("access-1", Some("refresh-1")).unwrap();
        assert_eq!(client.auth().refresh().await.unwrap(), "access-2");
        assert_eq!(tokens.access_token().as_deref(), Some("access-2"));
        assert_eq!(tokens.refresh_token().as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_logout_clears_session_even_on_failure() {
        let (client, tokens) = serve(router(Hits::default())).await;
        client.auth().login("analyst", "secret123").await.unwrap();

        let err = client.auth().logout().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(tokens.access_token().is_none());
        assert!(!client.caches().users.contains_key(keys::CURRENT_USER));
    }

    #[tokio::test]
    async fn test_weak_new_password_rejected_locally() {
        let (client, _) = serve(Router::new()).await;
        let err = client
            .auth()
            .change_password("old-pass1", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { ref field, .. } if field == "new_password"));
    }

    #[tokio::test]
    async fn test_reset_token_is_escaped() {
        let app = Router::new().route(
            "/api/auth/reset-password/{token}",
            post(|Path(token): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(body["password"], "newpass123");
                Json(json!({ "message": format!("reset {token}") }))
            }),
        );
        let (client, _) = serve(app).await;

        let message = client
            .auth()
            .reset_password("x/../y?z", "newpass123")
            .await
            .unwrap();
        assert_eq!(message, "reset x/../y?z");
    }
}

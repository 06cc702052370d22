use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use std::sync::Arc;

use crate::db::{
    AuthResponse, DbPool, LoginRequest, MeResponse, PublicUser, SignupRequest, User,
};
use crate::session;
use crate::AppState;

use super::error::{ApiError, AppJson};
use super::validation::validate_email;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Create a user with a hashed credential.
///
/// Fails when the email is already registered (case-sensitive exact match).
pub async fn register_user(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<PublicUser, ApiError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(ApiError::bad_request("Email already in use"));
    }

    let password_hash = hash_password(password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Unable to create account")
    })?;

    let result = sqlx::query("INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)")
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .execute(pool)
        .await?;

    let user: PublicUser = sqlx::query_as("SELECT id, name, email FROM users WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(user)
}

/// Check credentials and return the matching user.
///
/// Unknown email and wrong password are deliberately indistinguishable to
/// the caller.
pub async fn authenticate_user(
    pool: &DbPool,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    if !verify_password(password, &user.password_hash) {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    Ok(user)
}

/// Resolve the current user from the session cookie.
///
/// The user row is re-read from the store, so a deleted user reflects
/// immediately even while their token is still valid. Any token problem
/// resolves to `None`, never an error.
pub async fn resolve_user(
    pool: &DbPool,
    secret: &str,
    jar: &CookieJar,
) -> Result<Option<PublicUser>, ApiError> {
    let Some(cookie) = jar.get(session::SESSION_COOKIE) else {
        return Ok(None);
    };

    let Some(claims) = session::verify(cookie.value(), secret) else {
        return Ok(None);
    };

    let user: Option<PublicUser> = sqlx::query_as("SELECT id, name, email FROM users WHERE id = ?")
        .bind(claims.sub)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Extractor for handlers that require an authenticated user.
#[derive(Debug)]
pub struct CurrentUser(pub PublicUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        resolve_user(&state.db, &state.config.auth.jwt_secret, &jar)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// Sign up a new account
///
/// POST /auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Missing fields"));
    }
    validate_email(&request.email).map_err(ApiError::validation)?;

    let user = register_user(&state.db, &request.name, &request.email, &request.password).await?;

    // No auto-login: the client logs in separately
    Ok(Json(AuthResponse { user }))
}

/// Log in and receive a session cookie
///
/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Missing fields"));
    }

    let user = authenticate_user(&state.db, &request.email, &request.password).await?;

    let token = session::issue(user.id, &user.email, &state.config.auth.jwt_secret).map_err(
        |e| {
            tracing::error!("Failed to sign session token: {}", e);
            ApiError::internal("Unable to login")
        },
    )?;

    let jar = jar.add(session::session_cookie(
        token,
        state.config.auth.secure_cookies,
    ));

    tracing::info!(user_id = user.id, "User logged in");

    Ok((jar, Json(AuthResponse { user: user.into() })))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Log out by clearing the session cookie. Idempotent.
///
/// POST /auth/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.remove(session::removal_cookie());
    (jar, Json(LogoutResponse { success: true }))
}

/// Current user from the session cookie, or null
///
/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<MeResponse>, ApiError> {
    let user = resolve_user(&state.db, &state.config.auth.jwt_secret, &jar).await?;
    Ok(Json(MeResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
        assert!(!verify_password("hunter2", ""));
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let pool = test_pool().await;

        let user = register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(user.name, "Ant");
        assert_eq!(user.email, "ant@example.com");

        let authed = authenticate_user(&pool, "ant@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn test_register_never_stores_plaintext() {
        let pool = test_pool().await;
        register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();

        let (hash,): (String,) =
            sqlx::query_as("SELECT password_hash FROM users WHERE email = 'ant@example.com'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(!hash.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let pool = test_pool().await;
        register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();

        // Fails regardless of the name/password supplied
        let err = register_user(&pool, "Bee", "ant@example.com", "different")
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Email already in use");
    }

    #[tokio::test]
    async fn test_authenticate_failures_indistinguishable() {
        let pool = test_pool().await;
        register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();

        let unknown = authenticate_user(&pool, "nobody@example.com", "hunter2")
            .await
            .unwrap_err();
        let wrong = authenticate_user(&pool, "ant@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(unknown.message(), wrong.message());
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
        assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resolve_user_roundtrip() {
        let pool = test_pool().await;
        let user = register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();

        let token = session::issue(user.id, &user.email, SECRET).unwrap();
        let jar = CookieJar::new().add(Cookie::new(session::SESSION_COOKIE, token));

        let resolved = resolve_user(&pool, SECRET, &jar).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.email, user.email);
    }

    #[tokio::test]
    async fn test_resolve_user_no_cookie() {
        let pool = test_pool().await;
        let jar = CookieJar::new();
        assert!(resolve_user(&pool, SECRET, &jar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_user_tampered_token() {
        let pool = test_pool().await;
        let user = register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();

        let token = session::issue(user.id, &user.email, "other-secret").unwrap();
        let jar = CookieJar::new().add(Cookie::new(session::SESSION_COOKIE, token));

        assert!(resolve_user(&pool, SECRET, &jar).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_user_extractor_rejects_without_cookie() {
        let pool = test_pool().await;
        let state = Arc::new(AppState::new(crate::config::Config::default(), pool));

        let (mut parts, _) = axum::http::Request::builder()
            .uri("/products")
            .body(())
            .unwrap()
            .into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Unauthorized");
    }

    #[tokio::test]
    async fn test_resolve_user_deleted_user() {
        let pool = test_pool().await;
        let user = register_user(&pool, "Ant", "ant@example.com", "hunter2")
            .await
            .unwrap();
        let token = session::issue(user.id, &user.email, SECRET).unwrap();
        let jar = CookieJar::new().add(Cookie::new(session::SESSION_COOKIE, token));

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        // Valid token, but the record is gone
        assert!(resolve_user(&pool, SECRET, &jar).await.unwrap().is_none());
    }
}

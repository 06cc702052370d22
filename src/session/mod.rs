//! Signed session tokens.
//!
//! Sessions are stateless: a signed JWT carrying the user's identity and a
//! 7-day expiry, stored in an HTTP-only cookie. Validity is purely
//! cryptographic plus the expiry check; there is no server-side session
//! table, so logout only removes the cookie and an already-issued token
//! stays valid until it expires.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "antbid_token";

/// Session lifetime.
const SESSION_TTL_DAYS: i64 = 7;

/// Claims carried in a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: i64,
    /// User email at issue time
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Issue a signed session token for a user, valid for 7 days.
pub fn issue(
    user_id: i64,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user_id,
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(SESSION_TTL_DAYS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a session token and return its claims.
///
/// Returns `None` on any failure (malformed token, bad signature, expired)
/// so callers always have an unauthenticated fallback instead of an error.
pub fn verify(token: &str, secret: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// Build the session cookie holding a freshly issued token.
///
/// HTTP-only, SameSite=Lax, path `/`; the Secure flag is driven by
/// configuration since it only makes sense over TLS. No Max-Age: the token's
/// own expiry bounds the session.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Build the cookie used to clear the session on logout.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{NaiveDateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::Config;
use crate::db::{users, Database};

const AUTH_COOKIE_NAME: &str = "auth_token";

/// The session identity threaded through handlers via request extensions;
/// there is no ambient current-user global.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("missing JWT_SECRET")]
    MissingSecret,
    #[error("invalid JWT_EXPIRES_IN")]
    InvalidExpiresIn,
    #[error("database error: {0}")]
    Database(String),
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = get_cookie(headers, AUTH_COOKIE_NAME) {
        return Some(token);
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|value| value.to_string())
}

/// Verifies the JWT signature and claims, then checks the session row so a
/// logout invalidates tokens before they expire.
pub async fn verify_request_token(
    db: &Database,
    config: &Config,
    token: &str,
) -> Result<AuthUser, AuthError> {
    let secret = config.jwt_secret.as_deref().ok_or(AuthError::MissingSecret)?;
    let claims = verify_jwt_hs256(token, secret)?;

    let token_hash = hash_token(token);
    let session_user = users::find_session_user(db, &token_hash)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?
        .ok_or(AuthError::InvalidToken)?;

    if session_user != claims.user_id {
        return Err(AuthError::InvalidToken);
    }

    Ok(AuthUser {
        id: claims.user_id,
        email: claims.email,
    })
}

#[derive(Debug, Clone)]
struct JwtClaims {
    user_id: String,
    email: String,
}

fn verify_jwt_hs256(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let payload_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let sig_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    if parts.next().is_some() {
        return Err(AuthError::InvalidToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;

    let header_json: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::InvalidToken)?;
    let alg = header_json
        .get("alg")
        .and_then(|value| value.as_str())
        .ok_or(AuthError::InvalidToken)?;
    if alg != "HS256" {
        return Err(AuthError::InvalidToken);
    }

    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::InvalidToken)?;

    validate_registered_claims(&payload_json)?;

    let user_id = payload_json
        .get("userId")
        .and_then(|value| value.as_str())
        .ok_or(AuthError::InvalidToken)?
        .to_string();
    let email = payload_json
        .get("email")
        .and_then(|value| value.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(JwtClaims { user_id, email })
}

fn validate_registered_claims(payload: &serde_json::Value) -> Result<(), AuthError> {
    let now = Utc::now().timestamp();

    if let Some(exp) = payload.get("exp").and_then(|value| value.as_i64()) {
        if now >= exp {
            return Err(AuthError::InvalidToken);
        }
    }

    if let Some(nbf) = payload.get("nbf").and_then(|value| value.as_i64()) {
        if now < nbf {
            return Err(AuthError::InvalidToken);
        }
    }

    Ok(())
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn sign_jwt_for_user(
    config: &Config,
    user_id: &str,
    email: &str,
) -> Result<(String, NaiveDateTime), AuthError> {
    let secret = config.jwt_secret.as_deref().ok_or(AuthError::MissingSecret)?;
    let expires_in_ms = parse_expires_in_ms(&config.jwt_expires_in)?;

    let issued_at = Utc::now();
    let exp = issued_at
        .checked_add_signed(chrono::Duration::milliseconds(expires_in_ms))
        .ok_or(AuthError::InvalidExpiresIn)?;

    let header_json = serde_json::json!({
        "alg": "HS256",
        "typ": "JWT",
    });

    let payload_json = serde_json::json!({
        "userId": user_id,
        "email": email,
        "iat": issued_at.timestamp(),
        "exp": exp.timestamp(),
    });

    let header_b64 = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&header_json).map_err(|_| AuthError::InvalidToken)?);
    let payload_b64 = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&payload_json).map_err(|_| AuthError::InvalidToken)?);
    let signing_input = format!("{header_b64}.{payload_b64}");

    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();
    let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

    let token = format!("{signing_input}.{sig_b64}");
    let expires_at = exp.naive_utc();

    Ok((token, expires_at))
}

pub fn parse_expires_in_ms(value: &str) -> Result<i64, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() < 2 {
        return Err(AuthError::InvalidExpiresIn);
    }

    let (digits, unit) = trimmed.split_at(trimmed.len() - 1);

    let amount: i64 = digits.parse().map_err(|_| AuthError::InvalidExpiresIn)?;
    if amount <= 0 {
        return Err(AuthError::InvalidExpiresIn);
    }

    match unit {
        "s" => Ok(amount * 1000),
        "m" => Ok(amount * 60 * 1000),
        "h" => Ok(amount * 60 * 60 * 1000),
        "d" => Ok(amount * 24 * 60 * 60 * 1000),
        _ => Err(AuthError::InvalidExpiresIn),
    }
}

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())?;

    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?;
        if key == name {
            return parts.next().map(|v| v.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expires_in_units() {
        assert_eq!(parse_expires_in_ms("30s").unwrap(), 30_000);
        assert_eq!(parse_expires_in_ms("15m").unwrap(), 900_000);
        assert_eq!(parse_expires_in_ms("24h").unwrap(), 86_400_000);
        assert_eq!(parse_expires_in_ms("7d").unwrap(), 604_800_000);
        assert!(parse_expires_in_ms("").is_err());
        assert!(parse_expires_in_ms("h").is_err());
        assert!(parse_expires_in_ms("-1h").is_err());
        assert!(parse_expires_in_ms("10y").is_err());
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let config = Config::test_default();
        let (token, _expires) = sign_jwt_for_user(&config, "user-1", "a@b.c").unwrap();
        let claims = verify_jwt_hs256(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.email, "a@b.c");
        assert!(verify_jwt_hs256(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_signing_without_secret_fails() {
        let mut config = Config::test_default();
        config.jwt_secret = None;
        assert!(matches!(
            sign_jwt_for_user(&config, "user-1", "a@b.c"),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn test_bearer_and_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "auth_token=tok123; other=x".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));

        assert!(extract_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_token_hash_is_stable_hex() {
        let h = hash_token("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_token("abc"));
        assert_ne!(h, hash_token("abd"));
    }
}

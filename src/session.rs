//! Signed values carried by the browser: one-shot flash notices and CSRF
//! tokens. Both are HMAC-SHA256 tagged with the configured secret key.

use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::SecretKey;

type HmacSha256 = Hmac<Sha256>;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }
}

fn mac(key: &SecretKey, purpose: &str, payload: &[u8]) -> HmacSha256 {
    let mut mac = key.mac();
    mac.update(purpose.as_bytes());
    mac.update(b":");
    mac.update(payload);
    mac
}

fn sign(key: &SecretKey, purpose: &str, payload: &[u8]) -> String {
    hex::encode(mac(key, purpose, payload).finalize().into_bytes())
}

fn verify(key: &SecretKey, purpose: &str, payload: &[u8], signature: &str) -> bool {
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    mac(key, purpose, payload).verify_slice(&signature).is_ok()
}

pub fn encode_flash(key: &SecretKey, flash: &Flash) -> anyhow::Result<String> {
    let json = serde_json::to_vec(flash)?;
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = sign(key, FLASH_COOKIE, payload.as_bytes());
    Ok(format!("{payload}.{signature}"))
}

/// Returns `None` for anything malformed or not signed with `key`.
pub fn decode_flash(key: &SecretKey, value: &str) -> Option<Flash> {
    let (payload, signature) = value.rsplit_once('.')?;
    if !verify(key, FLASH_COOKIE, payload.as_bytes(), signature) {
        return None;
    }
    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&json).ok()
}

pub fn flash_set_cookie(key: &SecretKey, flash: &Flash) -> anyhow::Result<String> {
    let value = encode_flash(key, flash)?;
    Ok(format!("{FLASH_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax"))
}

pub fn flash_clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn issue_csrf_token(key: &SecretKey, now: DateTime<Utc>) -> String {
    let issued_at = now.timestamp().to_string();
    let signature = sign(key, "csrf", issued_at.as_bytes());
    format!("{issued_at}.{signature}")
}

pub fn verify_csrf_token(key: &SecretKey, token: &str, now: DateTime<Utc>, ttl: Duration) -> bool {
    let Some((issued_at, signature)) = token.trim().split_once('.') else {
        return false;
    };
    let Ok(issued_secs) = issued_at.parse::<i64>() else {
        return false;
    };
    if !verify(key, "csrf", issued_at.as_bytes(), signature) {
        return false;
    }

    let age = now.timestamp() - issued_secs;
    let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
    // Allow a little clock skew for tokens minted "in the future".
    (-60..=ttl).contains(&age)
}

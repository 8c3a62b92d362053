use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::cli::ServeArgs;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
pub const MIN_SECRET_KEY_LEN: usize = 16;

/// Everything the web app needs at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub secret_key: SecretKey,
    pub max_upload_bytes: usize,
    pub csrf_ttl: Duration,
}

impl Config {
    pub fn from_args(args: ServeArgs) -> anyhow::Result<Self> {
        if args.max_upload_bytes == 0 {
            anyhow::bail!("--max-upload-bytes must be > 0");
        }
        if args.csrf_ttl_secs == 0 {
            anyhow::bail!("--csrf-ttl-secs must be > 0");
        }

        Ok(Self {
            addr: args.addr,
            database_path: args.storage.database,
            upload_dir: args.storage.upload_dir,
            static_dir: args.static_dir,
            secret_key: SecretKey::new(args.secret_key)?,
            max_upload_bytes: args.max_upload_bytes,
            csrf_ttl: Duration::from_secs(args.csrf_ttl_secs),
        })
    }
}

/// Signing key, kept as an HMAC-SHA256 state already keyed with the secret.
#[derive(Clone)]
pub struct SecretKey(Hmac<Sha256>);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> anyhow::Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.len() < MIN_SECRET_KEY_LEN {
            anyhow::bail!("secret key must be at least {MIN_SECRET_KEY_LEN} bytes");
        }
        let mac = Hmac::<Sha256>::new_from_slice(trimmed.as_bytes())
            .map_err(|err| anyhow::anyhow!("secret key: {err}"))?;
        Ok(Self(mac))
    }

    /// A fresh keyed MAC with no input fed yet.
    pub fn mac(&self) -> Hmac<Sha256> {
        self.0.clone()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

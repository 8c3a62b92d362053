use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the magazine website.
    Serve(ServeArgs),
    /// Create the database tables if they do not exist.
    InitDb(InitDbArgs),
    /// Delete uploaded files that no book references.
    PruneUploads(PruneUploadsArgs),
}

#[derive(Debug, Args)]
pub struct StorageArgs {
    /// SQLite database file.
    #[arg(long, env = "VENBAAH_DATABASE", default_value = "venbaah.db")]
    pub database: PathBuf,

    /// Directory holding uploaded PDFs.
    #[arg(long, env = "VENBAAH_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, env = "VENBAAH_ADDR", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    #[command(flatten)]
    pub storage: StorageArgs,

    /// Static assets directory served under `/static`.
    #[arg(long, env = "VENBAAH_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Key for signing flash cookies and CSRF tokens (at least 16 bytes).
    #[arg(long, env = "VENBAAH_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Largest accepted request body.
    #[arg(
        long,
        env = "VENBAAH_MAX_UPLOAD_BYTES",
        default_value_t = crate::config::DEFAULT_MAX_UPLOAD_BYTES
    )]
    pub max_upload_bytes: usize,

    /// How long a rendered form stays submittable.
    #[arg(long, env = "VENBAAH_CSRF_TTL_SECS", default_value_t = 3600)]
    pub csrf_ttl_secs: u64,
}

// Keeps the secret out of `?cli` debug logs.
impl std::fmt::Debug for ServeArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeArgs")
            .field("addr", &self.addr)
            .field("storage", &self.storage)
            .field("static_dir", &self.static_dir)
            .field("secret_key", &"<redacted>")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("csrf_ttl_secs", &self.csrf_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Args)]
pub struct InitDbArgs {
    /// SQLite database file.
    #[arg(long, env = "VENBAAH_DATABASE", default_value = "venbaah.db")]
    pub database: PathBuf,
}

#[derive(Debug, Args)]
pub struct PruneUploadsArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Skip files modified more recently than this, so uploads still in
    /// flight are left alone.
    #[arg(long, default_value_t = 3600)]
    pub min_age_secs: u64,

    /// Only print what would be deleted.
    #[arg(long)]
    pub dry_run: bool,
}

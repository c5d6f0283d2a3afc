use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use qrdrop_render::EcLevel;
use qrdrop_server::ServerConfig;

#[derive(Parser)]
#[command(
    name = "qrdrop",
    about = "QR Drop: share an image through a short-lived QR code",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Debug-level logging for QR Drop crates
    #[arg(long, global = true, env = "QRDROP_DEBUG")]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "QRDROP_PRODUCTION")]
    pub production: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Render a QR code for a URL
    Qr(QrArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, env = "QRDROP_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,
    /// Largest accepted upload in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: u64,
    /// Hours an upload stays retrievable
    #[arg(long, env = "QR_EXPIRATION_HOURS", default_value_t = 24)]
    pub expiration_hours: i64,
    /// Seconds between background sweeps of expired images
    #[arg(long, env = "REAP_INTERVAL_SECS", default_value_t = 300)]
    pub reap_interval_secs: u64,
    /// Keep image bytes in this directory instead of memory
    #[arg(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,
    /// Origin for retrieval URLs, e.g. https://drop.example
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,
}

impl ServeArgs {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            max_upload_bytes: self.max_upload_bytes,
            expiration_hours: self.expiration_hours,
            reap_interval_secs: self.reap_interval_secs,
            upload_dir: self.upload_dir,
            public_base_url: self.public_base_url,
            ..ServerConfig::default()
        }
    }
}

#[derive(Args)]
pub struct QrArgs {
    pub url: String,
    /// Write the PNG here; prints a data URI when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Error-correction level: L, M, Q or H
    #[arg(long, default_value = "L")]
    pub ec: EcLevel,
    /// Pixels per module
    #[arg(long, default_value_t = 10)]
    pub module_size: u32,
}

use std::{net::SocketAddr, time::Duration};

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "knote",
    about = "Markdown notes with image attachments",
    version = crate::version::VERSION,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Connect to the note and blob stores, then serve HTTP (default).
    Run,

    /// Try each store connection once and exit non-zero on failure.
    Check,
}

#[derive(Args, Debug, Clone)]
pub struct Config {
    #[arg(
        long,
        global = true,
        env = "KNOTE_BIND",
        value_name = "ADDR",
        default_value = "127.0.0.1:3000"
    )]
    pub bind: SocketAddr,

    /// Note store location: `file://<dir>` or `memory://`.
    #[arg(
        long,
        global = true,
        env = "KNOTE_DB_URL",
        value_name = "URL",
        default_value = "file://./data"
    )]
    pub db_url: String,

    #[arg(
        long,
        global = true,
        env = "MINIO_HOST",
        value_name = "HOST",
        default_value = "localhost"
    )]
    pub minio_host: String,

    #[arg(
        long,
        global = true,
        env = "MINIO_PORT",
        value_name = "PORT",
        default_value_t = 9000
    )]
    pub minio_port: u16,

    #[arg(
        long,
        global = true,
        env = "MINIO_ACCESS_KEY",
        value_name = "KEY",
        default_value = "",
        hide_env_values = true
    )]
    pub minio_access_key: String,

    #[arg(
        long,
        global = true,
        env = "MINIO_SECRET_KEY",
        value_name = "KEY",
        default_value = "",
        hide_env_values = true
    )]
    pub minio_secret_key: String,

    #[arg(
        long,
        global = true,
        env = "MINIO_BUCKET",
        value_name = "NAME",
        default_value = "image-storage"
    )]
    pub minio_bucket: String,

    #[arg(
        long,
        global = true,
        env = "MINIO_REGION",
        value_name = "REGION",
        default_value = "us-east-1"
    )]
    pub minio_region: String,

    #[arg(
        long,
        global = true,
        env = "MINIO_SECURE",
        value_name = "BOOL",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub minio_secure: bool,

    #[arg(
        long = "db-retry-delay-ms",
        global = true,
        env = "KNOTE_DB_RETRY_DELAY_MS",
        value_name = "MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    pub db_retry_delay_ms: u64,

    #[arg(
        long = "blob-retry-delay-ms",
        global = true,
        env = "KNOTE_BLOB_RETRY_DELAY_MS",
        value_name = "MS",
        default_value_t = 5000,
        value_parser = clap::value_parser!(u64).range(1..=60_000)
    )]
    pub blob_retry_delay_ms: u64,

    #[arg(
        long = "connect-timeout-secs",
        global = true,
        env = "KNOTE_CONNECT_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=300)
    )]
    pub connect_timeout_secs: u64,

    #[arg(
        long = "blob-request-timeout-secs",
        global = true,
        env = "KNOTE_BLOB_REQUEST_TIMEOUT_SECS",
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..=600)
    )]
    pub blob_request_timeout_secs: u64,

    #[arg(
        long = "max-upload-bytes",
        global = true,
        env = "KNOTE_MAX_UPLOAD_BYTES",
        value_name = "BYTES",
        default_value_t = 10 * 1024 * 1024
    )]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn minio_endpoint(&self) -> String {
        let scheme = if self.minio_secure { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.minio_host, self.minio_port)
    }

    pub fn db_retry_delay(&self) -> Duration {
        Duration::from_millis(self.db_retry_delay_ms)
    }

    pub fn blob_retry_delay(&self) -> Duration {
        Duration::from_millis(self.blob_retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn blob_request_timeout(&self) -> Duration {
        Duration::from_secs(self.blob_request_timeout_secs)
    }
}

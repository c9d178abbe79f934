use anyhow::{Context, Result};
use clap::Parser;
use std::env;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Asset upload and bundling service")]
pub struct Args {
    /// Host to bind to (overrides BUNDLEGEN_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUNDLEGEN_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded files are stored (overrides BUNDLEGEN_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Upload body cap in bytes (overrides BUNDLEGEN_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("BUNDLEGEN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("BUNDLEGEN_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing BUNDLEGEN_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading BUNDLEGEN_PORT"),
        };
        let env_storage =
            env::var("BUNDLEGEN_STORAGE_DIR").unwrap_or_else(|_| "./data/files".into());
        let env_max_upload = match env::var("BUNDLEGEN_MAX_UPLOAD_BYTES") {
            Ok(value) => value.parse::<usize>().with_context(|| {
                format!("parsing BUNDLEGEN_MAX_UPLOAD_BYTES value `{}`", value)
            })?,
            Err(env::VarError::NotPresent) => DEFAULT_MAX_UPLOAD_BYTES,
            Err(err) => return Err(err).context("reading BUNDLEGEN_MAX_UPLOAD_BYTES"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

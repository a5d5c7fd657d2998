use std::path::PathBuf;

use bistro_core::assets::upload::DEFAULT_MAX_UPLOAD_BYTES;

use crate::auth::jwt::JwtConfig;

/// Where uploaded images are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    /// Files under `blob_root`, served at `/uploads`.
    Local,
    /// In-process store; nothing survives a restart.
    Memory,
}

impl BlobBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted image file (default: 5 MiB).
    pub max_upload_bytes: usize,
    /// Largest accepted request body, all files included (default: 32 MiB).
    pub max_request_bytes: usize,
    pub blob_backend: BlobBackend,
    /// Directory of the local blob store (default: `./uploads`).
    pub blob_root: PathBuf,
    /// Public URL prefix of stored blobs.
    pub blob_public_base_url: String,
    /// JWT validation settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `HOST`                 | `0.0.0.0`                        |
    /// | `PORT`                 | `3000`                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `MAX_UPLOAD_BYTES`     | `5242880`                        |
    /// | `MAX_REQUEST_BYTES`    | `33554432`                       |
    /// | `BLOB_BACKEND`         | `local`                          |
    /// | `BLOB_ROOT`            | `./uploads`                      |
    /// | `BLOB_PUBLIC_BASE_URL` | `http://localhost:3000/uploads`  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .map(|v| v.parse().expect("MAX_UPLOAD_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let max_request_bytes: usize = std::env::var("MAX_REQUEST_BYTES")
            .unwrap_or_else(|_| (32 * 1024 * 1024).to_string())
            .parse()
            .expect("MAX_REQUEST_BYTES must be a valid usize");

        let blob_backend = std::env::var("BLOB_BACKEND")
            .map(|v| BlobBackend::parse(&v).expect("BLOB_BACKEND must be 'local' or 'memory'"))
            .unwrap_or(BlobBackend::Local);

        let blob_root =
            PathBuf::from(std::env::var("BLOB_ROOT").unwrap_or_else(|_| "./uploads".into()));

        let blob_public_base_url = std::env::var("BLOB_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/uploads"));

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            max_request_bytes,
            blob_backend,
            blob_root,
            blob_public_base_url,
            jwt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_backend_parsing() {
        assert_eq!(BlobBackend::parse("local"), Some(BlobBackend::Local));
        assert_eq!(BlobBackend::parse(" Memory "), Some(BlobBackend::Memory));
        assert_eq!(BlobBackend::parse("s3"), None);
    }
}

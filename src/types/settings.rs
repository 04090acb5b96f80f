use serde::{Deserialize, Serialize};

/// Top-level service settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceSettings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub fetcher: FetcherSettings,
    pub ingestion: IngestionSettings,
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    pub database_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: crate::platform::get_data_dir()
                .join("linkvault.db")
                .to_string_lossy()
                .to_string(),
        }
    }
}

/// Open Graph scraping limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FetcherSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_body_bytes: usize,
    pub max_redirects: usize,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("linkvault/{} (+link preview)", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 2 * 1024 * 1024,
            max_redirects: 5,
        }
    }
}

/// Batch fan-out limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestionSettings {
    pub max_concurrency: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self { max_concurrency: 8 }
    }
}

/// Log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    pub level: String,
    pub include_targets: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            include_targets: true,
        }
    }
}

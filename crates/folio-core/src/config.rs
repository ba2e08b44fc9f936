//! Configuration module
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! first when present) and validated once at startup.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8080;
const MAX_UPLOAD_SIZE_MB: usize = 20;
const HTTP_CLIENT_TIMEOUT_SECS: u64 = 120;
const HTTP_CONCURRENCY_LIMIT: usize = 256;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const DOCUMENT_AI_LOCATION: &str = "us";
const DOCUMENTS_COLLECTION: &str = "documents";
const FIRESTORE_DATABASE: &str = "(default)";
const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";
const GCE_METADATA_HOST: &str = "metadata.google.internal";

/// Console log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Document database backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Firestore,
    Postgres,
}

impl FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firestore" => Ok(DatabaseBackend::Firestore),
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            _ => Err(anyhow::anyhow!("Invalid database backend: {}", s)),
        }
    }
}

impl Display for DatabaseBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DatabaseBackend::Firestore => write!(f, "firestore"),
            DatabaseBackend::Postgres => write!(f, "postgres"),
        }
    }
}

/// What happens to a request when archiving the original file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFailurePolicy {
    /// The request fails like any other pipeline error.
    #[default]
    Fail,
    /// The failure is logged and the record is stored without a storage reference.
    Degrade,
}

impl FromStr for ArchiveFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(ArchiveFailurePolicy::Fail),
            "degrade" => Ok(ArchiveFailurePolicy::Degrade),
            _ => Err(anyhow::anyhow!(
                "Invalid archive failure policy: {} (expected 'fail' or 'degrade')",
                s
            )),
        }
    }
}

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: LogFormat,
    pub max_upload_size_bytes: usize,
    pub cors_preflight_enabled: bool,
    pub cors_allow_origin: String,
    pub http_client_timeout_secs: u64,
    pub http_concurrency_limit: usize,
}

/// Document ingestion service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    // Archival step
    pub archive_enabled: bool,
    pub archive_failure_policy: ArchiveFailurePolicy,
    // Document AI processor
    pub document_ai_project_id: String,
    pub document_ai_location: String,
    pub document_ai_processor_id: String,
    pub document_ai_endpoint: Option<String>,
    // Google credentials
    pub google_access_token: Option<String>,
    pub gce_metadata_host: String,
    // Document database
    pub database_backend: DatabaseBackend,
    pub documents_collection: String,
    pub firestore_project_id: String,
    pub firestore_database: String,
    pub firestore_endpoint: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub gcs_bucket: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ServiceConfig::from_lookup(lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.inner().base.log_format
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().base.max_upload_size_bytes
    }

    pub fn cors_preflight_enabled(&self) -> bool {
        self.inner().base.cors_preflight_enabled
    }

    pub fn cors_allow_origin(&self) -> &str {
        &self.inner().base.cors_allow_origin
    }

    pub fn http_client_timeout_secs(&self) -> u64 {
        self.inner().base.http_client_timeout_secs
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn archive_enabled(&self) -> bool {
        self.inner().archive_enabled
    }

    pub fn archive_failure_policy(&self) -> ArchiveFailurePolicy {
        self.inner().archive_failure_policy
    }

    /// Fully qualified processor resource name.
    pub fn processor_name(&self) -> String {
        let c = self.inner();
        format!(
            "projects/{}/locations/{}/processors/{}",
            c.document_ai_project_id, c.document_ai_location, c.document_ai_processor_id
        )
    }

    /// Regional Document AI endpoint unless overridden.
    pub fn document_ai_endpoint(&self) -> String {
        let c = self.inner();
        c.document_ai_endpoint.clone().unwrap_or_else(|| {
            format!("https://{}-documentai.googleapis.com", c.document_ai_location)
        })
    }

    pub fn google_access_token(&self) -> Option<&str> {
        self.inner().google_access_token.as_deref()
    }

    pub fn gce_metadata_host(&self) -> &str {
        &self.inner().gce_metadata_host
    }

    pub fn database_backend(&self) -> DatabaseBackend {
        self.inner().database_backend
    }

    pub fn documents_collection(&self) -> &str {
        &self.inner().documents_collection
    }

    pub fn firestore_project_id(&self) -> &str {
        &self.inner().firestore_project_id
    }

    pub fn firestore_database(&self) -> &str {
        &self.inner().firestore_database
    }

    pub fn firestore_endpoint(&self) -> &str {
        &self.inner().firestore_endpoint
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn gcs_bucket(&self) -> Option<&str> {
        self.inner().gcs_bucket.as_deref()
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v.trim().to_lowercase())
        .and_then(|v| match v.as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Collection names double as SQL table names, so only identifier characters are allowed.
fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl ServiceConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let max_upload_size_mb = get("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let base = BaseConfig {
            server_port: match get("PORT") {
                Some(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                None => SERVER_PORT,
            },
            environment,
            log_format: match get("LOG_FORMAT") {
                Some(format) => format.parse()?,
                None => LogFormat::Compact,
            },
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            cors_preflight_enabled: parse_bool(lookup("CORS_PREFLIGHT_ENABLED"), true),
            cors_allow_origin: get("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),
            http_client_timeout_secs: get("HTTP_CLIENT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CLIENT_TIMEOUT_SECS),
            http_concurrency_limit: get("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
        };

        let document_ai_project_id = get("DOCUMENT_AI_PROJECT_ID")
            .ok_or_else(|| anyhow::anyhow!("DOCUMENT_AI_PROJECT_ID must be set"))?;

        let config = ServiceConfig {
            base,
            archive_enabled: parse_bool(lookup("ARCHIVE_ENABLED"), true),
            archive_failure_policy: match get("ARCHIVE_FAILURE_POLICY") {
                Some(policy) => policy.parse()?,
                None => ArchiveFailurePolicy::default(),
            },
            document_ai_location: get("DOCUMENT_AI_LOCATION")
                .unwrap_or_else(|| DOCUMENT_AI_LOCATION.to_string()),
            document_ai_processor_id: get("DOCUMENT_AI_PROCESSOR_ID")
                .ok_or_else(|| anyhow::anyhow!("DOCUMENT_AI_PROCESSOR_ID must be set"))?,
            document_ai_endpoint: get("DOCUMENT_AI_ENDPOINT"),
            google_access_token: get("GOOGLE_ACCESS_TOKEN"),
            gce_metadata_host: get("GCE_METADATA_HOST")
                .unwrap_or_else(|| GCE_METADATA_HOST.to_string()),
            database_backend: match get("DATABASE_BACKEND") {
                Some(backend) => backend.parse()?,
                None => DatabaseBackend::Firestore,
            },
            documents_collection: get("DOCUMENTS_COLLECTION")
                .unwrap_or_else(|| DOCUMENTS_COLLECTION.to_string()),
            firestore_project_id: get("FIRESTORE_PROJECT_ID")
                .unwrap_or_else(|| document_ai_project_id.clone()),
            firestore_database: get("FIRESTORE_DATABASE")
                .unwrap_or_else(|| FIRESTORE_DATABASE.to_string()),
            firestore_endpoint: get("FIRESTORE_ENDPOINT")
                .unwrap_or_else(|| FIRESTORE_ENDPOINT.to_string()),
            database_url: get("DATABASE_URL"),
            db_max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: get("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend: match get("STORAGE_BACKEND") {
                Some(backend) => backend.parse()?,
                None => StorageBackend::Gcs,
            },
            gcs_bucket: get("GCS_BUCKET"),
            s3_bucket: get("S3_BUCKET"),
            s3_region: get("S3_REGION"),
            s3_endpoint: get("S3_ENDPOINT"),
            aws_region: get("AWS_REGION"),
            local_storage_path: get("LOCAL_STORAGE_PATH"),
            local_storage_base_url: get("LOCAL_STORAGE_BASE_URL"),
            document_ai_project_id,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.document_ai_location.is_empty() || self.document_ai_processor_id.is_empty() {
            return Err(anyhow::anyhow!(
                "DOCUMENT_AI_LOCATION and DOCUMENT_AI_PROCESSOR_ID cannot be empty"
            ));
        }

        if self.base.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB cannot be 0"));
        }

        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT cannot be 0"));
        }

        if !is_valid_collection_name(&self.documents_collection) {
            return Err(anyhow::anyhow!(
                "DOCUMENTS_COLLECTION must contain only letters, digits and underscores"
            ));
        }

        match self.database_backend {
            DatabaseBackend::Postgres => {
                let url = self.database_url.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL must be set when using the postgres backend")
                })?;
                if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ));
                }
                if self.db_max_connections == 0 {
                    return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS cannot be 0"));
                }
            }
            DatabaseBackend::Firestore => {
                if self.firestore_project_id.is_empty() {
                    return Err(anyhow::anyhow!(
                        "FIRESTORE_PROJECT_ID must be set when using the firestore backend"
                    ));
                }
            }
        }

        // Storage settings only matter when the archival step runs
        if !self.archive_enabled {
            return Ok(());
        }

        match self.storage_backend {
            StorageBackend::Gcs => {
                if self.gcs_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "GCS_BUCKET must be set when using GCS storage backend"
                    ));
                }
            }
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DOCUMENT_AI_PROJECT_ID", "286240844421"),
        ("DOCUMENT_AI_PROCESSOR_ID", "7cbb0c206b7a5176"),
        ("GCS_BUCKET", "uploads-bucket"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(MINIMAL)).unwrap();

        assert_eq!(config.server_port(), 8080);
        assert_eq!(config.max_upload_size_bytes(), 20 * 1024 * 1024);
        assert!(config.cors_preflight_enabled());
        assert_eq!(config.cors_allow_origin(), "*");
        assert_eq!(config.http_concurrency_limit(), 256);
        assert!(config.archive_enabled());
        assert_eq!(config.archive_failure_policy(), ArchiveFailurePolicy::Fail);
        assert_eq!(config.database_backend(), DatabaseBackend::Firestore);
        assert_eq!(config.documents_collection(), "documents");
        assert_eq!(config.firestore_project_id(), "286240844421");
        assert_eq!(config.firestore_database(), "(default)");
        assert_eq!(config.storage_backend(), StorageBackend::Gcs);
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert!(!config.is_production());
    }

    #[test]
    fn test_processor_name_and_endpoint() {
        let config = Config::from_lookup(lookup_from(MINIMAL)).unwrap();
        assert_eq!(
            config.processor_name(),
            "projects/286240844421/locations/us/processors/7cbb0c206b7a5176"
        );
        assert_eq!(
            config.document_ai_endpoint(),
            "https://us-documentai.googleapis.com"
        );

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("DOCUMENT_AI_LOCATION", "eu"));
        pairs.push(("DOCUMENT_AI_ENDPOINT", "http://localhost:9000"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(
            config.processor_name(),
            "projects/286240844421/locations/eu/processors/7cbb0c206b7a5176"
        );
        assert_eq!(config.document_ai_endpoint(), "http://localhost:9000");
    }

    #[test]
    fn test_missing_processor_fails() {
        let result = Config::from_lookup(lookup_from(&[("DOCUMENT_AI_PROJECT_ID", "p")]));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("DOCUMENT_AI_PROCESSOR_ID"));
    }

    #[test]
    fn test_archive_disabled_skips_storage_validation() {
        let pairs = [
            ("DOCUMENT_AI_PROJECT_ID", "p"),
            ("DOCUMENT_AI_PROCESSOR_ID", "x"),
            ("ARCHIVE_ENABLED", "false"),
        ];
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(!config.archive_enabled());

        let pairs = [
            ("DOCUMENT_AI_PROJECT_ID", "p"),
            ("DOCUMENT_AI_PROCESSOR_ID", "x"),
        ];
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("GCS_BUCKET"));
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("DATABASE_BACKEND", "postgres"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        pairs.push(("DATABASE_URL", "mysql://localhost/db"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        pairs.pop();
        pairs.push(("DATABASE_URL", "postgresql://localhost/folio"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.database_backend(), DatabaseBackend::Postgres);
        assert_eq!(config.database_url(), Some("postgresql://localhost/folio"));
    }

    #[test]
    fn test_s3_requires_region() {
        let pairs = [
            ("DOCUMENT_AI_PROJECT_ID", "p"),
            ("DOCUMENT_AI_PROCESSOR_ID", "x"),
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "b"),
        ];
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("S3_REGION"));
    }

    #[test]
    fn test_invalid_collection_name_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("DOCUMENTS_COLLECTION", "documents; DROP TABLE x"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_policy_and_flags_parsing() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("ARCHIVE_FAILURE_POLICY", "Degrade"));
        pairs.push(("CORS_PREFLIGHT_ENABLED", "0"));
        pairs.push(("LOG_FORMAT", "json"));
        pairs.push(("ENVIRONMENT", "prod"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.archive_failure_policy(), ArchiveFailurePolicy::Degrade);
        assert!(!config.cors_preflight_enabled());
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.is_production());

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("ARCHIVE_FAILURE_POLICY", "ignore"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_port_fails() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}

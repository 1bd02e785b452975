//! Configuration module
//!
//! `Config` is built once at process start from the environment (and an optional
//! `.env` file) and handed to constructors by reference. Nothing reads the
//! environment after that.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const AVATAR_FOLDER: &str = "avatars";
const VIDEOS_FOLDER: &str = "videos";
const PROVISION_EMAIL_DOMAIN: &str = "seeder.com";
const PROVISION_CONCURRENCY: usize = 1;
const MAX_PROVISION_CONCURRENCY: usize = 32;
const PROVISION_VIDEO_DURATION_SECS: i32 = 120;

/// Settings consumed by the bulk provisioner and cleanup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionSettings {
    pub avatar_folder: String,
    pub videos_folder: String,
    /// Provisioned users get `{username}@{email_domain}`; cleanup finds them by it.
    pub email_domain: String,
    /// Maximum number of items processed at once. 1 means sequential.
    pub concurrency: usize,
    pub video_duration_secs: i32,
}

impl ProvisionSettings {
    /// Email suffix (`@domain`) that tags a row as provisioned.
    pub fn email_suffix(&self) -> String {
        format!("@{}", self.email_domain)
    }
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            avatar_folder: AVATAR_FOLDER.to_string(),
            videos_folder: VIDEOS_FOLDER.to_string(),
            email_domain: PROVISION_EMAIL_DOMAIN.to_string(),
            concurrency: PROVISION_CONCURRENCY,
            video_duration_secs: PROVISION_VIDEO_DURATION_SECS,
        }
    }
}

/// Settings consumed by the cascading delete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteSettings {
    /// When set, each blob delete waits (at most this long) until the object is
    /// observably absent before the metadata row is removed.
    pub blob_delete_wait: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_format: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub provision: ProvisionSettings,
    pub delete: DeleteSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => Some(s.parse::<StorageBackend>()?),
            Err(_) => None,
        };

        let concurrency = env::var("PROVISION_CONCURRENCY")
            .unwrap_or_else(|_| PROVISION_CONCURRENCY.to_string())
            .parse()
            .unwrap_or(PROVISION_CONCURRENCY);

        let blob_delete_wait = match env::var("BLOB_DELETE_WAIT_SECS") {
            Ok(s) if !s.trim().is_empty() => Some(Duration::from_secs(s.trim().parse().map_err(
                |_| anyhow::anyhow!("BLOB_DELETE_WAIT_SECS must be a whole number of seconds"),
            )?)),
            _ => None,
        };

        Ok(Config {
            environment,
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            provision: ProvisionSettings {
                avatar_folder: env::var("AVATAR_FOLDER")
                    .unwrap_or_else(|_| AVATAR_FOLDER.to_string()),
                videos_folder: env::var("VIDEOS_FOLDER")
                    .unwrap_or_else(|_| VIDEOS_FOLDER.to_string()),
                email_domain: env::var("PROVISION_EMAIL_DOMAIN")
                    .unwrap_or_else(|_| PROVISION_EMAIL_DOMAIN.to_string()),
                concurrency,
                video_duration_secs: env::var("PROVISION_VIDEO_DURATION_SECS")
                    .unwrap_or_else(|_| PROVISION_VIDEO_DURATION_SECS.to_string())
                    .parse()
                    .unwrap_or(PROVISION_VIDEO_DURATION_SECS),
            },
            delete: DeleteSettings { blob_delete_wait },
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        match self.storage_backend.unwrap_or(StorageBackend::S3) {
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
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.provision.email_domain.trim().is_empty() || self.provision.email_domain.contains('@')
        {
            return Err(anyhow::anyhow!(
                "PROVISION_EMAIL_DOMAIN must be a bare domain such as seeder.com"
            ));
        }

        if self.provision.concurrency == 0 || self.provision.concurrency > MAX_PROVISION_CONCURRENCY
        {
            return Err(anyhow::anyhow!(
                "PROVISION_CONCURRENCY must be between 1 and {}",
                MAX_PROVISION_CONCURRENCY
            ));
        }

        if self.provision.video_duration_secs <= 0 {
            return Err(anyhow::anyhow!(
                "PROVISION_VIDEO_DURATION_SECS must be positive"
            ));
        }

        if self.provision.avatar_folder.is_empty() || self.provision.videos_folder.is_empty() {
            return Err(anyhow::anyhow!(
                "AVATAR_FOLDER and VIDEOS_FOLDER must not be empty"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn log_json(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn provision_settings(&self) -> &ProvisionSettings {
        &self.provision
    }

    pub fn delete_settings(&self) -> &DeleteSettings {
        &self.delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config {
            environment: "development".to_string(),
            log_format: "pretty".to_string(),
            database_url: "postgres://localhost/mediakeep".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: Some("/tmp/mediakeep".to_string()),
            local_storage_base_url: Some("http://localhost:3000/media".to_string()),
            provision: ProvisionSettings::default(),
            delete: DeleteSettings::default(),
        }
    }

    #[test]
    fn local_config_is_valid() {
        assert!(local_config().validate().is_ok());
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let mut config = local_config();
        config.storage_backend = Some(StorageBackend::S3);
        assert!(config.validate().is_err());

        config.s3_bucket = Some("media".to_string());
        assert!(config.validate().is_err());

        config.aws_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut config = local_config();
        config.database_url = "mysql://localhost/db".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_concurrency() {
        let mut config = local_config();
        config.provision.concurrency = 0;
        assert!(config.validate().is_err());
        config.provision.concurrency = MAX_PROVISION_CONCURRENCY + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn provision_defaults() {
        let settings = ProvisionSettings::default();
        assert_eq!(settings.email_suffix(), "@seeder.com");
        assert_eq!(settings.avatar_folder, "avatars");
        assert_eq!(settings.video_duration_secs, 120);
        assert_eq!(settings.concurrency, 1);
    }
}

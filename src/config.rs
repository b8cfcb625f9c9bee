//! Pipeline configuration.
//!
//! The configuration is read once from a TOML file into a [`DwhConfig`] and
//! passed by reference into every entry point. Sections mirror the groups
//! operators already maintain for the cluster: `[cluster]`, `[iam_role]`,
//! `[s3]` and `[general]`. Upper-case section and key names (`[CLUSTER]`,
//! `HOST = ...`) are accepted as aliases.
//!
//! ```toml
//! [cluster]
//! host = "dwhcluster.abc123.us-west-2.redshift.amazonaws.com"
//! db_name = "dwh"
//! db_user = "dwhuser"
//! db_password = "..."
//! db_port = 5439
//!
//! [iam_role]
//! arn = "arn:aws:iam::123456789012:role/dwhRole"
//!
//! [s3]
//! log_data = "s3://udacity-dend/log_data"
//! log_jsonpath = "s3://udacity-dend/log_json_path.json"
//! song_data = "s3://udacity-dend/song_data"
//!
//! [general]
//! region = "us-west-2"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DwhError, DwhResult};

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dwh.toml";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "SPARKIFY_DWH_CONFIG";

/// Redshift's listener port.
pub const DEFAULT_PORT: u16 = 5439;

/// JSON mapping keyword that matches object keys to column names.
pub const JSON_AUTO: &str = "auto";

/// JSON mapping keyword that matches object keys to column names ignoring case.
pub const JSON_AUTO_IGNORECASE: &str = "auto ignorecase";

/// Full pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DwhConfig {
    #[serde(alias = "CLUSTER")]
    pub cluster: ClusterConfig,
    #[serde(alias = "IAM_ROLE", default)]
    pub iam_role: IamRoleConfig,
    #[serde(alias = "S3")]
    pub s3: SourceConfig,
    #[serde(alias = "GENERAL", default)]
    pub general: GeneralConfig,
}

/// Warehouse endpoint and credentials.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    #[serde(alias = "HOST")]
    pub host: String,
    #[serde(alias = "DB_NAME")]
    pub db_name: String,
    #[serde(alias = "DB_USER")]
    pub db_user: String,
    #[serde(alias = "DB_PASSWORD")]
    pub db_password: String,
    #[serde(alias = "DB_PORT", default = "default_port")]
    pub db_port: u16,
}

// Hand-written so the password never reaches logs.
impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_port", &self.db_port)
            .finish()
    }
}

impl ClusterConfig {
    /// `host:port/db` for log lines and error messages.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.db_port, self.db_name)
    }

    /// Build the driver connection settings.
    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut cfg = tokio_postgres::Config::new();
        cfg.host(&self.host)
            .port(self.db_port)
            .dbname(&self.db_name)
            .user(&self.db_user)
            .password(&self.db_password)
            .application_name("sparkify_dwh");
        cfg
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// IAM role the warehouse assumes to read the sources during `COPY`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IamRoleConfig {
    #[serde(alias = "ARN", default)]
    pub arn: String,
}

/// Source datasets.
///
/// For the Redshift dialect these are `s3://` URIs read by the warehouse.
/// For the Postgres dialect they are local files or directories (optionally
/// `file://` URIs) read by this process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(alias = "LOG_DATA")]
    pub log_data: String,
    /// JSONPaths document for the event log, or `auto`.
    #[serde(alias = "LOG_JSONPATH")]
    pub log_jsonpath: String,
    #[serde(alias = "SONG_DATA")]
    pub song_data: String,
    /// JSONPaths document for song metadata, or `auto` (the default).
    #[serde(alias = "SONG_JSONPATH", default = "default_song_jsonpath")]
    pub song_jsonpath: String,
}

fn default_song_jsonpath() -> String {
    JSON_AUTO.to_string()
}

/// Settings that apply to the whole run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// AWS region of the source bucket.
    #[serde(alias = "REGION", default)]
    pub region: String,
    #[serde(alias = "DIALECT", default)]
    pub dialect: Dialect,
    #[serde(alias = "STAGE_MODE", default)]
    pub stage_mode: StageMode,
}

/// SQL flavour the statements are rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Amazon Redshift: physical layout hints and server-side `COPY` from S3.
    #[default]
    Redshift,
    /// Vanilla PostgreSQL: no layout hints, client-side load from local files.
    Postgres,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Redshift => "redshift",
            Dialect::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction granularity for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    /// Commit after every statement. A failure leaves earlier statements of
    /// the stage applied.
    #[default]
    PerStatement,
    /// One transaction per stage, rolled back on the first failure.
    PerStage,
}

impl StageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageMode::PerStatement => "per_statement",
            StageMode::PerStage => "per_stage",
        }
    }
}

impl DwhConfig {
    /// Resolve the config path: explicit argument, then the environment
    /// variable, then [`DEFAULT_CONFIG_FILE`].
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(val) if !val.is_empty() => PathBuf::from(val),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> DwhResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DwhError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: DwhConfig = toml::from_str(&text).map_err(|source| DwhError::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config text. Used by tests and `plan`.
    pub fn from_toml(text: &str) -> DwhResult<Self> {
        let config: DwhConfig = toml::from_str(text).map_err(|source| DwhError::ConfigParse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value needed by the selected dialect is usable.
    pub fn validate(&self) -> DwhResult<()> {
        require("cluster.host", &self.cluster.host)?;
        require("cluster.db_name", &self.cluster.db_name)?;
        require("cluster.db_user", &self.cluster.db_user)?;
        require("s3.log_data", &self.s3.log_data)?;
        require("s3.log_jsonpath", &self.s3.log_jsonpath)?;
        require("s3.song_data", &self.s3.song_data)?;
        require("s3.song_jsonpath", &self.s3.song_jsonpath)?;
        if self.cluster.db_port == 0 {
            return Err(DwhError::InvalidConfig("cluster.db_port must be non-zero".into()));
        }

        match self.general.dialect {
            Dialect::Redshift => {
                require("iam_role.arn", &self.iam_role.arn)?;
                require("general.region", &self.general.region)?;
                for (key, value) in [
                    ("s3.log_data", &self.s3.log_data),
                    ("s3.song_data", &self.s3.song_data),
                ] {
                    if !is_s3_uri(value) {
                        return Err(DwhError::InvalidConfig(format!(
                            "{key} must be an s3:// URI for the redshift dialect, got '{value}'"
                        )));
                    }
                }
                for (key, value) in [
                    ("s3.log_jsonpath", &self.s3.log_jsonpath),
                    ("s3.song_jsonpath", &self.s3.song_jsonpath),
                ] {
                    if !is_auto_keyword(value) && !is_s3_uri(value) {
                        return Err(DwhError::InvalidConfig(format!(
                            "{key} must be 'auto' or an s3:// URI for the redshift dialect, got '{value}'"
                        )));
                    }
                }
            }
            Dialect::Postgres => {
                for (key, value) in [
                    ("s3.log_data", &self.s3.log_data),
                    ("s3.log_jsonpath", &self.s3.log_jsonpath),
                    ("s3.song_data", &self.s3.song_data),
                    ("s3.song_jsonpath", &self.s3.song_jsonpath),
                ] {
                    if is_s3_uri(value) {
                        return Err(DwhError::InvalidConfig(format!(
                            "{key} must be a local path for the postgres dialect, got '{value}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> DwhResult<()> {
    if value.trim().is_empty() {
        Err(DwhError::InvalidConfig(format!("{key} is required")))
    } else {
        Ok(())
    }
}

/// Whether a location names an S3 object or prefix.
pub fn is_s3_uri(value: &str) -> bool {
    value.trim().to_ascii_lowercase().starts_with("s3://")
}

/// Whether a JSON mapping value is one of the automatic keywords.
pub fn is_auto_keyword(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    normalized == JSON_AUTO || normalized == JSON_AUTO_IGNORECASE
}

/// Turn a configured local location into a path, stripping `file://`.
pub fn local_path(value: &str) -> PathBuf {
    let trimmed = value.trim();
    PathBuf::from(trimmed.strip_prefix("file://").unwrap_or(trimmed))
}

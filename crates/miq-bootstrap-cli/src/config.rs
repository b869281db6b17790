//! Configuration management for miq-bootstrap
//!
//! Sources, lowest precedence first: `conf/application.yml` (or the file given
//! with `-c`), `MIQ_BOOTSTRAP__*` environment variables, command line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

use miq_bootstrap_common::{BootstrapError, CU_ROLES, DEFAULT_ALERT_PROFILE_GUIDS};
use miq_bootstrap_core::{BootstrapPlan, Phase, read_guid_file};
use miq_bootstrap_persistence::StorageMode;

use crate::logging::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const DEFAULT_GUID_FILE: &str = "/var/www/miq/vmdb/GUID";
pub const ENV_PREFIX: &str = "MIQ_BOOTSTRAP";

pub const DB_URL: &str = "db.url";
pub const STORAGE_MODE: &str = "storage.mode";
pub const STORAGE_SEED_FILE: &str = "storage.seed_file";
pub const STORAGE_READ_ONLY: &str = "storage.read_only";
pub const SERVER_GUID: &str = "server.guid";
pub const SERVER_GUID_FILE: &str = "server.guid_file";
pub const ENTERPRISE_ID: &str = "enterprise.id";
pub const SETTINGS_DEFAULTS_FILE: &str = "settings.defaults_file";
pub const BOOTSTRAP_ALERT_PROFILE_GUIDS: &str = "bootstrap.alert_profile_guids";
pub const BOOTSTRAP_ROLES: &str = "bootstrap.roles";
pub const BOOTSTRAP_DRY_RUN: &str = "bootstrap.dry_run";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(
    name = "miq-bootstrap",
    version,
    about = "Assign default alert profiles and enable C&U roles on an appliance"
)]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<PathBuf>,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    pub database_url: Option<String>,
    /// Storage backend: external_db or memory
    #[arg(long = "storage")]
    pub storage: Option<String>,
    /// Seed file for the memory backend
    #[arg(long = "seed-file")]
    pub seed_file: Option<String>,
    /// GUID of the server to configure, instead of the GUID file
    #[arg(long = "server-guid")]
    pub server_guid: Option<String>,
    /// Enterprise to assign alert profiles to, instead of the last one
    #[arg(long = "enterprise-id")]
    pub enterprise_id: Option<i64>,
    /// Report what would change without writing
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Assign alert profiles, then enable roles
    Run,
    /// Only assign alert profiles to the enterprise
    AssignAlertProfiles,
    /// Only append the C&U roles to the server role list
    EnableRoles,
    /// Print roles and alert profile assignments without changing anything
    Show,
}

impl Command {
    /// Phases a command runs; `None` for read-only commands
    pub fn phases(self) -> Option<Vec<Phase>> {
        match self {
            Command::Run => Some(Phase::ALL.to_vec()),
            Command::AssignAlertProfiles => Some(vec![Phase::AlertProfileAssignment]),
            Command::EnableRoles => Some(vec![Phase::RoleAugmentation]),
            Command::Show => None,
        }
    }
}

/// Application configuration loaded from config files, environment, and flags
#[derive(Clone, Debug)]
pub struct Configuration {
    pub config: Config,
    pub command: Command,
}

impl Configuration {
    /// Parse the process arguments and build the configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        let file_source = match &cli.config_file {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut builder = Config::builder().add_source(file_source).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key(BOOTSTRAP_ALERT_PROFILE_GUIDS)
                .with_list_parse_key(BOOTSTRAP_ROLES),
        );

        if let Some(v) = cli.database_url {
            builder = builder.set_override(DB_URL, v)?;
        }
        if let Some(v) = cli.storage {
            builder = builder.set_override(STORAGE_MODE, v)?;
        }
        if let Some(v) = cli.seed_file {
            builder = builder.set_override(STORAGE_SEED_FILE, v)?;
        }
        if let Some(v) = cli.server_guid {
            builder = builder.set_override(SERVER_GUID, v)?;
        }
        if let Some(v) = cli.enterprise_id {
            builder = builder.set_override(ENTERPRISE_ID, v)?;
        }
        if cli.dry_run {
            builder = builder.set_override(BOOTSTRAP_DRY_RUN, true)?;
        }

        Ok(Configuration {
            config: builder.build()?,
            command: cli.command.unwrap_or(Command::Run),
        })
    }

    // ========================================================================
    // Storage
    // ========================================================================

    pub fn storage_mode(&self) -> anyhow::Result<StorageMode> {
        match self.config.get_string(STORAGE_MODE) {
            Ok(mode) => mode.parse().map_err(anyhow::Error::msg),
            Err(_) => Ok(StorageMode::ExternalDb),
        }
    }

    pub fn seed_file(&self) -> Option<String> {
        self.config.get_string(STORAGE_SEED_FILE).ok()
    }

    pub fn read_only(&self) -> bool {
        self.config.get_bool(STORAGE_READ_ONLY).unwrap_or(false)
    }

    /// Settings defaults tree the server's overrides are layered on
    pub fn settings_defaults(&self) -> anyhow::Result<Value> {
        match self.config.get_string(SETTINGS_DEFAULTS_FILE) {
            Ok(path) => load_yaml_tree(Path::new(&path)),
            Err(_) => Ok(Value::Object(Default::default())),
        }
    }

    /// Integer pool setting; negative or oversized values are rejected
    fn pool_setting<T: TryFrom<i64>>(&self, key: &str, default: T) -> anyhow::Result<T> {
        match self.config.get_int(key) {
            Ok(value) => T::try_from(value).map_err(|_| {
                BootstrapError::ConfigError(format!("{} is out of range: {}", key, value)).into()
            }),
            Err(_) => Ok(default),
        }
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let max_connections: u32 = self.pool_setting("db.pool.max_connections", 5)?;
        let min_connections: u32 = self.pool_setting("db.pool.min_connections", 1)?;
        let connect_timeout: u64 = self.pool_setting("db.pool.connect_timeout", 30)?;
        let acquire_timeout: u64 = self.pool_setting("db.pool.acquire_timeout", 8)?;
        let sqlx_logging = self
            .config
            .get_bool("db.pool.sqlx_logging")
            .unwrap_or(false);

        let url = self.config.get_string(DB_URL)?;

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .acquire_timeout(Duration::from_secs(acquire_timeout))
            .sqlx_logging(sqlx_logging);

        tracing::info!(
            max_connections = max_connections,
            min_connections = min_connections,
            connect_timeout = connect_timeout,
            sqlx_logging = sqlx_logging,
            "Database connection pool configured"
        );

        Ok(Database::connect(opt).await?)
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// Server GUID: configured value, else the appliance GUID file
    pub fn server_guid(&self) -> Result<String, BootstrapError> {
        if let Ok(guid) = self.config.get_string(SERVER_GUID) {
            return Ok(guid);
        }
        let path = self
            .config
            .get_string(SERVER_GUID_FILE)
            .unwrap_or_else(|_| DEFAULT_GUID_FILE.to_string());
        read_guid_file(path)
    }

    pub fn enterprise_id(&self) -> Option<i64> {
        self.config.get_int(ENTERPRISE_ID).ok()
    }

    // ========================================================================
    // Bootstrap plan
    // ========================================================================

    pub fn alert_profile_guids(&self) -> Vec<String> {
        self.config
            .get::<Vec<String>>(BOOTSTRAP_ALERT_PROFILE_GUIDS)
            .unwrap_or_else(|_| {
                DEFAULT_ALERT_PROFILE_GUIDS
                    .iter()
                    .map(|g| g.to_string())
                    .collect()
            })
    }

    pub fn roles(&self) -> Vec<String> {
        self.config
            .get::<Vec<String>>(BOOTSTRAP_ROLES)
            .unwrap_or_else(|_| CU_ROLES.iter().map(|r| r.to_string()).collect())
    }

    pub fn dry_run(&self) -> bool {
        self.config.get_bool(BOOTSTRAP_DRY_RUN).unwrap_or(false)
    }

    pub fn plan(&self) -> BootstrapPlan {
        BootstrapPlan {
            alert_profile_guids: self.alert_profile_guids(),
            roles: self.roles(),
            phases: self.command.phases().unwrap_or_default(),
            dry_run: self.dry_run(),
        }
    }

    // ========================================================================
    // Logging
    // ========================================================================

    /// Logging settings: `log.*` keys, falling back to the environment
    pub fn logging_config(&self) -> LoggingConfig {
        let env = LoggingConfig::from_env();
        LoggingConfig::from_config(
            Some(
                self.config
                    .get_string("log.dir")
                    .unwrap_or_else(|_| env.log_dir.display().to_string()),
            ),
            self.config
                .get_bool("log.console")
                .unwrap_or(env.console_output),
            self.config.get_bool("log.file").unwrap_or(env.file_logging),
            self.config
                .get_string("log.level")
                .unwrap_or_else(|_| env.console_level.to_string()),
            self.config.get_string("log.rotation").ok(),
        )
    }
}

/// Read a YAML document into a settings tree
pub fn load_yaml_tree(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("Failed to read settings file {}: {}", path.display(), e)
    })?;
    let value: Value = serde_yaml::from_str(&content)?;
    if !value.is_object() {
        anyhow::bail!("Settings file {} is not a mapping", path.display());
    }
    Ok(value)
}

//! Configuration file management for stride.
//!
//! Provides a TOML-based config file at `~/.config/stride/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stride_core::EngineConfig;
use stride_db::config::DbConfig;

/// Environment variable naming the operator's caller id.
pub const CALLER_ENV: &str = "STRIDE_CALLER";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub operator: OperatorSection,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OperatorSection {
    /// Identity every command runs as; owner of the plans it creates.
    pub caller_id: Uuid,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the stride config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/stride` or `~/.config/stride`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("stride");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("stride")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StrideConfig {
    pub db_config: DbConfig,
    caller_id: Option<Uuid>,
    pub engine: EngineConfig,
}

impl StrideConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `STRIDE_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - Caller: `cli_caller` > `STRIDE_CALLER` env > `config_file.operator.caller_id` > unset
    /// - Engine: `config_file.engine` > `EngineConfig::default()`
    pub fn resolve(cli_db_url: Option<&str>, cli_caller: Option<Uuid>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("STRIDE_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let caller_id = if let Some(id) = cli_caller {
            Some(id)
        } else if let Ok(raw) = std::env::var(CALLER_ENV) {
            let id = Uuid::parse_str(raw.trim())
                .with_context(|| format!("{CALLER_ENV} env var is not a valid UUID"))?;
            Some(id)
        } else {
            file_config.as_ref().map(|cfg| cfg.operator.caller_id)
        };

        let engine = file_config.map(|cfg| cfg.engine).unwrap_or_default();

        Ok(Self {
            db_config: DbConfig::new(db_url),
            caller_id,
            engine,
        })
    }

    /// The caller id, required by every command that reads or writes plans.
    pub fn caller_id(&self) -> Result<Uuid> {
        match self.caller_id {
            Some(id) => Ok(id),
            None => bail!(
                "caller id not found; pass --caller, set {CALLER_ENV}, or run `stride init` to create a config file"
            ),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{lock_env, with_config_home};

    const CALLER: &str = "6f1c8a52-2b7e-4c1f-9d0a-3e5b7c9d1f20";

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();

        let loaded = with_config_home(tmp.path(), || {
            let original = ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://testhost:5432/testdb".to_string(),
                },
                operator: OperatorSection {
                    caller_id: Uuid::parse_str(CALLER).unwrap(),
                },
                engine: EngineConfig {
                    template_week_count: 4,
                    ..EngineConfig::default()
                },
            };
            save_config(&original).unwrap();
            load_config().unwrap()
        });

        assert_eq!(loaded.database.url, "postgresql://testhost:5432/testdb");
        assert_eq!(loaded.operator.caller_id.to_string(), CALLER);
        assert_eq!(loaded.engine.template_week_count, 4);
        assert_eq!(loaded.engine.default_week_count, 52);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();

        let mode = with_config_home(tmp.path(), || {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: DbConfig::DEFAULT_URL.to_string(),
                },
                operator: OperatorSection {
                    caller_id: Uuid::new_v4(),
                },
                engine: EngineConfig::default(),
            })
            .unwrap();
            std::fs::metadata(config_path()).unwrap().permissions().mode()
        });
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn engine_table_is_optional() {
        let cfg: ConfigFile = toml::from_str(&format!(
            "[database]\nurl = \"postgresql://h/db\"\n\n[operator]\ncaller_id = \"{CALLER}\"\n"
        ))
        .unwrap();
        assert_eq!(cfg.engine, EngineConfig::default());
    }

    #[test]
    fn resolve_with_cli_flags_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var("STRIDE_DATABASE_URL", "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(CALLER_ENV, Uuid::new_v4().to_string()) };

        let flag_caller = Uuid::parse_str(CALLER).unwrap();
        let config =
            StrideConfig::resolve(Some("postgresql://cli:5432/clidb"), Some(flag_caller)).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
        assert_eq!(config.caller_id().unwrap(), flag_caller);

        unsafe { std::env::remove_var("STRIDE_DATABASE_URL") };
        unsafe { std::env::remove_var(CALLER_ENV) };
    }

    #[test]
    fn resolve_with_env_vars_overrides_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();

        let config = with_config_home(tmp.path(), || {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://file:5432/filedb".to_string(),
                },
                operator: OperatorSection {
                    caller_id: Uuid::new_v4(),
                },
                engine: EngineConfig::default(),
            })
            .unwrap();

            unsafe { std::env::set_var("STRIDE_DATABASE_URL", "postgresql://env:5432/envdb") };
            unsafe { std::env::set_var(CALLER_ENV, CALLER) };
            let config = StrideConfig::resolve(None, None);
            unsafe { std::env::remove_var("STRIDE_DATABASE_URL") };
            unsafe { std::env::remove_var(CALLER_ENV) };
            config.unwrap()
        });

        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.caller_id().unwrap().to_string(), CALLER);
    }

    #[test]
    fn resolve_defaults_and_requires_caller_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();

        unsafe { std::env::remove_var("STRIDE_DATABASE_URL") };
        unsafe { std::env::remove_var(CALLER_ENV) };
        let config = with_config_home(tmp.path(), || StrideConfig::resolve(None, None)).unwrap();

        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.engine, EngineConfig::default());
        let msg = config.caller_id().unwrap_err().to_string();
        assert!(msg.contains("caller id not found"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_rejects_malformed_caller_env() {
        let _lock = lock_env();

        unsafe { std::env::set_var(CALLER_ENV, "not-a-uuid") };
        let result = StrideConfig::resolve(Some(DbConfig::DEFAULT_URL), None);
        unsafe { std::env::remove_var(CALLER_ENV) };

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains(CALLER_ENV), "unexpected error: {msg}");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("stride/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}

// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DaemonError, IoContext};
use crate::permission::PermissionAnswer;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to bind the daemon socket
    pub socket_path: PathBuf,

    /// Directory reported by `getDatabasesPath`
    pub databases_path: PathBuf,

    /// Log level
    pub log_level: String,

    /// Reject missing or mistyped arguments instead of defaulting them
    pub strict_arguments: bool,

    /// Initial query result shape (list of row maps instead of columns + rows)
    pub query_as_map_list: bool,

    /// Compiled statements kept per open database
    pub statement_cache_capacity: usize,

    /// Answer given to every storage permission request
    pub storage_access: PermissionAnswer,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/run/sqlbridge/daemon.sock"),
            databases_path: PathBuf::from("/var/lib/sqlbridge/databases"),
            log_level: "info".to_string(),
            strict_arguments: false,
            query_as_map_list: false,
            statement_cache_capacity: 64,
            storage_access: PermissionAnswer::AllowForever,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, DaemonError> {
        let contents = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `SQLBRIDGE_CONFIG` if set, otherwise use defaults.
    pub fn load() -> Result<Self, DaemonError> {
        match std::env::var("SQLBRIDGE_CONFIG") {
            Ok(path) => Config::from_file(&PathBuf::from(path)),
            Err(_) => Ok(Config::default()),
        }
    }

    fn validate(&self) -> Result<(), DaemonError> {
        if self.statement_cache_capacity == 0 {
            return Err(DaemonError::config(
                "statement_cache_capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            socket_path = "/tmp/sqlbridge.sock"
            strict_arguments = true
            storage_access = "deny_forever"
            "#,
        )
        .unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/sqlbridge.sock"));
        assert!(config.strict_arguments);
        assert_eq!(config.storage_access, PermissionAnswer::DenyForever);
        assert_eq!(config.statement_cache_capacity, 64);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<Config>("sockt_path = \"/tmp/x\"").is_err());
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "statement_cache_capacity = 0").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, DaemonError::Config(_)), "got {err:?}");
    }
}

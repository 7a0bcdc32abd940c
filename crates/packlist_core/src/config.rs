//! Runtime configuration from environment variables.
//!
//! | variable              | required | meaning                                  |
//! |-----------------------|----------|------------------------------------------|
//! | `PACKLIST_DB_PATH`    | yes      | SQLite file, or `:memory:`               |
//! | `PACKLIST_LOG_LEVEL`  | no       | trace/debug/info/warn/error              |
//! | `PACKLIST_LOG_DIR`    | no       | absolute directory; unset disables logs  |

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_VAR: &str = "PACKLIST_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "PACKLIST_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "PACKLIST_LOG_DIR";

/// Location used to request an in-memory database.
pub const IN_MEMORY_DB_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Blank(&'static str),
    Invalid { var: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "environment variable `{var}` is not set"),
            Self::Blank(var) => write!(f, "environment variable `{var}` is blank"),
            Self::Invalid { var, message } => write!(f, "invalid `{var}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_VAR).ok_or(ConfigError::Missing(DB_PATH_VAR))?;
        let db_path = non_blank(DB_PATH_VAR, &db_path)?;

        let log_level = match lookup(LOG_LEVEL_VAR) {
            Some(value) => {
                normalize_level(non_blank(LOG_LEVEL_VAR, &value)?).map_err(|err| {
                    ConfigError::Invalid {
                        var: LOG_LEVEL_VAR,
                        message: err.to_string(),
                    }
                })?
            }
            None => default_log_level(),
        };

        let log_dir = match lookup(LOG_DIR_VAR) {
            Some(value) => {
                let dir = Path::new(non_blank(LOG_DIR_VAR, &value)?);
                if !dir.is_absolute() {
                    return Err(ConfigError::Invalid {
                        var: LOG_DIR_VAR,
                        message: format!("expected an absolute path, got `{}`", dir.display()),
                    });
                }
                Some(dir.to_path_buf())
            }
            None => None,
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            log_level,
            log_dir,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.db_path == Path::new(IN_MEMORY_DB_PATH)
    }
}

fn non_blank<'a>(var: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Blank(var));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError, DB_PATH_VAR, LOG_DIR_VAR, LOG_LEVEL_VAR};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn db_path_is_required() {
        assert_eq!(config_from(&[]), Err(ConfigError::Missing(DB_PATH_VAR)));
        assert_eq!(
            config_from(&[(DB_PATH_VAR, "  ")]),
            Err(ConfigError::Blank(DB_PATH_VAR))
        );
    }

    #[test]
    fn optional_values_fall_back_to_defaults() {
        let config = config_from(&[(DB_PATH_VAR, " /tmp/packlist.db ")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/packlist.db"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn log_settings_are_validated() {
        let config = config_from(&[
            (DB_PATH_VAR, ":memory:"),
            (LOG_LEVEL_VAR, "WARNING"),
            (LOG_DIR_VAR, "/var/log/packlist"),
        ])
        .unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/packlist")));

        let level_err = config_from(&[(DB_PATH_VAR, "a.db"), (LOG_LEVEL_VAR, "loud")]);
        assert!(matches!(
            level_err,
            Err(ConfigError::Invalid {
                var: LOG_LEVEL_VAR,
                ..
            })
        ));

        let dir_err = config_from(&[(DB_PATH_VAR, "a.db"), (LOG_DIR_VAR, "logs")]);
        assert!(matches!(
            dir_err,
            Err(ConfigError::Invalid {
                var: LOG_DIR_VAR,
                ..
            })
        ));
    }
}

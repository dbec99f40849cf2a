// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::path::PathBuf;

/// Meshbridge adapter configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the operation catalog file (YAML or JSON)
    pub catalog_path: PathBuf,
    /// Component tag stamped onto every event record
    pub component: String,
    /// Component instance name stamped onto every event record
    pub component_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `MESHBRIDGE_CATALOG_PATH`: operation catalog file (YAML or JSON)
    ///
    /// Optional (with defaults):
    /// - `MESHBRIDGE_COMPONENT`: component tag (default: "istio")
    /// - `MESHBRIDGE_COMPONENT_NAME`: instance name (default: "meshbridge-istio")
    pub fn from_env() -> Result<Self, ConfigError> {
        let catalog_path = std::env::var("MESHBRIDGE_CATALOG_PATH")
            .map_err(|_| ConfigError::Missing("MESHBRIDGE_CATALOG_PATH"))?;
        if catalog_path.is_empty() {
            return Err(ConfigError::Invalid(
                "MESHBRIDGE_CATALOG_PATH",
                "must not be empty",
            ));
        }

        let component =
            std::env::var("MESHBRIDGE_COMPONENT").unwrap_or_else(|_| "istio".to_string());

        let component_name = std::env::var("MESHBRIDGE_COMPONENT_NAME")
            .unwrap_or_else(|_| "meshbridge-istio".to_string());

        Ok(Self {
            catalog_path: PathBuf::from(catalog_path),
            component,
            component_name,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to set env vars for a test and restore them after
    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::set_var(key, value) };
        }

        fn remove(&mut self, key: &str) {
            let old = env::var(key).ok();
            self.vars.push((key.to_string(), old));
            // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
            unsafe { env::remove_var(key) };
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.drain(..).rev() {
                // SAFETY: Tests are serialized via ENV_MUTEX, so no concurrent access
                unsafe {
                    match value {
                        Some(v) => env::set_var(&key, v),
                        None => env::remove_var(&key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("MESHBRIDGE_CATALOG_PATH", "/etc/meshbridge/catalog.yaml");
        guard.remove("MESHBRIDGE_COMPONENT");
        guard.remove("MESHBRIDGE_COMPONENT_NAME");

        let config = Config::from_env().unwrap();

        assert_eq!(
            config.catalog_path,
            PathBuf::from("/etc/meshbridge/catalog.yaml")
        );
        assert_eq!(config.component, "istio");
        assert_eq!(config.component_name, "meshbridge-istio");
    }

    #[test]
    fn test_config_from_env_all_custom() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("MESHBRIDGE_CATALOG_PATH", "./catalog.json");
        guard.set("MESHBRIDGE_COMPONENT", "linkerd");
        guard.set("MESHBRIDGE_COMPONENT_NAME", "meshbridge-linkerd");

        let config = Config::from_env().unwrap();

        assert_eq!(config.catalog_path, PathBuf::from("./catalog.json"));
        assert_eq!(config.component, "linkerd");
        assert_eq!(config.component_name, "meshbridge-linkerd");
    }

    #[test]
    fn test_config_missing_catalog_path() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.remove("MESHBRIDGE_CATALOG_PATH");

        let result = Config::from_env();
        assert!(result.is_err());

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing("MESHBRIDGE_CATALOG_PATH")
        ));
        assert!(err.to_string().contains("MESHBRIDGE_CATALOG_PATH"));
    }

    #[test]
    fn test_config_empty_catalog_path() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let mut guard = EnvGuard::new();

        guard.set("MESHBRIDGE_CATALOG_PATH", "");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::Invalid("MESHBRIDGE_CATALOG_PATH", _)
        ));
    }

    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::Missing("MY_VAR");
        assert_eq!(
            missing.to_string(),
            "missing required environment variable: MY_VAR"
        );

        let invalid = ConfigError::Invalid("MY_VAR", "must not be empty");
        assert_eq!(
            invalid.to_string(),
            "invalid value for MY_VAR: must not be empty"
        );
    }
}

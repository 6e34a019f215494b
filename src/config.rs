//! Runtime tuning knobs.
//!
//! Configuration is resolved from defaults, an optional JSON document and a
//! couple of environment overrides, then installed for the current thread.

use std::{cell::RefCell, fmt};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colorize when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub color: ColorMode,
    /// Nesting depth at which diagnostic printing emits `[...]`.
    pub print_max_depth: usize,
    /// Nesting depth at which JSON encoding emits the depth marker.
    pub json_max_depth: usize,
    /// Entry count at which an object switches to hashed storage.
    pub object_hash_threshold: usize,
    /// Upper bound on receiver + arguments + captures for one call.
    pub max_call_args: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            print_max_depth: 64,
            json_max_depth: 256,
            object_hash_threshold: 8,
            max_call_args: 16,
        }
    }
}

#[derive(Debug)]
pub struct ConfigError {
    source: serde_json::Error,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid runtime config: {}", self.source)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl RuntimeConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError { source })
    }

    /// Defaults with `FLYUX_COLOR` / `NO_COLOR` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        if std::env::var_os("NO_COLOR").is_some() {
            self.color = ColorMode::Never;
        }
        if let Ok(mode) = std::env::var("FLYUX_COLOR") {
            match mode.to_ascii_lowercase().as_str() {
                "always" => self.color = ColorMode::Always,
                "never" => self.color = ColorMode::Never,
                "auto" => self.color = ColorMode::Auto,
                other => log::warn!("ignoring unknown FLYUX_COLOR value {:?}", other),
            }
        }
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::from_env());
}

/// Replaces the configuration for the current thread.
pub fn install(config: RuntimeConfig) {
    CONFIG.with(|slot| *slot.borrow_mut() = config);
}

pub fn current() -> RuntimeConfig {
    CONFIG.with(|slot| slot.borrow().clone())
}

/// Reads one field without cloning the whole config.
pub fn with<R>(f: impl FnOnce(&RuntimeConfig) -> R) -> R {
    CONFIG.with(|slot| f(&slot.borrow()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{"color": "never", "json_max_depth": 8}"#)
            .expect("valid config");
        assert_eq!(config.color, ColorMode::Never);
        assert_eq!(config.json_max_depth, 8);
        assert_eq!(config.object_hash_threshold, 8);
        assert_eq!(config.max_call_args, 16);
    }

    #[test]
    fn malformed_json_reports_error() {
        let err = RuntimeConfig::from_json("{color:").unwrap_err();
        assert!(err.to_string().starts_with("invalid runtime config"));
    }

    #[test]
    fn install_is_thread_local() {
        install(RuntimeConfig {
            print_max_depth: 3,
            ..RuntimeConfig::default()
        });
        assert_eq!(with(|c| c.print_max_depth), 3);
        let other = std::thread::spawn(|| with(|c| c.print_max_depth))
            .join()
            .unwrap();
        assert_eq!(other, 64);
        install(RuntimeConfig::default());
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Analysis configuration.
///
/// Every field has a default, so a TOML file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name or path of the readelf-compatible introspection utility.
    pub readelf: PathBuf,

    /// Arguments passed before the input path.
    pub readelf_args: Vec<String>,

    /// Upper bound for a single utility invocation.
    pub timeout_secs: u64,

    /// Rule names that are never evaluated.
    pub disabled_rules: Vec<String>,

    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            readelf: PathBuf::from("readelf"),
            readelf_args: ["-W", "-S", "-l", "-d", "-s"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: 60,
            disabled_rules: Vec::new(),
            policy: Policy::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_rule_disabled(&self, name: &str) -> bool {
        self.disabled_rules.iter().any(|r| r == name)
    }
}

/// Packaging-policy knobs consumed by individual rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Policy {
    /// Treat a binary without a `GNU_STACK` program header as having an
    /// executable stack.
    pub missing_gnu_stack_is_executable: bool,

    /// Package name prefixes subject to the shared-library naming policy.
    pub shlib_name_prefixes: Vec<String>,

    /// Install-path prefixes exempt from the static-library debuginfo rule.
    pub debug_exempt_prefixes: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            missing_gnu_stack_is_executable: false,
            shlib_name_prefixes: vec!["lib".to_string()],
            debug_exempt_prefixes: vec!["/usr/lib/debug/".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.readelf, PathBuf::from("readelf"));
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn partial_policy_override_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            timeout_secs = 5
            disabled_rules = ["call-to-mktemp"]

            [policy]
            missing_gnu_stack_is_executable = true
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_secs, 5);
        assert!(config.is_rule_disabled("call-to-mktemp"));
        assert!(!config.is_rule_disabled("no-soname"));
        assert!(config.policy.missing_gnu_stack_is_executable);
        assert_eq!(config.policy.shlib_name_prefixes, vec!["lib"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("readelf_path = \"x\"").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn printed_config_parses_back() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}

use std::env;
use std::path::PathBuf;

use crate::models::FABA_EXTENSION;

pub const DEFAULT_EXTENSION: &str = "mp3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Extension of the source audio files, without the dot.
    pub extension: String,
    /// Where the rotating run log goes. `None` picks the platform default.
    pub log_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            log_dir: None,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            extension: lookup("FABAGEN_EXTENSION")
                .map(|ext| normalize_extension(&ext))
                .filter(|ext| !ext.is_empty())
                .unwrap_or(defaults.extension),
            log_dir: lookup("FABAGEN_LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            debug: lookup("FABAGEN_DEBUG")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.debug),
        }
    }

    /// Applies command line overrides on top of the environment.
    pub fn merge(mut self, extension: Option<&str>, log_dir: Option<PathBuf>, debug: bool) -> Self {
        if let Some(ext) = extension {
            self.extension = normalize_extension(ext);
        }
        if log_dir.is_some() {
            self.log_dir = log_dir;
        }
        self.debug |= debug;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.extension.is_empty() {
            return Err("source extension must not be empty".to_string());
        }
        if self.extension.eq_ignore_ascii_case(FABA_EXTENSION) {
            return Err(format!(
                ".{} files are generator output and cannot be used as input",
                FABA_EXTENSION
            ));
        }
        Ok(())
    }
}

fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn reads_env_vars() {
        let config = Config::from_lookup(lookup(&[
            ("FABAGEN_EXTENSION", ".WAV"),
            ("FABAGEN_LOG_DIR", "/tmp/fabagen"),
            ("FABAGEN_DEBUG", "true"),
        ]));
        assert_eq!(config.extension, "wav");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/fabagen")));
        assert!(config.debug);
    }

    #[test]
    fn cli_overrides_env() {
        let config = Config::from_lookup(lookup(&[("FABAGEN_EXTENSION", "wav")]))
            .merge(Some("mp3"), None, true);
        assert_eq!(config.extension, "mp3");
        assert!(config.debug);
    }

    #[test]
    fn faba_input_is_rejected() {
        let config = Config::default().merge(Some("FABA"), None, false);
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}

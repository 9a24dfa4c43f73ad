//! User configuration for mentor.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/mentor/config.toml` (falling
//! back to `~/.config/mentor/config.toml`). Every key is optional; a missing
//! file yields the defaults. Parse errors are soft: they are reported on
//! stderr before the terminal is initialised and the defaults are used.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable that overrides `api_url` from the file.
pub const API_URL_ENV: &str = "MENTOR_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_THEME: &str = "catppuccin-mocha";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the tutoring backend.
    pub api_url: String,
    /// `dark` or `catppuccin-mocha`.
    pub theme: String,
    /// How many passages a knowledge search returns.
    pub search_results: usize,
    /// Where the client-state database and the log file live.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            theme: DEFAULT_THEME.to_owned(),
            search_results: mentor_core::client::DEFAULT_SEARCH_K,
            data_dir: None,
        }
    }
}

/// `$XDG_<var>` or `~/<home_rel>`, or `<home_rel>` relative to the cwd when
/// neither is set.
fn xdg_dir(var: &str, home_rel: &str) -> PathBuf {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(home_rel)))
        .unwrap_or_else(|| PathBuf::from(home_rel))
}

pub fn config_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config").join("mentor").join("config.toml")
}

impl Config {
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads `path`. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }

    /// Loads the user's config file and applies environment overrides.
    ///
    /// Never fails: errors are printed to stderr and the defaults used.
    pub fn load() -> Self {
        let mut config = Self::load_from(&config_path()).unwrap_or_else(|e| {
            eprintln!("mentor: {e}; using defaults");
            Self::default()
        });
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        config
    }

    pub fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| xdg_dir("XDG_DATA_HOME", ".local/share").join("mentor"))
    }

    /// Search size with a floor of one passage.
    pub fn search_k(&self) -> usize {
        self.search_results.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::parse("", Path::new("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.api_url, "http://localhost:8000");
        assert_eq!(cfg.search_k(), 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let raw = "theme = \"dark\"\nsearch_results = 8\n";
        let cfg = Config::parse(raw, Path::new("config.toml")).unwrap();
        assert_eq!(cfg.theme, "dark");
        assert_eq!(cfg.search_results, 8);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = Config::parse("search_results = \"many\"", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("c.toml"));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn env_override_replaces_api_url_unless_blank() {
        let mut cfg = Config::default();
        cfg.apply_api_url_override(Some("  ".to_owned()));
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        cfg.apply_api_url_override(Some("https://tutor.example.edu".to_owned()));
        assert_eq!(cfg.api_url, "https://tutor.example.edu");
    }

    #[test]
    fn explicit_data_dir_wins() {
        let cfg = Config::parse("data_dir = \"/srv/mentor\"", Path::new("c.toml")).unwrap();
        assert_eq!(cfg.data_dir(), PathBuf::from("/srv/mentor"));
    }

    #[test]
    fn zero_search_results_is_floored() {
        let cfg = Config::parse("search_results = 0", Path::new("c.toml")).unwrap();
        assert_eq!(cfg.search_k(), 1);
    }
}

//! Load configuration from XDG `config.toml` and a project `.env`, then apply it to the
//! process environment with priority: **existing env > .env > XDG**.
//!
//! [`Settings::from_env`] reads the typed values the recipes need once loading is done.

mod env_file;
mod xdg;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// App name used for `$XDG_CONFIG_HOME/recipes/config.toml`.
pub const APP_NAME: &str = "recipes";

pub const DEFAULT_GITHUB_BRANCH: &str = "main";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(#[from] dotenv::Error),
}

/// Loads the XDG `[env]` table and the optional project `.env`, then sets only the
/// variables that are **not** already in the process environment.
///
/// * `app_name`: XDG directory name, normally [`APP_NAME`].
/// * `override_dir`: look for `.env` here instead of the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir)?;

    let mut keys: HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var_os(key).is_some() {
            continue;
        }
        if let Some(v) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, v);
        }
    }
    Ok(())
}

/// Path of the XDG config file for `app_name`, whether or not it exists.
pub fn config_file_path(app_name: &str) -> Result<PathBuf, LoadError> {
    xdg::config_path(app_name)
}

/// Typed view of the environment after [`load_and_apply`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// `OLLAMA_HOST`; the Ollama client falls back to localhost when unset.
    pub ollama_host: Option<String>,
    pub serper_api_key: Option<String>,
    pub github_token: Option<String>,
    /// `owner/name` of the repository the GitHub tools act on.
    pub github_repository: Option<String>,
    pub github_branch: String,
    pub database_url: Option<String>,
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            ollama_host: non_empty("OLLAMA_HOST"),
            serper_api_key: non_empty("SERPER_API_KEY"),
            github_token: non_empty("GITHUB_TOKEN"),
            github_repository: non_empty("GITHUB_REPOSITORY"),
            github_branch: non_empty("GITHUB_BRANCH")
                .unwrap_or_else(|| DEFAULT_GITHUB_BRANCH.to_string()),
            database_url: non_empty("DATABASE_URL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests below share XDG_CONFIG_HOME and the settings keys.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn restore_var(key: &str, prev: Option<String>) {
        match prev {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    fn xdg_with(app: &str, toml_body: &str) -> tempfile::TempDir {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join(app);
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), toml_body).unwrap();
        xdg_dir
    }

    #[test]
    fn existing_env_wins() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(dotenv_dir.path().join(".env"), "CONFIG_TEST_EXISTING=from_dotenv\n").unwrap();
        env::set_var("CONFIG_TEST_EXISTING", "from_env");
        load_and_apply("config-crate-nonexistent-app-xyz", Some(dotenv_dir.path())).unwrap();
        let val = env::var("CONFIG_TEST_EXISTING");
        env::remove_var("CONFIG_TEST_EXISTING");
        assert_eq!(val.as_deref(), Ok("from_env"));
    }

    #[test]
    fn no_config_is_ok() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let empty = tempfile::tempdir().unwrap();
        assert!(load_and_apply("config-crate-nonexistent-app-xyz", Some(empty.path())).is_ok());
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg_dir = xdg_with(APP_NAME, "[env]\nCONFIG_TEST_PRIORITY = \"from_xdg\"\n");
        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(dotenv_dir.path().join(".env"), "CONFIG_TEST_PRIORITY=from_dotenv\n").unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("CONFIG_TEST_PRIORITY");

        let result = load_and_apply(APP_NAME, Some(dotenv_dir.path()));
        let val = env::var("CONFIG_TEST_PRIORITY");
        env::remove_var("CONFIG_TEST_PRIORITY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        result.unwrap();
        assert_eq!(val.as_deref(), Ok("from_dotenv"));
    }

    #[test]
    fn xdg_applied_when_no_dotenv() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg_dir = xdg_with(APP_NAME, "[env]\nCONFIG_TEST_XDG_ONLY = \"from_xdg\"\n");
        let empty_dir = tempfile::tempdir().unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("CONFIG_TEST_XDG_ONLY");

        let result = load_and_apply(APP_NAME, Some(empty_dir.path()));
        let val = env::var("CONFIG_TEST_XDG_ONLY");
        env::remove_var("CONFIG_TEST_XDG_ONLY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        result.unwrap();
        assert_eq!(val.as_deref(), Ok("from_xdg"));
    }

    #[test]
    fn invalid_xdg_toml_fails_with_parse_error() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let xdg_dir = xdg_with(APP_NAME, "invalid [[[\n");
        let empty_dir = tempfile::tempdir().unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        let result = load_and_apply(APP_NAME, Some(empty_dir.path()));
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn config_file_path_uses_xdg_config_home() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-home");
        let path = config_file_path(APP_NAME);
        restore_var("XDG_CONFIG_HOME", prev_xdg);
        assert_eq!(path.unwrap(), PathBuf::from("/tmp/xdg-home/recipes/config.toml"));
    }

    #[test]
    fn settings_read_from_env_with_branch_default() {
        let _g = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let keys = [
            "OLLAMA_HOST",
            "SERPER_API_KEY",
            "GITHUB_TOKEN",
            "GITHUB_REPOSITORY",
            "GITHUB_BRANCH",
            "DATABASE_URL",
        ];
        let prev: Vec<_> = keys.iter().map(|k| env::var(k).ok()).collect();
        for k in keys {
            env::remove_var(k);
        }
        env::set_var("SERPER_API_KEY", "key-1");
        env::set_var("GITHUB_REPOSITORY", "owner/repo");
        env::set_var("DATABASE_URL", "  ");

        let settings = Settings::from_env();
        for (k, v) in keys.iter().zip(prev) {
            restore_var(k, v);
        }

        assert_eq!(settings.serper_api_key.as_deref(), Some("key-1"));
        assert_eq!(settings.github_repository.as_deref(), Some("owner/repo"));
        assert_eq!(settings.github_branch, DEFAULT_GITHUB_BRANCH);
        assert_eq!(settings.ollama_host, None);
        assert_eq!(settings.github_token, None);
        assert_eq!(settings.database_url, None, "blank values count as unset");
    }
}

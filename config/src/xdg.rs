//! Load the `[env]` table from `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LoadError;

/// `$XDG_CONFIG_HOME` when set, else the platform config dir from `dirs`.
fn config_home() -> Result<PathBuf, LoadError> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => dirs::config_dir()
            .ok_or_else(|| LoadError::XdgPath("no config directory for this platform".into())),
    }
}

pub(crate) fn config_path(app_name: &str) -> Result<PathBuf, LoadError> {
    Ok(config_home()?.join(app_name).join("config.toml"))
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Missing file or missing `[env]` section returns an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_path(app_name)?;
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_table_parses() {
        let config: ConfigFile =
            toml::from_str("[env]\nOLLAMA_HOST = \"http://gpu:11434\"\n").unwrap();
        assert_eq!(
            config.env.get("OLLAMA_HOST").map(String::as_str),
            Some("http://gpu:11434")
        );
    }

    #[test]
    fn other_sections_are_ignored() {
        let config: ConfigFile = toml::from_str("[other]\nkey = \"ignored\"\n").unwrap();
        assert!(config.env.is_empty());
    }

    #[test]
    fn non_string_env_value_is_rejected() {
        assert!(toml::from_str::<ConfigFile>("[env]\nPORT = 8080\n").is_err());
    }
}

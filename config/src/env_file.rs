//! Read a project `.env` into a key-value map without touching the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` in `override_dir` if given, else in the current directory.
fn env_file_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Missing file returns an empty map. Parsing follows `dotenv`: `#` comments,
/// optional `export`, single or double quotes.
pub fn load_env_map(
    override_dir: Option<&Path>,
) -> Result<HashMap<String, String>, dotenv::Error> {
    let Some(path) = env_file_path(override_dir) else {
        return Ok(HashMap::new());
    };
    dotenv::from_path_iter(&path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_env(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), content).unwrap();
        dir
    }

    #[test]
    fn missing_file_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn reads_pairs_and_skips_comments() {
        let dir = write_env("# keys\nSERPER_API_KEY=abc\n\nGITHUB_REPOSITORY=owner/repo\n");
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("SERPER_API_KEY").map(String::as_str), Some("abc"));
        assert_eq!(m.get("GITHUB_REPOSITORY").map(String::as_str), Some("owner/repo"));
    }

    #[test]
    fn quoted_values_are_unquoted() {
        let dir = write_env("A=\"hello world\"\nB='single'\n");
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(m.get("A").map(String::as_str), Some("hello world"));
        assert_eq!(m.get("B").map(String::as_str), Some("single"));
    }

    #[test]
    fn malformed_line_is_an_error() {
        let dir = write_env("NOT A PAIR\n");
        assert!(load_env_map(Some(dir.path())).is_err());
    }
}

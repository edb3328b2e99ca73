//! On-disk layout under `~/.bank-link`.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

const BASE_DIR_NAME: &str = ".bank-link";
const CONFIG_FILE_NAME: &str = "config.json";
const LOGS_DIR_NAME: &str = "logs";
const LOG_FILE_NAME: &str = "dev.jsonl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Layout rooted in the user's home directory.
    pub fn new() -> CoreResult<Self> {
        dirs::home_dir()
            .map(|home| Self::with_base_dir(home.join(BASE_DIR_NAME)))
            .ok_or(CoreError::NoHomeDir)
    }

    pub fn with_base_dir(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR_NAME)
    }

    /// Central JSONL log shared by every bank-link process.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Create the base and logs directories if missing.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        let logs = self.logs_dir();
        std::fs::create_dir_all(&logs).map_err(|e| CoreError::io(logs, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_custom_root() {
        let paths = Paths::with_base_dir(PathBuf::from("/srv/link"));

        assert_eq!(paths.base_dir(), Path::new("/srv/link"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/link/config.json"));
        assert_eq!(paths.log_file(), PathBuf::from("/srv/link/logs/dev.jsonl"));
    }

    #[test]
    fn test_home_layout_matches_log_default() {
        let paths = Paths::new().unwrap();
        assert_eq!(paths.log_file(), observability::default_log_path());
    }

    #[test]
    fn test_ensure_dirs_creates_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("a").join("b"));

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
    }

    #[test]
    fn test_ensure_dirs_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let err = Paths::with_base_dir(blocker.clone()).ensure_dirs().unwrap_err();
        assert!(matches!(err, CoreError::Io { ref path, .. } if path.starts_with(&blocker)));
    }
}

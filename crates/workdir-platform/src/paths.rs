use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "node-workdir";
const LEGACY_CONFIG_FILE: &str = ".node-workdir.json";

/// Overrides the whole config directory; mostly useful for tests and portable setups.
pub const CONFIG_DIR_ENV: &str = "NODE_WORKDIR_CONFIG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub home_dir: PathBuf,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform.
    ///
    /// # Errors
    /// Returns an error when the home, config or data directory cannot be
    /// determined.
    pub fn new() -> Result<Self, AppPathsError> {
        let home_dir = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;

        let config_dir = resolve_config_dir(
            std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from),
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            platform_config_dir(&home_dir),
        )
        .ok_or(AppPathsError::ConfigDirUnavailable)?;

        let data_dir = if std::env::var_os(CONFIG_DIR_ENV).is_some() {
            config_dir.clone()
        } else {
            dirs::data_dir()
                .ok_or(AppPathsError::DataDirUnavailable)?
                .join(APP_DIR)
        };

        Ok(Self {
            home_dir,
            config_dir,
            data_dir,
        })
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    #[must_use]
    pub fn legacy_config_file(&self) -> PathBuf {
        self.home_dir.join(LEGACY_CONFIG_FILE)
    }

    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.config_dir.join("backups")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("node-workdir.log")
    }

    /// Ensure the config and data directories exist on disk.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn platform_config_dir(home: &Path) -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let _ = home;
        dirs::config_dir()
    }

    #[cfg(not(target_os = "windows"))]
    {
        // XDG layout on every unix, including macOS, so the file is easy to find.
        Some(home.join(".config"))
    }
}

fn resolve_config_dir(
    override_dir: Option<PathBuf>,
    xdg_config_home: Option<PathBuf>,
    platform_default: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(dir) = override_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        return Some(dir);
    }

    xdg_config_home
        .filter(|dir| dir.is_absolute())
        .or(platform_default)
        .map(|base| base.join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{AppPaths, resolve_config_dir};

    fn test_paths(root: &Path) -> AppPaths {
        AppPaths {
            home_dir: root.join("home"),
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    #[test]
    fn file_paths_use_expected_filenames() {
        let root = PathBuf::from("/tmp/nwd");
        let paths = test_paths(&root);

        assert_eq!(paths.config_file(), root.join("config").join("config.json"));
        assert_eq!(
            paths.legacy_config_file(),
            root.join("home").join(".node-workdir.json")
        );
        assert_eq!(paths.backup_dir(), root.join("config").join("backups"));
        assert!(paths.log_file().ends_with("node-workdir.log"));
    }

    #[test]
    fn override_wins_over_xdg() {
        let resolved = resolve_config_dir(
            Some(PathBuf::from("/custom")),
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/me/.config")),
        );

        assert_eq!(resolved, Some(PathBuf::from("/custom")));
    }

    #[test]
    fn xdg_config_home_is_used_when_absolute() {
        let resolved = resolve_config_dir(
            None,
            Some(PathBuf::from("/xdg")),
            Some(PathBuf::from("/home/me/.config")),
        );

        assert_eq!(resolved, Some(PathBuf::from("/xdg/node-workdir")));
    }

    #[test]
    fn relative_xdg_config_home_is_ignored() {
        let resolved = resolve_config_dir(
            None,
            Some(PathBuf::from("relative")),
            Some(PathBuf::from("/home/me/.config")),
        );

        assert_eq!(
            resolved,
            Some(PathBuf::from("/home/me/.config/node-workdir"))
        );
    }

    #[test]
    fn ensure_dirs_creates_all_directories() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let paths = test_paths(temp_dir.path());

        paths
            .ensure_dirs()
            .expect("ensure_dirs should create application directories");

        assert!(paths.config_dir.is_dir());
        assert!(paths.data_dir.is_dir());
    }
}

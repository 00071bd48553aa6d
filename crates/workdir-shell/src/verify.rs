use std::fmt;
use std::path::{Path, PathBuf};
use workdir_backend::ShellType;

use crate::config::ShellConfig;
use crate::detect::get_config_path_for_shell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    Installed,
    /// A hook is present but differs from what would be generated now.
    Stale,
    /// Only a hook from an older release is present.
    Legacy,
    NotInstalled,
    ConfigFileNotFound,
    Error(String),
}

impl HookStatus {
    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed | Self::Stale)
    }

    #[must_use]
    pub fn needs_regenerate(&self) -> bool {
        matches!(self, Self::Stale | Self::Legacy)
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => f.write_str("installed"),
            Self::Stale => f.write_str("installed, out of date"),
            Self::Legacy => f.write_str("legacy hook found"),
            Self::NotInstalled => f.write_str("not installed"),
            Self::ConfigFileNotFound => f.write_str("no startup file"),
            Self::Error(details) => write!(f, "error: {details}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HookReport {
    pub shell_type: ShellType,
    pub config_path: Option<PathBuf>,
    pub status: HookStatus,
}

/// Inspect the shell's startup file. With `expected_body`, an installed hook
/// whose body differs is reported as [`HookStatus::Stale`].
#[must_use]
pub fn verify_hook(shell_type: ShellType, expected_body: Option<&str>) -> HookReport {
    match get_config_path_for_shell(shell_type) {
        Some(path) => verify_hook_at(shell_type, &path, expected_body),
        None => HookReport {
            shell_type,
            config_path: None,
            status: HookStatus::ConfigFileNotFound,
        },
    }
}

#[must_use]
pub fn verify_hook_at(shell_type: ShellType, path: &Path, expected_body: Option<&str>) -> HookReport {
    let status = if path.exists() {
        match ShellConfig::load(shell_type, path.to_path_buf()) {
            Ok(config) => status_of(&config, expected_body),
            Err(e) => HookStatus::Error(e.to_string()),
        }
    } else {
        HookStatus::ConfigFileNotFound
    };

    HookReport {
        shell_type,
        config_path: Some(path.to_path_buf()),
        status,
    }
}

fn status_of(config: &ShellConfig, expected_body: Option<&str>) -> HookStatus {
    if let Some(body) = config.hook_body() {
        let stale = expected_body
            .is_some_and(|expected| expected.trim_end_matches(['\n', '\r']) != body);
        if stale {
            HookStatus::Stale
        } else {
            HookStatus::Installed
        }
    } else if config.has_legacy_hook() {
        HookStatus::Legacy
    } else {
        HookStatus::NotInstalled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LEGACY_HOOK_END, LEGACY_HOOK_START, hook_block};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let report = verify_hook_at(ShellType::Bash, &dir.path().join(".bashrc"), None);
        assert_eq!(report.status, HookStatus::ConfigFileNotFound);
    }

    #[test]
    fn test_installed_and_stale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".zshrc");
        fs::write(&path, format!("export A=1\n{}", hook_block("body v1"))).unwrap();

        let report = verify_hook_at(ShellType::Zsh, &path, Some("body v1\n"));
        assert_eq!(report.status, HookStatus::Installed);

        let report = verify_hook_at(ShellType::Zsh, &path, Some("body v2"));
        assert_eq!(report.status, HookStatus::Stale);
        assert!(report.status.is_installed());
        assert!(report.status.needs_regenerate());

        let report = verify_hook_at(ShellType::Zsh, &path, None);
        assert_eq!(report.status, HookStatus::Installed);
    }

    #[test]
    fn test_legacy_and_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.fish");

        fs::write(&path, "set -x EDITOR vim\n").unwrap();
        assert_eq!(
            verify_hook_at(ShellType::Fish, &path, None).status,
            HookStatus::NotInstalled
        );

        fs::write(&path, format!("{LEGACY_HOOK_START}\nold\n{LEGACY_HOOK_END}\n")).unwrap();
        assert_eq!(
            verify_hook_at(ShellType::Fish, &path, None).status,
            HookStatus::Legacy
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(HookStatus::Stale.to_string(), "installed, out of date");
        assert_eq!(
            HookStatus::Error("denied".to_string()).to_string(),
            "error: denied"
        );
    }
}

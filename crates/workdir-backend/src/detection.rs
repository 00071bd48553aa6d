use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use workdir_platform::{CommandProbe, ProbeError};

use crate::manager::{NVM_SCRIPT_LOCATIONS, Verb, VersionManager, supported_managers};
use crate::types::ShellDialect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerDetection {
    pub manager: VersionManager,
    pub found: bool,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

impl ManagerDetection {
    fn missing(manager: VersionManager) -> Self {
        Self {
            manager,
            found: false,
            path: None,
            version: None,
        }
    }
}

/// Probe every manager in `managers`, one after the other.
pub async fn detect_managers(
    probe: &dyn CommandProbe,
    managers: &[VersionManager],
    timeout: Duration,
) -> Vec<ManagerDetection> {
    let mut detections = Vec::with_capacity(managers.len());
    for &manager in managers {
        detections.push(detect_manager(probe, manager, timeout).await);
    }
    detections
}

pub async fn detect_manager(
    probe: &dyn CommandProbe,
    manager: VersionManager,
    timeout: Duration,
) -> ManagerDetection {
    match manager {
        VersionManager::Nvm if !cfg!(windows) => detect_unix_nvm(probe, timeout).await,
        VersionManager::Nvm | VersionManager::N if cfg!(windows) => {
            ManagerDetection::missing(manager)
        }
        VersionManager::NvmWindows if !cfg!(windows) => ManagerDetection::missing(manager),
        _ => detect_binary(probe, manager, timeout).await,
    }
}

/// First supported manager that was found, in the dialect's preference order.
#[must_use]
pub fn recommend_manager(
    detections: &[ManagerDetection],
    dialect: ShellDialect,
) -> Option<VersionManager> {
    supported_managers(dialect).iter().copied().find(|manager| {
        detections
            .iter()
            .any(|detection| detection.manager == *manager && detection.found)
    })
}

async fn detect_binary(
    probe: &dyn CommandProbe,
    manager: VersionManager,
    timeout: Duration,
) -> ManagerDetection {
    let verbs = manager.verbs();
    let path = which::which(verbs.program).ok();

    match probe
        .run(verbs.program, verbs.args(Verb::Check), timeout)
        .await
    {
        Ok(output) if output.success => {
            let version = output.first_line().map(clean_version);
            debug!("{manager} found, version {version:?}");
            ManagerDetection {
                manager,
                found: true,
                path,
                version,
            }
        }
        Ok(_) => ManagerDetection::missing(manager),
        Err(error @ ProbeError::Timeout { .. }) => {
            warn!("Treating {manager} as unavailable: {error}");
            ManagerDetection::missing(manager)
        }
        Err(error) => {
            debug!("{manager} not available: {error}");
            ManagerDetection::missing(manager)
        }
    }
}

async fn detect_unix_nvm(probe: &dyn CommandProbe, timeout: Duration) -> ManagerDetection {
    let nvm_dir = std::env::var_os("NVM_DIR").map(PathBuf::from);
    let home = dirs::home_dir();

    for script in nvm_script_candidates(nvm_dir.as_deref(), home.as_deref()) {
        if !script.is_file() {
            continue;
        }

        let script_arg = script.to_string_lossy();
        let check = r#". "$1" >/dev/null 2>&1 && nvm --version"#;
        if let Some(output) = probe
            .run_ok("bash", &["-c", check, "bash", &script_arg], timeout)
            .await
        {
            return ManagerDetection {
                manager: VersionManager::Nvm,
                found: true,
                version: output.first_line().map(clean_version),
                path: Some(script),
            };
        }
    }

    // nvm.fish ships as an autoloaded fish function instead of nvm.sh
    if let Some(home) = home {
        let function = home
            .join(".config")
            .join("fish")
            .join("functions")
            .join("nvm.fish");
        if function.is_file()
            && let Some(output) = probe
                .run_ok("fish", &["-c", "nvm --version"], timeout)
                .await
        {
            return ManagerDetection {
                manager: VersionManager::Nvm,
                found: true,
                version: output.first_line().map(clean_version),
                path: Some(function),
            };
        }
    }

    ManagerDetection::missing(VersionManager::Nvm)
}

fn nvm_script_candidates(nvm_dir: Option<&Path>, home: Option<&Path>) -> Vec<PathBuf> {
    NVM_SCRIPT_LOCATIONS
        .iter()
        .filter_map(|location| {
            if let Some(rest) = location.strip_prefix("$NVM_DIR/") {
                nvm_dir.map(|dir| dir.join(rest))
            } else if let Some(rest) = location.strip_prefix("$HOME/") {
                home.map(|dir| dir.join(rest))
            } else {
                Some(PathBuf::from(location))
            }
        })
        .collect()
}

fn clean_version(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw
        .rsplit_once(' ')
        .map_or(raw, |(_, last)| last)
        .trim_start_matches('v');
    raw.to_string()
}

use log::debug;
use std::path::PathBuf;
use which::which;
use workdir_backend::ShellType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInfo {
    pub shell_type: ShellType,
    pub path: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub is_current: bool,
}

/// The user's interactive shell, read from the environment.
#[must_use]
pub fn detect_current_shell() -> Option<ShellType> {
    let shell = std::env::var("SHELL").ok();
    let in_powershell = std::env::var_os("PSModulePath").is_some();
    shell_from_env(shell.as_deref(), in_powershell, cfg!(target_os = "windows"))
}

/// `$SHELL` wins on unix. Windows has no `$SHELL` outside of MSYS, so a
/// PowerShell session is recognised by `PSModulePath` and anything else is
/// taken to be `cmd`.
fn shell_from_env(shell: Option<&str>, in_powershell: bool, windows: bool) -> Option<ShellType> {
    if let Some(shell) = shell.filter(|s| !s.is_empty())
        && let Some(shell_type) = ShellType::from_name(shell)
    {
        return Some(shell_type);
    }

    if windows {
        return Some(if in_powershell {
            ShellType::PowerShell
        } else {
            ShellType::Cmd
        });
    }

    None
}

/// Executable names for each shell, in lookup order.
fn binaries(shell_type: ShellType) -> &'static [&'static str] {
    match shell_type {
        ShellType::Bash => &["bash"],
        ShellType::Zsh => &["zsh"],
        ShellType::Fish => &["fish"],
        ShellType::PowerShell => &["pwsh", "powershell"],
        ShellType::Cmd => &["cmd"],
    }
}

#[must_use]
pub fn find_shell_binary(shell_type: ShellType) -> Option<PathBuf> {
    binaries(shell_type).iter().find_map(|name| which(name).ok())
}

/// Every shell that is installed or already has a startup file.
#[must_use]
pub fn detect_shells() -> Vec<ShellInfo> {
    let current = detect_current_shell();

    ShellType::ALL
        .into_iter()
        .filter_map(|shell_type| {
            let path = find_shell_binary(shell_type);
            let config_file = get_config_path_for_shell(shell_type);
            let is_current = current == Some(shell_type);

            if path.is_none() && config_file.is_none() && !is_current {
                return None;
            }

            debug!(
                "Found shell {} (binary: {:?}, config: {:?})",
                shell_type.name(),
                path,
                config_file
            );
            Some(ShellInfo {
                shell_type,
                path,
                config_file,
                is_current,
            })
        })
        .collect()
}

#[must_use]
pub fn get_config_path_for_shell(shell_type: ShellType) -> Option<PathBuf> {
    shell_type.config_files().into_iter().find(|p| p.exists())
}

/// The startup file to edit: the first existing candidate, otherwise the
/// preferred one.
#[must_use]
pub fn get_or_create_config_path(shell_type: ShellType) -> Option<PathBuf> {
    if let Some(existing) = get_config_path_for_shell(shell_type) {
        return Some(existing);
    }

    shell_type.config_files().into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_from_env_unix() {
        assert_eq!(
            shell_from_env(Some("/usr/bin/zsh"), false, false),
            Some(ShellType::Zsh)
        );
        assert_eq!(
            shell_from_env(Some("/opt/homebrew/bin/fish"), true, false),
            Some(ShellType::Fish)
        );
        assert_eq!(shell_from_env(Some("/bin/tcsh"), false, false), None);
        assert_eq!(shell_from_env(None, false, false), None);
    }

    #[test]
    fn test_shell_from_env_windows() {
        assert_eq!(
            shell_from_env(None, true, true),
            Some(ShellType::PowerShell)
        );
        assert_eq!(shell_from_env(Some(""), false, true), Some(ShellType::Cmd));
        assert_eq!(
            shell_from_env(Some("C:\\Program Files\\Git\\usr\\bin\\bash.exe"), true, true),
            Some(ShellType::Bash)
        );
    }

    #[test]
    fn test_powershell_prefers_pwsh() {
        assert_eq!(binaries(ShellType::PowerShell)[0], "pwsh");
    }

    #[test]
    fn test_cmd_has_no_config_path() {
        assert_eq!(get_or_create_config_path(ShellType::Cmd), None);
    }
}

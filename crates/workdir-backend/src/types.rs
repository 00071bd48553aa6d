use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The three shell languages hooks are generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellDialect {
    Posix,
    Fish,
    PowerShell,
}

impl ShellDialect {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Fish => "fish",
            Self::PowerShell => "powershell",
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Cmd,
}

impl ShellType {
    pub const ALL: [Self; 5] = [Self::Bash, Self::Zsh, Self::Fish, Self::PowerShell, Self::Cmd];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
            Self::PowerShell => "powershell",
            Self::Cmd => "cmd",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bash => "Bash",
            Self::Zsh => "Zsh",
            Self::Fish => "Fish",
            Self::PowerShell => "PowerShell",
            Self::Cmd => "Command Prompt",
        }
    }

    /// Parse a shell name or binary basename (`pwsh.exe`, `zsh`, `/bin/bash`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let base = base
            .strip_suffix(".exe")
            .or_else(|| base.strip_suffix(".EXE"))
            .unwrap_or(base);
        let base = base.strip_prefix('-').unwrap_or(base);

        match base.to_ascii_lowercase().as_str() {
            "bash" | "sh" => Some(Self::Bash),
            "zsh" => Some(Self::Zsh),
            "fish" => Some(Self::Fish),
            "powershell" | "pwsh" => Some(Self::PowerShell),
            "cmd" => Some(Self::Cmd),
            _ => None,
        }
    }

    /// `None` for shells hooks cannot be generated for.
    #[must_use]
    pub const fn dialect(self) -> Option<ShellDialect> {
        match self {
            Self::Bash | Self::Zsh => Some(ShellDialect::Posix),
            Self::Fish => Some(ShellDialect::Fish),
            Self::PowerShell => Some(ShellDialect::PowerShell),
            Self::Cmd => None,
        }
    }

    /// Startup files in order of preference. The first existing one is edited,
    /// otherwise the first entry is created.
    #[must_use]
    pub fn config_files(self) -> Vec<PathBuf> {
        let Some(home) = dirs::home_dir() else {
            return Vec::new();
        };

        match self {
            Self::Bash => {
                let mut files = vec![home.join(".bashrc")];
                if cfg!(target_os = "macos") {
                    files.push(home.join(".bash_profile"));
                }
                files
            }
            Self::Zsh => {
                let zdotdir = std::env::var_os("ZDOTDIR")
                    .map(PathBuf::from)
                    .filter(|dir| dir.is_absolute())
                    .unwrap_or_else(|| home.clone());
                vec![zdotdir.join(".zshrc")]
            }
            Self::Fish => {
                let config_home = std::env::var_os("XDG_CONFIG_HOME")
                    .map(PathBuf::from)
                    .filter(|dir| dir.is_absolute())
                    .unwrap_or_else(|| home.join(".config"));
                vec![config_home.join("fish").join("config.fish")]
            }
            Self::PowerShell => powershell_profiles(&home),
            Self::Cmd => Vec::new(),
        }
    }
}

fn powershell_profiles(home: &std::path::Path) -> Vec<PathBuf> {
    const PROFILE: &str = "Microsoft.PowerShell_profile.ps1";

    if cfg!(target_os = "windows") {
        let documents = dirs::document_dir().unwrap_or_else(|| home.join("Documents"));
        vec![
            documents.join("PowerShell").join(PROFILE),
            documents.join("WindowsPowerShell").join(PROFILE),
        ]
    } else {
        vec![home.join(".config").join("powershell").join(PROFILE)]
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ShellDialect, ShellType};

    #[test]
    fn from_name_accepts_paths_and_executables() {
        assert_eq!(ShellType::from_name("/bin/zsh"), Some(ShellType::Zsh));
        assert_eq!(ShellType::from_name("/usr/local/bin/fish"), Some(ShellType::Fish));
        assert_eq!(ShellType::from_name("pwsh.exe"), Some(ShellType::PowerShell));
        assert_eq!(
            ShellType::from_name("C:\\Windows\\System32\\cmd.exe"),
            Some(ShellType::Cmd)
        );
        assert_eq!(ShellType::from_name("-bash"), Some(ShellType::Bash));
        assert_eq!(ShellType::from_name("tcsh"), None);
    }

    #[test]
    fn dialects_group_bash_and_zsh() {
        assert_eq!(ShellType::Bash.dialect(), Some(ShellDialect::Posix));
        assert_eq!(ShellType::Zsh.dialect(), Some(ShellDialect::Posix));
        assert_eq!(ShellType::Fish.dialect(), Some(ShellDialect::Fish));
        assert_eq!(
            ShellType::PowerShell.dialect(),
            Some(ShellDialect::PowerShell)
        );
        assert_eq!(ShellType::Cmd.dialect(), None);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ShellType::PowerShell).expect("serialize shell");
        assert_eq!(json, "\"powershell\"");

        let parsed: ShellType = serde_json::from_str("\"zsh\"").expect("deserialize shell");
        assert_eq!(parsed, ShellType::Zsh);
    }

    #[test]
    fn cmd_has_no_config_files() {
        assert!(ShellType::Cmd.config_files().is_empty());
    }

    #[test]
    fn fish_config_lives_under_fish_dir() {
        let files = ShellType::Fish.config_files();
        if let Some(first) = files.first() {
            assert!(first.ends_with("fish/config.fish"));
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BackendError;
use crate::types::{ShellDialect, ShellType};

/// Where `nvm.sh` is usually installed, written as POSIX shell words.
/// `$NVM_DIR` entries are skipped when the variable is unset.
pub const NVM_SCRIPT_LOCATIONS: &[&str] = &[
    "$NVM_DIR/nvm.sh",
    "$HOME/.nvm/nvm.sh",
    "/opt/homebrew/opt/nvm/nvm.sh",
    "/usr/local/opt/nvm/nvm.sh",
    "/usr/share/nvm/nvm.sh",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Use,
    Install,
    List,
    Check,
}

/// How to drive one version manager from a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verbs {
    pub program: &'static str,
    pub use_args: &'static [&'static str],
    pub install_args: &'static [&'static str],
    pub list_args: &'static [&'static str],
    pub check_args: &'static [&'static str],
}

impl Verbs {
    #[must_use]
    pub const fn args(&self, verb: Verb) -> &'static [&'static str] {
        match verb {
            Verb::Use => self.use_args,
            Verb::Install => self.install_args,
            Verb::List => self.list_args,
            Verb::Check => self.check_args,
        }
    }

    /// Program followed by the verb's arguments, space separated.
    #[must_use]
    pub fn command_prefix(&self, verb: Verb) -> String {
        std::iter::once(self.program)
            .chain(self.args(verb).iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionManager {
    #[serde(rename = "nvm")]
    Nvm,
    #[serde(rename = "n")]
    N,
    #[serde(rename = "fnm")]
    Fnm,
    #[serde(rename = "nvm-windows")]
    NvmWindows,
    #[serde(rename = "nvs")]
    Nvs,
}

impl VersionManager {
    pub const ALL: [Self; 5] = [Self::Nvm, Self::N, Self::Fnm, Self::NvmWindows, Self::Nvs];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nvm => "nvm",
            Self::N => "n",
            Self::Fnm => "fnm",
            Self::NvmWindows => "nvm-windows",
            Self::Nvs => "nvs",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Nvm => "nvm (Node Version Manager)",
            Self::N => "n (Interactively Manage Node.js Versions)",
            Self::Fnm => "fnm (Fast Node Manager)",
            Self::NvmWindows => "nvm-windows",
            Self::Nvs => "nvs (Node Version Switcher)",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nvm" => Some(Self::Nvm),
            "n" => Some(Self::N),
            "fnm" => Some(Self::Fnm),
            "nvm-windows" | "nvm_windows" | "nvmwindows" => Some(Self::NvmWindows),
            "nvs" => Some(Self::Nvs),
            _ => None,
        }
    }

    #[must_use]
    pub const fn verbs(self) -> Verbs {
        match self {
            Self::Nvm => Verbs {
                program: "nvm",
                use_args: &["use"],
                install_args: &["install"],
                list_args: &["ls"],
                check_args: &["--version"],
            },
            Self::N => Verbs {
                program: "n",
                use_args: &[],
                install_args: &["install"],
                list_args: &["ls"],
                check_args: &["--version"],
            },
            Self::Fnm => Verbs {
                program: "fnm",
                use_args: &["use"],
                install_args: &["install"],
                list_args: &["list"],
                check_args: &["--version"],
            },
            Self::NvmWindows => Verbs {
                program: "nvm",
                use_args: &["use"],
                install_args: &["install"],
                list_args: &["list"],
                check_args: &["version"],
            },
            Self::Nvs => Verbs {
                program: "nvs",
                use_args: &["use"],
                install_args: &["add"],
                list_args: &["list"],
                check_args: &["--version"],
            },
        }
    }

    /// nvm on unix is a shell function that has to be sourced first.
    #[must_use]
    pub const fn needs_loader(self, dialect: ShellDialect) -> bool {
        matches!((self, dialect), (Self::Nvm, ShellDialect::Posix))
    }

    #[must_use]
    pub fn supports(self, dialect: ShellDialect) -> bool {
        supported_managers(dialect).contains(&self)
    }
}

impl fmt::Display for VersionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[must_use]
pub const fn supported_managers(dialect: ShellDialect) -> &'static [VersionManager] {
    match dialect {
        ShellDialect::Posix | ShellDialect::Fish => {
            &[VersionManager::Nvm, VersionManager::N, VersionManager::Fnm]
        }
        ShellDialect::PowerShell => &[
            VersionManager::NvmWindows,
            VersionManager::Fnm,
            VersionManager::Nvs,
        ],
    }
}

/// Check that hooks can be generated for this pairing.
///
/// # Errors
/// Returns [`BackendError::UnsupportedShell`] for shells without a hook dialect
/// and [`BackendError::UnsupportedCombination`] when the manager does not run in
/// that dialect.
pub fn ensure_supported(
    shell: ShellType,
    manager: VersionManager,
) -> Result<ShellDialect, BackendError> {
    let dialect = shell.dialect().ok_or(BackendError::UnsupportedShell {
        shell: shell.as_str(),
    })?;

    if manager.supports(dialect) {
        Ok(dialect)
    } else {
        Err(BackendError::UnsupportedCombination {
            shell: shell.as_str(),
            manager: manager.as_str(),
            supported: supported_managers(dialect)
                .iter()
                .map(|m| m.as_str())
                .collect(),
        })
    }
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Unknown shell: {name}")]
    UnknownShell { name: String },

    #[error("Unknown version manager: {name}")]
    UnknownManager { name: String },

    #[error("Hooks cannot be generated for {shell}")]
    UnsupportedShell { shell: &'static str },

    #[error("{manager} is not supported in {shell}")]
    UnsupportedCombination {
        shell: &'static str,
        manager: &'static str,
        supported: Vec<&'static str>,
    },
}

impl BackendError {
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownShell { .. } => {
                vec!["Use one of: bash, zsh, fish, powershell".to_string()]
            }
            Self::UnknownManager { .. } => {
                vec!["Use one of: nvm, n, fnm, nvm-windows, nvs".to_string()]
            }
            Self::UnsupportedShell { .. } => vec![
                "Use bash, zsh, fish or PowerShell as your interactive shell".to_string(),
            ],
            Self::UnsupportedCombination {
                shell, supported, ..
            } => vec![format!(
                "Pick a manager that works with {shell}: {}",
                supported.join(", ")
            )],
        }
    }
}

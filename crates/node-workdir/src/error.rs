use std::fmt::Write as _;
use std::process::ExitCode;
use workdir_backend::{BackendError, ShellType};
use workdir_core::{InputError, StoreError};
use workdir_platform::AppPathsError;
use workdir_shell::{ConfigError, HookError};

#[derive(Debug)]
pub enum AppError {
    Input(InputError),
    Backend(BackendError),
    Hook(HookError),
    ShellConfig(ConfigError),
    Store(StoreError),
    Paths(AppPathsError),
    NotRegistered { dir: String },
    NoStartupFile { shell: ShellType },
    ShellNotDetected,
    NoManagerFound { shell: ShellType },
}

impl AppError {
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Input(error) => error.suggestions().to_vec(),
            Self::Backend(error) => error.suggestions(),
            Self::Hook(error) => error.suggestions(),
            Self::ShellConfig(error) => error.suggestions(),
            Self::Store(_) => vec![
                "Check the permissions of the config directory".to_string(),
                "Set NODE_WORKDIR_CONFIG_DIR to use another location".to_string(),
            ],
            Self::Paths(_) => {
                vec!["Set HOME, or NODE_WORKDIR_CONFIG_DIR, and try again".to_string()]
            }
            Self::NotRegistered { .. } => {
                vec!["Run `node-workdir list` to see registered projects".to_string()]
            }
            Self::NoStartupFile { .. } => {
                vec!["Make sure your home directory is set".to_string()]
            }
            Self::ShellNotDetected => {
                vec!["Pass the shell explicitly, e.g. `--shell zsh`".to_string()]
            }
            Self::NoManagerFound { .. } => vec![
                "Install nvm, n, fnm, nvm-windows or nvs first".to_string(),
                "Or pass one explicitly with `--manager <name>`".to_string(),
            ],
        }
    }

    /// Input mistakes exit with 2, everything else with 1.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        let usage = matches!(
            self,
            Self::Input(_)
                | Self::Backend(
                    BackendError::UnknownShell { .. } | BackendError::UnknownManager { .. }
                )
        );
        if usage {
            ExitCode::from(2)
        } else {
            ExitCode::FAILURE
        }
    }

    /// `error:` line followed by one `hint:` line per suggestion.
    #[must_use]
    pub fn report(&self) -> String {
        let mut report = format!("error: {self}\n");
        for suggestion in self.suggestions() {
            let _ = writeln!(report, "hint: {suggestion}");
        }
        report
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(error) => write!(f, "{error}"),
            Self::Backend(error) => write!(f, "{error}"),
            Self::Hook(error) => write!(f, "{error}"),
            Self::ShellConfig(error) => write!(f, "{error}"),
            Self::Store(error) => write!(f, "{error}"),
            Self::Paths(error) => write!(f, "{error}"),
            Self::NotRegistered { dir } => write!(f, "No project is registered for {dir}"),
            Self::NoStartupFile { shell } => {
                write!(f, "No startup file location is known for {}", shell.name())
            }
            Self::ShellNotDetected => write!(f, "Could not detect your shell"),
            Self::NoManagerFound { shell } => write!(
                f,
                "No supported Node version manager was found for {}",
                shell.name()
            ),
        }
    }
}

impl std::error::Error for AppError {}

impl From<InputError> for AppError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<BackendError> for AppError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

impl From<HookError> for AppError {
    fn from(value: HookError) -> Self {
        match value {
            HookError::Unsupported(error) => Self::Backend(error),
            other => Self::Hook(other),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::ShellConfig(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<AppPathsError> for AppError {
    fn from(value: AppPathsError) -> Self {
        Self::Paths(value)
    }
}

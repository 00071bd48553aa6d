//! Hook generation.
//!
//! Every dialect renders the same state machine: capture the active Node
//! version, resolve the target from the embedded project table, switch only
//! when they differ (installing on demand, failing open), arm restoration, run
//! the real command and restore afterwards. The dialects only differ in the
//! template text and in how they spell a manager call, a loader and a wrapper.

mod fish;
mod posix;
mod powershell;

use log::{debug, warn};
use thiserror::Error;
use workdir_backend::{BackendError, ShellDialect, ShellType, Verb, VersionManager, ensure_supported};
use workdir_core::{Registry, WorkdirEntry};

use crate::escape::escape_for_embedding;
use crate::template::{self, TemplateError};

/// Package-manager entry points wrapped by default.
pub const WRAPPED_COMMANDS: &[&str] = &["npm", "npx", "yarn", "pnpm"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    #[error("No {0} is configured yet")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Unsupported(#[from] BackendError),

    #[error("Cannot wrap {0:?}: command names may only contain letters, digits, '-' and '_'")]
    InvalidCommand(String),

    #[error("Failed to render hook: {0}")]
    Template(#[from] TemplateError),
}

impl HookError {
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotConfigured(_) => vec![
                "Run `node-workdir setup --shell <shell> --manager <manager>` first".to_string(),
                "Use `node-workdir detect` to see what is installed".to_string(),
            ],
            Self::Unsupported(error) => error.suggestions(),
            Self::InvalidCommand(_) => {
                vec!["Wrap plain executable names such as npm or yarn".to_string()]
            }
            Self::Template(_) => vec!["Please report this as a bug".to_string()],
        }
    }
}

/// Everything a hook is rendered from.
#[derive(Debug, Clone, Copy)]
pub struct HookSpec<'a> {
    pub shell: ShellType,
    pub manager: VersionManager,
    pub entries: &'a [WorkdirEntry],
    pub commands: &'a [&'a str],
}

impl<'a> HookSpec<'a> {
    #[must_use]
    pub fn new(shell: ShellType, manager: VersionManager, entries: &'a [WorkdirEntry]) -> Self {
        Self {
            shell,
            manager,
            entries,
            commands: WRAPPED_COMMANDS,
        }
    }

    pub fn from_registry(registry: &'a Registry) -> Result<Self, HookError> {
        let shell = registry.shell.ok_or(HookError::NotConfigured("shell"))?;
        let manager = registry.manager.ok_or(HookError::NotConfigured("version manager"))?;
        Ok(Self::new(shell, manager, &registry.workdirs))
    }

    #[must_use]
    pub fn with_shell(self, shell: ShellType) -> Self {
        Self { shell, ..self }
    }
}

/// Per-dialect spelling of the pieces the shared templates are assembled from.
trait Dialect {
    fn kind(&self) -> ShellDialect;

    /// Template text with `{{PLACEHOLDER}}` slots.
    fn template(&self) -> &'static str;

    /// Shell expressions for the version being switched to and the version
    /// being restored, as seen at the point each manager call is made.
    fn target_version(&self) -> &'static str;
    fn previous_version(&self) -> &'static str;

    fn invoke_manager(&self, manager: VersionManager, verb: Verb, version: &str) -> String {
        format!("{} {version}", manager.verbs().command_prefix(verb))
    }

    /// Definition of the function that makes the manager callable and reports
    /// whether it is.
    fn loader(&self, manager: VersionManager) -> String;

    fn wrapper(&self, command: &str) -> String;
}

fn strategy(dialect: ShellDialect) -> &'static dyn Dialect {
    match dialect {
        ShellDialect::Posix => &posix::Posix,
        ShellDialect::Fish => &fish::Fish,
        ShellDialect::PowerShell => &powershell::PowerShell,
    }
}

/// Render the hook body (without block markers) for `spec`.
///
/// Unsupported shell and manager pairings are rejected before anything is
/// rendered.
pub fn render_hook(spec: &HookSpec<'_>) -> Result<String, HookError> {
    let dialect = strategy(ensure_supported(spec.shell, spec.manager)?);

    if let Some(bad) = spec.commands.iter().find(|command| !is_plain_command(command)) {
        return Err(HookError::InvalidCommand((*bad).to_string()));
    }

    let escape = |raw: &str| escape_for_embedding(raw, dialect.kind());
    let header = header(spec);
    let entries = escape(&snapshot_table(spec.entries));
    let manager = escape(spec.manager.as_str());
    let loader = dialect.loader(spec.manager);
    let use_target = dialect.invoke_manager(spec.manager, Verb::Use, dialect.target_version());
    let install_target =
        dialect.invoke_manager(spec.manager, Verb::Install, dialect.target_version());
    let use_previous =
        dialect.invoke_manager(spec.manager, Verb::Use, dialect.previous_version());
    let wrappers = spec
        .commands
        .iter()
        .map(|command| dialect.wrapper(command))
        .collect::<Vec<_>>()
        .join("\n\n");

    let body = template::render(
        dialect.template(),
        &[
            ("HEADER", &header),
            ("ENTRIES", &entries),
            ("MANAGER", &manager),
            ("LOADER", &loader),
            ("USE_TARGET", &use_target),
            ("INSTALL_TARGET", &install_target),
            ("USE_PREVIOUS", &use_previous),
            ("WRAPPERS", &wrappers),
        ],
    )?;

    debug!(
        "Rendered {} hook for {} with {} project(s)",
        spec.shell,
        spec.manager,
        spec.entries.len()
    );
    Ok(body)
}

/// The project table embedded in every hook: one `<version>\t<dir>` line per
/// entry. Entries that would break the line format are skipped.
#[must_use]
pub fn snapshot_table(entries: &[WorkdirEntry]) -> String {
    entries
        .iter()
        .filter(|entry| {
            let usable = !entry.dir.is_empty()
                && !entry.version.is_empty()
                && !entry.dir.contains(['\t', '\n', '\r'])
                && !entry.version.contains(['\t', '\n', '\r']);
            if !usable {
                warn!("Skipping unusable project entry {:?}", entry.dir);
            }
            usable
        })
        .map(|entry| format!("{}\t{}", entry.version, entry.dir))
        .collect::<Vec<_>>()
        .join("\n")
}

fn header(spec: &HookSpec<'_>) -> String {
    format!(
        "# node-workdir hook for {} using {}\n\
         # Wraps: {}\n\
         # Projects are embedded below. Run `node-workdir regenerate` after editing the config by hand.",
        spec.shell.name(),
        spec.manager.display_name(),
        spec.commands.join(", ")
    )
}

fn is_plain_command(command: &str) -> bool {
    !command.is_empty()
        && command
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

use log::debug;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use workdir_backend::ShellType;

pub const HOOK_START: &str = "# NODE_WORKDIR_HOOK_START";
pub const HOOK_END: &str = "# NODE_WORKDIR_HOOK_END";

/// Markers written by older releases. Recognised and replaced, never written.
pub const LEGACY_HOOK_START: &str = "# >>> node-workdir hook >>>";
pub const LEGACY_HOOK_END: &str = "# <<< node-workdir hook <<<";

static HOOK_BLOCK: LazyLock<Regex> = LazyLock::new(|| block_pattern(HOOK_START, HOOK_END));
static LEGACY_HOOK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| block_pattern(LEGACY_HOOK_START, LEGACY_HOOK_END));

// start marker through the end of the end marker's line, non-greedy
fn block_pattern(start: &str, end: &str) -> Regex {
    let pattern = format!(
        r"(?s){}.*?{}[^\n]*\n?",
        regex::escape(start),
        regex::escape(end)
    );
    Regex::new(&pattern).expect("hook marker pattern is valid")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} has a hook start marker without a matching end marker", .0.display())]
    UnterminatedBlock(PathBuf),

    #[error("{0} has no startup file to hook into")]
    UnsupportedShell(ShellType),
}

impl ConfigError {
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Read { .. } | Self::Write { .. } => {
                vec!["Check that the file exists and that you can write to it".to_string()]
            }
            Self::UnterminatedBlock(path) => vec![format!(
                "Delete the line `{HOOK_START}` and what follows it from {} by hand, then run the command again",
                path.display()
            )],
            Self::UnsupportedShell(_) => {
                vec!["Use bash, zsh, fish or PowerShell".to_string()]
            }
        }
    }
}

/// A shell startup file and its current content.
pub struct ShellConfig {
    pub shell_type: ShellType,
    pub config_path: PathBuf,
    pub content: String,
}

impl ShellConfig {
    /// A missing file loads as empty content.
    pub fn load(shell_type: ShellType, config_path: PathBuf) -> Result<Self, ConfigError> {
        let content = if config_path.exists() {
            fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                path: config_path.clone(),
                source,
            })?
        } else {
            String::new()
        };

        Ok(Self {
            shell_type,
            config_path,
            content,
        })
    }

    #[must_use]
    pub fn has_hook(&self) -> bool {
        HOOK_BLOCK.is_match(&self.content)
    }

    #[must_use]
    pub fn has_legacy_hook(&self) -> bool {
        LEGACY_HOOK_BLOCK.is_match(&self.content)
    }

    /// Text between the current markers, without the marker lines.
    #[must_use]
    pub fn hook_body(&self) -> Option<&str> {
        let block = HOOK_BLOCK.find(&self.content)?.as_str();
        let (_, after_start) = block.split_once('\n')?;
        let end = after_start.rfind(HOOK_END)?;
        Some(after_start[..end].trim_end_matches(['\n', '\r']))
    }

    /// Replace any existing hook block (current or legacy) with `body`,
    /// appended at the end of the file.
    pub fn inject_hook(&self, body: &str) -> Result<ShellConfigEdit, ConfigError> {
        let (stripped, removed) = self.strip_blocks()?;

        let mut modified = stripped.trim_end().to_string();
        if !modified.is_empty() {
            modified.push('\n');
        }
        modified.push_str(&hook_block(body));

        let mut changes = Vec::new();
        if modified != self.content {
            if removed.legacy > 0 {
                changes.push("Removed legacy node-workdir hook".to_string());
            }
            changes.push(if removed.current > 0 {
                "Updated node-workdir hook".to_string()
            } else {
                "Added node-workdir hook".to_string()
            });
        }

        Ok(self.edit(modified, changes))
    }

    /// Cut every hook block out. Everything else is left byte for byte.
    pub fn remove_hook(&self) -> Result<ShellConfigEdit, ConfigError> {
        let (modified, removed) = self.strip_blocks()?;

        let mut changes = Vec::new();
        if removed.current > 0 {
            changes.push("Removed node-workdir hook".to_string());
        }
        if removed.legacy > 0 {
            changes.push("Removed legacy node-workdir hook".to_string());
        }

        Ok(self.edit(modified, changes))
    }

    pub fn apply_edit(&mut self, edit: &ShellConfigEdit) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: self.config_path.clone(),
            source,
        };

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        fs::write(&self.config_path, &edit.modified).map_err(write_error)?;
        self.content.clone_from(&edit.modified);
        debug!(
            "Updated {} ({})",
            self.config_path.display(),
            edit.changes.join(", ")
        );

        Ok(())
    }

    fn strip_blocks(&self) -> Result<(String, Removed), ConfigError> {
        let current = HOOK_BLOCK.find_iter(&self.content).count();
        let without_current = HOOK_BLOCK.replace_all(&self.content, "");
        let legacy = LEGACY_HOOK_BLOCK.find_iter(&without_current).count();
        let stripped = LEGACY_HOOK_BLOCK.replace_all(&without_current, "").into_owned();

        if stripped.contains(HOOK_START) || stripped.contains(LEGACY_HOOK_START) {
            return Err(ConfigError::UnterminatedBlock(self.config_path.clone()));
        }

        Ok((stripped, Removed { current, legacy }))
    }

    fn edit(&self, modified: String, changes: Vec<String>) -> ShellConfigEdit {
        ShellConfigEdit {
            original: self.content.clone(),
            modified,
            changes,
        }
    }
}

struct Removed {
    current: usize,
    legacy: usize,
}

/// `body` wrapped in the current markers, ending in exactly one newline.
#[must_use]
pub fn hook_block(body: &str) -> String {
    format!(
        "{HOOK_START}\n{}\n{HOOK_END}\n",
        body.trim_end_matches(['\n', '\r'])
    )
}

/// Write the hook into `path`, creating the file and its parents if needed.
pub fn inject_hook_file(
    shell_type: ShellType,
    path: &Path,
    body: &str,
) -> Result<ShellConfigEdit, ConfigError> {
    let mut config = ShellConfig::load(shell_type, path.to_path_buf())?;
    let edit = config.inject_hook(body)?;
    if edit.has_changes() {
        config.apply_edit(&edit)?;
    }
    Ok(edit)
}

/// Strip the hook from `path`. A missing file or a file without a hook is
/// left untouched.
pub fn remove_hook_file(shell_type: ShellType, path: &Path) -> Result<ShellConfigEdit, ConfigError> {
    let mut config = ShellConfig::load(shell_type, path.to_path_buf())?;
    let edit = config.remove_hook()?;
    if edit.has_changes() {
        config.apply_edit(&edit)?;
    }
    Ok(edit)
}

pub struct ShellConfigEdit {
    pub original: String,
    pub modified: String,
    pub changes: Vec<String>,
}

impl ShellConfigEdit {
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    #[must_use]
    pub fn diff_preview(&self) -> String {
        if !self.has_changes() {
            return "No changes needed.".to_string();
        }

        let mut preview = String::new();

        for change in &self.changes {
            let _ = writeln!(preview, "+ {change}");
        }

        preview
    }
}

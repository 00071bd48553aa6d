#![allow(clippy::missing_errors_doc)]

mod config;
mod detect;
mod escape;
mod hooks;
mod template;
mod verify;

pub use config::{
    ConfigError, HOOK_END, HOOK_START, LEGACY_HOOK_END, LEGACY_HOOK_START, ShellConfig,
    ShellConfigEdit, hook_block, inject_hook_file, remove_hook_file,
};
pub use detect::{
    ShellInfo, detect_current_shell, detect_shells, find_shell_binary, get_config_path_for_shell,
    get_or_create_config_path,
};
pub use escape::escape_for_embedding;
pub use hooks::{HookError, HookSpec, WRAPPED_COMMANDS, render_hook, snapshot_table};
pub use template::TemplateError;
pub use verify::{HookReport, HookStatus, verify_hook, verify_hook_at};

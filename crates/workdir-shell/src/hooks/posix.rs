use workdir_backend::{NVM_SCRIPT_LOCATIONS, ShellDialect, VersionManager};

use super::Dialect;

/// bash and zsh.
///
/// Restoration is armed with a trap on INT and EXIT. The trap is global to the
/// shell, so `__node_workdir_restore` clears it again before switching back and
/// `__NODE_WORKDIR_RESTORE` keeps it from running twice.
pub(super) struct Posix;

const TEMPLATE: &str = r##"{{HEADER}}
__NODE_WORKDIR_ENTRIES={{ENTRIES}}
__NODE_WORKDIR_MANAGER={{MANAGER}}
__NODE_WORKDIR_RESTORE=''

__node_workdir_current() {
    command -v node >/dev/null 2>&1 || return 0
    local __nwd_raw
    __nwd_raw="$(command node --version 2>/dev/null)" || return 0
    printf '%s' "${__nwd_raw#v}"
}

__node_workdir_target() {
    local __nwd_dir="${1%/}/" __nwd_best='' __nwd_best_len=-1
    local __nwd_version __nwd_entry __nwd_base
    while IFS=$'\t' read -r __nwd_version __nwd_entry; do
        [ -n "$__nwd_version" ] || continue
        __nwd_base="${__nwd_entry%/}"
        case "$__nwd_dir" in
            "$__nwd_base"/*)
                if [ "${#__nwd_base}" -gt "$__nwd_best_len" ]; then
                    __nwd_best_len="${#__nwd_base}"
                    __nwd_best="$__nwd_version"
                fi
                ;;
        esac
    done <<__NODE_WORKDIR_TABLE__
$__NODE_WORKDIR_ENTRIES
__NODE_WORKDIR_TABLE__
    printf '%s' "$__nwd_best"
}

{{LOADER}}

__node_workdir_switch() {
    if ! __node_workdir_load; then
        printf 'node-workdir: %s is not available, keeping the current Node version\n' "$__NODE_WORKDIR_MANAGER" >&2
        return 1
    fi
    if {{USE_TARGET}} >/dev/null 2>&1; then
        return 0
    fi
    printf 'node-workdir: installing Node %s with %s\n' "$1" "$__NODE_WORKDIR_MANAGER" >&2
    if {{INSTALL_TARGET}} >&2 && {{USE_TARGET}} >/dev/null 2>&1; then
        return 0
    fi
    printf 'node-workdir: warning: could not switch to Node %s, keeping the current version\n' "$1" >&2
    return 1
}

__node_workdir_restore() {
    [ -n "$__NODE_WORKDIR_RESTORE" ] || return 0
    local __nwd_previous="$__NODE_WORKDIR_RESTORE"
    __NODE_WORKDIR_RESTORE=''
    trap - INT EXIT
    if {{USE_PREVIOUS}} >/dev/null 2>&1; then
        printf 'node-workdir: restored Node %s\n' "$__nwd_previous" >&2
    else
        printf 'node-workdir: warning: could not restore Node %s\n' "$__nwd_previous" >&2
    fi
}

__node_workdir_run() {
    local __nwd_cmd="$1"
    shift
    local __nwd_previous __nwd_target __nwd_status
    __nwd_previous="$(__node_workdir_current)"
    __nwd_target="$(__node_workdir_target "$PWD")"
    if [ -n "$__nwd_target" ] && [ "$__nwd_target" != "$__nwd_previous" ]; then
        if __node_workdir_switch "$__nwd_target"; then
            printf 'node-workdir: using Node %s for %s\n' "$__nwd_target" "$__nwd_cmd" >&2
            if [ -n "$__nwd_previous" ]; then
                __NODE_WORKDIR_RESTORE="$__nwd_previous"
                trap '__node_workdir_restore' INT EXIT
            fi
        fi
    fi
    command "$__nwd_cmd" "$@"
    __nwd_status=$?
    __node_workdir_restore
    return "$__nwd_status"
}

{{WRAPPERS}}"##;

impl Dialect for Posix {
    fn kind(&self) -> ShellDialect {
        ShellDialect::Posix
    }

    fn template(&self) -> &'static str {
        TEMPLATE
    }

    fn target_version(&self) -> &'static str {
        r#""$1""#
    }

    fn previous_version(&self) -> &'static str {
        r#""$__nwd_previous""#
    }

    fn loader(&self, manager: VersionManager) -> String {
        let program = manager.verbs().program;

        if !manager.needs_loader(ShellDialect::Posix) {
            return format!(
                "__node_workdir_load() {{\n    command -v {program} >/dev/null 2>&1\n}}"
            );
        }

        let locations = NVM_SCRIPT_LOCATIONS
            .iter()
            .map(|location| format!("\"{location}\""))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "__node_workdir_load() {{
    command -v {program} >/dev/null 2>&1 && return 0
    local __nwd_script
    for __nwd_script in {locations}; do
        if [ -s \"$__nwd_script\" ]; then
            . \"$__nwd_script\" --no-use >/dev/null 2>&1
            command -v {program} >/dev/null 2>&1 && return 0
        fi
    done
    return 1
}}"
        )
    }

    fn wrapper(&self, command: &str) -> String {
        format!("{command}() {{\n    __node_workdir_run {command} \"$@\"\n}}")
    }
}

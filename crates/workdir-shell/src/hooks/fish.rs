use workdir_backend::{ShellDialect, VersionManager};

use super::Dialect;

/// fish has no function-scoped exit trap. The interrupt path is covered by a
/// signal handler defined while a restoration is pending, and the normal path
/// by a guarded call after the command returns.
pub(super) struct Fish;

const TEMPLATE: &str = r##"{{HEADER}}
set -g __node_workdir_entries {{ENTRIES}}
set -g __node_workdir_manager {{MANAGER}}

function __node_workdir_current
    command -q node; or return 0
    set -l raw (command node --version 2>/dev/null); or return 0
    string replace -r '^v' '' -- $raw
end

function __node_workdir_target --argument-names cwd
    set -l dir (string trim -r -c / -- $cwd)
    set dir "$dir/"
    set -l best
    set -l best_len -1
    for line in (string split \n -- $__node_workdir_entries)
        set -l fields (string split -m 1 \t -- $line)
        test (count $fields) -eq 2; or continue
        set -l base (string trim -r -c / -- $fields[2])
        if string match -q -- "$base/*" $dir
            set -l len (string length -- "$base")
            if test $len -gt $best_len
                set best_len $len
                set best $fields[1]
            end
        end
    end
    printf '%s' $best
end

{{LOADER}}

function __node_workdir_switch --argument-names target
    if not __node_workdir_load
        printf 'node-workdir: %s is not available, keeping the current Node version\n' $__node_workdir_manager >&2
        return 1
    end
    if {{USE_TARGET}} >/dev/null 2>&1
        return 0
    end
    printf 'node-workdir: installing Node %s with %s\n' $target $__node_workdir_manager >&2
    if {{INSTALL_TARGET}} >&2; and {{USE_TARGET}} >/dev/null 2>&1
        return 0
    end
    printf 'node-workdir: warning: could not switch to Node %s, keeping the current version\n' $target >&2
    return 1
end

function __node_workdir_restore
    set -q __node_workdir_restore_to; or return 0
    set -l previous $__node_workdir_restore_to
    set -e __node_workdir_restore_to
    functions -e __node_workdir_on_signal
    if {{USE_PREVIOUS}} >/dev/null 2>&1
        printf 'node-workdir: restored Node %s\n' $previous >&2
    else
        printf 'node-workdir: warning: could not restore Node %s\n' $previous >&2
    end
end

function __node_workdir_run
    set -l cmd $argv[1]
    set -e argv[1]
    set -l previous (__node_workdir_current)
    set -l target (__node_workdir_target $PWD)
    if test -n "$target"; and test "$target" != "$previous"
        if __node_workdir_switch $target
            printf 'node-workdir: using Node %s for %s\n' $target $cmd >&2
            if test -n "$previous"
                set -g __node_workdir_restore_to $previous
                function __node_workdir_on_signal --on-signal INT --on-signal TERM
                    __node_workdir_restore
                end
            end
        end
    end
    command $cmd $argv
    set -l code $status
    if set -q __node_workdir_restore_to
        __node_workdir_restore
    end
    return $code
end

{{WRAPPERS}}"##;

impl Dialect for Fish {
    fn kind(&self) -> ShellDialect {
        ShellDialect::Fish
    }

    fn template(&self) -> &'static str {
        TEMPLATE
    }

    fn target_version(&self) -> &'static str {
        "$target"
    }

    fn previous_version(&self) -> &'static str {
        "$previous"
    }

    // nvm.fish and the binaries alike are found through `type`
    fn loader(&self, manager: VersionManager) -> String {
        format!(
            "function __node_workdir_load\n    type -q {}\nend",
            manager.verbs().program
        )
    }

    fn wrapper(&self, command: &str) -> String {
        format!(
            "function {command} --wraps {command} --description '{command} with the project Node version'\n    __node_workdir_run {command} $argv\nend"
        )
    }
}

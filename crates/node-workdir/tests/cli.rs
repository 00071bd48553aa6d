//! Drives the `node-workdir` binary with HOME and the config directory pointed
//! at a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::{TempDir, tempdir};

const HOOK_START: &str = "# NODE_WORKDIR_HOOK_START";

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            root: tempdir().unwrap(),
        }
    }

    fn home(&self) -> &Path {
        self.root.path()
    }

    fn config_dir(&self) -> PathBuf {
        self.home().join("cfg")
    }

    fn bashrc(&self) -> PathBuf {
        self.home().join(".bashrc")
    }

    fn project(&self, name: &str) -> String {
        let dir = self.home().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir.to_string_lossy().into_owned()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_node-workdir"))
            .args(args)
            .current_dir(self.home())
            .env("HOME", self.home())
            .env("NODE_WORKDIR_CONFIG_DIR", self.config_dir())
            .env("XDG_CONFIG_HOME", self.home().join(".config"))
            .env("SHELL", "/bin/bash")
            .env_remove("ZDOTDIR")
            .env_remove("PSModulePath")
            .env_remove("NODE_WORKDIR_DEBUG")
            .output()
            .unwrap()
    }

    fn config(&self) -> Value {
        let raw = fs::read_to_string(self.config_dir().join("config.json")).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

#[test]
fn add_before_setup_saves_and_hints() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    let output = sandbox.run(&["add", &project, "v18.17.1"]);

    assert_success(&output);
    assert!(stdout(&output).contains(&format!("Added {project} (Node 18.17.1)")));
    assert!(stderr(&output).contains("node-workdir setup"));
    let config = sandbox.config();
    assert_eq!(config["workdirs"][0]["dir"], project.as_str());
    assert_eq!(config["workdirs"][0]["version"], "18.17.1");
    assert!(!sandbox.bashrc().exists());
}

#[test]
fn setup_then_add_writes_the_hook() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    fs::write(sandbox.bashrc(), "export EDITOR=vim\n").unwrap();

    assert_success(&sandbox.run(&["setup", "--shell", "bash", "--manager", "fnm"]));
    assert_success(&sandbox.run(&["add", &project, "18.17.1"]));

    let bashrc = fs::read_to_string(sandbox.bashrc()).unwrap();
    assert!(bashrc.starts_with("export EDITOR=vim\n"));
    assert_eq!(bashrc.matches(HOOK_START).count(), 1);
    assert!(bashrc.contains(&format!("18.17.1\t{project}")));
    assert!(bashrc.contains("fnm use"));

    let config = sandbox.config();
    assert_eq!(config["shell"], "bash");
    assert_eq!(config["manager"], "fnm");
}

#[test]
fn repeated_add_reports_unchanged_then_updated() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");

    assert_success(&sandbox.run(&["add", &project, "18"]));

    let same = sandbox.run(&["add", &project, "18"]);
    assert_success(&same);
    assert!(stdout(&same).contains("already uses Node 18"));

    let changed = sandbox.run(&["add", &project, "20"]);
    assert_success(&changed);
    assert!(stdout(&changed).contains("Node 18 -> 20"));
    assert_eq!(sandbox.config()["workdirs"].as_array().unwrap().len(), 1);
}

#[test]
fn unsafe_input_exits_with_usage_code() {
    let sandbox = Sandbox::new();

    let traversal = sandbox.run(&["add", "../../etc/passwd", "18"]);
    assert_eq!(traversal.status.code(), Some(2));
    assert!(stderr(&traversal).contains("error:"));
    assert!(stderr(&traversal).contains("hint:"));

    let injection = sandbox.run(&["add", "/srv/app", "18.0.0; rm -rf /"]);
    assert_eq!(injection.status.code(), Some(2));
    assert!(!sandbox.config_dir().join("config.json").exists());
}

#[test]
fn unsupported_pair_changes_nothing() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["setup", "--shell", "bash", "--manager", "nvs"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nvs is not supported in bash"));
    assert!(!sandbox.config_dir().join("config.json").exists());
    assert!(!sandbox.bashrc().exists());
}

#[test]
fn unknown_manager_is_a_usage_error() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["setup", "--shell", "bash", "--manager", "volta"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Unknown version manager: volta"));
}

#[test]
fn regenerate_without_setup_fails() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["regenerate"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No shell is configured yet"));
    assert!(!sandbox.bashrc().exists());
}

#[test]
fn remove_then_clean_restores_startup_file() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    fs::write(sandbox.bashrc(), "alias ll='ls -l'\n").unwrap();

    assert_success(&sandbox.run(&["setup", "--shell", "bash", "--manager", "nvm"]));
    assert_success(&sandbox.run(&["add", &project, "16"]));

    let removed = sandbox.run(&["remove", &project]);
    assert_success(&removed);
    assert!(stdout(&removed).contains("was Node 16"));
    assert!(sandbox.config()["workdirs"].as_array().unwrap().is_empty());

    let missing = sandbox.run(&["remove", &project]);
    assert_eq!(missing.status.code(), Some(1));
    assert!(stderr(&missing).contains("No project is registered"));

    assert_success(&sandbox.run(&["clean"]));
    assert_eq!(
        fs::read_to_string(sandbox.bashrc()).unwrap(),
        "alias ll='ls -l'\n"
    );
}

#[test]
fn hook_prints_block_for_another_shell() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    assert_success(&sandbox.run(&["setup", "--shell", "bash", "--manager", "fnm", "--no-hook"]));
    assert_success(&sandbox.run(&["add", &project, "20"]));
    let bashrc_before = fs::read(sandbox.bashrc()).unwrap();
    let fish_config = sandbox.home().join(".config").join("fish").join("config.fish");

    let output = sandbox.run(&["hook", "--shell", "fish"]);

    assert_success(&output);
    let block = stdout(&output);
    assert!(block.starts_with(HOOK_START));
    assert!(block.contains("function npm --wraps npm"));
    assert_eq!(fs::read(sandbox.bashrc()).unwrap(), bashrc_before);
    assert!(!fish_config.exists());
}

#[test]
fn info_hints_when_hook_is_missing() {
    let sandbox = Sandbox::new();
    assert_success(&sandbox.run(&["setup", "--shell", "bash", "--manager", "fnm", "--no-hook"]));

    let output = sandbox.run(&["info"]);

    assert_success(&output);
    assert!(stdout(&output).contains("Hook:          no startup file"));
    assert!(stderr(&output).contains("node-workdir regenerate"));
}

#[test]
fn list_json_and_table() {
    let sandbox = Sandbox::new();
    let outer = sandbox.project("p");
    let inner = sandbox.project("p/inner");
    assert_success(&sandbox.run(&["add", &outer, "16"]));
    assert_success(&sandbox.run(&["add", &inner, "20"]));

    let json = sandbox.run(&["list", "--json"]);
    assert_success(&json);
    let entries: Value = serde_json::from_str(&stdout(&json)).unwrap();
    assert_eq!(entries[1]["dir"], inner.as_str());
    assert_eq!(entries[1]["version"], "20");

    let table = stdout(&sandbox.run(&["list"]));
    assert!(table.contains(&outer));
    assert!(table.contains(&inner));
}

#[test]
fn info_reports_stale_hook() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("app");
    assert_success(&sandbox.run(&["setup", "--shell", "bash", "--manager", "fnm"]));

    let fresh = sandbox.run(&["info"]);
    assert_success(&fresh);
    assert!(stdout(&fresh).contains("Hook:          installed"));

    let config_file = sandbox.config_dir().join("config.json");
    let mut config = sandbox.config();
    config["workdirs"] = serde_json::json!([{ "dir": project, "version": "22" }]);
    fs::write(&config_file, serde_json::to_string(&config).unwrap()).unwrap();

    let stale = sandbox.run(&["info"]);
    assert_success(&stale);
    assert!(stdout(&stale).contains("installed, out of date"));
    assert!(stderr(&stale).contains("node-workdir regenerate"));
}

use log::{debug, info, warn};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use workdir_backend::{
    BackendError, ShellType, VersionManager, detect_managers, ensure_supported, recommend_manager,
    supported_managers,
};
use workdir_core::{
    ConfigStore, Registry, StoreError, StorePaths, UpsertOutcome, WorkdirEntry, validate_path,
    validate_version,
};
use workdir_platform::{AppPaths, DEFAULT_PROBE_TIMEOUT, SystemProbe};
use workdir_shell::{
    HookSpec, ShellConfigEdit, detect_current_shell, detect_shells,
    get_or_create_config_path, hook_block, inject_hook_file, remove_hook_file, render_hook,
    verify_hook,
};

use crate::cli::Commands;
use crate::error::AppError;

pub async fn run(command: Commands) -> Result<(), AppError> {
    let paths = AppPaths::new()?;
    let mut app = App::new(paths);

    match command {
        Commands::Add { dir, version } => app.add(&dir, &version),
        Commands::Remove { dir } => app.remove(&dir),
        Commands::List { json } => app.list(json),
        Commands::Regenerate => app.regenerate(),
        Commands::Clean { all } => app.clean(all),
        Commands::Info => app.info(),
        Commands::Setup {
            shell,
            manager,
            no_hook,
        } => app.setup(shell.as_deref(), manager.as_deref(), no_hook).await,
        Commands::Detect => {
            detect().await;
            Ok(())
        }
        Commands::Hook { shell } => app.hook(shell.as_deref()),
    }
}

struct App {
    paths: AppPaths,
    store: ConfigStore,
}

/// Where a regenerated hook was written and what changed.
struct HookWrite {
    path: PathBuf,
    edit: ShellConfigEdit,
}

impl App {
    fn new(paths: AppPaths) -> Self {
        let store = ConfigStore::new(StorePaths::from(&paths));
        Self { paths, store }
    }

    fn add(&mut self, dir: &str, version: &str) -> Result<(), AppError> {
        let dir = validate_path(dir)?;
        let version = validate_version(version)?;

        let mut registry = self.store.load();
        let outcome = registry.upsert(&dir, &version);
        if outcome == UpsertOutcome::Unchanged {
            println!("{}", describe_upsert(&dir, &version, &outcome));
            return Ok(());
        }

        self.store.save(&mut registry)?;
        let written = regenerate_if_configured(&registry)?;

        println!("{}", describe_upsert(&dir, &version, &outcome));
        report_hook_write(written.as_ref());
        Ok(())
    }

    fn remove(&mut self, dir: &str) -> Result<(), AppError> {
        let dir = validate_path(dir)?;

        let mut registry = self.store.load();
        let Some(removed) = registry.remove(&dir) else {
            return Err(AppError::NotRegistered { dir });
        };

        self.store.save(&mut registry)?;
        let written = regenerate_if_configured(&registry)?;

        println!("Removed {} (was Node {})", removed.dir, removed.version);
        report_hook_write(written.as_ref());
        Ok(())
    }

    fn list(&mut self, json: bool) -> Result<(), AppError> {
        let registry = self.store.load();

        if json {
            let rendered = serde_json::to_string_pretty(&registry.workdirs)
                .map_err(StoreError::from)?;
            println!("{rendered}");
            return Ok(());
        }

        if registry.workdirs.is_empty() {
            println!("No directories registered. Add one with `node-workdir add <dir> <version>`.");
            return Ok(());
        }

        let cwd = current_dir_string();
        let current = cwd.as_deref().and_then(|cwd| registry.resolve(cwd));
        print!("{}", format_table(&registry.workdirs, current));
        Ok(())
    }

    fn regenerate(&mut self) -> Result<(), AppError> {
        let registry = self.store.load();
        let written = write_hook(&registry)?;
        report_hook_write(Some(&written));
        Ok(())
    }

    fn clean(&mut self, all: bool) -> Result<(), AppError> {
        let registry = self.store.load();
        let shells = clean_targets(all, registry.shell, detect_current_shell());
        if shells.is_empty() {
            return Err(AppError::ShellNotDetected);
        }

        let mut cleaned = 0;
        for shell in shells {
            for path in shell.config_files() {
                if !path.exists() {
                    continue;
                }
                let edit = remove_hook_file(shell, &path)?;
                if edit.has_changes() {
                    info!("Removed hook from {}", path.display());
                    println!("Removed hook from {}", path.display());
                    cleaned += 1;
                }
            }
        }

        if cleaned == 0 {
            println!("No hook found.");
        }
        Ok(())
    }

    fn info(&mut self) -> Result<(), AppError> {
        let registry = self.store.load();
        let store_paths = self.store.paths();

        println!("Config file:   {}", describe_file(&store_paths.config_file));
        println!("Legacy config: {}", describe_file(&store_paths.legacy_file));
        println!("Backups:       {}", store_paths.backup_dir.display());
        println!("Log file:      {}", self.paths.log_file().display());
        println!("Shell:         {}", describe_option(registry.shell.map(ShellType::name)));
        println!(
            "Manager:       {}",
            describe_option(registry.manager.map(VersionManager::display_name))
        );
        println!("Directories:   {}", registry.workdirs.len());
        println!(
            "Last updated:  {}",
            describe_option(
                registry
                    .last_updated
                    .map(|at| at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                    .as_deref()
            )
        );

        let mut needs_regenerate = false;
        match registry.shell {
            Some(shell) => {
                let expected = HookSpec::from_registry(&registry)
                    .and_then(|spec| render_hook(&spec))
                    .map_err(|e| debug!("Cannot render the expected hook: {e}"))
                    .ok();
                let report = verify_hook(shell, expected.as_deref());
                let location = report
                    .config_path
                    .as_deref()
                    .map(|path| format!(" ({})", path.display()))
                    .unwrap_or_default();
                println!("Hook:          {}{location}", report.status);
                needs_regenerate =
                    report.status.needs_regenerate() || !report.status.is_installed();
            }
            None => println!("Hook:          not configured"),
        }

        if let Some(cwd) = current_dir_string() {
            match registry.resolve(&cwd) {
                Some(entry) => println!("Current dir:   Node {} (from {})", entry.version, entry.dir),
                None => println!("Current dir:   not registered"),
            }
        }

        if needs_regenerate {
            eprintln!("hint: run `node-workdir regenerate` to update the hook");
        }
        Ok(())
    }

    async fn setup(
        &mut self,
        shell: Option<&str>,
        manager: Option<&str>,
        no_hook: bool,
    ) -> Result<(), AppError> {
        let shell = match shell {
            Some(name) => parse_shell(name)?,
            None => detect_current_shell().ok_or(AppError::ShellNotDetected)?,
        };
        let dialect = shell.dialect().ok_or(BackendError::UnsupportedShell {
            shell: shell.as_str(),
        })?;

        let manager = match manager {
            Some(name) => parse_manager(name)?,
            None => {
                let detections = detect_managers(
                    &SystemProbe,
                    supported_managers(dialect),
                    DEFAULT_PROBE_TIMEOUT,
                )
                .await;
                let manager = recommend_manager(&detections, dialect)
                    .ok_or(AppError::NoManagerFound { shell })?;
                println!("Detected {}", manager.display_name());
                manager
            }
        };
        ensure_supported(shell, manager)?;

        let mut registry = self.store.load();
        let previous_shell = registry.shell.filter(|previous| *previous != shell);
        registry.shell = Some(shell);
        registry.manager = Some(manager);
        self.store.save(&mut registry)?;

        println!("Using {} with {}", manager.display_name(), shell.name());

        if no_hook {
            return Ok(());
        }

        if let Some(previous) = previous_shell {
            remove_hooks_for(previous);
        }
        let written = write_hook(&registry)?;
        report_hook_write(Some(&written));
        Ok(())
    }

    fn hook(&mut self, shell: Option<&str>) -> Result<(), AppError> {
        let registry = self.store.load();
        let mut spec = HookSpec::from_registry(&registry)?;
        if let Some(name) = shell {
            spec = spec.with_shell(parse_shell(name)?);
        }
        let body = render_hook(&spec)?;
        print!("{}", hook_block(&body));
        Ok(())
    }
}

async fn detect() {
    let current = detect_current_shell();
    println!(
        "Current shell: {}",
        describe_option(current.map(ShellType::name))
    );

    println!("Shells:");
    for shell in detect_shells() {
        let location = shell
            .path
            .as_deref()
            .map_or_else(|| "not found".to_string(), |p| p.display().to_string());
        let marker = if shell.is_current { "*" } else { " " };
        println!("  {marker} {:<12} {location}", shell.shell_type.name());
        if let Some(config_file) = &shell.config_file {
            println!("      startup file: {}", config_file.display());
        }
    }

    let detections =
        detect_managers(&SystemProbe, &VersionManager::ALL, DEFAULT_PROBE_TIMEOUT).await;
    println!("Version managers:");
    for detection in &detections {
        let state = match (&detection.found, &detection.version) {
            (true, Some(version)) => format!("found ({version})"),
            (true, None) => "found".to_string(),
            (false, _) => "not found".to_string(),
        };
        println!("    {:<12} {state}", detection.manager.display_name());
    }

    if let Some(dialect) = current.and_then(ShellType::dialect)
        && let Some(manager) = recommend_manager(&detections, dialect)
    {
        println!("Recommended: {}", manager.display_name());
    }
}

/// Render and inject the hook for the configured shell and manager.
fn write_hook(registry: &Registry) -> Result<HookWrite, AppError> {
    let spec = HookSpec::from_registry(registry)?;
    let body = render_hook(&spec)?;
    let path = get_or_create_config_path(spec.shell)
        .ok_or(AppError::NoStartupFile { shell: spec.shell })?;
    let edit = inject_hook_file(spec.shell, &path, &body)?;
    debug!("Hook for {} written to {}", spec.shell, path.display());
    Ok(HookWrite { path, edit })
}

/// Registry edits made before `setup` keep working; the hook follows once a
/// shell and manager are chosen.
fn regenerate_if_configured(registry: &Registry) -> Result<Option<HookWrite>, AppError> {
    if registry.hook_target().is_none() {
        debug!("Skipping hook regeneration, no shell or manager configured");
        return Ok(None);
    }
    write_hook(registry).map(Some)
}

fn remove_hooks_for(shell: ShellType) {
    for path in shell.config_files() {
        if !path.exists() {
            continue;
        }
        match remove_hook_file(shell, &path) {
            Ok(edit) if edit.has_changes() => {
                println!("Removed old hook from {}", path.display());
            }
            Ok(_) => {}
            Err(e) => warn!("Could not remove old hook from {}: {e}", path.display()),
        }
    }
}

fn report_hook_write(written: Option<&HookWrite>) {
    match written {
        Some(HookWrite { path, edit }) if edit.has_changes() => {
            println!("Hook updated in {}", path.display());
            println!("Open a new terminal to pick it up.");
        }
        Some(HookWrite { path, .. }) => {
            println!("Hook in {} is up to date", path.display());
        }
        None => eprintln!("hint: run `node-workdir setup` to install the shell hook"),
    }
}

fn parse_shell(name: &str) -> Result<ShellType, BackendError> {
    ShellType::from_name(name).ok_or_else(|| BackendError::UnknownShell {
        name: name.to_string(),
    })
}

fn parse_manager(name: &str) -> Result<VersionManager, BackendError> {
    VersionManager::from_name(name).ok_or_else(|| BackendError::UnknownManager {
        name: name.to_string(),
    })
}

fn clean_targets(
    all: bool,
    configured: Option<ShellType>,
    detected: Option<ShellType>,
) -> Vec<ShellType> {
    if all {
        return ShellType::ALL.to_vec();
    }
    configured.or(detected).into_iter().collect()
}

fn describe_upsert(dir: &str, version: &str, outcome: &UpsertOutcome) -> String {
    match outcome {
        UpsertOutcome::Added => format!("Added {dir} (Node {version})"),
        UpsertOutcome::Updated { previous } => {
            format!("Updated {dir}: Node {previous} -> {version}")
        }
        UpsertOutcome::Unchanged => format!("{dir} already uses Node {version}"),
    }
}

fn format_table(entries: &[WorkdirEntry], current: Option<&WorkdirEntry>) -> String {
    let width = entries
        .iter()
        .map(|entry| entry.dir.chars().count())
        .max()
        .unwrap_or(0);

    let mut table = String::new();
    for entry in entries {
        let marker = if current == Some(entry) { "*" } else { " " };
        let _ = writeln!(table, "{marker} {:<width$}  {}", entry.dir, entry.version);
    }
    table
}

fn describe_file(path: &Path) -> String {
    let state = if path.exists() { "" } else { " (missing)" };
    format!("{}{state}", path.display())
}

fn describe_option(value: Option<&str>) -> &str {
    value.unwrap_or("not configured")
}

fn current_dir_string() -> Option<String> {
    std::env::current_dir()
        .ok()
        .map(|dir| dir.to_string_lossy().into_owned())
}

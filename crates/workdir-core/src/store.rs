use chrono::Utc;
use log::{debug, info, warn};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

use workdir_platform::{AppPaths, AppPathsError};

use crate::registry::Registry;

pub const MAX_BACKUPS: usize = 5;

const BACKUP_PREFIX: &str = "config-";
const LEGACY_BACKUP_NAME: &str = "legacy-config.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub config_file: PathBuf,
    pub legacy_file: PathBuf,
    pub backup_dir: PathBuf,
}

impl From<&AppPaths> for StorePaths {
    fn from(paths: &AppPaths) -> Self {
        Self {
            config_file: paths.config_file(),
            legacy_file: paths.legacy_config_file(),
            backup_dir: paths.backup_dir(),
        }
    }
}

#[derive(Debug)]
struct CachedRegistry {
    modified: SystemTime,
    registry: Registry,
}

/// Reads and writes the registry file. Assumes a single process at a time;
/// there is no file locking.
#[derive(Debug)]
pub struct ConfigStore {
    paths: StorePaths,
    cache: Option<CachedRegistry>,
}

impl ConfigStore {
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self { paths, cache: None }
    }

    /// Store at the platform's standard location.
    ///
    /// # Errors
    /// Returns an error when the home or config directory cannot be determined.
    pub fn open() -> Result<Self, AppPathsError> {
        let paths = AppPaths::new()?;
        Ok(Self::new(StorePaths::from(&paths)))
    }

    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Load the registry, reusing the cached copy while the file's mtime is
    /// unchanged. Missing or unreadable files yield an empty registry.
    pub fn load(&mut self) -> Registry {
        self.migrate_legacy();

        let config_file = &self.paths.config_file;
        let modified = match fs::metadata(config_file).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(error) => {
                if error.kind() == std::io::ErrorKind::NotFound {
                    debug!("No config at {}, using defaults", config_file.display());
                } else {
                    warn!("Cannot stat {}: {error}", config_file.display());
                }
                self.cache = None;
                return Registry::default();
            }
        };

        if let Some(cached) = &self.cache
            && cached.modified == modified
        {
            return cached.registry.clone();
        }

        let parsed = fs::read_to_string(config_file)
            .map_err(|error| error.to_string())
            .and_then(|content| {
                serde_json::from_str::<Registry>(&content).map_err(|error| error.to_string())
            });

        match parsed {
            Ok(registry) => {
                self.cache = Some(CachedRegistry {
                    modified,
                    registry: registry.clone(),
                });
                registry
            }
            Err(error) => {
                warn!(
                    "Ignoring unreadable config {}: {error}",
                    config_file.display()
                );
                self.cache = None;
                Registry::default()
            }
        }
    }

    /// Persist `registry`, stamping `last_updated`. The previous file is
    /// copied into the backup directory first.
    ///
    /// # Errors
    /// Returns an error if serialization or the write itself fails. Backup
    /// problems are only logged.
    pub fn save(&mut self, registry: &mut Registry) -> Result<(), StoreError> {
        let dropped = registry.sanitize();
        if dropped > 0 {
            warn!("Dropped {dropped} malformed or duplicate project entries");
        }
        registry.last_updated = Some(Utc::now());

        let content = serde_json::to_string_pretty(registry)?;
        let config_file = self.paths.config_file.clone();

        if let Err(error) = self.backup_current() {
            warn!("Could not back up {}: {error}", config_file.display());
        }

        write_atomic(&config_file, content.as_bytes()).map_err(|source| StoreError::Write {
            path: config_file.clone(),
            source,
        })?;

        if let Err(error) = rotate_backups(&self.paths.backup_dir, MAX_BACKUPS) {
            warn!(
                "Could not rotate backups in {}: {error}",
                self.paths.backup_dir.display()
            );
        }

        self.cache = fs::metadata(&config_file)
            .and_then(|meta| meta.modified())
            .ok()
            .map(|modified| CachedRegistry {
                modified,
                registry: registry.clone(),
            });

        debug!("Saved {} project(s) to {}", registry.workdirs.len(), config_file.display());
        Ok(())
    }

    fn backup_current(&self) -> std::io::Result<Option<PathBuf>> {
        if !self.paths.config_file.is_file() {
            return Ok(None);
        }

        fs::create_dir_all(&self.paths.backup_dir)?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.9fZ");
        let mut target = self
            .paths
            .backup_dir
            .join(format!("{BACKUP_PREFIX}{stamp}.json"));
        let mut attempt = 1_u32;
        while target.exists() {
            target = self
                .paths
                .backup_dir
                .join(format!("{BACKUP_PREFIX}{stamp}-{attempt}.json"));
            attempt += 1;
        }

        // rotation orders by mtime, so the backup must not inherit the source's
        let content = fs::read(&self.paths.config_file)?;
        fs::write(&target, content)?;
        restrict_permissions(&target)?;
        Ok(Some(target))
    }

    /// Copy a legacy dotfile into the canonical location once. Safe to call
    /// on every load.
    fn migrate_legacy(&self) {
        let StorePaths {
            config_file,
            legacy_file,
            backup_dir,
        } = &self.paths;

        if config_file.exists() || !legacy_file.is_file() {
            return;
        }

        match copy_legacy(config_file, legacy_file, backup_dir) {
            Ok(()) => info!(
                "Migrated legacy config {} to {}",
                legacy_file.display(),
                config_file.display()
            ),
            Err(error) => warn!(
                "Could not migrate legacy config {}: {error}",
                legacy_file.display()
            ),
        }
    }
}

fn copy_legacy(config_file: &Path, legacy_file: &Path, backup_dir: &Path) -> std::io::Result<()> {
    let content = fs::read(legacy_file)?;
    write_atomic(config_file, &content)?;

    fs::create_dir_all(backup_dir)?;
    let legacy_backup = backup_dir.join(LEGACY_BACKUP_NAME);
    if !legacy_backup.exists() {
        fs::copy(legacy_file, &legacy_backup)?;
        restrict_permissions(&legacy_backup)?;
    }
    Ok(())
}

/// Keep the `keep` newest `config-*.json` backups, newest by mtime with the
/// timestamped name as tie-breaker.
fn rotate_backups(backup_dir: &Path, keep: usize) -> std::io::Result<usize> {
    if !backup_dir.is_dir() {
        return Ok(0);
    }

    let mut backups: Vec<(SystemTime, PathBuf)> = fs::read_dir(backup_dir)?
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(BACKUP_PREFIX) && name.ends_with(".json")
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|meta| meta.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .collect();

    backups.sort_by(|a, b| b.cmp(a));

    let mut removed = 0;
    for (_, path) in backups.into_iter().skip(keep) {
        fs::remove_file(&path)?;
        removed += 1;
    }
    Ok(removed)
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "config path has no parent")
    })?;
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("config");
    let nonce = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let pid = std::process::id();

    let mut tmp_path = None;
    for attempt in 0..16_u8 {
        let candidate = parent.join(format!(".{file_name}.{pid}.{nonce}.{attempt}.tmp"));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                restrict_permissions(&candidate)?;
                file.write_all(data)?;
                file.sync_all()?;
                tmp_path = Some(candidate);
                break;
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    let Some(tmp_path) = tmp_path else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to create unique temp file",
        ));
    };

    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    Ok(())
}

fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{ConfigStore, StorePaths, rotate_backups};
    use crate::registry::Registry;

    fn store_in(root: &Path) -> ConfigStore {
        ConfigStore::new(StorePaths {
            config_file: root.join("config").join("config.json"),
            legacy_file: root.join(".node-workdir.json"),
            backup_dir: root.join("config").join("backups"),
        })
    }

    #[test]
    fn missing_file_loads_default() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut store = store_in(temp_dir.path());

        assert_eq!(store.load(), Registry::default());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut store = store_in(temp_dir.path());
        let config_file = store.paths().config_file.clone();
        std::fs::create_dir_all(config_file.parent().expect("parent")).expect("create dir");
        std::fs::write(&config_file, "{not json").expect("write corrupt config");

        assert_eq!(store.load(), Registry::default());
    }

    #[test]
    fn save_then_load_round_trips_and_stamps_time() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut store = store_in(temp_dir.path());
        let mut registry = Registry::default();
        registry.upsert("/proj", "18.17.1");

        store.save(&mut registry).expect("save registry");
        assert!(registry.last_updated.is_some());

        let mut fresh = store_in(temp_dir.path());
        let loaded = fresh.load();
        assert_eq!(loaded.workdirs, registry.workdirs);
        assert_eq!(loaded.last_updated, registry.last_updated);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut store = store_in(temp_dir.path());
        let mut registry = Registry::default();

        store.save(&mut registry).expect("first save");
        store.save(&mut registry).expect("second save");

        let config_dir = temp_dir.path().join("config");
        let leftovers = std::fs::read_dir(&config_dir)
            .expect("read config dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut store = store_in(temp_dir.path());
        store.save(&mut Registry::default()).expect("save");

        let mode = std::fs::metadata(&store.paths().config_file)
            .expect("stat config")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn external_edit_invalidates_cache() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut store = store_in(temp_dir.path());
        let mut registry = Registry::default();
        registry.upsert("/a", "16");
        store.save(&mut registry).expect("save");
        assert_eq!(store.load().workdirs.len(), 1);

        let config_file = store.paths().config_file.clone();
        let edited = r#"{"workdirs":[{"dir":"/a","version":"16"},{"dir":"/b","version":"20"}]}"#;
        std::fs::write(&config_file, edited).expect("edit config");
        let file = std::fs::File::options()
            .write(true)
            .open(&config_file)
            .expect("open config");
        file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(5))
            .expect("bump mtime");

        assert_eq!(store.load().workdirs.len(), 2);
    }

    #[test]
    fn rotate_ignores_missing_directory() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");

        let removed = rotate_backups(&temp_dir.path().join("nope"), 5).expect("rotate");

        assert_eq!(removed, 0);
    }
}

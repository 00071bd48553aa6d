use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use workdir_backend::{ShellType, VersionManager};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdirEntry {
    pub dir: String,
    pub version: String,
}

impl WorkdirEntry {
    #[must_use]
    pub fn new(dir: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            version: version.into(),
        }
    }

    /// True when `cwd` is this directory or lies below it.
    #[must_use]
    pub fn contains(&self, cwd: &str) -> bool {
        let base = trim_separators(&self.dir);
        let cwd = trim_separators(cwd);

        if base.is_empty() {
            // root entry
            return cwd.is_empty() || cwd.starts_with(is_separator);
        }

        match strip_prefix_path(cwd, base) {
            Some(rest) => rest.is_empty() || rest.starts_with(is_separator),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated { previous: String },
    Unchanged,
}

/// The persisted configuration: chosen shell and manager plus the ordered
/// directory to version table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default, deserialize_with = "deserialize_shell")]
    pub shell: Option<ShellType>,

    #[serde(default, deserialize_with = "deserialize_manager")]
    pub manager: Option<VersionManager>,

    #[serde(default, deserialize_with = "deserialize_workdirs")]
    pub workdirs: Vec<WorkdirEntry>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Registry {
    /// Insert or overwrite the entry for `dir`. Both values must already be
    /// validated.
    pub fn upsert(&mut self, dir: &str, version: &str) -> UpsertOutcome {
        match self.workdirs.iter_mut().find(|entry| same_dir(&entry.dir, dir)) {
            Some(entry) if entry.version == version => UpsertOutcome::Unchanged,
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.version, version.to_string());
                UpsertOutcome::Updated { previous }
            }
            None => {
                self.workdirs.push(WorkdirEntry::new(dir, version));
                UpsertOutcome::Added
            }
        }
    }

    pub fn remove(&mut self, dir: &str) -> Option<WorkdirEntry> {
        let index = self
            .workdirs
            .iter()
            .position(|entry| same_dir(&entry.dir, dir))?;
        Some(self.workdirs.remove(index))
    }

    /// Most specific entry governing `cwd`: the longest directory that equals
    /// `cwd` or is one of its ancestors.
    #[must_use]
    pub fn resolve(&self, cwd: &str) -> Option<&WorkdirEntry> {
        self.workdirs
            .iter()
            .filter(|entry| entry.contains(cwd))
            .max_by_key(|entry| trim_separators(&entry.dir).len())
    }

    /// Drop entries without a directory or version and later duplicates.
    pub fn sanitize(&mut self) -> usize {
        let before = self.workdirs.len();
        let mut kept: Vec<WorkdirEntry> = Vec::with_capacity(before);

        for entry in self.workdirs.drain(..) {
            let dir = entry.dir.trim();
            let version = entry.version.trim();
            if dir.is_empty() || version.is_empty() {
                continue;
            }
            if kept.iter().any(|existing| same_dir(&existing.dir, dir)) {
                continue;
            }
            kept.push(WorkdirEntry::new(dir, version));
        }

        self.workdirs = kept;
        before - self.workdirs.len()
    }

    #[must_use]
    pub fn hook_target(&self) -> Option<(ShellType, VersionManager)> {
        Some((self.shell?, self.manager?))
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}

fn trim_separators(path: &str) -> &str {
    path.trim_end_matches(is_separator)
}

fn strip_prefix_path<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if cfg!(windows) {
        let head = path.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix)
            .then(|| &path[prefix.len()..])
    } else {
        path.strip_prefix(prefix)
    }
}

fn same_dir(a: &str, b: &str) -> bool {
    let (a, b) = (trim_separators(a), trim_separators(b));
    if cfg!(windows) {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn deserialize_shell<'de, D>(deserializer: D) -> Result<Option<ShellType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(ShellType::from_name))
}

fn deserialize_manager<'de, D>(deserializer: D) -> Result<Option<VersionManager>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(VersionManager::from_name))
}

fn deserialize_workdirs<'de, D>(deserializer: D) -> Result<Vec<WorkdirEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Array(items) = raw else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let dir = item.get("dir")?.as_str()?;
            let version = item.get("version")?.as_str()?;
            Some(WorkdirEntry::new(dir, version))
        })
        .collect())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|time| time.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use workdir_backend::{ShellType, VersionManager};

    use super::{Registry, UpsertOutcome, WorkdirEntry};

    fn registry(entries: &[(&str, &str)]) -> Registry {
        Registry {
            workdirs: entries
                .iter()
                .map(|(dir, version)| WorkdirEntry::new(*dir, *version))
                .collect(),
            ..Registry::default()
        }
    }

    #[test]
    fn upsert_reports_added_updated_unchanged() {
        let mut registry = Registry::default();

        assert_eq!(registry.upsert("/proj", "18"), UpsertOutcome::Added);
        assert_eq!(registry.upsert("/proj", "18"), UpsertOutcome::Unchanged);
        assert_eq!(
            registry.upsert("/proj", "20"),
            UpsertOutcome::Updated {
                previous: "18".to_string()
            }
        );
        assert_eq!(registry.workdirs, vec![WorkdirEntry::new("/proj", "20")]);
    }

    #[test]
    fn upsert_keeps_position_on_update() {
        let mut registry = registry(&[("/a", "16"), ("/b", "18"), ("/c", "20")]);

        registry.upsert("/b", "22");

        let dirs: Vec<_> = registry.workdirs.iter().map(|e| e.dir.as_str()).collect();
        assert_eq!(dirs, ["/a", "/b", "/c"]);
        assert_eq!(registry.workdirs[1].version, "22");
    }

    #[test]
    fn remove_returns_the_entry() {
        let mut registry = registry(&[("/a", "16"), ("/b", "18")]);

        assert_eq!(registry.remove("/a"), Some(WorkdirEntry::new("/a", "16")));
        assert_eq!(registry.remove("/a"), None);
        assert_eq!(registry.workdirs.len(), 1);
    }

    #[test]
    fn resolve_picks_longest_prefix() {
        let registry = registry(&[("/p", "16"), ("/p/a/b", "20"), ("/p/a", "18")]);

        assert_eq!(
            registry.resolve("/p/a/b/extra").map(|e| e.version.as_str()),
            Some("20")
        );
        assert_eq!(registry.resolve("/p/x").map(|e| e.version.as_str()), Some("16"));
        assert_eq!(registry.resolve("/p").map(|e| e.version.as_str()), Some("16"));
        assert!(registry.resolve("/other").is_none());
    }

    #[test]
    fn resolve_respects_directory_boundaries() {
        let registry = registry(&[("/a/b", "18")]);

        assert!(registry.resolve("/a/b").is_some());
        assert!(registry.resolve("/a/b/c").is_some());
        assert!(registry.resolve("/a/bc").is_none());
        assert!(registry.resolve("/a").is_none());
    }

    #[test]
    fn root_entry_matches_everything() {
        let registry = registry(&[("/", "16"), ("/srv", "20")]);

        assert_eq!(registry.resolve("/tmp").map(|e| e.version.as_str()), Some("16"));
        assert_eq!(
            registry.resolve("/srv/app").map(|e| e.version.as_str()),
            Some("20")
        );
    }

    #[test]
    fn sanitize_drops_empty_and_duplicate_entries() {
        let mut registry = registry(&[("/a", "16"), ("", "18"), ("/b", " "), ("/a", "20")]);

        assert_eq!(registry.sanitize(), 3);
        assert_eq!(registry.workdirs, vec![WorkdirEntry::new("/a", "16")]);
    }

    #[test]
    fn deserialization_is_lenient() {
        let value = json!({
            "shell": "zsh",
            "manager": "volta",
            "workdirs": [
                { "dir": "/proj", "version": "18.17.1" },
                { "dir": 42, "version": "18" },
                { "version": "20" },
                "garbage"
            ],
            "lastUpdated": "not a date"
        });

        let registry: Registry = serde_json::from_value(value).expect("registry should parse");

        assert_eq!(registry.shell, Some(ShellType::Zsh));
        assert_eq!(registry.manager, None);
        assert_eq!(registry.workdirs, vec![WorkdirEntry::new("/proj", "18.17.1")]);
        assert_eq!(registry.last_updated, None);
    }

    #[test]
    fn serialization_uses_documented_keys() {
        let mut registry = registry(&[("/proj", "18")]);
        registry.shell = Some(ShellType::Fish);
        registry.manager = Some(VersionManager::NvmWindows);

        let value = serde_json::to_value(&registry).expect("serialize registry");

        assert_eq!(value["shell"], "fish");
        assert_eq!(value["manager"], "nvm-windows");
        assert_eq!(value["workdirs"][0]["dir"], "/proj");
        assert!(value.get("lastUpdated").is_some());
    }

    #[test]
    fn hook_target_needs_shell_and_manager() {
        let mut registry = Registry::default();
        assert_eq!(registry.hook_target(), None);

        registry.shell = Some(ShellType::Bash);
        assert_eq!(registry.hook_target(), None);

        registry.manager = Some(VersionManager::Fnm);
        assert_eq!(
            registry.hook_target(),
            Some((ShellType::Bash, VersionManager::Fnm))
        );
    }
}

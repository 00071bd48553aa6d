//! Single entry point for every directory and version string typed by a user.
//!
//! Everything stored in the registry, and therefore everything embedded in a
//! generated hook, has been through [`validate_path`] or [`validate_version`].

use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{ErrorCode, InputError};

const UNSAFE_CHARACTERS: &[char] = &[
    ';', '|', '&', '$', '(', ')', '{', '}', '[', ']', '\\', '`', '"', '\'', '<', '>', '*', '?',
];

static SEMVER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[vV]?[0-9]+(\.[0-9]+){0,2}$").expect("semver pattern is valid"));
static LTS_CODENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^lts/[a-z0-9_-]+$").expect("lts pattern is valid"));
static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^(latest|stable|node)$").expect("keyword pattern is valid"));

/// Inputs needed to turn a user path into an absolute one.
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    pub home: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

impl PathContext {
    #[must_use]
    pub fn current() -> Self {
        Self {
            home: dirs::home_dir(),
            cwd: std::env::current_dir().ok(),
        }
    }
}

/// Validate a project directory and resolve it to an absolute, normalized path.
///
/// # Errors
/// Returns a validation error for empty or unresolvable input and a security
/// error for shell metacharacters or `..` traversal.
pub fn validate_path(input: &str) -> Result<String, InputError> {
    validate_path_in(input, &PathContext::current())
}

/// Same as [`validate_path`] with an explicit home and working directory.
///
/// # Errors
/// See [`validate_path`].
pub fn validate_path_in(input: &str, context: &PathContext) -> Result<String, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::validation(
            ErrorCode::EmptyPath,
            "Path cannot be empty",
            &["Pass the project directory, for example `.` or `~/code/app`"],
        ));
    }

    if let Some(c) = find_unsafe_character(trimmed, cfg!(windows)) {
        return Err(InputError::security(
            ErrorCode::UnsafeCharacters,
            format!("Path contains an unsafe character: {}", describe(c)),
            &[
                "Paths cannot contain ; | & $ ( ) { } [ ] \\ ` \" ' < > * ? or control characters",
                "Rename the directory or use a standard path",
            ],
        ));
    }

    let expanded = expand_tilde(trimmed, context.home.as_deref())?;
    let normalized = normalize(&expanded);

    if normalized
        .components()
        .any(|component| component == Component::ParentDir)
    {
        return Err(InputError::security(
            ErrorCode::PathTraversal,
            format!("Path escapes its base directory: {trimmed}"),
            &["Use an absolute path or a path below the current directory"],
        ));
    }

    let absolute = if normalized.is_absolute() {
        normalized
    } else {
        let cwd = context.cwd.as_deref().ok_or_else(|| {
            InputError::validation(
                ErrorCode::InvalidPathFormat,
                "Cannot resolve a relative path without a working directory",
                &["Pass an absolute path"],
            )
        })?;
        normalize(&cwd.join(normalized))
    };

    if !absolute.is_absolute() {
        return Err(invalid_format(trimmed));
    }

    absolute
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_format(trimmed))
}

/// Validate and normalize a Node.js version specifier.
///
/// # Errors
/// Returns a security error for shell metacharacters and a validation error
/// for anything that is not a recognised version format.
pub fn validate_version(input: &str) -> Result<String, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::validation(
            ErrorCode::EmptyVersion,
            "Version cannot be empty",
            &["Pass a version such as 18, 20.11.1 or lts/iron"],
        ));
    }

    if trimmed.eq_ignore_ascii_case("lts/*") {
        return Ok("lts/*".to_string());
    }

    if let Some(c) = find_unsafe_character(trimmed, false) {
        return Err(InputError::security(
            ErrorCode::UnsafeCharacters,
            format!("Version contains an unsafe character: {}", describe(c)),
            &["Versions look like 18, 18.17 or 18.17.1, or lts/*, lts/<name>, latest, stable, node"],
        ));
    }

    if SEMVER.is_match(trimmed) {
        let bare = trimmed.trim_start_matches(['v', 'V']);
        return Ok(bare.to_string());
    }

    if LTS_CODENAME.is_match(trimmed) || KEYWORD.is_match(trimmed) {
        return Ok(trimmed.to_ascii_lowercase());
    }

    Err(InputError::validation(
        ErrorCode::InvalidVersionFormat,
        format!("Unrecognised version format: {trimmed}"),
        &[
            "Use a numeric version: 18, 18.17 or 18.17.1 (a leading v is allowed)",
            "Or an alias: lts/*, lts/<codename>, latest, stable, node",
        ],
    ))
}

fn find_unsafe_character(input: &str, allow_backslash: bool) -> Option<char> {
    input.chars().find(|&c| {
        c.is_control() || (UNSAFE_CHARACTERS.contains(&c) && !(allow_backslash && c == '\\'))
    })
}

fn describe(c: char) -> String {
    if c.is_control() {
        format!("control character U+{:04X}", u32::from(c))
    } else {
        format!("'{c}'")
    }
}

fn invalid_format(input: &str) -> InputError {
    InputError::validation(
        ErrorCode::InvalidPathFormat,
        format!("Could not resolve path: {input}"),
        &["Use an absolute path or one relative to the current directory"],
    )
}

fn expand_tilde(input: &str, home: Option<&Path>) -> Result<PathBuf, InputError> {
    let rest = if input == "~" {
        Some("")
    } else {
        input
            .strip_prefix("~/")
            .or_else(|| input.strip_prefix("~\\").filter(|_| cfg!(windows)))
    };

    match rest {
        Some(rest) => {
            let home = home.ok_or_else(|| {
                InputError::validation(
                    ErrorCode::InvalidPathFormat,
                    "Could not determine the home directory to expand ~",
                    &["Pass an absolute path instead"],
                )
            })?;
            Ok(if rest.is_empty() {
                home.to_path_buf()
            } else {
                home.join(rest)
            })
        }
        None if input.starts_with('~') => Err(InputError::validation(
            ErrorCode::InvalidPathFormat,
            format!("Only the current user's home can be abbreviated: {input}"),
            &["Write the full path instead of ~user"],
        )),
        None => Ok(PathBuf::from(input)),
    }
}

/// Lexical normalization: drops `.`, folds `name/..`, keeps leading `..` of
/// relative paths and never climbs above a root.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let mut normalized = PathBuf::new();
    for part in parts {
        normalized.push(part.as_os_str());
    }
    normalized
}

//! Shell-like expansion of path arguments
//!
//! `--path` values are matched against absolute paths stored in the
//! catalog, so they are expanded the way a shell would before the wildcard
//! translation: `~` first, then `$VAR` / `${VAR}`, then made absolute and
//! normalised lexically (no symlink resolution, the path need not exist).

use std::path::{Component, Path, PathBuf};

use crate::error::{CliError, Result};
use samadhi_store::credentials::expand_home;

/// Expand `raw` into an absolute, normalised path
///
/// A path that cannot be made absolute (an empty one) is a usage error.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let home_expanded = expand_home(Path::new(raw));
    let expanded = expand_vars(&home_expanded.to_string_lossy(), |name| std::env::var(name).ok());
    let absolute = std::path::absolute(expanded)
        .map_err(|e| CliError::usage(format!("Invalid path '{raw}': {e}")))?;
    Ok(normalize(&absolute))
}

/// Substitute `$NAME` and `${NAME}`; unknown variables are left untouched
pub fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), lookup(name)) {
            (false, Some(value)) => out.push_str(&value),
            _ => {
                out.push('$');
                out.push_str(&after[..consumed]);
            }
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

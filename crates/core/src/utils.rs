//! Path utilities.
//!
//! All filenames stored in the artifact model use forward slashes regardless
//! of the host OS, so exports stay byte-stable across platforms.

use crate::error::{CompileError, Result};
use path_slash::PathExt;
use std::path::{Component, Path, PathBuf};

/// Returns the path as a forward-slash string.
pub fn to_slash(path: &Path) -> String {
    path.to_slash_lossy().into_owned()
}

/// Resolves `.` and `..` components lexically, without touching the
/// filesystem.
pub fn normalized(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            _ => out.push(component.as_os_str()),
        }
    }
    out
}

/// Returns the absolute, lexically normalized form of `path`, anchored at the
/// process's current directory when relative.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalized(path));
    }
    let cwd = current_dir()?;
    Ok(normalized(&cwd.join(path)))
}

/// The process's current directory, with the path attached on failure.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|err| CompileError::io(err, "."))
}

/// Computes the path of `path` relative to `base`, possibly via `..`
/// components.
///
/// Both paths are expected to be absolute and normalized. Returns `None` when
/// no relative form exists (different drives on Windows).
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path_components: Vec<Component<'_>> = path.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();

    if let (Some(Component::Prefix(a)), Some(Component::Prefix(b))) =
        (path_components.first(), base_components.first())
    {
        if a != b {
            return None;
        }
    }

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_components.len() {
        out.push("..");
    }
    for component in &path_components[common..] {
        out.push(component.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    Some(out)
}

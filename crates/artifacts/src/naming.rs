//! Filename identity: canonical forms for every path spelling a compiler can
//! emit.
//!
//! Compilers and build frameworks report the same logical file under many
//! spellings (absolute, project-relative, import-remapped). [`convert_filename`]
//! resolves a reported path to a [`Filename`] holding all four canonical
//! forms, so later lookups succeed no matter which spelling a tool used.

use compile_artifacts_core::{
    error::{CompileError, Result},
    utils,
};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    path::{Component, Path, PathBuf},
};

/// Path metadata for one file of a compilation unit.
///
/// All four fields use forward-slash separators regardless of the host OS.
/// Equality, ordering and hashing are defined solely on `relative`: the same
/// logical file reached via different `used` spellings collapses to one
/// identity once the relative paths agree, even if the other fields differ.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Filename {
    /// OS-level absolute form.
    pub absolute: String,
    /// The path exactly as the tool reported it.
    pub used: String,
    /// Relative to the process's current directory. This is the identity key.
    pub relative: String,
    /// Tool-specific short projection (e.g. with a `contracts/` prefix
    /// stripped).
    pub short: String,
}

impl Filename {
    pub fn new(
        absolute: impl Into<String>,
        used: impl Into<String>,
        relative: impl Into<String>,
        short: impl Into<String>,
    ) -> Self {
        Self {
            absolute: absolute.into(),
            used: used.into(),
            relative: relative.into(),
            short: short.into(),
        }
    }
}

impl PartialEq for Filename {
    fn eq(&self, other: &Self) -> bool {
        self.relative == other.relative
    }
}

impl Eq for Filename {}

impl Hash for Filename {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relative.hash(state);
    }
}

impl PartialOrd for Filename {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Filename {
    fn cmp(&self, other: &Self) -> Ordering {
        self.relative.cmp(&other.relative)
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

/// Converts `/path:Contract` to `Contract`.
pub fn extract_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Converts `/path:Contract` to `/path`.
pub fn extract_filename(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Combines a filename with a contract name into the `path:Contract` form.
pub fn combine_filename_name(filename: &str, name: &str) -> String {
    format!("{filename}:{name}")
}

/// On Windows, re-anchors a root-absolute path (`/c/...`) with the drive
/// convention (`c:/...`). No-op elsewhere.
fn reanchor_drive(path: &Path) -> PathBuf {
    if !cfg!(windows) {
        return path.to_path_buf();
    }
    let mut components = path.components();
    if !matches!(components.next(), Some(Component::RootDir)) {
        return path.to_path_buf();
    }
    match components.next() {
        Some(Component::Normal(drive)) => {
            let mut out = PathBuf::from(format!("{}:/", drive.to_string_lossy()));
            for component in components {
                out.push(component.as_os_str());
            }
            out
        }
        _ => path.to_path_buf(),
    }
}

/// Checks that `filename` exists, trying the project-layout heuristics in
/// order: the path as given, `<cwd>/contracts/`, `<cwd>/`,
/// `<cwd>/node_modules/`, then `node_modules/` in every parent of `cwd` (the
/// node.js dependency resolution rule).
fn verify_filename_existence(filename: PathBuf, cwd: &Path) -> Result<PathBuf> {
    if filename.exists() {
        return Ok(filename);
    }

    let candidates = [cwd.join("contracts").join(&filename), cwd.join(&filename)];
    for candidate in candidates {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    for dir in cwd.ancestors() {
        let candidate = dir.join("node_modules").join(&filename);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(CompileError::UnknownFile(filename))
}

/// Converts a path string exactly as emitted by a compiler or build tool into
/// a [`Filename`].
///
/// `relative_to_short` is the tool-specific projection from the
/// workdir-relative path to the short form (e.g. stripping a `contracts/`
/// prefix). `working_dir` defaults to the process's current directory;
/// `package` is an optional package-root segment to strip from the reported
/// path.
///
/// Fails with [`CompileError::UnknownFile`] when the path cannot be located
/// on disk under any heuristic.
pub fn convert_filename<F>(
    used_filename: &str,
    relative_to_short: F,
    working_dir: Option<&Path>,
    package: Option<&str>,
) -> Result<Filename>
where
    F: FnOnce(&Path) -> PathBuf,
{
    let mut filename = reanchor_drive(Path::new(used_filename));

    let cwd = match working_dir {
        None => utils::current_dir()?,
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => utils::normalized(&utils::current_dir()?.join(dir)),
    };

    if let Some(package) = package {
        if let Ok(stripped) = filename.strip_prefix(package) {
            filename = stripped.to_path_buf();
        }
    }

    let filename = verify_filename_existence(filename, &cwd)?;

    let absolute = utils::absolutize(&filename)?;

    // No relative form exists across drives on Windows; fall back to the
    // resolved path itself.
    let relative = utils::relative_to(&absolute, &utils::current_dir()?)
        .unwrap_or_else(|| filename.clone());

    let short = if cwd.is_absolute() {
        absolute.strip_prefix(&cwd).map(Path::to_path_buf)
    } else {
        relative.strip_prefix(&cwd).map(Path::to_path_buf)
    }
    .unwrap_or_else(|_| relative.clone());
    let short = relative_to_short(&short);

    Ok(Filename {
        absolute: utils::to_slash(&absolute),
        relative: utils::to_slash(&relative),
        short: utils::to_slash(&short),
        used: utils::to_slash(Path::new(used_filename)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn filename(relative: &str, used: &str) -> Filename {
        Filename::new(format!("/tmp/{relative}"), used, relative, relative)
    }

    #[test]
    fn equality_is_defined_on_relative_only() {
        let a = Filename::new("/x/a.sol", "a.sol", "src/a.sol", "a.sol");
        let b = Filename::new("/y/a.sol", "./src/a.sol", "src/a.sol", "src/a.sol");
        let c = filename("src/b.sol", "b.sol");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn extracts_contract_and_filename() {
        assert_eq!(extract_name("/path/to/a.sol:Token"), "Token");
        assert_eq!(extract_filename("/path/to/a.sol:Token"), "/path/to/a.sol");
        assert_eq!(extract_filename("Token"), "Token");
        assert_eq!(combine_filename_name("a.sol", "Token"), "a.sol:Token");
    }

    #[test]
    fn resolves_through_contracts_dir() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = dir.path().join("contracts");
        fs::create_dir_all(&contracts).unwrap();
        fs::write(contracts.join("Token.sol"), "contract Token {}").unwrap();

        let file = convert_filename(
            "Token.sol",
            |short| short.to_path_buf(),
            Some(dir.path()),
            None,
        )
        .unwrap();
        assert!(file.absolute.ends_with("contracts/Token.sol"));
        assert_eq!(file.used, "Token.sol");
        assert_eq!(file.short, "contracts/Token.sol");
    }

    #[test]
    fn resolves_through_node_modules() {
        let dir = tempfile::tempdir().unwrap();
        let module = dir.path().join("node_modules").join("@openzeppelin");
        fs::create_dir_all(&module).unwrap();
        fs::write(module.join("Ownable.sol"), "contract Ownable {}").unwrap();
        let nested = dir.path().join("packages").join("app");
        fs::create_dir_all(&nested).unwrap();

        // Resolution walks up from the nested working dir to the root
        // node_modules.
        let file = convert_filename(
            "@openzeppelin/Ownable.sol",
            |short| short.to_path_buf(),
            Some(&nested),
            None,
        )
        .unwrap();
        assert!(file.absolute.ends_with("node_modules/@openzeppelin/Ownable.sol"));
    }

    #[test]
    fn strips_package_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = dir.path().join("contracts");
        fs::create_dir_all(&contracts).unwrap();
        fs::write(contracts.join("A.sol"), "contract A {}").unwrap();

        let file = convert_filename(
            "mypkg/A.sol",
            |short| short.to_path_buf(),
            Some(dir.path()),
            Some("mypkg"),
        )
        .unwrap();
        assert!(file.absolute.ends_with("contracts/A.sol"));
    }

    #[test]
    fn unknown_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_filename(
            "DoesNotExist.sol",
            |short| short.to_path_buf(),
            Some(dir.path()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownFile(_)));
    }

    #[test]
    fn short_projection_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = dir.path().join("contracts");
        fs::create_dir_all(&contracts).unwrap();
        fs::write(contracts.join("B.sol"), "contract B {}").unwrap();

        let file = convert_filename(
            "B.sol",
            |short| short.strip_prefix("contracts").map(Path::to_path_buf).unwrap_or_else(|_| short.to_path_buf()),
            Some(dir.path()),
            None,
        )
        .unwrap();
        assert_eq!(file.short, "B.sol");
    }
}

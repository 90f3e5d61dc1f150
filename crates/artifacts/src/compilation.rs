//! The top-level compilation aggregate: every compilation unit produced for a
//! target, plus source content and position caches.

use crate::{
    compilation_unit::CompilationUnit,
    naming::Filename,
    platform::{Platform, PlatformType},
    source_unit::LibraryAddresses,
};
use alloy_primitives::U256;
use compile_artifacts_core::{CompileError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};
use tracing::trace;

/// `(libname, 0xAddress)` tuples, comma separated.
static LIBRARY_DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((?P<name>\w+),\s*(?P<value>0x[0-9a-fA-F]{2,40})\),?").unwrap());

/// Parses a command-line library linking directive such as
/// `(Math, 0x42),(Utils, 0x43)` into name to address pairs.
pub fn parse_libraries(libraries: &str) -> Result<LibraryAddresses> {
    let mut ret = LibraryAddresses::new();
    for capture in LIBRARY_DIRECTIVE_RE.captures_iter(libraries) {
        let name = &capture["name"];
        let value = &capture["value"];
        let addr = U256::from_str_radix(value.trim_start_matches("0x"), 16)
            .map_err(|_| CompileError::InvalidLibraries(libraries.to_string()))?;
        ret.insert(name.to_string(), addr);
    }
    if ret.is_empty() {
        return Err(CompileError::InvalidLibraries(libraries.to_string()));
    }
    Ok(ret)
}

/// Byte-oriented line table of one source file, built once per file.
///
/// Lines keep their terminators, so line start offsets are exact byte offsets
/// into the file.
#[derive(Debug)]
struct LineIndex {
    lines: Vec<Vec<u8>>,
    starts: Vec<usize>,
    total: usize,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let bytes = content.as_bytes();
        let lines = split_lines_keepends(bytes);
        let mut starts = Vec::with_capacity(lines.len());
        let mut acc = 0;
        for line in &lines {
            starts.push(acc);
            acc += line.len();
        }
        Self { lines, starts, total: bytes.len() }
    }

    /// `(line, column)`, both 1-based. The end-of-file offset maps to the
    /// first column of the line past the last.
    fn line_of_offset(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.total {
            return None;
        }
        if offset == self.total {
            return Some((self.lines.len() + 1, 0));
        }
        let line = self.starts.partition_point(|start| *start <= offset);
        Some((line, offset - self.starts[line - 1] + 1))
    }

    fn offset_of_line(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.starts.get(line - 1).copied()
    }

    fn code_of_line(&self, line: usize) -> Option<&[u8]> {
        if line == 0 {
            return None;
        }
        self.lines.get(line - 1).map(Vec::as_slice)
    }
}

/// Splits on `\n`, `\r\n` and lone `\r`, keeping the terminator with the
/// line.
fn split_lines_keepends(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(bytes[start..=i].to_vec());
                i += 1;
                start = i;
            }
            b'\r' => {
                let end = if bytes.get(i + 1) == Some(&b'\n') { i + 1 } else { i };
                lines.push(bytes[start..=end].to_vec());
                i = end + 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(bytes[start..].to_vec());
    }
    lines
}

/// Everything produced by running a build tool on one target.
///
/// Owns one [`CompilationUnit`] per compiler invocation, the platform
/// metadata, the project-level dependency set, and lazily loaded source
/// content with its position caches.
pub struct Compilation {
    compilation_units: BTreeMap<String, CompilationUnit>,
    platform: Box<dyn Platform>,

    /// Files that belong to third-party packages rather than the project.
    dependencies: HashSet<String>,
    /// Library addresses requested for linking, when any.
    pub libraries: Option<LibraryAddresses>,
    /// The directory the build tool was run from.
    pub working_dir: PathBuf,
    /// The npm package name of the target, when one exists.
    pub package: Option<String>,
    /// True when only bytecode is available (etherscan without sources).
    pub bytecode_only: bool,

    unit_counter: Cell<u64>,
    // Absolute path -> file content / line table, loaded on first use.
    src_content: RefCell<BTreeMap<String, String>>,
    line_indexes: RefCell<HashMap<String, LineIndex>>,
}

impl std::fmt::Debug for Compilation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compilation")
            .field("target", &self.platform.target())
            .field("platform", &self.platform.name())
            .field("compilation_units", &self.compilation_units.keys())
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

impl Compilation {
    pub fn new(platform: Box<dyn Platform>, working_dir: PathBuf) -> Self {
        Self {
            compilation_units: BTreeMap::new(),
            platform,
            dependencies: HashSet::new(),
            libraries: None,
            working_dir,
            package: None,
            bytecode_only: false,
            unit_counter: Cell::new(0),
            src_content: RefCell::new(BTreeMap::new()),
            line_indexes: RefCell::new(HashMap::new()),
        }
    }

    /// What the platform was invoked on.
    pub fn target(&self) -> &str {
        self.platform.target()
    }

    pub fn platform(&self) -> &dyn Platform {
        &*self.platform
    }

    pub fn set_platform(&mut self, platform: Box<dyn Platform>) {
        self.platform = platform;
    }

    /// The platform's wire identifier, as recorded in exports.
    pub fn platform_type(&self) -> PlatformType {
        self.platform.platform_type()
    }

    pub fn compilation_units(&self) -> &BTreeMap<String, CompilationUnit> {
        &self.compilation_units
    }

    pub fn compilation_unit(&self, unique_id: &str) -> Option<&CompilationUnit> {
        self.compilation_units.get(unique_id)
    }

    pub fn compilation_unit_mut(&mut self, unique_id: &str) -> Option<&mut CompilationUnit> {
        self.compilation_units.get_mut(unique_id)
    }

    /// Returns the compilation unit with `unique_id`, creating it if needed.
    /// An id of `"."` asks for a fresh unit with a generated id.
    pub fn create_compilation_unit(&mut self, unique_id: &str) -> &mut CompilationUnit {
        let unique_id = if unique_id == "." {
            let next = self.unit_counter.get();
            self.unit_counter.set(next + 1);
            format!("unit-{next}")
        } else {
            unique_id.to_string()
        };
        trace!(id = unique_id.as_str(), "compilation unit");
        self.compilation_units
            .entry(unique_id.clone())
            .or_insert_with(|| CompilationUnit::new(unique_id))
    }

    /// True when `contract` is defined in two or more compilation units.
    /// Several definitions within a single unit do not count.
    pub fn is_in_multiple_compilation_unit(&self, contract: &str) -> bool {
        let count = self
            .compilation_units
            .values()
            .filter(|unit| {
                unit.source_units()
                    .values()
                    .any(|source_unit| source_unit.contracts_names().iter().any(|n| n == contract))
            })
            .count();
        count >= 2
    }

    /// Every filename registered in any compilation unit.
    pub fn filenames(&self) -> BTreeSet<&Filename> {
        self.compilation_units
            .values()
            .flat_map(|unit| unit.filenames().iter())
            .collect()
    }

    /// Resolves any spelling of a filename across all compilation units.
    pub fn filename_lookup(&self, filename: &str) -> Result<&Filename> {
        for unit in self.compilation_units.values() {
            if let Ok(file) = unit.filename_lookup(filename) {
                return Ok(file);
            }
        }
        Err(CompileError::UnregisteredFilename {
            filename: filename.to_string(),
            known: self.filenames().iter().map(|f| f.absolute.clone()).collect(),
        })
    }

    pub fn dependencies(&self) -> &HashSet<String> {
        &self.dependencies
    }

    pub fn add_dependency(&mut self, path: impl Into<String>) {
        self.dependencies.insert(path.into());
    }

    /// True when `path` is a third-party file, either recorded as such or
    /// reported by the platform.
    pub fn is_dependency(&self, path: &str) -> bool {
        self.dependencies.contains(path) || self.platform.is_dependency(path)
    }

    /// Strips the metadata trailer from every contract of every unit.
    pub fn remove_metadata(&mut self) {
        for unit in self.compilation_units.values_mut() {
            let filenames: Vec<Filename> = unit.filenames().to_vec();
            for filename in &filenames {
                if let Some(source_unit) = unit.source_unit_mut(filename) {
                    source_unit.remove_metadata();
                }
            }
        }
    }

    fn ensure_src_content(&self) {
        if !self.src_content.borrow().is_empty() {
            return;
        }
        let mut content = self.src_content.borrow_mut();
        for filename in self.filenames() {
            if content.contains_key(&filename.absolute) {
                continue;
            }
            let path = Path::new(&filename.absolute);
            if !path.is_file() {
                continue;
            }
            if let Ok(bytes) = fs::read(path) {
                content.insert(filename.absolute.clone(), String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }

    /// Source code of `filename_absolute`, loading from disk on first use.
    pub fn src_content_for_file(&self, filename_absolute: &str) -> Option<String> {
        self.ensure_src_content();
        self.src_content.borrow().get(filename_absolute).cloned()
    }

    /// Replaces all source content, e.g. when restoring from an export.
    /// Position caches built from the previous content are dropped.
    pub fn set_src_content(&self, src: BTreeMap<String, String>) {
        *self.src_content.borrow_mut() = src;
        self.line_indexes.borrow_mut().clear();
    }

    fn with_line_index<T>(
        &self,
        file: &Filename,
        f: impl FnOnce(&LineIndex) -> T,
    ) -> Result<T> {
        if !self.line_indexes.borrow().contains_key(&file.absolute) {
            let content = self.src_content_for_file(&file.absolute).ok_or_else(|| {
                CompileError::MissingSourceContent(file.absolute.clone())
            })?;
            self.line_indexes
                .borrow_mut()
                .insert(file.absolute.clone(), LineIndex::new(&content));
        }
        Ok(f(&self.line_indexes.borrow()[&file.absolute]))
    }

    /// Maps a global byte offset into `file` to a 1-based `(line, column)`
    /// pair. The end-of-file offset maps to the line past the last, column 0.
    pub fn get_line_from_offset(&self, file: &Filename, offset: usize) -> Result<(usize, usize)> {
        self.with_line_index(file, |index| index.line_of_offset(offset))?.ok_or_else(|| {
            CompileError::OffsetOutOfRange { file: file.relative.clone(), offset }
        })
    }

    /// Maps a 1-based line of `file` to the global byte offset of its first
    /// character.
    pub fn get_global_offset_from_line(&self, file: &Filename, line: usize) -> Result<usize> {
        self.with_line_index(file, |index| index.offset_of_line(line))?.ok_or_else(|| {
            CompileError::LineOutOfRange { file: file.relative.clone(), line }
        })
    }

    /// The raw bytes of a 1-based line, terminator included. `None` when the
    /// line is past the end of the file.
    pub fn get_code_from_line(&self, file: &Filename, line: usize) -> Result<Option<Vec<u8>>> {
        self.with_line_index(file, |index| index.code_of_line(line).map(<[u8]>::to_vec))
    }
}

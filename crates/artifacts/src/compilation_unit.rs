//! One compiler invocation and the source units it produced.

use crate::{compiler::CompilerVersion, naming::Filename, source_unit::SourceUnit};
use compile_artifacts_core::{CompileError, Result};
use serde_json::Value;
use std::{
    cell::OnceCell,
    collections::{BTreeMap, BTreeSet, HashMap},
};

/// Artifacts of a single compiler invocation.
///
/// A build may call the compiler several times (one per solc version, or per
/// framework-defined build group); each call becomes one compilation unit
/// holding the source units it produced.
#[derive(Debug, Default)]
pub struct CompilationUnit {
    unique_id: String,

    /// Filenames in registration order. Exports iterate this rather than the
    /// source unit map so their output order is reproducible.
    filenames: Vec<Filename>,
    source_units: BTreeMap<Filename, SourceUnit>,
    filename_to_contracts: BTreeMap<Filename, BTreeSet<String>>,

    /// Which compiler produced this unit.
    pub compiler_version: CompilerVersion,
    /// When the unit comes from an etherscan-like service and the target is a
    /// proxy, the implementation's address.
    pub implementation_address: Option<String>,

    // Spelling -> Filename index, built on first lookup. Registration is
    // expected to be complete by then; later additions are not re-indexed.
    filenames_lookup: OnceCell<HashMap<String, Filename>>,
}

impl CompilationUnit {
    pub fn new(unique_id: impl Into<String>) -> Self {
        Self { unique_id: unique_id.into(), ..Default::default() }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn filenames(&self) -> &[Filename] {
        &self.filenames
    }

    /// Replaces the filename list, e.g. to reorder or post-filter it.
    pub fn set_filenames(&mut self, filenames: Vec<Filename>) {
        self.filenames = filenames;
    }

    pub fn source_units(&self) -> &BTreeMap<Filename, SourceUnit> {
        &self.source_units
    }

    pub fn source_unit(&self, filename: &Filename) -> Option<&SourceUnit> {
        self.source_units.get(filename)
    }

    pub fn source_unit_mut(&mut self, filename: &Filename) -> Option<&mut SourceUnit> {
        self.source_units.get_mut(filename)
    }

    /// Returns the source unit for `filename`, creating it if needed, and
    /// appends the filename to the ordered list on first sight. Call in the
    /// order the filenames should be exported.
    pub fn create_source_unit(&mut self, filename: &Filename) -> &mut SourceUnit {
        if !self.source_units.contains_key(filename) && !self.filenames.contains(filename) {
            self.filenames.push(filename.clone());
        }
        self.source_units
            .entry(filename.clone())
            .or_insert_with(|| SourceUnit::new(filename.clone()))
    }

    pub fn filename_to_contracts(&self) -> &BTreeMap<Filename, BTreeSet<String>> {
        &self.filename_to_contracts
    }

    /// Records that `filename` declares `contract`, both in the unit-wide
    /// index and in the file's source unit.
    pub fn record_contract(&mut self, filename: &Filename, contract: &str) {
        self.filename_to_contracts
            .entry(filename.clone())
            .or_default()
            .insert(contract.to_string());
        if let Some(source_unit) = self.source_units.get_mut(filename) {
            source_unit.add_contract_name(contract);
        }
    }

    /// All ASTs of the unit, keyed by absolute path.
    pub fn asts(&self) -> BTreeMap<&str, &Value> {
        self.source_units
            .values()
            .map(|source_unit| (source_unit.filename.absolute.as_str(), &source_unit.ast))
            .collect()
    }

    /// Resolves any spelling (absolute, relative or used) of a registered
    /// filename to its [`Filename`].
    pub fn filename_lookup(&self, filename: &str) -> Result<&Filename> {
        let lookup = self.filenames_lookup.get_or_init(|| {
            let mut lookup = HashMap::new();
            for file in &self.filenames {
                lookup.insert(file.absolute.clone(), file.clone());
                lookup.insert(file.relative.clone(), file.clone());
                lookup.insert(file.used.clone(), file.clone());
            }
            lookup
        });
        lookup.get(filename).ok_or_else(|| CompileError::UnregisteredFilename {
            filename: filename.to_string(),
            known: self.filenames.iter().map(|f| f.absolute.clone()).collect(),
        })
    }

    /// Maps a used spelling to the absolute path.
    pub fn find_absolute_filename_from_used_filename(&self, used: &str) -> Result<String> {
        self.filenames
            .iter()
            .find(|f| f.used == used)
            .map(|f| f.absolute.clone())
            .ok_or_else(|| CompileError::UnregisteredFilename {
                filename: used.to_string(),
                known: self.filenames.iter().map(|f| f.absolute.clone()).collect(),
            })
    }

    /// Maps an absolute path to the relative spelling.
    pub fn relative_filename_from_absolute_filename(&self, absolute: &str) -> Result<String> {
        self.filenames
            .iter()
            .find(|f| f.absolute == absolute)
            .map(|f| f.relative.clone())
            .ok_or_else(|| CompileError::UnregisteredFilename {
                filename: absolute.to_string(),
                known: self.filenames.iter().map(|f| f.absolute.clone()).collect(),
            })
    }
}

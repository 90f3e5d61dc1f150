//! The standard export format: a self-contained JSON snapshot of a
//! [`Compilation`] that can be re-imported without the original build tool.
//!
//! Four schema generations exist in the wild; [`detect_schema`] tells them
//! apart and [`load_from_compile`] restores any of them. Exports are always
//! written in the current schema.

use crate::{
    compilation::Compilation,
    compilation_unit::CompilationUnit,
    compiler::CompilerVersion,
    naming::Filename,
    natspec::{DevDoc, Natspec, UserDoc},
    platform::{PlatformType, StandardPlatform},
    source_unit::SourceUnit,
};
use compile_artifacts_core::{utils, CompileError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Schema version written by [`generate_standard_export`].
pub const EXPORT_VERSION: &str = "0.0.2";

/// The schema generations an export file can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    /// Oldest exports: a single implicit compilation unit, contracts keyed by
    /// name at the top level.
    Legacy1,
    /// Compilation units exist but ASTs still live at the top level and no
    /// schema version is recorded.
    Legacy2,
    /// `crytic_version` `0.0.1`: per-unit ASTs, contracts nested under their
    /// filename.
    V0_0_1,
    /// The current schema: per-unit `source_units` maps.
    Current,
}

/// Identifies which schema generation `json` uses.
pub fn detect_schema(json: &Value) -> SchemaVersion {
    if json.get("compilation_units").is_none() {
        SchemaVersion::Legacy1
    } else if json.get("crytic_version").is_none() {
        SchemaVersion::Legacy2
    } else if json.get("crytic_version").and_then(Value::as_str) == Some("0.0.1") {
        SchemaVersion::V0_0_1
    } else {
        SchemaVersion::Current
    }
}

/// One contract's artifacts as laid out in the export file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedContract {
    pub abi: Value,
    #[serde(default)]
    pub bin: Option<String>,
    #[serde(default, rename = "bin-runtime")]
    pub bin_runtime: Option<String>,
    pub srcmap: String,
    #[serde(rename = "srcmap-runtime")]
    pub srcmap_runtime: String,
    pub filenames: Filename,
    #[serde(default)]
    pub libraries: BTreeMap<String, String>,
    pub is_dependency: bool,
    #[serde(default)]
    pub userdoc: UserDoc,
    #[serde(default)]
    pub devdoc: DevDoc,
}

/// One source unit as laid out in the current schema.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ExportedSourceUnit {
    #[serde(default)]
    pub ast: Value,
    #[serde(default)]
    pub contracts: BTreeMap<String, ExportedContract>,
}

/// One compilation unit as laid out in the current schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedUnit {
    pub compiler: CompilerVersion,
    /// Keyed by relative path.
    pub source_units: BTreeMap<String, ExportedSourceUnit>,
    pub filenames: Vec<Filename>,
}

/// The complete export document (current schema).
#[derive(Debug, Serialize, Deserialize)]
pub struct StandardExport {
    pub compilation_units: BTreeMap<String, ExportedUnit>,
    #[serde(default)]
    pub package: Option<String>,
    pub working_dir: String,
    #[serde(rename = "type")]
    pub platform_type: PlatformType,
    #[serde(default)]
    pub unit_tests: Vec<String>,
    pub crytic_version: String,
}

/// Snapshots `compilation` into the current export schema.
///
/// When the compilation carries library addresses, bytecode is exported with
/// its placeholders patched.
pub fn generate_standard_export(compilation: &Compilation) -> StandardExport {
    let libraries_to_update = compilation.libraries.as_ref();
    let mut compilation_units = BTreeMap::new();

    for (id, unit) in compilation.compilation_units() {
        let mut source_units = BTreeMap::new();
        for filename in unit.filenames() {
            let Some(source_unit) = unit.source_unit(filename) else {
                continue;
            };
            let mut contracts = BTreeMap::new();
            for name in source_unit.contracts_names() {
                let libraries = source_unit.libraries_names_and_patterns(unit, name);
                let natspec =
                    source_unit.natspec().get(name).cloned().unwrap_or_default();
                contracts.insert(
                    name.clone(),
                    ExportedContract {
                        abi: source_unit.abi(name).cloned().unwrap_or(Value::Null),
                        bin: source_unit.bytecode_init(unit, name, libraries_to_update),
                        bin_runtime: source_unit
                            .bytecode_runtime(unit, name, libraries_to_update),
                        srcmap: source_unit.srcmap_init(name).join(";"),
                        srcmap_runtime: source_unit.srcmap_runtime(name).join(";"),
                        filenames: filename.clone(),
                        libraries: libraries.into_iter().collect(),
                        is_dependency: compilation.is_dependency(&filename.absolute),
                        userdoc: natspec.userdoc,
                        devdoc: natspec.devdoc,
                    },
                );
            }
            source_units.insert(
                filename.relative.clone(),
                ExportedSourceUnit { ast: source_unit.ast.clone(), contracts },
            );
        }
        compilation_units.insert(
            id.clone(),
            ExportedUnit {
                compiler: unit.compiler_version.clone(),
                source_units,
                filenames: unit.filenames().to_vec(),
            },
        );
    }

    StandardExport {
        compilation_units,
        package: compilation.package.clone(),
        working_dir: utils::to_slash(&compilation.working_dir),
        platform_type: compilation.platform().platform_type_used(),
        unit_tests: compilation.platform().guessed_tests(),
        crytic_version: EXPORT_VERSION.to_string(),
    }
}

/// Writes the export of `compilation` into `export_dir` and returns the
/// written path.
///
/// The file is named after the last component of the target, or `contracts`
/// when the target is a directory.
pub fn export_to_standard(compilation: &Compilation, export_dir: &Path) -> Result<PathBuf> {
    let output = generate_standard_export(compilation);

    fs::create_dir_all(export_dir).map_err(|err| CompileError::io(err, export_dir))?;

    let target = compilation.target();
    let target_name = if Path::new(target).is_dir() {
        "contracts".to_string()
    } else {
        Path::new(target)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.to_string())
    };

    let path = export_dir.join(format!("{target_name}.json"));
    let file = fs::File::create(&path).map_err(|err| CompileError::io(err, &path))?;
    serde_json::to_writer(BufWriter::new(file), &output)?;
    debug!(path = %path.display(), "wrote standard export");
    Ok(path)
}

// Legacy shapes share this flat unit layout: contracts keyed by name, ASTs
// either within the unit or at the document's top level.
#[derive(Debug, Deserialize)]
struct FlatUnitJson {
    compiler: CompilerVersion,
    #[serde(default)]
    filenames: Vec<Filename>,
    #[serde(default)]
    asts: BTreeMap<String, Value>,
    #[serde(default)]
    contracts: BTreeMap<String, ExportedContract>,
}

#[derive(Debug, Deserialize)]
struct Legacy2Json {
    compilation_units: BTreeMap<String, FlatUnitJson>,
    #[serde(default)]
    asts: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct V001UnitJson {
    compiler: CompilerVersion,
    #[serde(default)]
    filenames: Vec<Filename>,
    #[serde(default)]
    asts: BTreeMap<String, Value>,
    /// Contracts nested under their filename; the outer key is informational.
    #[serde(default)]
    contracts: BTreeMap<String, BTreeMap<String, ExportedContract>>,
}

#[derive(Debug, Deserialize)]
struct V001Json {
    compilation_units: BTreeMap<String, V001UnitJson>,
}

#[derive(Debug, Deserialize)]
struct CurrentJson {
    compilation_units: BTreeMap<String, ExportedUnit>,
}

/// Restores `compilation` from any schema generation of `json`. Returns the
/// platform type the artifacts originally came from and the recorded unit
/// test commands.
pub fn load_from_compile(
    compilation: &mut Compilation,
    json: &Value,
) -> Result<(PlatformType, Vec<String>)> {
    compilation.package =
        json.get("package").and_then(Value::as_str).map(str::to_string);

    match detect_schema(json) {
        SchemaVersion::Legacy1 => load_legacy1(compilation, json)?,
        SchemaVersion::Legacy2 => load_legacy2(compilation, json)?,
        SchemaVersion::V0_0_1 => load_v0_0_1(compilation, json)?,
        SchemaVersion::Current => load_current(compilation, json)?,
    }

    let working_dir = json
        .get("working_dir")
        .and_then(Value::as_str)
        .ok_or_else(|| CompileError::InvalidArchive("missing working_dir".to_string()))?;
    compilation.working_dir = PathBuf::from(working_dir);

    let platform_type = json
        .get("type")
        .cloned()
        .ok_or_else(|| CompileError::InvalidArchive("missing platform type".to_string()))?;
    let platform_type: PlatformType = serde_json::from_value(platform_type)?;

    let unit_tests = json
        .get("unit_tests")
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_default();

    Ok((platform_type, unit_tests))
}

/// Resolves an AST path against the unit's registered filenames, degrading to
/// a synthetic filename for malformed exports that omitted the list.
fn filename_for_ast(unit: &CompilationUnit, path: &str) -> Filename {
    unit.filename_lookup(path).cloned().unwrap_or_else(|_| {
        debug!(path, "AST path missing from the export's filename list");
        Filename::new(path, path, path, path)
    })
}

fn apply_contract(
    source_unit: &mut SourceUnit,
    name: &str,
    contract: ExportedContract,
) {
    source_unit.set_abi(name, contract.abi);
    if let Some(bin) = contract.bin {
        source_unit.set_init_bytecode(name, bin);
    }
    if let Some(bin) = contract.bin_runtime {
        source_unit.set_runtime_bytecode(name, bin);
    }
    source_unit
        .set_srcmap_init(name, contract.srcmap.split(';').map(str::to_string).collect());
    source_unit.set_srcmap_runtime(
        name,
        contract.srcmap_runtime.split(';').map(str::to_string).collect(),
    );
    source_unit.set_libraries(name, contract.libraries.into_iter().collect());
    source_unit
        .set_natspec(name, Natspec { userdoc: contract.userdoc, devdoc: contract.devdoc });
}

fn load_contract(
    unit: &mut CompilationUnit,
    filename: &Filename,
    name: &str,
    contract: ExportedContract,
    dependencies: &mut Vec<String>,
) {
    if contract.is_dependency {
        dependencies.extend([
            filename.absolute.clone(),
            filename.relative.clone(),
            filename.short.clone(),
            filename.used.clone(),
        ]);
    }
    unit.create_source_unit(filename);
    unit.record_contract(filename, name);
    if let Some(source_unit) = unit.source_unit_mut(filename) {
        apply_contract(source_unit, name, contract);
    }
}

fn populate_flat_unit(
    unit: &mut CompilationUnit,
    parsed: FlatUnitJson,
    top_level_asts: Option<&BTreeMap<String, Value>>,
    dependencies: &mut Vec<String>,
) {
    unit.compiler_version = parsed.compiler;
    unit.set_filenames(parsed.filenames);

    let asts = top_level_asts.unwrap_or(&parsed.asts);
    for (path, ast) in asts {
        let filename = filename_for_ast(unit, path);
        unit.create_source_unit(&filename).ast = ast.clone();
    }

    for (name, contract) in parsed.contracts {
        let filename = contract.filenames.clone();
        load_contract(unit, &filename, &name, contract, dependencies);
    }
}

fn load_legacy1(compilation: &mut Compilation, json: &Value) -> Result<()> {
    let parsed: FlatUnitJson = serde_json::from_value(json.clone())?;
    let mut dependencies = Vec::new();
    populate_flat_unit(
        compilation.create_compilation_unit("legacy"),
        parsed,
        None,
        &mut dependencies,
    );
    for dependency in dependencies {
        compilation.add_dependency(dependency);
    }
    Ok(())
}

fn load_legacy2(compilation: &mut Compilation, json: &Value) -> Result<()> {
    let parsed: Legacy2Json = serde_json::from_value(json.clone())?;
    let mut dependencies = Vec::new();
    for (id, unit_json) in parsed.compilation_units {
        populate_flat_unit(
            compilation.create_compilation_unit(&id),
            unit_json,
            Some(&parsed.asts),
            &mut dependencies,
        );
    }
    for dependency in dependencies {
        compilation.add_dependency(dependency);
    }
    Ok(())
}

fn load_v0_0_1(compilation: &mut Compilation, json: &Value) -> Result<()> {
    let parsed: V001Json = serde_json::from_value(json.clone())?;
    let mut dependencies = Vec::new();
    for (id, unit_json) in parsed.compilation_units {
        let unit = compilation.create_compilation_unit(&id);
        unit.compiler_version = unit_json.compiler;
        unit.set_filenames(unit_json.filenames);

        for (path, ast) in &unit_json.asts {
            let filename = filename_for_ast(unit, path);
            unit.create_source_unit(&filename).ast = ast.clone();
        }

        for contracts in unit_json.contracts.into_values() {
            for (name, contract) in contracts {
                let filename = contract.filenames.clone();
                load_contract(unit, &filename, &name, contract, &mut dependencies);
            }
        }
    }
    for dependency in dependencies {
        compilation.add_dependency(dependency);
    }
    Ok(())
}

fn load_current(compilation: &mut Compilation, json: &Value) -> Result<()> {
    let parsed: CurrentJson = serde_json::from_value(json.clone())?;
    let mut dependencies = Vec::new();
    for (id, unit_json) in parsed.compilation_units {
        let unit = compilation.create_compilation_unit(&id);
        unit.compiler_version = unit_json.compiler;
        unit.set_filenames(unit_json.filenames);

        for (path, source_unit_json) in unit_json.source_units {
            let filename = filename_for_ast(unit, &path);
            unit.create_source_unit(&filename).ast = source_unit_json.ast;
            for (name, contract) in source_unit_json.contracts {
                load_contract(unit, &filename, &name, contract, &mut dependencies);
            }
        }
    }
    for dependency in dependencies {
        compilation.add_dependency(dependency);
    }
    Ok(())
}

impl Compilation {
    /// Restores a compilation from a standard export file.
    pub fn load_standard(path: &Path) -> Result<Self> {
        let file = fs::File::open(path).map_err(|err| CompileError::io(err, path))?;
        let json: Value = serde_json::from_reader(BufReader::new(file))?;
        Self::load_standard_json(path.display().to_string(), &json)
    }

    /// Restores a compilation from an already parsed export document.
    /// `target` names where the document came from.
    pub fn load_standard_json(target: String, json: &Value) -> Result<Self> {
        let mut compilation =
            Compilation::new(Box::new(StandardPlatform::new(target.clone())), PathBuf::new());
        let (underlying, unit_tests) = load_from_compile(&mut compilation, json)?;

        let mut platform = StandardPlatform::new(target);
        platform.set_underlying(underlying);
        platform.set_unit_tests(unit_tests);
        compilation.set_platform(Box::new(platform));
        Ok(compilation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_detection() {
        assert_eq!(detect_schema(&json!({"contracts": {}})), SchemaVersion::Legacy1);
        assert_eq!(
            detect_schema(&json!({"compilation_units": {}})),
            SchemaVersion::Legacy2
        );
        assert_eq!(
            detect_schema(&json!({"compilation_units": {}, "crytic_version": "0.0.1"})),
            SchemaVersion::V0_0_1
        );
        assert_eq!(
            detect_schema(&json!({"compilation_units": {}, "crytic_version": "0.0.2"})),
            SchemaVersion::Current
        );
    }

    #[test]
    fn loads_legacy1_document() {
        let filenames = json!({
            "absolute": "/p/A.sol",
            "used": "A.sol",
            "relative": "A.sol",
            "short": "A.sol"
        });
        let doc = json!({
            "compiler": { "compiler": "solc", "version": "0.5.11", "optimized": false },
            "filenames": [filenames.clone()],
            "asts": { "/p/A.sol": { "nodeType": "SourceUnit" } },
            "contracts": {
                "Token": {
                    "abi": [],
                    "bin": "6080",
                    "bin-runtime": "6080",
                    "srcmap": "0:10:0",
                    "srcmap-runtime": "0:10:0",
                    "filenames": filenames,
                    "libraries": {},
                    "is_dependency": true
                }
            },
            "working_dir": "/p",
            "type": 1,
            "unit_tests": []
        });

        let compilation = Compilation::load_standard_json("export.json".into(), &doc).unwrap();
        assert_eq!(compilation.platform_type(), PlatformType::Standard);
        assert_eq!(compilation.platform().platform_type_used(), PlatformType::Solc);
        assert_eq!(compilation.working_dir, PathBuf::from("/p"));
        assert!(compilation.is_dependency("/p/A.sol"));
        assert!(compilation.is_dependency("A.sol"));

        let unit = compilation.compilation_unit("legacy").unwrap();
        let file = unit.filename_lookup("A.sol").unwrap().clone();
        let source_unit = unit.source_unit(&file).unwrap();
        assert_eq!(source_unit.contracts_names(), ["Token"]);
        assert_eq!(source_unit.ast["nodeType"], "SourceUnit");
    }

    #[test]
    fn loads_legacy2_top_level_asts() {
        let filenames = json!({
            "absolute": "/p/B.sol",
            "used": "B.sol",
            "relative": "B.sol",
            "short": "B.sol"
        });
        let doc = json!({
            "compilation_units": {
                "u1": {
                    "compiler": { "compiler": "solc", "version": "N/A", "optimized": null },
                    "filenames": [filenames.clone()],
                    "contracts": {
                        "B": {
                            "abi": [],
                            "bin": "00",
                            "bin-runtime": "00",
                            "srcmap": "",
                            "srcmap-runtime": "",
                            "filenames": filenames,
                            "libraries": {},
                            "is_dependency": false
                        }
                    }
                }
            },
            "asts": { "B.sol": { "ast": true } },
            "working_dir": "/p",
            "type": 2
        });

        let compilation = Compilation::load_standard_json("export.json".into(), &doc).unwrap();
        let unit = compilation.compilation_unit("u1").unwrap();
        let file = unit.filename_lookup("/p/B.sol").unwrap().clone();
        assert_eq!(unit.source_unit(&file).unwrap().ast["ast"], true);
        assert_eq!(compilation.platform().platform_type_used(), PlatformType::Truffle);
    }

    #[test]
    fn loads_v0_0_1_nested_contracts() {
        let filenames = json!({
            "absolute": "/p/C.sol",
            "used": "C.sol",
            "relative": "C.sol",
            "short": "C.sol"
        });
        let doc = json!({
            "compilation_units": {
                "u1": {
                    "compiler": { "compiler": "solc", "version": "0.6.12", "optimized": true },
                    "filenames": [filenames.clone()],
                    "asts": { "/p/C.sol": { "nodeType": "SourceUnit" } },
                    "contracts": {
                        "C.sol": {
                            "C": {
                                "abi": [],
                                "bin": "6080",
                                "bin-runtime": "6080",
                                "srcmap": "0:4:0",
                                "srcmap-runtime": "0:4:0",
                                "filenames": filenames,
                                "libraries": {},
                                "is_dependency": true
                            }
                        }
                    }
                }
            },
            "crytic_version": "0.0.1",
            "working_dir": "/p",
            "type": 11,
            "unit_tests": []
        });
        assert_eq!(detect_schema(&doc), SchemaVersion::V0_0_1);

        let compilation = Compilation::load_standard_json("export.json".into(), &doc).unwrap();
        assert_eq!(compilation.platform().platform_type_used(), PlatformType::Hardhat);
        assert!(compilation.is_dependency("/p/C.sol"));

        let unit = compilation.compilation_unit("u1").unwrap();
        let file = unit.filename_lookup("C.sol").unwrap().clone();
        let source_unit = unit.source_unit(&file).unwrap();
        assert_eq!(source_unit.contracts_names(), ["C"]);
        assert_eq!(source_unit.ast["nodeType"], "SourceUnit");
        assert_eq!(source_unit.bytecodes_init()["C"], "6080");
        assert_eq!(source_unit.srcmap_init("C"), ["0:4:0"]);
    }

    #[test]
    fn missing_working_dir_is_rejected() {
        let doc = json!({
            "compilation_units": {},
            "crytic_version": "0.0.2",
            "type": 1
        });
        let err = Compilation::load_standard_json("export.json".into(), &doc).unwrap_err();
        assert!(matches!(err, CompileError::InvalidArchive(_)));
    }

    #[test]
    fn unknown_platform_type_is_rejected() {
        let doc = json!({
            "compilation_units": {},
            "crytic_version": "0.0.2",
            "working_dir": "/p",
            "type": 999
        });
        let err = Compilation::load_standard_json("export.json".into(), &doc).unwrap_err();
        assert!(matches!(err, CompileError::Json(_)));
    }
}

//! Per-file compiler artifacts: ABIs, bytecode, source maps, natspec, and the
//! library-linking resolver.

use crate::{compilation_unit::CompilationUnit, naming::Filename, natspec::Natspec};
use alloy_primitives::{hex, keccak256, U256};
use compile_artifacts_core::{CompileError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};
use tracing::debug;

/// Library name (any accepted spelling) to address.
pub type LibraryAddresses = BTreeMap<String, U256>;

/// Unlinked library references in bytecode: exactly 40 characters, `__` on
/// both ends.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__.{36}__").unwrap());

/// Pads `name` into the Solidity 0.4 placeholder form: `__name____...` with 40
/// characters total.
fn legacy_placeholder(name: &str) -> String {
    let pad = 38usize.saturating_sub(name.chars().count());
    format!("__{name}{}", "_".repeat(pad))
}

/// Hashes `name` into the Solidity 0.5 placeholder form:
/// `__$<34 hex chars of keccak256>$__`.
fn hashed_placeholder(name: &str) -> String {
    let digest = hex::encode(keccak256(name.as_bytes()));
    format!("__${}$__", &digest[..34])
}

fn truncate_chars(name: &str, len: usize) -> String {
    name.chars().take(len).collect()
}

/// Every placeholder another contract's bytecode might use to reference the
/// library `contract_name` defined in `filename`.
///
/// Platforms disagree on whether references use the bare contract name or the
/// `filename:contract_name` form, and old compilers truncated the latter to 36
/// characters, so all the spellings are candidates.
fn get_library_candidates(filename: &Filename, contract_name: &str) -> Vec<String> {
    let with_absolute = format!("{}:{contract_name}", filename.absolute);
    let with_used = format!("{}:{contract_name}", filename.used);

    let name_candidates = [
        with_absolute.clone(),
        truncate_chars(&with_absolute, 36),
        with_used.clone(),
        truncate_chars(&with_used, 36),
    ];

    let mut ret = vec![legacy_placeholder(contract_name)];
    for candidate in name_candidates {
        ret.push(legacy_placeholder(&candidate));
        ret.push(hashed_placeholder(&candidate));
    }
    ret
}

/// Artifacts of a single source file within a compilation unit.
///
/// All contract-indexed maps use the contract name as key. Derived data
/// (function selectors, event topics, resolved library references) is computed
/// lazily and cached through interior mutability, so queries take `&self`.
#[derive(Debug, Default)]
pub struct SourceUnit {
    /// The file these artifacts belong to.
    pub filename: Filename,
    /// Raw AST as emitted by the compiler.
    pub ast: Value,

    abis: BTreeMap<String, Value>,
    init_bytecodes: BTreeMap<String, String>,
    runtime_bytecodes: BTreeMap<String, String>,
    srcmaps_init: BTreeMap<String, Vec<String>>,
    srcmaps_runtime: BTreeMap<String, Vec<String>>,
    natspec: BTreeMap<String, Natspec>,
    contracts_names: Vec<String>,

    // Lazy caches. `libraries` maps contract name to the resolved
    // (library name, placeholder) pairs found in its bytecode.
    libraries: RefCell<BTreeMap<String, Vec<(String, String)>>>,
    hashes: RefCell<BTreeMap<String, BTreeMap<String, u32>>>,
    events: RefCell<BTreeMap<String, BTreeMap<String, (u32, Vec<bool>)>>>,
    contracts_without_libraries: RefCell<Option<Vec<String>>>,
}

impl SourceUnit {
    pub fn new(filename: Filename) -> Self {
        Self { filename, ..Default::default() }
    }

    /// All contract names defined in this file, in insertion order.
    pub fn contracts_names(&self) -> &[String] {
        &self.contracts_names
    }

    /// Registers a contract name, keeping the list duplicate-free.
    pub fn add_contract_name(&mut self, name: &str) {
        if !self.contracts_names.iter().any(|n| n == name) {
            self.contracts_names.push(name.to_string());
        }
    }

    pub fn abis(&self) -> &BTreeMap<String, Value> {
        &self.abis
    }

    pub fn abi(&self, name: &str) -> Option<&Value> {
        self.abis.get(name)
    }

    pub fn set_abi(&mut self, name: impl Into<String>, abi: Value) {
        self.abis.insert(name.into(), abi);
    }

    pub fn bytecodes_init(&self) -> &BTreeMap<String, String> {
        &self.init_bytecodes
    }

    pub fn bytecodes_runtime(&self) -> &BTreeMap<String, String> {
        &self.runtime_bytecodes
    }

    pub fn set_init_bytecode(&mut self, name: impl Into<String>, bytecode: String) {
        self.init_bytecodes.insert(name.into(), bytecode);
    }

    pub fn set_runtime_bytecode(&mut self, name: impl Into<String>, bytecode: String) {
        self.runtime_bytecodes.insert(name.into(), bytecode);
    }

    pub fn srcmaps_init(&self) -> &BTreeMap<String, Vec<String>> {
        &self.srcmaps_init
    }

    pub fn srcmaps_runtime(&self) -> &BTreeMap<String, Vec<String>> {
        &self.srcmaps_runtime
    }

    pub fn srcmap_init(&self, name: &str) -> &[String] {
        self.srcmaps_init.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn srcmap_runtime(&self, name: &str) -> &[String] {
        self.srcmaps_runtime.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn set_srcmap_init(&mut self, name: impl Into<String>, srcmap: Vec<String>) {
        self.srcmaps_init.insert(name.into(), srcmap);
    }

    pub fn set_srcmap_runtime(&mut self, name: impl Into<String>, srcmap: Vec<String>) {
        self.srcmaps_runtime.insert(name.into(), srcmap);
    }

    pub fn natspec(&self) -> &BTreeMap<String, Natspec> {
        &self.natspec
    }

    pub fn set_natspec(&mut self, name: impl Into<String>, natspec: Natspec) {
        self.natspec.insert(name.into(), natspec);
    }

    /// The init bytecode of `name`, with library placeholders patched when
    /// `libraries` is provided. `unit` is the compilation unit this source
    /// unit belongs to.
    pub fn bytecode_init(
        &self,
        unit: &CompilationUnit,
        name: &str,
        libraries: Option<&LibraryAddresses>,
    ) -> Option<String> {
        let bytecode = self.init_bytecodes.get(name)?;
        Some(self.update_bytecode_with_libraries(unit, bytecode, libraries))
    }

    /// The runtime bytecode of `name`, with library placeholders patched when
    /// `libraries` is provided.
    pub fn bytecode_runtime(
        &self,
        unit: &CompilationUnit,
        name: &str,
        libraries: Option<&LibraryAddresses>,
    ) -> Option<String> {
        let bytecode = self.runtime_bytecodes.get(name)?;
        Some(self.update_bytecode_with_libraries(unit, bytecode, libraries))
    }

    /// Expands each provided library name into every placeholder spelling a
    /// compiler might have emitted for it, all mapping to the same address.
    fn convert_libraries_names(
        &self,
        unit: &CompilationUnit,
        libraries: &LibraryAddresses,
    ) -> LibraryAddresses {
        let mut new_names = LibraryAddresses::new();
        for (lib, addr) in libraries {
            new_names.insert(lib.clone(), *addr);
            new_names.insert(legacy_placeholder(lib), *addr);
            new_names.insert(hashed_placeholder(lib), *addr);

            for (lib_filename, contract_names) in unit.filename_to_contracts() {
                if !contract_names.contains(lib) {
                    continue;
                }
                for candidate in get_library_candidates(lib_filename, lib) {
                    new_names.insert(candidate, *addr);
                }
            }
        }
        new_names
    }

    /// Resolves a placeholder found in bytecode back to the contract it
    /// references. Returns `(contract name, placeholder)`.
    fn library_name_lookup(
        &self,
        unit: &CompilationUnit,
        lib_name: &str,
        original_contract: &str,
    ) -> Option<(String, String)> {
        for (filename, contract_names) in unit.filename_to_contracts() {
            for name in contract_names {
                if name == lib_name {
                    return Some((name.clone(), name.clone()));
                }
                for candidate in get_library_candidates(filename, name) {
                    if candidate == lib_name {
                        return Some((name.clone(), candidate));
                    }
                }
            }
        }

        // Solidity <0.4 truncated placeholders can collide. With exactly two
        // contracts in the file we can still assume the reference means "the
        // other one".
        if self.contracts_names.len() == 2 {
            let other = self
                .contracts_names
                .iter()
                .find(|c| c.as_str() != original_contract)?;
            debug!(
                placeholder = lib_name,
                library = other.as_str(),
                "resolved ambiguous library placeholder to the only other contract"
            );
            return Some((other.clone(), legacy_placeholder(other)));
        }

        None
    }

    fn resolve_libraries(&self, unit: &CompilationUnit, name: &str) {
        if self.libraries.borrow().contains_key(name) {
            return;
        }
        let mut found = BTreeSet::new();
        for bytecode in [self.init_bytecodes.get(name), self.runtime_bytecodes.get(name)]
            .into_iter()
            .flatten()
        {
            for placeholder in PLACEHOLDER_RE.find_iter(bytecode) {
                found.insert(placeholder.as_str().to_string());
            }
        }
        let resolved = found
            .iter()
            .filter_map(|placeholder| self.library_name_lookup(unit, placeholder, name))
            .collect();
        self.libraries.borrow_mut().insert(name.to_string(), resolved);
    }

    /// Names of the libraries referenced by `name`'s bytecode.
    pub fn libraries_names(&self, unit: &CompilationUnit, name: &str) -> Vec<String> {
        self.resolve_libraries(unit, name);
        self.libraries.borrow()[name].iter().map(|(lib, _)| lib.clone()).collect()
    }

    /// `(library name, placeholder)` pairs referenced by `name`'s bytecode.
    pub fn libraries_names_and_patterns(
        &self,
        unit: &CompilationUnit,
        name: &str,
    ) -> Vec<(String, String)> {
        self.resolve_libraries(unit, name);
        self.libraries.borrow()[name].clone()
    }

    /// Seeds the resolved-library cache, bypassing bytecode scanning. Used
    /// when restoring from an export that already recorded the references.
    pub fn set_libraries(&self, name: impl Into<String>, libraries: Vec<(String, String)>) {
        self.libraries.borrow_mut().insert(name.into(), libraries);
    }

    fn update_bytecode_with_libraries(
        &self,
        unit: &CompilationUnit,
        bytecode: &str,
        libraries: Option<&LibraryAddresses>,
    ) -> String {
        let Some(libraries) = libraries else {
            return bytecode.to_string();
        };
        let libraries = self.convert_libraries_names(unit, libraries);
        let mut patched = bytecode.to_string();
        let placeholders: BTreeSet<String> = PLACEHOLDER_RE
            .find_iter(bytecode)
            .map(|m| m.as_str().to_string())
            .collect();
        for placeholder in placeholders {
            if let Some(addr) = libraries.get(&placeholder) {
                let hex_addr = format!("{addr:x}");
                patched = patched.replace(&placeholder, &format!("{hex_addr:0>40}"));
            }
        }
        patched
    }

    /// Contracts of this file that are not used as libraries by any other
    /// contract of the file.
    pub fn contracts_names_without_libraries(&self, unit: &CompilationUnit) -> Vec<String> {
        if self.contracts_without_libraries.borrow().is_none() {
            let mut libraries = BTreeSet::new();
            for contract_name in &self.contracts_names {
                libraries.extend(self.libraries_names(unit, contract_name));
            }
            let remaining = self
                .contracts_names
                .iter()
                .filter(|name| !libraries.contains(*name))
                .cloned()
                .collect();
            *self.contracts_without_libraries.borrow_mut() = Some(remaining);
        }
        self.contracts_without_libraries
            .borrow()
            .clone()
            .unwrap_or_default()
    }

    /// Function selectors of `name`: `"sig(type,...)"` to the first four
    /// bytes of the signature's keccak256 hash.
    pub fn hashes(&self, name: &str) -> Result<BTreeMap<String, u32>> {
        if !self.hashes.borrow().contains_key(name) {
            let abi =
                self.abis.get(name).ok_or_else(|| CompileError::UnknownContract(name.into()))?;
            let mut hashes = BTreeMap::new();
            for entry in abi.as_array().into_iter().flatten() {
                if entry.get("type").and_then(Value::as_str) != Some("function") {
                    continue;
                }
                if let Some(sig) = signature_of(entry) {
                    hashes.insert(sig.clone(), selector(&sig));
                }
            }
            self.hashes.borrow_mut().insert(name.to_string(), hashes);
        }
        Ok(self.hashes.borrow()[name].clone())
    }

    /// Event topics of `name`: `"sig(type,...)"` to the reduced topic hash
    /// and the per-parameter indexed flags.
    pub fn events_topics(&self, name: &str) -> Result<BTreeMap<String, (u32, Vec<bool>)>> {
        if !self.events.borrow().contains_key(name) {
            let abi =
                self.abis.get(name).ok_or_else(|| CompileError::UnknownContract(name.into()))?;
            let mut events = BTreeMap::new();
            for entry in abi.as_array().into_iter().flatten() {
                if entry.get("type").and_then(Value::as_str) != Some("event") {
                    continue;
                }
                let Some(sig) = signature_of(entry) else { continue };
                let indexes = entry
                    .get("inputs")
                    .and_then(Value::as_array)
                    .map(|inputs| {
                        inputs
                            .iter()
                            .map(|input| {
                                input.get("indexed").and_then(Value::as_bool).unwrap_or(false)
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                events.insert(sig.clone(), (selector(&sig), indexes));
            }
            self.events.borrow_mut().insert(name.to_string(), events);
        }
        Ok(self.events.borrow()[name].clone())
    }

    /// Decodes the CBOR metadata trailer at the end of `name`'s runtime
    /// bytecode.
    pub fn metadata_of(&self, name: &str) -> Result<BTreeMap<String, Value>> {
        let bytecode = self
            .runtime_bytecodes
            .get(name)
            .ok_or_else(|| CompileError::UnknownContract(name.into()))?;
        let (_, trailer) = split_metadata(bytecode).ok_or_else(|| {
            CompileError::InvalidMetadata(format!(
                "runtime bytecode of {name} has no metadata trailer"
            ))
        })?;
        let raw = hex::decode(trailer)
            .map_err(|err| CompileError::InvalidMetadata(err.to_string()))?;
        let decoded: ciborium::Value = ciborium::de::from_reader(raw.as_slice())
            .map_err(|err| CompileError::InvalidMetadata(err.to_string()))?;
        let entries = decoded.into_map().map_err(|_| {
            CompileError::InvalidMetadata(format!("metadata of {name} is not a CBOR map"))
        })?;

        let mut metadata = BTreeMap::new();
        for (key, value) in entries {
            let Ok(key) = key.into_text() else { continue };
            let value = match value {
                // Single byte values encode flags.
                ciborium::Value::Bytes(bytes) if bytes.len() == 1 => {
                    Value::Bool(bytes[0] != 0)
                }
                ciborium::Value::Bytes(bytes) if key == "solc" => Value::String(
                    bytes.iter().map(u8::to_string).collect::<Vec<_>>().join("."),
                ),
                ciborium::Value::Bytes(bytes) => Value::String(hex::encode(bytes)),
                ciborium::Value::Text(text) => Value::String(text),
                ciborium::Value::Bool(flag) => Value::Bool(flag),
                ciborium::Value::Integer(int) => match i64::try_from(int) {
                    Ok(int) => Value::from(int),
                    // Out of JSON's integer range; skip like other unknown
                    // shapes.
                    Err(_) => continue,
                },
                _ => continue,
            };
            metadata.insert(key, value);
        }
        Ok(metadata)
    }

    /// Strips the metadata trailer from every contract's runtime bytecode,
    /// and removes the same bytes from the init bytecode.
    ///
    /// Makes bytecode comparable across compilations that differ only in
    /// source paths or compiler settings hashes. Contracts without a
    /// well-formed trailer are left untouched.
    pub fn remove_metadata(&mut self) {
        for (name, bytecode) in &mut self.runtime_bytecodes {
            if bytecode.is_empty() || bytecode == "0x" {
                continue;
            }
            let Some((stripped, trailer)) = split_metadata(bytecode) else {
                continue;
            };
            let trailer = trailer.to_string();
            *bytecode = stripped.to_string();
            if let Some(init) = self.init_bytecodes.get_mut(name) {
                *init = init.replace(&trailer, "");
            }
        }
    }
}

/// Splits hex runtime bytecode into (code, metadata trailer). The last two
/// bytes encode the big-endian byte length of the CBOR blob preceding them;
/// the trailer includes those length bytes.
fn split_metadata(bytecode: &str) -> Option<(&str, &str)> {
    if bytecode.len() < 4 {
        return None;
    }
    let length_hex = &bytecode[bytecode.len() - 4..];
    let metadata_length = usize::from_str_radix(length_hex, 16).ok()?;
    let trailer_len = metadata_length * 2 + 4;
    if trailer_len > bytecode.len() {
        return None;
    }
    Some(bytecode.split_at(bytecode.len() - trailer_len))
}

fn signature_of(entry: &Value) -> Option<String> {
    let name = entry.get("name")?.as_str()?;
    let arguments: Vec<&str> = entry
        .get("inputs")?
        .as_array()?
        .iter()
        .map(|input| input.get("type").and_then(Value::as_str).unwrap_or_default())
        .collect();
    Some(format!("{name}({})", arguments.join(",")))
}

/// First four bytes of the keccak256 hash of `sig`, big-endian.
fn selector(sig: &str) -> u32 {
    let digest = keccak256(sig.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn erc20_abi() -> Value {
        json!([
            {
                "type": "function",
                "name": "transfer",
                "inputs": [
                    { "name": "to", "type": "address" },
                    { "name": "amount", "type": "uint256" }
                ]
            },
            {
                "type": "event",
                "name": "Transfer",
                "inputs": [
                    { "name": "from", "type": "address", "indexed": true },
                    { "name": "to", "type": "address", "indexed": true },
                    { "name": "amount", "type": "uint256", "indexed": false }
                ]
            },
            { "type": "fallback" }
        ])
    }

    fn unit_with_file(relative: &str) -> (CompilationUnit, Filename) {
        let unit = CompilationUnit::new("test");
        let filename =
            Filename::new(format!("/project/{relative}"), relative, relative, relative);
        (unit, filename)
    }

    #[test]
    fn function_selectors_match_known_values() {
        let (_, filename) = unit_with_file("Token.sol");
        let mut source = SourceUnit::new(filename);
        source.add_contract_name("Token");
        source.set_abi("Token", erc20_abi());

        let hashes = source.hashes("Token").unwrap();
        assert_eq!(hashes["transfer(address,uint256)"], 0xa9059cbb);

        let events = source.events_topics("Token").unwrap();
        let (topic, indexes) = &events["Transfer(address,address,uint256)"];
        assert_eq!(*topic, 0xddf252ad);
        assert_eq!(indexes, &[true, true, false]);
    }

    #[test]
    fn selectors_of_unknown_contract_fail() {
        let (_, filename) = unit_with_file("Token.sol");
        let source = SourceUnit::new(filename);
        assert!(matches!(
            source.hashes("Nope").unwrap_err(),
            CompileError::UnknownContract(_)
        ));
    }

    #[test]
    fn patches_legacy_and_hashed_placeholders() {
        let mut unit = CompilationUnit::new("test");
        let filename = Filename::new("/project/Math.sol", "Math.sol", "Math.sol", "Math.sol");
        {
            let source = unit.create_source_unit(&filename);
            source.add_contract_name("SafeMath");
            source.add_contract_name("Token");
        }
        unit.record_contract(&filename, "SafeMath");
        unit.record_contract(&filename, "Token");

        let legacy = legacy_placeholder("SafeMath");
        let hashed = hashed_placeholder("SafeMath");
        assert_eq!(legacy.len(), 40);
        assert_eq!(hashed.len(), 40);

        let mut source = SourceUnit::new(filename.clone());
        source.add_contract_name("Token");
        source.set_init_bytecode("Token", format!("6080{legacy}6040{hashed}00"));
        source.set_runtime_bytecode("Token", format!("6080{legacy}00"));

        let mut libraries = LibraryAddresses::new();
        libraries.insert("SafeMath".into(), U256::from(0xdeadbeefu64));

        let patched = source.bytecode_init(&unit, "Token", Some(&libraries)).unwrap();
        let addr = format!("{:0>40}", "deadbeef");
        assert_eq!(patched, format!("6080{addr}6040{addr}00"));

        // Without addresses the bytecode is returned untouched.
        let raw = source.bytecode_init(&unit, "Token", None).unwrap();
        assert!(raw.contains(&legacy));
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let unit = CompilationUnit::new("test");
        let (_, filename) = unit_with_file("A.sol");
        let mut source = SourceUnit::new(filename);
        let placeholder = legacy_placeholder("Mystery");
        source.set_runtime_bytecode("A", format!("60{placeholder}60"));

        let mut libraries = LibraryAddresses::new();
        libraries.insert("Other".into(), U256::from(1));
        let patched = source.bytecode_runtime(&unit, "A", Some(&libraries)).unwrap();
        assert!(patched.contains(&placeholder));
    }

    #[test]
    fn two_contract_fallback_resolves_ambiguous_placeholder() {
        let unit = CompilationUnit::new("test");
        let (_, filename) = unit_with_file("Pair.sol");
        let mut source = SourceUnit::new(filename);
        source.add_contract_name("Token");
        source.add_contract_name("Lib");
        // A placeholder naming no known contract.
        source.set_runtime_bytecode("Token", format!("60{}60", legacy_placeholder("Unknown")));

        let names = source.libraries_names(&unit, "Token");
        assert_eq!(names, vec!["Lib".to_string()]);

        let without = source.contracts_names_without_libraries(&unit);
        assert_eq!(without, vec!["Token".to_string()]);
    }

    #[test]
    fn metadata_trailer_round_trip() {
        let (_, filename) = unit_with_file("Meta.sol");
        let mut source = SourceUnit::new(filename);

        // Build a real CBOR map: {"ipfs": <2 bytes>, "experimental": <1 byte>,
        // "solc": <3 bytes>}.
        let map = ciborium::Value::Map(vec![
            (
                ciborium::Value::Text("ipfs".into()),
                ciborium::Value::Bytes(vec![0x12, 0x34]),
            ),
            (
                ciborium::Value::Text("experimental".into()),
                ciborium::Value::Bytes(vec![0x01]),
            ),
            (
                ciborium::Value::Text("solc".into()),
                ciborium::Value::Bytes(vec![0, 8, 19]),
            ),
        ]);
        let mut cbor = Vec::new();
        ciborium::ser::into_writer(&map, &mut cbor).unwrap();
        let trailer = format!("{}{:04x}", hex::encode(&cbor), cbor.len());

        let code = "60806040";
        source.set_runtime_bytecode("Meta", format!("{code}{trailer}"));
        source.set_init_bytecode("Meta", format!("aa{code}{trailer}"));

        let metadata = source.metadata_of("Meta").unwrap();
        assert_eq!(metadata["ipfs"], json!("1234"));
        assert_eq!(metadata["experimental"], json!(true));
        assert_eq!(metadata["solc"], json!("0.8.19"));

        source.remove_metadata();
        assert_eq!(source.bytecodes_runtime()["Meta"], code);
        assert_eq!(source.bytecodes_init()["Meta"], format!("aa{code}"));
    }

    #[test]
    fn metadata_integers_outside_i64_are_skipped() {
        let (_, filename) = unit_with_file("Runs.sol");
        let mut source = SourceUnit::new(filename);

        let map = ciborium::Value::Map(vec![
            (
                ciborium::Value::Text("runs".into()),
                ciborium::Value::Integer(200.into()),
            ),
            (
                ciborium::Value::Text("huge".into()),
                ciborium::Value::Integer(u64::MAX.into()),
            ),
        ]);
        let mut cbor = Vec::new();
        ciborium::ser::into_writer(&map, &mut cbor).unwrap();
        let trailer = format!("{}{:04x}", hex::encode(&cbor), cbor.len());
        source.set_runtime_bytecode("Runs", format!("6080{trailer}"));

        let metadata = source.metadata_of("Runs").unwrap();
        assert_eq!(metadata["runs"], json!(200));
        assert!(!metadata.contains_key("huge"));
    }

    #[test]
    fn remove_metadata_skips_malformed_bytecode() {
        let (_, filename) = unit_with_file("Odd.sol");
        let mut source = SourceUnit::new(filename);
        source.set_runtime_bytecode("A", "0x".into());
        // Length field claims more bytes than the bytecode holds.
        source.set_runtime_bytecode("B", "6080ffff".into());
        source.remove_metadata();
        assert_eq!(source.bytecodes_runtime()["A"], "0x");
        assert_eq!(source.bytecodes_runtime()["B"], "6080ffff");
    }
}

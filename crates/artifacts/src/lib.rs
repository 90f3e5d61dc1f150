//! Unified model of smart-contract compiler output.
//!
//! Build-tool adapters (solc, vyper, or wrappers around Truffle, Hardhat,
//! Foundry, Brownie, ...) parse their tool's JSON and populate this common
//! shape: a [`Compilation`] owns one [`CompilationUnit`] per compiler
//! invocation, each of which owns one [`SourceUnit`] per source file, keyed by
//! a canonical [`Filename`]. Downstream consumers query the model for ABIs,
//! link-ready bytecode, source positions and serializable snapshots.
//!
//! The model is single-threaded by design: lazy caches use interior
//! mutability, so none of the container types are `Sync`. Wrap a
//! [`Compilation`] in external synchronization if it must cross threads.

pub mod compilation;
pub mod compilation_unit;
pub mod compiler;
pub mod naming;
pub mod natspec;
pub mod platform;
pub mod source_unit;
pub mod standard;

pub use compilation::{parse_libraries, Compilation};
pub use compilation_unit::CompilationUnit;
pub use compiler::CompilerVersion;
pub use naming::{convert_filename, Filename};
pub use natspec::Natspec;
pub use platform::{Platform, PlatformType, StandardPlatform};
pub use source_unit::{LibraryAddresses, SourceUnit};
pub use standard::{export_to_standard, generate_standard_export, load_from_compile};

pub use compile_artifacts_core::{CompileError, Result};

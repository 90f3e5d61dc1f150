//! Core utilities shared by the compilation artifact crates: the common error
//! type and cross-platform path helpers.

pub mod error;
pub mod utils;

pub use error::{CompileError, IoError, Result};

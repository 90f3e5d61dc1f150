use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Various errors raised while populating or querying the artifact model.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A file reported by a compiler could not be located on disk under any of
    /// the search heuristics.
    #[error("unknown file: {0}")]
    UnknownFile(PathBuf),
    /// A path spelling that was never registered in any compilation unit.
    #[error("{filename} does not exist in {known:?}")]
    UnregisteredFilename {
        filename: String,
        /// Absolute paths of every registered filename, for diagnostics.
        known: Vec<String>,
    },
    /// No artifact is stored under the requested contract name.
    #[error("contract {0} does not exist")]
    UnknownContract(String),
    /// A library linking directive that does not match the expected grammar.
    #[error(
        "invalid library linking directive\nGot:\n{0}\nExpected format:\n(libname1, 0x00),(libname2, 0x02)"
    )]
    InvalidLibraries(String),
    /// The runtime bytecode does not end in a well-formed metadata trailer.
    #[error("invalid metadata trailer: {0}")]
    InvalidMetadata(String),
    /// No source content is available for the file.
    #[error("no source content for {0}")]
    MissingSourceContent(String),
    /// A byte offset past the end of the file.
    #[error("offset {offset} is out of range for {file}")]
    OffsetOutOfRange { file: String, offset: usize },
    /// A 1-based line number outside the file.
    #[error("line {line} is out of range for {file}")]
    LineOutOfRange { file: String, line: usize },
    /// An exported archive that cannot be interpreted as any known schema.
    #[error("cannot import compiled archive: {0}")]
    InvalidArchive(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] IoError),
    /// General purpose message.
    #[error("{0}")]
    Message(String),
}

impl CompileError {
    pub fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        IoError::new(err, path).into()
    }

    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

/// An I/O error carrying the path that triggered it.
#[derive(Debug, Error)]
#[error("\"{}\": {io}", self.path.display())]
pub struct IoError {
    io: io::Error,
    path: PathBuf,
}

impl IoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    /// The path that the failing operation was performed on.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl From<IoError> for io::Error {
    fn from(err: IoError) -> Self {
        err.io
    }
}

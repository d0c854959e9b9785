//! Error taxonomy for the compatibility-analysis engine.
//!
//! Every variant corresponds to a row in the tool's documented exit-code
//! table; see [`ExitCode`] for the mapping. All variants are fatal — the
//! engine aborts rather than emit a partial report, since a silently
//! skipped class could hide a real incompatibility.

use std::path::PathBuf;

use crate::disasm::InternalParseError;

/// An error that aborts an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An input path could not be read (missing archive, permission denied).
    #[error("cannot access {path}: {source}")]
    Access {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A required external tool (archive extractor, disassembler) was not found.
    #[error("required external tool not found: {0}")]
    ToolNotFound(String),
    /// A serialized API dump was malformed.
    #[error("malformed API dump: {0}")]
    InvalidDump(String),
    /// A serialized API dump's format version is incompatible with this build.
    #[error("incompatible dump format: found major version {found}, expected {expected}")]
    DumpVersion {
        /// The major version found in the dump.
        found: u32,
        /// The major version this build expects.
        expected: u32,
    },
    /// The disassembly parser hit a state it cannot recover from.
    #[error("internal error while parsing disassembly: {0}")]
    Internal(#[from] InternalParseError),
    /// A module required by the run was not available (e.g. `petgraph`-gated
    /// analyses compiled out).
    #[error("missing internal module: {0}")]
    MissingModule(&'static str),
    /// Any other fatal condition, mapped to the generic exit code.
    #[error("{0}")]
    Generic(String),
}

/// The documented process exit code for a terminal engine outcome.
///
/// A host binary (out of scope for this crate) can call [`ExitCode::of`]
/// on the final `Result` of a run instead of re-deriving this mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// The two versions are compatible.
    Compatible = 0,
    /// The two versions are incompatible at the configured severity level.
    Incompatible = 1,
    /// A generic, otherwise unclassified error occurred.
    GenericError = 2,
    /// A required external tool was not found.
    MissingTool = 3,
    /// An input could not be accessed.
    InputAccess = 4,
    /// A serialized API dump was malformed.
    MalformedDump = 7,
    /// A serialized API dump has an incompatible format version.
    IncompatibleDumpVersion = 8,
    /// An internal module required by the run was missing.
    MissingInternalModule = 9,
}

impl ExitCode {
    /// Maps an [`EngineError`] to its documented exit code.
    #[must_use]
    pub fn of(err: &EngineError) -> Self {
        match err {
            EngineError::Access { .. } => Self::InputAccess,
            EngineError::ToolNotFound(_) => Self::MissingTool,
            EngineError::InvalidDump(_) => Self::MalformedDump,
            EngineError::DumpVersion { .. } => Self::IncompatibleDumpVersion,
            EngineError::Internal(_) => Self::GenericError,
            EngineError::MissingModule(_) => Self::MissingInternalModule,
            EngineError::Generic(_) => Self::GenericError,
        }
    }
}

/// A non-fatal condition observed during a run (empty archive, failed
/// parameter-name extraction). Collected on [`crate::engine::Report`]
/// rather than printed directly, and also emitted live as
/// [`tracing::warn!`] events so a host binary can surface them as they
/// happen.
pub type Warning = String;

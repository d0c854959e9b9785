//! The boundary between this crate and an external disassembler process.
//! Spawning `javap` (or any other disassembler) is out of scope for this
//! crate; callers provide an implementation of
//! [`Disassembler`], so a test can feed canned disassembly text without a
//! JDK on the test machine.

use std::path::Path;

use crate::error::EngineError;

/// Something that can turn a batch of class files into disassembly text.
///
/// The engine blocks on a single call to completion; it has no internal
/// suspension points or cancellation of its own. Arguments
/// are handed through as real paths, not a shell command line, so an
/// implementation built on [`std::process::Command::arg`] never has to
/// quote `$`, spaces, or parentheses in a class name — `Command` passes
/// each argument to the OS directly, bypassing the shell entirely.
pub trait Disassembler {
    /// Disassembles every class file in `class_files`, returning the
    /// concatenated textual disassembly for the whole batch.
    ///
    /// # Errors
    /// Returns [`EngineError::ToolNotFound`] if the external tool itself
    /// could not be located, or [`EngineError::Access`] if a class file
    /// could not be read.
    fn disassemble(&self, class_files: &[&Path]) -> Result<String, EngineError>;
}

//! A per-chunk scratch directory, scoped to the lifetime of one
//! disassembly batch: guaranteed removal on every exit path,
//! including a failed disassembler invocation, via `Drop`.

use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// A scratch directory removed when dropped, regardless of how its scope
/// is exited.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a fresh, empty scratch directory under `parent`, named
    /// uniquely enough that concurrent batches (in separate runs; this
    /// engine itself never runs two batches at once) never collide.
    ///
    /// # Errors
    /// Returns [`EngineError::Access`] if the directory could not be created.
    pub fn create_under(parent: &Path) -> Result<Self, EngineError> {
        let unique = format!("japi-compat-{}-{}", std::process::id(), scratch_nonce());
        let path = parent.join(unique);
        std::fs::create_dir_all(&path).map_err(|source| EngineError::Access { path: path.clone(), source })?;
        Ok(Self { path })
    }

    /// The directory's path, for extracting class files into before
    /// disassembling them.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn scratch_nonce() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_dir_is_removed_on_drop() {
        let parent = std::env::temp_dir();
        let path = {
            let scratch = ScratchDir::create_under(&parent).unwrap();
            let path = scratch.path().to_owned();
            assert!(path.exists());
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn two_scratch_dirs_do_not_collide() {
        let parent = std::env::temp_dir();
        let a = ScratchDir::create_under(&parent).unwrap();
        let b = ScratchDir::create_under(&parent).unwrap();
        assert_ne!(a.path(), b.path());
    }
}

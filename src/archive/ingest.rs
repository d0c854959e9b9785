//! Ties together [`ArchiveSource`] discovery, [`FilterRules`], and
//! command-line-length-aware batching into the ingestor's public
//! contract: "given one or more archive paths, produce
//! the set of class-file paths to analyze."

use crate::{
    archive::{filter::FilterRules, source::ClassEntry, ArchiveSource},
    error::EngineError,
};

/// A conservative estimate of the platform's maximum command-line
/// argument length, in bytes. Deliberately far below the smallest
/// practical OS limit (Windows' ~8191 characters) so a batch invocation
/// never truncates when invoking a batch disassembly.
pub const DEFAULT_MAX_BATCH_BYTES: usize = 6_000;

/// A bound on how many class files a single chunk may contain, independent
/// of the byte budget — keeps a single disassembler invocation from
/// spanning an unreasonable number of files even when names are short.
pub const DEFAULT_MAX_BATCH_ENTRIES: usize = 500;

/// Discovers every class file reachable from `sources`, retaining only
/// those that survive `rules`.
///
/// # Errors
/// Returns [`EngineError::Access`] if any source cannot be listed.
pub fn ingest(sources: &[&dyn ArchiveSource], rules: &FilterRules) -> Result<Vec<ClassEntry>, EngineError> {
    let mut kept = Vec::new();
    for source in sources {
        for entry in source.class_entries()? {
            if rules.keeps(&entry.binary_name) {
                kept.push(entry);
            }
        }
    }
    Ok(kept)
}

/// A plan for invoking a disassembler over `entries` in batches small
/// enough to respect a command-line length limit.
#[derive(Debug)]
pub struct ChunkPlan {
    chunks: Vec<Vec<ClassEntry>>,
}

fn entry_cost(entry: &ClassEntry) -> usize {
    // A rough per-argument cost: the path text itself plus quoting and
    // separator overhead.
    entry.binary_name.len() + entry.member_path.as_ref().map_or(0, String::len) + 8
}

impl ChunkPlan {
    /// Builds a plan from `entries`, splitting into chunks so that
    /// neither `max_bytes` nor `max_entries` is exceeded by any one
    /// chunk. A single entry whose own cost exceeds `max_bytes` still
    /// gets a chunk of its own rather than being dropped.
    #[must_use]
    pub fn build(entries: Vec<ClassEntry>, max_bytes: usize, max_entries: usize) -> Self {
        let mut chunks: Vec<Vec<ClassEntry>> = Vec::new();
        let mut current: Vec<ClassEntry> = Vec::new();
        let mut current_bytes = 0usize;
        for entry in entries {
            let cost = entry_cost(&entry);
            let would_overflow = !current.is_empty() && (current_bytes + cost > max_bytes || current.len() >= max_entries);
            if would_overflow {
                chunks.push(std::mem::take(&mut current));
                current_bytes = 0;
            }
            current_bytes += cost;
            current.push(entry);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        Self { chunks }
    }

    /// Builds a plan using the engine's documented default limits.
    #[must_use]
    pub fn build_default(entries: Vec<ClassEntry>) -> Self {
        Self::build(entries, DEFAULT_MAX_BATCH_BYTES, DEFAULT_MAX_BATCH_ENTRIES)
    }

    /// The batches, in discovery order.
    #[must_use]
    pub fn chunks(&self) -> &[Vec<ClassEntry>] {
        &self.chunks
    }

    /// The total number of class files across every chunk.
    #[must_use]
    pub fn total_entries(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::source::Container;

    fn entry(binary_name: &str) -> ClassEntry {
        ClassEntry { binary_name: binary_name.to_owned(), container: Container::Directory(".".into()), member_path: None }
    }

    #[test]
    fn chunk_plan_splits_on_byte_budget() {
        let entries = vec![entry("a/B"), entry("a/C"), entry("a/D")];
        let plan = ChunkPlan::build(entries, 20, 100);
        assert!(plan.chunks().len() > 1);
        assert_eq!(plan.total_entries(), 3);
    }

    #[test]
    fn chunk_plan_splits_on_entry_count() {
        let entries: Vec<_> = (0..5).map(|i| entry(&format!("a/B{i}"))).collect();
        let plan = ChunkPlan::build(entries, 1_000_000, 2);
        assert_eq!(plan.chunks().len(), 3);
        assert_eq!(plan.total_entries(), 5);
    }

    #[test]
    fn oversized_single_entry_gets_its_own_chunk() {
        let huge_name = "a/".to_owned() + &"B".repeat(1000);
        let plan = ChunkPlan::build(vec![entry(&huge_name), entry("a/C")], 10, 100);
        assert_eq!(plan.chunks().len(), 2);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let plan = ChunkPlan::build_default(Vec::new());
        assert!(plan.chunks().is_empty());
    }
}

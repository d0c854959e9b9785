//! The engine: orchestrates ingestion of both versions, runs the
//! difference detector and classifier, and assembles the final
//! [`Report`]. This is the one module that touches the filesystem and an
//! external disassembler process directly — everything downstream of
//! ingestion works on owned, in-memory [`SymbolTable`]/[`UsageTables`]
//! values.

use std::path::PathBuf;

use crate::{
    archive::{self, ArchiveSource, ChunkPlan, ClassEntry, Container, FilterRules, ScratchDir},
    classify::{self, ClassifiedProblem, Severity},
    config::Options,
    diff,
    disasm::{self, Disassembler, ParseOptions},
    error::{EngineError, ExitCode, Warning},
    model::SymbolTable,
    usage::UsageTables,
};

/// The outcome of a full compatibility run.
#[derive(Debug)]
pub struct Report {
    /// Every detected problem, with its binary and source severities.
    pub problems: Vec<ClassifiedProblem>,
    /// Non-fatal conditions observed along the way (empty archive,
    /// missing parameter names, …).
    pub warnings: Vec<Warning>,
    /// The documented process exit code this report corresponds to.
    pub exit_code: ExitCode,
}

/// A label identifying which archive an entry came from, for the
/// disassembly parser's `archive` field and for grouping a [`ChunkPlan`]
/// so a single disassembler invocation never mixes entries pulled from
/// two different archives.
fn archive_label_of(entry: &ClassEntry) -> String {
    match &entry.container {
        Container::Directory(path) => path.file_name().map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned()),
        Container::ZipFile(path) => path.file_name().map_or_else(|| path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned()),
        Container::ZipBytes(_) => "nested-archive".to_owned(),
    }
}

/// Ingests one version: discovers and filters class files across
/// `sources`, disassembles them in batches, and parses the result into a
/// fresh [`SymbolTable`]/[`UsageTables`] pair.
///
/// # Errors
/// Returns [`EngineError::Access`] if a source or a class file cannot be
/// read, [`EngineError::ToolNotFound`] if the disassembler is
/// unavailable, or [`EngineError::Internal`] if the disassembly output
/// cannot be parsed.
pub fn ingest_version(
    sources: &[&dyn ArchiveSource],
    disassembler: &dyn Disassembler,
    rules: &FilterRules,
    parse_options: ParseOptions,
) -> Result<(SymbolTable, UsageTables, Vec<Warning>), EngineError> {
    let entries = archive::ingest(sources, rules)?;
    let mut warnings = Vec::new();
    if entries.is_empty() {
        let message = "no class files survived filtering".to_owned();
        tracing::warn!("{message}");
        warnings.push(message);
    }

    let mut by_archive: std::collections::BTreeMap<String, Vec<ClassEntry>> = std::collections::BTreeMap::new();
    for entry in entries {
        by_archive.entry(archive_label_of(&entry)).or_default().push(entry);
    }

    let mut table = SymbolTable::new();
    let mut usage = UsageTables::new();
    let tmp_dir = std::env::temp_dir();

    for (label, group) in by_archive {
        let total = group.len();
        tracing::debug!(archive = %label, class_count = total, "ingesting archive");
        let plan = ChunkPlan::build_default(group);
        for chunk in plan.chunks() {
            let scratch = ScratchDir::create_under(&tmp_dir)?;
            let mut paths = Vec::with_capacity(chunk.len());
            for entry in chunk {
                paths.push(write_class_file(&scratch, entry)?);
            }
            let path_refs: Vec<&std::path::Path> = paths.iter().map(PathBuf::as_path).collect();
            let text = disassembler.disassemble(&path_refs)?;
            disasm::parse_into(&text, &label, &mut table, &mut usage, parse_options)?;
        }
    }

    Ok((table, usage, warnings))
}

fn write_class_file(scratch: &ScratchDir, entry: &ClassEntry) -> Result<PathBuf, EngineError> {
    let bytes = archive::read_entry(entry)?;
    let file_name = format!("{}.class", entry.binary_name.replace('/', "__"));
    let path = scratch.path().join(file_name);
    std::fs::write(&path, &bytes).map_err(|source| EngineError::Access { path: path.clone(), source })?;
    Ok(path)
}

/// Runs a complete two-version compatibility analysis: ingests both
/// sides, detects differences, classifies them, and decides the exit
/// code (spec §6's `strict` knob promotes `Low` to a counted problem).
///
/// # Errors
/// See [`ingest_version`].
pub fn run(
    v1_sources: &[&dyn ArchiveSource],
    v2_sources: &[&dyn ArchiveSource],
    disassembler: &dyn Disassembler,
    options: &Options,
) -> Result<Report, EngineError> {
    let rules = FilterRules { keep_internal: options.keep_internal, skip: options.skip_packages.clone(), keep: options.keep_packages.clone() };
    let parse_options = ParseOptions { quick: options.quick, check_implementation: options.check_implementation };

    let (v1_table, _v1_usage, mut warnings) =
        tracing::info_span!("ingest", version = "v1").in_scope(|| ingest_version(v1_sources, disassembler, &rules, parse_options))?;
    let (v2_table, v2_usage, v2_warnings) =
        tracing::info_span!("ingest", version = "v2").in_scope(|| ingest_version(v2_sources, disassembler, &rules, parse_options))?;
    warnings.extend(v2_warnings);

    let detection = tracing::info_span!("detect").in_scope(|| diff::detect(&v1_table, &v2_table, &v2_usage, options));
    let classified = tracing::info_span!("classify").in_scope(|| classify::classify(detection.problems, &v2_usage, options));

    let worst = classified.iter().map(|c| c.binary.max(c.source)).max().unwrap_or(Severity::Safe);
    let exit_code = if classify::counts_as_problem(worst, options.strict) { ExitCode::Incompatible } else { ExitCode::Compatible };

    tracing::info!(problem_count = classified.len(), warning_count = warnings.len(), ?exit_code, "compatibility analysis complete");

    Ok(Report { problems: classified, warnings, exit_code })
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Mutex};

    use super::*;
    use crate::archive::DirectoryArchiveSource;

    const LOG_ENV_VAR: &str = "JAPI_COMPAT_LOG";

    /// Wires the `tracing` spans this module emits to stderr when
    /// `JAPI_COMPAT_LOG` is set, so a developer can rerun a failing test
    /// with e.g. `JAPI_COMPAT_LOG=debug` and see the per-phase spans.
    fn init_test_logging() {
        if std::env::var_os(LOG_ENV_VAR).is_none() {
            return;
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_env(LOG_ENV_VAR))
            .with_test_writer()
            .try_init();
    }

    /// A [`Disassembler`] stub that returns pre-canned `javap`-style text
    /// keyed by how many files are in the batch, so tests never need a
    /// JDK on the test machine.
    struct StubDisassembler {
        outputs: Mutex<Vec<String>>,
    }

    impl StubDisassembler {
        fn new(output: impl Into<String>) -> Self {
            Self { outputs: Mutex::new(vec![output.into()]) }
        }
    }

    impl Disassembler for StubDisassembler {
        fn disassemble(&self, class_files: &[&Path]) -> Result<String, EngineError> {
            for path in class_files {
                if !path.exists() {
                    return Err(EngineError::Access { path: (*path).to_owned(), source: std::io::Error::other("missing scratch file") });
                }
            }
            Ok(self.outputs.lock().unwrap().first().cloned().unwrap_or_default())
        }
    }

    fn write_dir_with_class(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("japi-compat-engine-test-{name}-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("a")).unwrap();
        std::fs::write(dir.join("a/Widget.class"), b"\xCA\xFE\xBA\xBE").unwrap();
        dir
    }

    #[test]
    fn ingest_version_parses_disassembly_from_a_directory_source() {
        init_test_logging();
        let dir = write_dir_with_class("ingest");
        let source = DirectoryArchiveSource::new(&dir);
        let sources: Vec<&dyn ArchiveSource> = vec![&source];
        let disassembler = StubDisassembler::new(
            "public class a.Widget {\n  public void doIt();\n    descriptor: ()V\n\n}\n",
        );
        let (table, _usage, warnings) = ingest_version(&sources, &disassembler, &FilterRules::new(), ParseOptions::default()).unwrap();
        assert!(warnings.is_empty());
        let id = table.type_id("a.Widget").expect("type present");
        assert!(table.methods_of(id).any(|(_, m)| m.short_name == "doIt"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn ingest_version_warns_when_nothing_survives_filtering() {
        init_test_logging();
        let dir = std::env::temp_dir().join(format!("japi-compat-engine-test-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let source = DirectoryArchiveSource::new(&dir);
        let sources: Vec<&dyn ArchiveSource> = vec![&source];
        let disassembler = StubDisassembler::new("");
        let (_table, _usage, warnings) = ingest_version(&sources, &disassembler, &FilterRules::new(), ParseOptions::default()).unwrap();
        assert_eq!(warnings.len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn run_reports_a_removed_method_as_incompatible() {
        init_test_logging();
        let dir1 = write_dir_with_class("run-v1");
        let dir2 = write_dir_with_class("run-v2");
        let source1 = DirectoryArchiveSource::new(&dir1);
        let source2 = DirectoryArchiveSource::new(&dir2);
        let v1_sources: Vec<&dyn ArchiveSource> = vec![&source1];
        let v2_sources: Vec<&dyn ArchiveSource> = vec![&source2];

        let disassembler = StubV1V2Disassembler::new(
            "public class a.Widget {\n  public void doIt();\n    descriptor: ()V\n\n}\n",
            "public class a.Widget {\n}\n",
        );
        let options = Options::default();
        let report = run(&v1_sources, &v2_sources, &disassembler, &options).unwrap();
        assert!(report.problems.iter().any(|c| c.problem.kind == crate::diff::ProblemKind::RemovedMethod));
        assert_eq!(report.exit_code, ExitCode::Incompatible);

        std::fs::remove_dir_all(&dir1).ok();
        std::fs::remove_dir_all(&dir2).ok();
    }

    /// A [`Disassembler`] stub that alternates between two canned
    /// outputs across successive calls, modeling the v1-then-v2 call
    /// order [`run`] makes.
    struct StubV1V2Disassembler {
        outputs: Mutex<std::collections::VecDeque<String>>,
    }

    impl StubV1V2Disassembler {
        fn new(v1: impl Into<String>, v2: impl Into<String>) -> Self {
            Self { outputs: Mutex::new(std::collections::VecDeque::from([v1.into(), v2.into()])) }
        }
    }

    impl Disassembler for StubV1V2Disassembler {
        fn disassemble(&self, _class_files: &[&Path]) -> Result<String, EngineError> {
            Ok(self.outputs.lock().unwrap().pop_front().unwrap_or_default())
        }
    }
}

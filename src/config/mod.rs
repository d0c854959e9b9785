//! Run options threaded through the engine: the user-facing knobs that
//! change which problems are detected, how they're classified, and how
//! much of the affected-usage surface is rendered.

/// The tunable knobs for one compatibility run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Whether implicit-internal packages (`com.sun`, `sun`, a directory
    /// component named `internal`/`impl`/`examples`, …) are filtered out
    /// of the analysis. `true` keeps them in.
    pub keep_internal: bool,
    /// Whether a `Low` severity counts as a problem (rather than a
    /// warning) when deciding the process exit code.
    pub strict: bool,
    /// Whether usage analysis (the invocation/field-use tables built from
    /// bytecode disassembly) is skipped, trading precision for speed.
    pub quick: bool,
    /// Whether method bodies are compared for implementation-level
    /// changes, beyond the API surface.
    pub check_implementation: bool,
    /// Whether the rendered report omits the per-problem detail sections
    /// and prints only the summary.
    pub short: bool,
    /// Additional dotted package prefixes to exclude, on top of the
    /// implicit-internal rules.
    pub skip_packages: Vec<String>,
    /// Dotted package prefixes to keep even though an implicit or
    /// explicit skip rule would otherwise exclude them.
    pub keep_packages: Vec<String>,
    /// The maximum number of affected methods listed per problem before
    /// the list is truncated with a count of the remainder.
    pub affected_method_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            keep_internal: false,
            strict: false,
            quick: false,
            check_implementation: false,
            short: false,
            skip_packages: Vec::new(),
            keep_packages: Vec::new(),
            affected_method_limit: 10,
        }
    }
}

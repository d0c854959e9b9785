//! The problem classifier: assigns a binary- and source-level [`Severity`]
//! to every detected [`Problem`], applies the context-sensitive
//! downgrades, and collapses repeated emissions of the same underlying
//! type change down to their maximum severity.

mod severity_tables;

use std::collections::HashMap;

use crate::{
    config::Options,
    diff::problem::{Problem, ProblemKind},
    usage::UsageTables,
};

pub use severity_tables::{binary_severity, source_severity};

/// How severe a compatibility problem is, from least to most breaking.
/// Ordered so that `max` over a set of emissions picks the worst one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// No observable effect on conforming clients.
    Safe,
    /// A narrow, usually theoretical, breakage.
    Low,
    /// A breakage clients are likely to hit in ordinary use.
    Medium,
    /// A breakage that is certain to affect clients exercising the
    /// changed surface.
    High,
}

/// A [`Problem`] paired with its computed binary and source severities.
#[derive(Debug, Clone)]
pub struct ClassifiedProblem {
    /// The underlying problem.
    pub problem: Problem,
    /// The binary-compatibility severity.
    pub binary: Severity,
    /// The source-compatibility severity.
    pub source: Severity,
}

/// The version-stamp field-naming convention that downgrades a changed
/// constant value to [`Severity::Low`] (spec §4.3).
fn is_version_stamp_field(target: Option<&str>) -> bool {
    target.is_some_and(|name| name == "VERSION" || name == "VERNUM")
}

/// Applies the context-sensitive downgrades on top of the base table
/// lookup. `quick` mirrors [`Options::quick`]: under quick mode an
/// unreachable added-abstract-method downgrades to `Low` rather than
/// `Safe`, since usage analysis was skipped and "no caller recorded"
/// is a weaker signal.
fn downgrade_binary(problem: &Problem, base: Severity, usage_v2: &UsageTables, quick: bool) -> Severity {
    match problem.kind {
        ProblemKind::InterfaceAddedAbstractMethod | ProblemKind::AbstractClassAddedAbstractMethod => {
            let has_caller = problem
                .type_name
                .as_deref()
                .zip(problem.target.as_deref())
                .is_some_and(|(type_name, method_name)| usage_v2.first_added_invoker(type_name, method_name).is_some());
            if has_caller {
                base
            } else if quick {
                Severity::Low
            } else {
                Severity::Safe
            }
        }
        ProblemKind::InterfaceAddedSuperInterface
        | ProblemKind::AbstractClassAddedSuperInterface
        | ProblemKind::AbstractClassAddedSuperAbstractClass => {
            let reachable = problem.type_name.as_deref().is_some_and(|t| usage_v2.class_has_added_invocations(t));
            if reachable {
                base
            } else if quick {
                Severity::Low
            } else {
                Severity::Safe
            }
        }
        ProblemKind::ChangedFinalFieldValue if is_version_stamp_field(problem.target.as_deref()) => Severity::Low,
        _ => base,
    }
}

/// Source severity is unaffected by the context overrides in
/// [`downgrade_binary`]: a recompiling client never observes the
/// *reachability* of an added abstract method or the *value* a constant
/// field inlines to, only whether the shapes it depends on still exist.
fn downgrade_source(_problem: &Problem, base: Severity) -> Severity {
    base
}

/// Classifies every problem in `problems`, applying context-sensitive
/// downgrades, then collapses repeated emissions of the same `(type,
/// kind, target)` down to their maximum severity (spec §4.3 "A final
/// pass selects … the maximum severity across its occurrences").
#[must_use]
pub fn classify(problems: Vec<Problem>, usage_v2: &UsageTables, options: &Options) -> Vec<ClassifiedProblem> {
    let mut classified: Vec<ClassifiedProblem> = problems
        .into_iter()
        .map(|problem| {
            let base_binary = binary_severity(problem.kind);
            let base_source = source_severity(problem.kind);
            let binary = downgrade_binary(&problem, base_binary, usage_v2, options.quick);
            let source = downgrade_source(&problem, base_source);
            ClassifiedProblem { problem, binary, source }
        })
        .collect();

    let mut ceiling: HashMap<(String, ProblemKind, Option<String>), (Severity, Severity)> = HashMap::new();
    for c in &classified {
        let key = c.problem.ceiling_key();
        let entry = ceiling.entry(key).or_insert((Severity::Safe, Severity::Safe));
        entry.0 = entry.0.max(c.binary);
        entry.1 = entry.1.max(c.source);
    }
    for c in &mut classified {
        let key = c.problem.ceiling_key();
        if let Some(&(binary, source)) = ceiling.get(&key) {
            c.binary = binary;
            c.source = source;
        }
    }
    classified
}

/// Whether `strict` (spec §6) would treat this severity as a problem
/// rather than a warning: ordinarily only `Medium` and `High` count, but
/// `strict` additionally promotes `Low`.
#[must_use]
pub fn counts_as_problem(severity: Severity, strict: bool) -> bool {
    match severity {
        Severity::Safe => false,
        Severity::Low => strict,
        Severity::Medium | Severity::High => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::problem::Location;

    #[test]
    fn severity_ordering_supports_max() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Safe);
    }

    #[test]
    fn unreachable_added_abstract_method_downgrades_to_safe() {
        let problem = Problem::new("a.Iface.\"added\":()V", ProblemKind::InterfaceAddedAbstractMethod, Location::this())
            .with_type_name("a.Iface")
            .with_target("added");
        let usage = UsageTables::new();
        let classified = classify(vec![problem], &usage, &Options::default());
        assert_eq!(classified[0].binary, Severity::Safe);
    }

    #[test]
    fn reachable_added_abstract_method_keeps_base_severity() {
        let problem = Problem::new("a.Iface.\"added\":()V", ProblemKind::InterfaceAddedAbstractMethod, Location::this())
            .with_type_name("a.Iface")
            .with_target("added");
        let mut usage = UsageTables::new();
        usage.record_invocation("a.B.\"caller\":()V", "a.Iface", "added", "()V", false);
        let classified = classify(vec![problem], &usage, &Options::default());
        assert_eq!(classified[0].binary, binary_severity(ProblemKind::InterfaceAddedAbstractMethod));
    }

    #[test]
    fn quick_mode_downgrades_to_low_instead_of_safe() {
        let problem = Problem::new("a.Iface.\"added\":()V", ProblemKind::InterfaceAddedAbstractMethod, Location::this())
            .with_type_name("a.Iface")
            .with_target("added");
        let usage = UsageTables::new();
        let options = Options { quick: true, ..Options::default() };
        let classified = classify(vec![problem], &usage, &options);
        assert_eq!(classified[0].binary, Severity::Low);
    }

    #[test]
    fn version_field_constant_change_downgrades_to_low() {
        let problem = Problem::new("a.B.\"m\":()V", ProblemKind::ChangedFinalFieldValue, Location::this())
            .with_type_name("a.B")
            .with_target("VERSION")
            .with_values("1", "2");
        let usage = UsageTables::new();
        let classified = classify(vec![problem], &usage, &Options::default());
        assert_eq!(classified[0].binary, Severity::Low);
    }

    #[test]
    fn severity_ceiling_dedupes_across_methods() {
        let a = Problem::new("a.B.\"m\":()V", ProblemKind::ClassBecameInterface, Location::this()).with_type_name("a.B");
        let b = Problem::new("a.B.\"n\":()V", ProblemKind::ClassBecameInterface, Location::this()).with_type_name("a.B");
        let usage = UsageTables::new();
        let classified = classify(vec![a, b], &usage, &Options::default());
        assert_eq!(classified.len(), 2);
        assert_eq!(classified[0].binary, classified[1].binary);
    }

    #[test]
    fn constant_inlining_invariant_never_safe() {
        let problem = Problem::new("a.B.\"m\":()V", ProblemKind::ChangedFinalFieldValue, Location::this())
            .with_type_name("a.B")
            .with_target("LIMIT")
            .with_values("1", "2");
        let usage = UsageTables::new();
        let classified = classify(vec![problem], &usage, &Options::default());
        assert!(classified[0].binary >= Severity::Medium);
    }
}

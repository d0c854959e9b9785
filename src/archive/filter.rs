//! The archive ingestor's filter rules: applied, in order,
//! to every class file a [`super::ArchiveSource`] discovers, before it is
//! handed to the disassembler.

/// The fixed prefixes of implicit-internal packages, never analyzed
/// unless the caller explicitly asks to keep internals.
const IMPLICIT_INTERNAL_PACKAGES: &[&str] = &["com.oracle", "com.sun", "COM.rsa", "sun", "sunw"];

/// Path segments that mark a package as internal regardless of its name.
const IMPLICIT_INTERNAL_SEGMENTS: &[&str] = &["internal", "impl", "examples"];

fn has_dollar_digit(simple_name: &str) -> bool {
    simple_name
        .char_indices()
        .any(|(i, c)| c == '$' && simple_name[i + 1..].starts_with(|d: char| d.is_ascii_digit()))
}

fn simple_name(binary_name: &str) -> &str {
    binary_name.rsplit('/').next().unwrap_or(binary_name)
}

fn has_dotted_directory_component(binary_name: &str) -> bool {
    binary_name
        .rsplit_once('/')
        .is_some_and(|(dir, _)| dir.split('/').any(|segment| segment.contains('.')))
}

fn package_of_binary_name(binary_name: &str) -> String {
    binary_name.rsplit_once('/').map_or_else(String::new, |(pkg, _)| pkg.replace('/', "."))
}

fn matches_implicit_internal(binary_name: &str, package: &str) -> bool {
    IMPLICIT_INTERNAL_PACKAGES.iter().any(|p| package == *p || package.starts_with(&format!("{p}.")))
        || binary_name.split('/').any(|segment| IMPLICIT_INTERNAL_SEGMENTS.contains(&segment))
}

fn matches_any_prefix(package: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| package == p || package.starts_with(&format!("{p}.")))
}

/// The filter rules to apply when deciding whether a discovered class
/// file should be analyzed.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    /// Disables the implicit internal-package filter (rule 3), letting
    /// JDK-internal packages through.
    pub keep_internal: bool,
    /// Package-prefix blacklist: a class whose package matches is dropped.
    pub skip: Vec<String>,
    /// Package-prefix whitelist. When non-empty, a class must *also*
    /// match this list to survive (additive with `skip`).
    pub keep: Vec<String>,
}

impl FilterRules {
    /// Creates a rule set with every filter disabled except the fixed
    /// structural ones (rules 1 and 2, which are never user-configurable).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `binary_name` (e.g. `com/acme/Widget`) survives all four
    /// filter rules, applied in order.
    #[must_use]
    pub fn keeps(&self, binary_name: &str) -> bool {
        let name = simple_name(binary_name);
        if has_dollar_digit(name) {
            return false;
        }
        if has_dotted_directory_component(binary_name) {
            return false;
        }
        let package = package_of_binary_name(binary_name);
        if !self.keep_internal && matches_implicit_internal(binary_name, &package) {
            return false;
        }
        if !self.skip.is_empty() && matches_any_prefix(&package, &self.skip) {
            return false;
        }
        if !self.keep.is_empty() && !matches_any_prefix(&package, &self.keep) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_anonymous_and_local_classes() {
        let rules = FilterRules::new();
        assert!(!rules.keeps("com/acme/Widget$1"));
        assert!(!rules.keeps("com/acme/Widget$2Local"));
        assert!(rules.keeps("com/acme/Widget$Inner"));
    }

    #[test]
    fn drops_embedded_version_directories() {
        let rules = FilterRules::new();
        assert!(!rules.keeps("com/acme/v1.2/Widget"));
        assert!(rules.keeps("com/acme/v12/Widget"));
    }

    #[test]
    fn drops_implicit_internal_packages_unless_kept() {
        let rules = FilterRules::new();
        assert!(!rules.keeps("sun/misc/Unsafe"));
        assert!(!rules.keeps("com/acme/internal/Widget"));
        let kept = FilterRules { keep_internal: true, ..FilterRules::new() };
        assert!(kept.keeps("sun/misc/Unsafe"));
        assert!(kept.keeps("com/acme/internal/Widget"));
    }

    #[test]
    fn skip_and_keep_lists_are_additive() {
        let rules = FilterRules {
            skip: vec!["com.acme.legacy".to_owned()],
            keep: vec!["com.acme".to_owned()],
            ..FilterRules::new()
        };
        assert!(rules.keeps("com/acme/Widget"));
        assert!(!rules.keeps("com/acme/legacy/Widget"));
        assert!(!rules.keeps("org/other/Widget"));
    }

    #[test]
    fn filter_monotonicity_keep_internal_only_adds() {
        let skip_only = FilterRules::new();
        let with_internal = FilterRules { keep_internal: true, ..FilterRules::new() };
        for name in ["com/acme/Widget", "sun/misc/Unsafe", "com/acme/internal/Widget"] {
            if skip_only.keeps(name) {
                assert!(with_internal.keeps(name), "enabling keep-internal must never remove {name}");
            }
        }
    }

    #[test]
    fn filter_monotonicity_skip_only_removes() {
        let base = FilterRules::new();
        let with_skip = FilterRules { skip: vec!["com.acme".to_owned()], ..FilterRules::new() };
        for name in ["com/acme/Widget", "org/other/Widget"] {
            if !base.keeps(name) {
                assert!(!with_skip.keeps(name), "adding a skip list must never add {name} back");
            }
        }
    }
}

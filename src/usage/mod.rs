//! The usage recorder: tracks,
//! per version, which methods invoke which other methods, which added
//! abstract methods are actually exercised, and — optionally — which
//! fields a method body touches.

use std::collections::{BTreeSet, HashMap};

/// Invocation targets under these binary-name prefixes are ignored, per
/// JDK core-library calls carry no information about the
/// *analyzed* library's API shape, and `<init>` calls are tracked through
/// constructor resolution rather than usage recording.
const IGNORED_TARGET_PREFIXES: &[&str] = &["java/lang/", "java/util/", "java/io/"];

fn is_ignored_target(owner: &str, name: &str) -> bool {
    name == "<init>" || IGNORED_TARGET_PREFIXES.iter().any(|p| owner.starts_with(p))
}

/// The three usage tables for one version.
#[derive(Debug, Default)]
pub struct UsageTables {
    /// invoked-method id (`owner."name":descriptor`) → callers.
    invoked_by: HashMap<String, BTreeSet<String>>,
    /// target class name → invoked method name → callers, restricted to
    /// invocations that resolved to a method not declared directly on
    /// the nominal target class.
    added_invoked_by_class: HashMap<String, HashMap<String, BTreeSet<String>>>,
    /// field id (`owner.name:descriptor`) → callers. Populated only when
    /// implementation-level (field-use) checking is enabled.
    field_used_by: HashMap<String, BTreeSet<String>>,
}

impl UsageTables {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `caller` invokes `owner."name":descriptor`. When the
    /// invocation did not resolve to a method declared directly on
    /// `owner` (`resolved_on_declaring_class` is `false`), also records it
    /// in [`Self::added_invokers_of`] under `owner`/`name` — this is how
    /// the classifier later tells whether a newly added abstract method
    /// is actually reachable.
    pub fn record_invocation(
        &mut self,
        caller: &str,
        owner: &str,
        name: &str,
        descriptor: &str,
        resolved_on_declaring_class: bool,
    ) {
        if is_ignored_target(owner, name) {
            return;
        }
        let callee_id = format!("{owner}.\"{name}\":{descriptor}");
        self.invoked_by
            .entry(callee_id)
            .or_default()
            .insert(caller.to_owned());
        if !resolved_on_declaring_class {
            self.added_invoked_by_class
                .entry(owner.to_owned())
                .or_default()
                .entry(name.to_owned())
                .or_default()
                .insert(caller.to_owned());
        }
    }

    /// Records that `caller`'s body reads or writes `owner.name:descriptor`.
    pub fn record_field_use(&mut self, caller: &str, owner: &str, name: &str, descriptor: &str) {
        let field_id = format!("{owner}.{name}:{descriptor}");
        self.field_used_by
            .entry(field_id)
            .or_default()
            .insert(caller.to_owned());
    }

    /// Every caller recorded for `owner."name":descriptor`.
    #[must_use]
    pub fn callers_of(&self, owner: &str, name: &str, descriptor: &str) -> Option<&BTreeSet<String>> {
        self.invoked_by.get(&format!("{owner}.\"{name}\":{descriptor}"))
    }

    /// Whether any caller was recorded for `owner."name":descriptor`.
    #[must_use]
    pub fn has_caller(&self, owner: &str, name: &str, descriptor: &str) -> bool {
        self.callers_of(owner, name, descriptor).is_some_and(|c| !c.is_empty())
    }

    /// Whether `class` has any entries at all in the added-invocation
    /// table — used to downgrade `Interface_Added_Super_Interface` and
    /// related super-type additions when nothing in the analyzed set
    /// actually reaches the new supertype's members.
    #[must_use]
    pub fn class_has_added_invocations(&self, class: &str) -> bool {
        self.added_invoked_by_class
            .get(class)
            .is_some_and(|by_name| by_name.values().any(|c| !c.is_empty()))
    }

    /// The first caller (by sorted order, for determinism) recorded for
    /// `class`'s added-method usage, used to populate a problem's
    /// `add_effect` narrative.
    #[must_use]
    pub fn first_added_invoker(&self, class: &str, method_name: &str) -> Option<&str> {
        self.added_invoked_by_class
            .get(class)?
            .get(method_name)?
            .iter()
            .next()
            .map(String::as_str)
    }

    /// The first caller (by sorted order) recorded for *any* added-method
    /// usage of `class`, used to narrate a type-level addition (a gained
    /// abstract superclass or interface) that is not tied to one
    /// specific method name.
    #[must_use]
    pub fn any_added_invoker(&self, class: &str) -> Option<&str> {
        self.added_invoked_by_class
            .get(class)?
            .values()
            .flatten()
            .next()
            .map(String::as_str)
    }

    /// Every caller recorded for `owner.name:descriptor`.
    #[must_use]
    pub fn field_callers(&self, owner: &str, name: &str, descriptor: &str) -> Option<&BTreeSet<String>> {
        self.field_used_by.get(&format!("{owner}.{name}:{descriptor}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jdk_core_invocations_are_ignored() {
        let mut usage = UsageTables::new();
        usage.record_invocation("a.B.\"m\":()V", "java/util/List", "add", "(Ljava/lang/Object;)Z", true);
        assert!(usage.callers_of("java/util/List", "add", "(Ljava/lang/Object;)Z").is_none());
    }

    #[test]
    fn init_invocations_are_ignored() {
        let mut usage = UsageTables::new();
        usage.record_invocation("a.B.\"m\":()V", "a.C", "<init>", "()V", true);
        assert!(usage.callers_of("a.C", "<init>", "()V").is_none());
    }

    #[test]
    fn non_declaring_invocations_feed_added_invoked_by_class() {
        let mut usage = UsageTables::new();
        usage.record_invocation("a.B.\"caller\":()V", "a.Iface", "target", "()V", false);
        assert!(usage.class_has_added_invocations("a.Iface"));
        assert_eq!(usage.first_added_invoker("a.Iface", "target"), Some("a.B.\"caller\":()V"));
    }

    #[test]
    fn declaring_invocations_do_not_feed_added_invoked_by_class() {
        let mut usage = UsageTables::new();
        usage.record_invocation("a.B.\"caller\":()V", "a.Iface", "target", "()V", true);
        assert!(!usage.class_has_added_invocations("a.Iface"));
    }
}

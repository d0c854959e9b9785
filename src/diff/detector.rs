//! The difference detector: three passes over a pair of symbol tables —
//! added methods, removed methods, and the merge of methods present in
//! both versions — producing the raw [`Problem`] set that
//! [`crate::classify`] then assigns severities to.
//!
//! Pass A and Pass B also build the per-class added/removed abstract
//! method sets that [`super::type_merge`] consults when it attributes a
//! type-level abstract-method change to the owning class.

use std::collections::{HashMap, HashSet};

use crate::{
    config::Options,
    diff::{
        problem::{Location, Problem, ProblemKind},
        type_merge::{AbstractMethodSets, TypeMergeContext},
    },
    model::{
        symbol::{Access, Method, TypeKind},
        version::MethodId,
        SymbolTable, TypeId,
    },
    usage::UsageTables,
};

/// The fixed whitelist of unchecked (`RuntimeException`/`Error`) types
/// recognized by name alone, per spec §4.3 step 3: a thrown type is
/// unchecked if it is in this list, *or* its direct superclass resolves
/// to `java.lang.RuntimeException` in the same version.
const UNCHECKED_EXCEPTION_WHITELIST: &[&str] = &[
    "java.lang.RuntimeException",
    "java.lang.Error",
    "java.lang.NullPointerException",
    "java.lang.ClassCastException",
    "java.lang.IllegalArgumentException",
    "java.lang.IllegalStateException",
    "java.lang.IndexOutOfBoundsException",
    "java.lang.ArrayIndexOutOfBoundsException",
    "java.lang.StringIndexOutOfBoundsException",
    "java.lang.UnsupportedOperationException",
    "java.lang.NumberFormatException",
    "java.lang.ArithmeticException",
    "java.lang.NegativeArraySizeException",
    "java.lang.ArrayStoreException",
    "java.lang.ConcurrentModificationException",
    "java.lang.SecurityException",
    "java.lang.AssertionError",
    "java.lang.OutOfMemoryError",
    "java.lang.StackOverflowError",
    "java.lang.LinkageError",
    "java.lang.NoClassDefFoundError",
    "java.lang.ExceptionInInitializerError",
    "java.lang.NoSuchMethodError",
    "java.lang.NoSuchFieldError",
    "java.lang.VirtualMachineError",
    "java.lang.AbstractMethodError",
];

/// Whether `type_id` (in `table`) is an unchecked exception per spec
/// §4.3/GLOSSARY: in the fixed whitelist, or its direct superclass is
/// named `java.lang.RuntimeException` in this same version's table.
#[must_use]
pub fn is_unchecked_exception(table: &SymbolTable, type_id: TypeId) -> bool {
    let name = table.name_of(type_id);
    if UNCHECKED_EXCEPTION_WHITELIST.contains(&name) {
        return true;
    }
    table
        .type_(type_id)
        .super_class
        .is_some_and(|sup| table.name_of(sup) == "java.lang.RuntimeException")
}

/// The outcome of running all three detector passes plus the class-level
/// type merge backstop: the flat problem set, and the bookkeeping sets a
/// source-level report (out of scope for this crate) would need to
/// suppress `Added_Method`/`Removed_Method` entries for methods already
/// reported as a return-type change.
#[derive(Debug, Default)]
pub struct DetectionResult {
    /// Every problem found across all passes.
    pub problems: Vec<Problem>,
    /// Canonical ids of methods (on both sides) that participate in a
    /// `Changed_Method_Return_From_Void` pairing — suppressed from
    /// Added/Removed sections of a source-level report.
    pub changed_return_from_void: HashSet<String>,
}

fn owner_name(table: &SymbolTable, method: &Method) -> String {
    table.name_of(method.class).to_owned()
}

fn is_effectively_private(table: &SymbolTable, method: &Method) -> bool {
    method.access == Access::Private || table.type_(method.class).access == Access::Private
}

/// An index from `(owning class name, short name, descriptor text)` to
/// the method id, built once per version so passes A/B/C can look up a
/// counterpart by name rather than by id (ids are never comparable
/// across versions).
fn build_index(table: &SymbolTable) -> HashMap<(String, String, String), MethodId> {
    table
        .all_methods()
        .map(|(id, m)| ((owner_name(table, m), m.short_name.clone(), m.descriptor.to_string()), id))
        .collect()
}

/// Walks `class`'s supertypes in `table`, returning the first method
/// found declared on one of them matching `short_name`/`descriptor`.
fn find_on_supertypes(table: &SymbolTable, class: TypeId, short_name: &str, descriptor: &str) -> Option<(TypeId, MethodId)> {
    table
        .supertypes(class)
        .into_iter()
        .find_map(|sup| table.find_method(sup, short_name, descriptor).map(|id| (sup, id)))
}

/// Pass A: methods present only in v2.
fn pass_added(
    v1: &SymbolTable,
    v2: &SymbolTable,
    v1_index: &HashMap<(String, String, String), MethodId>,
    added_abstract: &mut AbstractMethodSets,
    changed_return_from_void: &mut HashSet<String>,
    problems: &mut Vec<Problem>,
) {
    for (method_id, method) in v2.all_methods() {
        if is_effectively_private(v2, method) {
            continue;
        }
        let class_name = owner_name(v2, method);
        let key = (class_name.clone(), method.short_name.clone(), method.descriptor.to_string());
        if v1_index.contains_key(&key) {
            continue;
        }

        // Special case: a void-returning v1 method with the same name and
        // parameters becoming non-void in v2.
        if let Some(void_pair) = find_void_to_value_pair(v1, v2, &class_name, method) {
            let (v1_method_id, v1_method) = void_pair;
            let v1_canonical = v1_method.canonical_id(&class_name);
            let v2_canonical = method.canonical_id(&class_name);
            changed_return_from_void.insert(v1_canonical.clone());
            changed_return_from_void.insert(v2_canonical);
            problems.push(Problem::new(v1_canonical, ProblemKind::ChangedMethodReturnFromVoid, Location::this()).with_type_name(&class_name));
            let _ = v1_method_id;
            continue;
        }

        // Special case: overrides a method declared on a v2 supertype that
        // already existed (by name) in v1.
        if let Some(overridden_id) = find_overridden_on_existing_supertype(v1, v2, method) {
            let overridden = v1.method(overridden_id);
            let owner = owner_name(v1, overridden);
            problems.push(
                Problem::new(overridden.canonical_id(&owner), ProblemKind::ClassOverriddenMethod, Location::this())
                    .with_type_name(&owner)
                    .with_target(method.short_name.clone()),
            );
            continue;
        }

        problems.push(
            Problem::new(method.canonical_id(&class_name), ProblemKind::AddedMethod, Location::this())
                .with_type_name(&class_name)
                .with_target(method.short_name.clone()),
        );
        if method.is_abstract && method.access.is_externally_visible() {
            added_abstract.entry(class_name).or_default().push(method.short_name.clone());
        }
        let _ = method_id;
    }
}

fn find_void_to_value_pair<'a>(v1: &'a SymbolTable, v2: &SymbolTable, class_name: &str, v2_method: &Method) -> Option<(MethodId, &'a Method)> {
    if v2_method.return_type.is_none() || v2_method.is_constructor {
        return None;
    }
    let class1 = v1.type_id(class_name)?;
    v1.methods_of(class1)
        .find(|(_, m)| {
            m.short_name == v2_method.short_name
                && m.return_type.is_none()
                && !m.is_constructor
                && same_parameter_descriptors(v1, v2, &m.parameters, &v2_method.parameters)
        })
        .map(|(id, _)| (id, v1.method(id)))
}

fn same_parameter_descriptors(
    v1: &SymbolTable,
    v2: &SymbolTable,
    params1: &[crate::model::symbol::Parameter],
    params2: &[crate::model::symbol::Parameter],
) -> bool {
    params1.len() == params2.len()
        && params1
            .iter()
            .zip(params2)
            .all(|(p1, p2)| v1.name_of(p1.param_type) == v2.name_of(p2.param_type))
}

/// Whether `method` (declared in v2) overrides a same-signature method
/// declared directly on one of its v2 supertypes whose name is also
/// present (archive-backed) in v1 — i.e. the override target is not
/// itself new in this release.
fn find_overridden_on_existing_supertype(v1: &SymbolTable, v2: &SymbolTable, method: &Method) -> Option<MethodId> {
    let (super_type, super_method_id) = find_on_supertypes(v2, method.class, &method.short_name, &method.descriptor.to_string())?;
    let super_name = v2.name_of(super_type);
    let v1_super = v1.type_id(super_name)?;
    if v1.type_(v1_super).archive.is_none() {
        return None;
    }
    let super_method = v2.method(super_method_id);
    v1.find_method(v1_super, &super_method.short_name, &super_method.descriptor.to_string())
}

/// Pass B: methods present only in v1.
fn pass_removed(
    v1: &SymbolTable,
    v2: &SymbolTable,
    v2_index: &HashMap<(String, String, String), MethodId>,
    removed_abstract: &mut AbstractMethodSets,
    problems: &mut Vec<Problem>,
) {
    for (_method_id, method) in v1.all_methods() {
        if is_effectively_private(v1, method) {
            continue;
        }
        let class_name = owner_name(v1, method);
        let key = (class_name.clone(), method.short_name.clone(), method.descriptor.to_string());
        if v2_index.contains_key(&key) {
            continue;
        }

        if !method.is_abstract && v1.type_(method.class).is_class() {
            if let Some(class2) = v2.type_id(&class_name) {
                if v2.type_(class2).is_class() {
                    let moved = find_on_supertypes(v2, class2, &method.short_name, &method.descriptor.to_string())
                        .is_some_and(|(_, id)| !v2.method(id).is_abstract);
                    if moved {
                        problems.push(
                            Problem::new(method.canonical_id(&class_name), ProblemKind::ClassMethodMovedUpHierarchy, Location::this())
                                .with_type_name(&class_name)
                                .with_target(method.short_name.clone()),
                        );
                        continue;
                    }
                }
            }
        }

        problems.push(
            Problem::new(method.canonical_id(&class_name), ProblemKind::RemovedMethod, Location::this())
                .with_type_name(&class_name)
                .with_target(method.short_name.clone()),
        );
        if method.is_abstract && method.access.is_externally_visible() {
            removed_abstract.entry(class_name).or_default().push(method.short_name.clone());
        }
    }
}

fn access_transition_problem(m1: &Method, m2: &Method) -> Option<ProblemKind> {
    match (m1.is_static, m2.is_static) {
        (false, true) => return Some(ProblemKind::MethodBecameStatic),
        (true, false) => return Some(ProblemKind::MethodBecameNonStatic),
        _ => {}
    }
    None
}

/// Pass C: methods present, with public or protected access, in both
/// versions. Emits attribute-transition problems directly, and recurses
/// into [`TypeMergeContext`] for receiver/parameter/return structural
/// changes.
#[allow(clippy::too_many_arguments)]
fn pass_merge(
    v1: &SymbolTable,
    v2: &SymbolTable,
    v1_index: &HashMap<(String, String, String), MethodId>,
    v2_index: &HashMap<(String, String, String), MethodId>,
    ctx: &TypeMergeContext<'_>,
    class_became_abstract_seen: &mut HashSet<String>,
    problems: &mut Vec<Problem>,
) {
    for ((class_name, short_name, descriptor), &m1_id) in v1_index {
        let Some(&m2_id) = v2_index.get(&(class_name.clone(), short_name.clone(), descriptor.clone())) else {
            continue;
        };
        let m1 = v1.method(m1_id);
        let m2 = v2.method(m2_id);
        if !m1.access.is_externally_visible() || !m2.access.is_externally_visible() {
            continue;
        }

        let owner1 = m1.class;
        if !m1.is_static && !v1.is_externally_constructible(owner1) {
            continue;
        }

        let method_id = m1.canonical_id(class_name);

        if let Some(kind) = access_transition_problem(m1, m2) {
            problems.push(Problem::new(method_id.clone(), kind, Location::this()).with_type_name(class_name));
        }
        if !m1.is_synchronized && m2.is_synchronized {
            problems.push(Problem::new(method_id.clone(), ProblemKind::MethodBecameSynchronized, Location::this()).with_type_name(class_name));
        }
        if m1.is_synchronized && !m2.is_synchronized {
            problems.push(Problem::new(method_id.clone(), ProblemKind::MethodBecameNonSynchronized, Location::this()).with_type_name(class_name));
        }
        if !m1.is_final && m2.is_final {
            let kind = if m1.is_static { ProblemKind::StaticMethodBecameFinal } else { ProblemKind::NonStaticMethodBecameFinal };
            problems.push(Problem::new(method_id.clone(), kind, Location::this()).with_type_name(class_name));
        }
        if m2.access > m1.access {
            problems.push(Problem::new(method_id.clone(), ProblemKind::ChangedMethodAccess, Location::this()).with_type_name(class_name));
        }
        if v1.type_(owner1).is_class() {
            if !m1.is_abstract && m2.is_abstract {
                problems.push(Problem::new(method_id.clone(), ProblemKind::MethodBecameAbstract, Location::this()).with_type_name(class_name));
                if class_became_abstract_seen.insert(class_name.clone()) {
                    problems.push(
                        Problem::new(method_id.clone(), ProblemKind::ClassMethodBecameAbstract, Location::this()).with_type_name(class_name),
                    );
                }
            }
            if m1.is_abstract && !m2.is_abstract {
                problems.push(Problem::new(method_id.clone(), ProblemKind::MethodBecameNonAbstract, Location::this()).with_type_name(class_name));
            }
        }

        push_exception_deltas(v1, v2, m1, m2, class_name, &method_id, problems);

        for (i, (p1, p2)) in m1.parameters.iter().zip(&m2.parameters).enumerate() {
            for template in ctx.merge(p1.param_type, p2.param_type).iter() {
                let base = Location::parameter(i);
                problems.push(template.instantiate(&method_id, &base));
            }
        }

        for template in ctx.merge(owner1, m2.class).iter() {
            problems.push(template.instantiate(&method_id, &Location::this()));
        }

        if let (Some(r1), Some(r2)) = (m1.return_type, m2.return_type) {
            for template in ctx.merge(r1, r2).iter() {
                problems.push(template.instantiate(&method_id, &Location::return_value()));
            }
        }
    }
}

fn push_exception_deltas(v1: &SymbolTable, v2: &SymbolTable, m1: &Method, m2: &Method, class_name: &str, method_id: &str, problems: &mut Vec<Problem>) {
    let names1: HashMap<&str, TypeId> = m1.exceptions.iter().map(|&id| (v1.name_of(id), id)).collect();
    let names2: HashMap<&str, TypeId> = m2.exceptions.iter().map(|&id| (v2.name_of(id), id)).collect();
    let both_non_abstract = !m1.is_abstract && !m2.is_abstract;

    for (&name, &id) in &names2 {
        if names1.contains_key(name) {
            continue;
        }
        if is_unchecked_exception(v2, id) {
            if both_non_abstract {
                problems.push(Problem::new(method_id.to_owned(), ProblemKind::AddedUncheckedException, Location::this()).with_type_name(class_name).with_target(name));
            }
        } else {
            let kind = if m2.is_abstract { ProblemKind::AbstractMethodAddedCheckedException } else { ProblemKind::NonAbstractMethodAddedCheckedException };
            problems.push(Problem::new(method_id.to_owned(), kind, Location::this()).with_type_name(class_name).with_target(name));
        }
    }
    for (&name, &id) in &names1 {
        if names2.contains_key(name) {
            continue;
        }
        if is_unchecked_exception(v1, id) {
            if both_non_abstract {
                problems.push(Problem::new(method_id.to_owned(), ProblemKind::RemovedUncheckedException, Location::this()).with_type_name(class_name).with_target(name));
            }
        } else {
            let kind = if m1.is_abstract { ProblemKind::AbstractMethodRemovedCheckedException } else { ProblemKind::NonAbstractMethodRemovedCheckedException };
            problems.push(Problem::new(method_id.to_owned(), kind, Location::this()).with_type_name(class_name).with_target(name));
        }
    }
}

/// Emits type-level structural problems for every type present (by name)
/// in both versions, stamped at a synthetic per-class method id rooted
/// at `this`. This is a backstop independent of Pass C's per-method
/// merges: a type whose entire method surface was replaced (e.g. a class
/// that became an interface, dropping its constructor) would otherwise
/// never have a method pairing to hang its receiver merge off of.
fn class_level_backstop(v1: &SymbolTable, v2: &SymbolTable, ctx: &TypeMergeContext<'_>, problems: &mut Vec<Problem>) {
    for (t1, ty1) in v1.types() {
        if ty1.archive.is_none() || ty1.kind == TypeKind::Array || ty1.kind == TypeKind::Primitive {
            continue;
        }
        let Some(t2) = v2.type_id(&ty1.name) else { continue };
        if v2.type_(t2).archive.is_none() {
            continue;
        }
        let synthetic_id = format!("{}.<type>:()V", ty1.name);
        for template in ctx.merge(t1, t2).iter() {
            problems.push(template.instantiate(&synthetic_id, &Location::this()));
        }
    }
}

/// Runs all three detector passes plus the class-level backstop,
/// returning the complete (unclassified) problem set.
#[must_use]
pub fn detect(v1: &SymbolTable, v2: &SymbolTable, usage_v2: &UsageTables, _options: &Options) -> DetectionResult {
    let v1_index = build_index(v1);
    let v2_index = build_index(v2);

    let mut added_abstract = AbstractMethodSets::new();
    let mut removed_abstract = AbstractMethodSets::new();
    let mut changed_return_from_void = HashSet::new();
    let mut problems = Vec::new();

    pass_added(v1, v2, &v1_index, &mut added_abstract, &mut changed_return_from_void, &mut problems);
    pass_removed(v1, v2, &v2_index, &mut removed_abstract, &mut problems);

    let ctx = TypeMergeContext::new(v1, v2, &added_abstract, &removed_abstract, usage_v2);
    let mut class_became_abstract_seen = HashSet::new();
    pass_merge(v1, v2, &v1_index, &v2_index, &ctx, &mut class_became_abstract_seen, &mut problems);
    class_level_backstop(v1, v2, &ctx, &mut problems);

    DetectionResult { problems, changed_return_from_void }
}

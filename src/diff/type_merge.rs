//! `merge_types`: the recursive, memoized structural comparison between a
//! v1 type and its same-named v2 counterpart. Invoked from the receiver,
//! parameter, and return merges in [`super::detector`], and recursively
//! from itself through array element types and field types.
//!
//! Every structural difference is cached per `(t1, t2)` pair as a
//! [`ProblemTemplate`] — a [`crate::diff::problem::Problem`] without a
//! method id or location attached yet. A call site stamps the template
//! with the method it was reached through and the [`Location`] (`this`,
//! `RetVal`, a parameter index, optionally extended with a field path)
//! once it receives the cached result, so the same underlying type change
//! is computed once regardless of how many methods mention the type.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use crate::{
    diff::problem::{Location, Problem, ProblemKind},
    model::{interner::TypeId, symbol::TypeKind, SymbolTable},
    usage::UsageTables,
};

/// A [`Problem`] with its `method_id` and [`Location`] not yet filled in;
/// produced by [`merge_types`] and instantiated once per call site.
#[derive(Debug, Clone)]
pub struct ProblemTemplate {
    kind: ProblemKind,
    type_name: Option<String>,
    target: Option<String>,
    old_value: Option<String>,
    new_value: Option<String>,
    add_effect: Option<String>,
    /// Nested field path to append to the call site's location (e.g. a
    /// field named `inner` within the touched type).
    sub_path: Vec<String>,
}

impl ProblemTemplate {
    fn new(kind: ProblemKind) -> Self {
        Self {
            kind,
            type_name: None,
            target: None,
            old_value: None,
            new_value: None,
            add_effect: None,
            sub_path: Vec::new(),
        }
    }

    #[must_use]
    fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    #[must_use]
    fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    #[must_use]
    fn with_values(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_value = Some(old.into());
        self.new_value = Some(new.into());
        self
    }

    #[must_use]
    fn with_add_effect(mut self, effect: impl Into<String>) -> Self {
        self.add_effect = Some(effect.into());
        self
    }

    #[must_use]
    fn nested(mut self, field_name: impl Into<String>) -> Self {
        self.sub_path.insert(0, field_name.into());
        self
    }

    /// Stamps this template with the method and base location it was
    /// reached through, producing a concrete [`Problem`].
    #[must_use]
    pub fn instantiate(&self, method_id: &str, base: &Location) -> Problem {
        let mut location = base.clone();
        for segment in &self.sub_path {
            location = location.field(segment.clone());
        }
        let mut problem = Problem::new(method_id.to_owned(), self.kind, location);
        problem.type_name = self.type_name.clone();
        problem.target = self.target.clone();
        problem.old_value = self.old_value.clone();
        problem.new_value = self.new_value.clone();
        problem.add_effect = self.add_effect.clone();
        problem
    }
}

/// Per-class sets of abstract method short names gained or lost between
/// versions, keyed by canonical type name. Built by
/// [`super::detector`]'s Pass A/B and consulted here so a type-level
/// merge can emit the one problem per class that Pass A/B deferred.
pub type AbstractMethodSets = HashMap<String, Vec<String>>;

/// Holds the two symbol tables and the memoization/cycle-guard state for
/// one differencing run. `merge` is the entry point; everything else is
/// a private recursive step.
pub struct TypeMergeContext<'a> {
    v1: &'a SymbolTable,
    v2: &'a SymbolTable,
    added_abstract: &'a AbstractMethodSets,
    removed_abstract: &'a AbstractMethodSets,
    usage_v2: &'a UsageTables,
    cache: RefCell<HashMap<(TypeId, TypeId), Rc<Vec<ProblemTemplate>>>>,
    visiting: RefCell<HashSet<(TypeId, TypeId)>>,
}

impl<'a> TypeMergeContext<'a> {
    /// Creates a merge context over `v1`/`v2`'s symbol tables.
    #[must_use]
    pub fn new(
        v1: &'a SymbolTable,
        v2: &'a SymbolTable,
        added_abstract: &'a AbstractMethodSets,
        removed_abstract: &'a AbstractMethodSets,
        usage_v2: &'a UsageTables,
    ) -> Self {
        Self {
            v1,
            v2,
            added_abstract,
            removed_abstract,
            usage_v2,
            cache: RefCell::new(HashMap::new()),
            visiting: RefCell::new(HashSet::new()),
        }
    }

    /// Merges `t1` (a v1 type) against `t2` (its v2 counterpart),
    /// returning every structural [`ProblemTemplate`] found. Memoized and
    /// cycle-guarded on `(t1, t2)`: a revisit (mutually recursive types)
    /// short-circuits to an empty result rather than looping.
    #[must_use]
    pub fn merge(&self, t1: TypeId, t2: TypeId) -> Rc<Vec<ProblemTemplate>> {
        let key = (t1, t2);
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Rc::clone(cached);
        }
        if !self.visiting.borrow_mut().insert(key) {
            return Rc::new(Vec::new());
        }
        let result = self.merge_uncached(t1, t2);
        self.visiting.borrow_mut().remove(&key);
        let rc = Rc::new(result);
        self.cache.borrow_mut().insert(key, Rc::clone(&rc));
        rc
    }

    fn merge_uncached(&self, t1: TypeId, t2: TypeId) -> Vec<ProblemTemplate> {
        let ty1 = self.v1.type_(t1);
        let ty2 = self.v2.type_(t2);

        if ty1.name != ty2.name {
            return Vec::new();
        }
        // A type with no archive is synthetic (a primitive, or resolved
        // only by reference) and carries no comparable API surface.
        if ty1.archive.is_none() || ty2.archive.is_none() {
            return Vec::new();
        }
        if !self.v1.is_externally_constructible(t1) {
            return Vec::new();
        }

        if ty1.kind == TypeKind::Array {
            return match (ty1.base_type, ty2.base_type) {
                (Some(b1), Some(b2)) => (*self.merge(b1, b2)).clone(),
                _ => Vec::new(),
            };
        }

        let mut out = Vec::new();
        self.push_kind_transition(ty1, ty2, &mut out);
        self.push_modifier_transitions(ty1, ty2, &mut out);
        self.push_abstract_method_propagation(ty1, ty2, &mut out);
        self.push_super_class_deltas(ty1, ty2, &mut out);
        self.push_super_interface_deltas(ty1, ty2, &mut out);
        self.push_field_deltas(ty1, ty2, &mut out);
        out
    }

    fn push_kind_transition(
        &self,
        ty1: &crate::model::Type,
        ty2: &crate::model::Type,
        out: &mut Vec<ProblemTemplate>,
    ) {
        match (ty1.kind, ty2.kind) {
            (TypeKind::Class, TypeKind::Interface) => {
                out.push(ProblemTemplate::new(ProblemKind::ClassBecameInterface).with_type_name(&ty1.name));
            }
            (TypeKind::Interface, TypeKind::Class) => {
                out.push(ProblemTemplate::new(ProblemKind::InterfaceBecameClass).with_type_name(&ty1.name));
            }
            _ => {}
        }
    }

    fn push_modifier_transitions(
        &self,
        ty1: &crate::model::Type,
        ty2: &crate::model::Type,
        out: &mut Vec<ProblemTemplate>,
    ) {
        if ty1.kind != TypeKind::Class || ty2.kind != TypeKind::Class {
            return;
        }
        if !ty1.is_final && ty2.is_final {
            out.push(ProblemTemplate::new(ProblemKind::ClassBecameFinal).with_type_name(&ty1.name));
        }
        if ty1.is_final && !ty2.is_final {
            out.push(ProblemTemplate::new(ProblemKind::ClassBecameNonFinal).with_type_name(&ty1.name));
        }
        if !ty1.is_abstract && ty2.is_abstract {
            out.push(ProblemTemplate::new(ProblemKind::ClassBecameAbstract).with_type_name(&ty1.name));
        }
        if ty1.is_abstract && !ty2.is_abstract {
            out.push(ProblemTemplate::new(ProblemKind::ClassBecameNonAbstract).with_type_name(&ty1.name));
        }
    }

    fn push_abstract_method_propagation(
        &self,
        ty1: &crate::model::Type,
        ty2: &crate::model::Type,
        out: &mut Vec<ProblemTemplate>,
    ) {
        if let Some(added) = self.added_abstract.get(&ty2.name) {
            for method_name in added {
                let kind = if ty2.kind == TypeKind::Interface {
                    ProblemKind::InterfaceAddedAbstractMethod
                } else if ty2.is_abstract {
                    ProblemKind::AbstractClassAddedAbstractMethod
                } else {
                    ProblemKind::NonAbstractClassAddedAbstractMethod
                };
                let mut template = ProblemTemplate::new(kind).with_type_name(&ty2.name).with_target(method_name.clone());
                if let Some(caller) = self.usage_v2.first_added_invoker(&ty2.name, method_name) {
                    template = template.with_add_effect(caller.to_owned());
                }
                out.push(template);
            }
        }
        if let Some(removed) = self.removed_abstract.get(&ty1.name) {
            for method_name in removed {
                let kind = if ty1.kind == TypeKind::Interface {
                    ProblemKind::InterfaceRemovedAbstractMethod
                } else {
                    ProblemKind::ClassRemovedAbstractMethod
                };
                out.push(ProblemTemplate::new(kind).with_type_name(&ty1.name).with_target(method_name.clone()));
            }
        }
    }

    fn push_super_class_deltas(
        &self,
        ty1: &crate::model::Type,
        ty2: &crate::model::Type,
        out: &mut Vec<ProblemTemplate>,
    ) {
        if ty1.kind != TypeKind::Class {
            return;
        }
        let super1 = ty1.super_class.map(|id| self.v1.name_of(id).to_owned());
        let super2 = ty2.super_class.map(|id| self.v2.name_of(id).to_owned());
        match (&super1, &super2) {
            (None, Some(s2)) => {
                out.push(ProblemTemplate::new(ProblemKind::AddedSuperClass).with_type_name(&ty1.name).with_target(s2.clone()));
            }
            (Some(s1), None) => {
                out.push(ProblemTemplate::new(ProblemKind::RemovedSuperClass).with_type_name(&ty1.name).with_target(s1.clone()));
            }
            (Some(s1), Some(s2)) if s1 != s2 => {
                out.push(
                    ProblemTemplate::new(ProblemKind::ChangedSuperClass)
                        .with_type_name(&ty1.name)
                        .with_values(s1.clone(), s2.clone()),
                );
                let super2_is_abstract = ty2.super_class.is_some_and(|id| self.v2.type_(id).is_abstract);
                if ty1.is_abstract && super2_is_abstract {
                    let mut template = ProblemTemplate::new(ProblemKind::AbstractClassAddedSuperAbstractClass)
                        .with_type_name(&ty1.name)
                        .with_target(s2.clone());
                    if let Some(caller) = self.usage_v2.any_added_invoker(&ty1.name) {
                        template = template.with_add_effect(caller.to_owned());
                    }
                    out.push(template);
                }
            }
            _ => {}
        }
    }

    fn interface_has_abstract_methods(&self, iface: TypeId) -> bool {
        self.v2.methods_of(iface).any(|(_, m)| m.is_abstract)
    }

    fn push_super_interface_deltas(
        &self,
        ty1: &crate::model::Type,
        ty2: &crate::model::Type,
        out: &mut Vec<ProblemTemplate>,
    ) {
        let names1: HashSet<&str> = ty1.super_interfaces.iter().map(|&id| self.v1.name_of(id)).collect();
        let names2: HashSet<&str> = ty2.super_interfaces.iter().map(|&id| self.v2.name_of(id)).collect();

        for &iface2 in &ty2.super_interfaces {
            let name = self.v2.name_of(iface2);
            if names1.contains(name) {
                continue;
            }
            let has_abstract = self.interface_has_abstract_methods(iface2);
            if ty1.kind == TypeKind::Interface {
                let kind = if has_abstract {
                    ProblemKind::InterfaceAddedSuperInterface
                } else {
                    ProblemKind::InterfaceAddedSuperConstantInterface
                };
                out.push(ProblemTemplate::new(kind).with_type_name(&ty1.name).with_target(name.to_owned()));
            } else if ty1.kind == TypeKind::Class && ty1.is_abstract {
                let mut template = ProblemTemplate::new(ProblemKind::AbstractClassAddedSuperInterface)
                    .with_type_name(&ty1.name)
                    .with_target(name.to_owned());
                if let Some(caller) = self.usage_v2.any_added_invoker(&ty1.name) {
                    template = template.with_add_effect(caller.to_owned());
                }
                out.push(template);
            }
        }

        for &iface1 in &ty1.super_interfaces {
            let name = self.v1.name_of(iface1);
            if !names2.contains(name) {
                out.push(ProblemTemplate::new(ProblemKind::InterfaceRemovedSuperInterface).with_type_name(&ty1.name).with_target(name.to_owned()));
            }
        }
    }

    fn push_field_deltas(&self, ty1: &crate::model::Type, ty2: &crate::model::Type, out: &mut Vec<ProblemTemplate>) {
        let mut renamed_targets = HashSet::new();

        for f1 in &ty1.fields {
            if !f1.access.is_externally_visible() {
                continue;
            }
            if let Some(f2) = ty2.field(&f1.name) {
                let type1_name = self.v1.name_of(f1.field_type).to_owned();
                let type2_name = self.v2.name_of(f2.field_type).to_owned();
                if type1_name != type2_name {
                    out.push(
                        ProblemTemplate::new(ProblemKind::ChangedFieldType)
                            .with_type_name(&ty1.name)
                            .with_target(f1.name.clone())
                            .with_values(type1_name, type2_name),
                    );
                }
                if f2.access > f1.access {
                    out.push(ProblemTemplate::new(ProblemKind::ChangedFieldAccess).with_type_name(&ty1.name).with_target(f1.name.clone()));
                }
                if let (Some(v1_val), Some(v2_val)) = (&f1.value, &f2.value) {
                    if v1_val != v2_val {
                        out.push(
                            ProblemTemplate::new(ProblemKind::ChangedFinalFieldValue)
                                .with_type_name(&ty1.name)
                                .with_target(f1.name.clone())
                                .with_values(v1_val.0.clone(), v2_val.0.clone()),
                        );
                    }
                }
                if f1.is_final && !f2.is_final {
                    out.push(ProblemTemplate::new(ProblemKind::FieldBecameNonFinal).with_type_name(&ty1.name).with_target(f1.name.clone()));
                }
                if !f1.is_final && f2.is_final {
                    out.push(ProblemTemplate::new(ProblemKind::FieldBecameFinal).with_type_name(&ty1.name).with_target(f1.name.clone()));
                }
                if f1.is_static != f2.is_static {
                    let constant = f1.is_constant() || f2.is_constant();
                    let kind = match (f1.is_static, constant) {
                        (false, false) => ProblemKind::FieldBecameStatic,
                        (true, false) => ProblemKind::FieldBecameNonStatic,
                        (false, true) => ProblemKind::ConstantFieldBecameStatic,
                        (true, true) => ProblemKind::ConstantFieldBecameNonStatic,
                    };
                    out.push(ProblemTemplate::new(kind).with_type_name(&ty1.name).with_target(f1.name.clone()));
                }
                for template in self.merge(f1.field_type, f2.field_type).iter() {
                    out.push(template.clone().nested(f1.name.clone()));
                }
            } else if let Some(f2) = ty2.fields.get(f1.position) {
                let same_slot_same_type = f2.name != f1.name && self.v1.name_of(f1.field_type) == self.v2.name_of(f2.field_type);
                if same_slot_same_type {
                    let kind = if f1.is_constant() { ProblemKind::RenamedConstantField } else { ProblemKind::RenamedNonConstantField };
                    out.push(
                        ProblemTemplate::new(kind)
                            .with_type_name(&ty1.name)
                            .with_target(f1.name.clone())
                            .with_values(f1.name.clone(), f2.name.clone()),
                    );
                    renamed_targets.insert(f2.name.clone());
                } else {
                    let kind = if f1.is_constant() { ProblemKind::RemovedConstantField } else { ProblemKind::RemovedNonConstantField };
                    out.push(ProblemTemplate::new(kind).with_type_name(&ty1.name).with_target(f1.name.clone()));
                }
            } else {
                let kind = if f1.is_constant() { ProblemKind::RemovedConstantField } else { ProblemKind::RemovedNonConstantField };
                out.push(ProblemTemplate::new(kind).with_type_name(&ty1.name).with_target(f1.name.clone()));
            }
        }

        for f2 in &ty2.fields {
            if !f2.access.is_externally_visible() {
                continue;
            }
            if ty1.field(&f2.name).is_some() || renamed_targets.contains(&f2.name) {
                continue;
            }
            let kind = if ty2.kind == TypeKind::Interface { ProblemKind::InterfaceAddedField } else { ProblemKind::ClassAddedField };
            out.push(ProblemTemplate::new(kind).with_type_name(&ty2.name).with_target(f2.name.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        resolve::ensure_resolved_type,
        symbol::{Access, ConstantValue, Field},
        Type,
    };

    fn class(name: &str, archive: &str) -> Type {
        Type {
            name: name.to_owned(),
            kind: TypeKind::Class,
            package: crate::model::version::package_of(name),
            archive: Some(archive.to_owned()),
            access: Access::Public,
            is_abstract: false,
            is_final: false,
            is_static: false,
            is_annotation: false,
            is_deprecated: false,
            super_class: None,
            super_interfaces: Default::default(),
            fields: Vec::new(),
            annotations: Default::default(),
            base_type: None,
        }
    }

    fn constructible(table: &mut SymbolTable, name: &str) -> TypeId {
        use crate::model::symbol::{Method, Parameter};
        let id = table.define_type(class(name, "lib.jar"));
        table.add_method(Method {
            short_name: "<init>".into(),
            descriptor: "()V".parse().unwrap(),
            class: id,
            return_type: None,
            parameters: Vec::<Parameter>::new(),
            exceptions: Default::default(),
            access: Access::Public,
            is_abstract: false,
            is_final: false,
            is_static: false,
            is_native: false,
            is_synchronized: false,
            is_constructor: true,
            is_deprecated: false,
            annotations: Default::default(),
            archive: Some("lib.jar".into()),
        });
        id
    }

    #[test]
    fn class_became_interface_is_detected() {
        let mut v1 = SymbolTable::new();
        let t1 = constructible(&mut v1, "a.Widget");
        let mut v2 = SymbolTable::new();
        let mut iface = class("a.Widget", "lib.jar");
        iface.kind = TypeKind::Interface;
        let t2 = v2.define_type(iface);

        let added = AbstractMethodSets::new();
        let removed = AbstractMethodSets::new();
        let usage = UsageTables::new();
        let ctx = TypeMergeContext::new(&v1, &v2, &added, &removed, &usage);
        let templates = ctx.merge(t1, t2);
        assert!(templates.iter().any(|t| t.kind == ProblemKind::ClassBecameInterface));
    }

    #[test]
    fn cycle_guard_short_circuits_mutually_recursive_field_types() {
        use crate::model::symbol::Field;

        fn link(table: &mut SymbolTable, holder: TypeId, field_name: &str, field_type: TypeId) {
            let mut t = table.type_(holder).clone();
            t.fields.push(Field {
                name: field_name.into(),
                field_type,
                access: Access::Public,
                is_final: false,
                is_static: false,
                is_transient: false,
                is_volatile: false,
                position: t.fields.len(),
                value: None,
                mangled: "La.A;".into(),
            });
            table.define_type(t);
        }

        let mut v1 = SymbolTable::new();
        let a1 = constructible(&mut v1, "a.A");
        let b1 = constructible(&mut v1, "a.B");
        link(&mut v1, a1, "peer", b1);
        link(&mut v1, b1, "peer", a1);

        let mut v2 = SymbolTable::new();
        let a2 = constructible(&mut v2, "a.A");
        let b2 = constructible(&mut v2, "a.B");
        link(&mut v2, a2, "peer", b2);
        link(&mut v2, b2, "peer", a2);

        let added = AbstractMethodSets::new();
        let removed = AbstractMethodSets::new();
        let usage = UsageTables::new();
        let ctx = TypeMergeContext::new(&v1, &v2, &added, &removed, &usage);
        // a.A's `peer` field merges into a.B, whose own `peer` field merges
        // back into a.A; the in-flight guard must return empty rather than
        // recurse forever, and the outer call must still terminate.
        let _ = ctx.merge(a1, a2);
    }

    #[test]
    fn removed_field_is_classified_constant_vs_non_constant() {
        let mut v1 = SymbolTable::new();
        let int_ty = ensure_resolved_type(&mut v1, "int");
        let t1 = constructible(&mut v1, "a.Widget");
        {
            let mut t = v1.type_(t1).clone();
            t.fields.push(Field {
                name: "count".into(),
                field_type: int_ty,
                access: Access::Public,
                is_final: false,
                is_static: false,
                is_transient: false,
                is_volatile: false,
                position: 0,
                value: None,
                mangled: "I".into(),
            });
            t.fields.push(Field {
                name: "LIMIT".into(),
                field_type: int_ty,
                access: Access::Public,
                is_final: true,
                is_static: true,
                is_transient: false,
                is_volatile: false,
                position: 1,
                value: Some(ConstantValue::from_literal("10")),
                mangled: "I".into(),
            });
            v1.define_type(t);
        }
        let mut v2 = SymbolTable::new();
        let t2 = constructible(&mut v2, "a.Widget");

        let added = AbstractMethodSets::new();
        let removed = AbstractMethodSets::new();
        let usage = UsageTables::new();
        let ctx = TypeMergeContext::new(&v1, &v2, &added, &removed, &usage);
        let templates = ctx.merge(t1, t2);
        assert!(templates.iter().any(|t| t.kind == ProblemKind::RemovedNonConstantField && t.target.as_deref() == Some("count")));
        assert!(templates.iter().any(|t| t.kind == ProblemKind::RemovedConstantField && t.target.as_deref() == Some("LIMIT")));
    }

    #[test]
    fn renamed_field_detected_by_position_and_type() {
        let mut v1 = SymbolTable::new();
        let string_ty = ensure_resolved_type(&mut v1, "java.lang.String");
        let t1 = constructible(&mut v1, "a.Widget");
        {
            let mut t = v1.type_(t1).clone();
            t.fields.push(Field {
                name: "oldName".into(),
                field_type: string_ty,
                access: Access::Public,
                is_final: true,
                is_static: true,
                is_transient: false,
                is_volatile: false,
                position: 0,
                value: Some(ConstantValue::from_literal("Value")),
                mangled: "Ljava/lang/String;".into(),
            });
            v1.define_type(t);
        }
        let mut v2 = SymbolTable::new();
        let string_ty2 = ensure_resolved_type(&mut v2, "java.lang.String");
        let t2 = constructible(&mut v2, "a.Widget");
        {
            let mut t = v2.type_(t2).clone();
            t.fields.push(Field {
                name: "newName".into(),
                field_type: string_ty2,
                access: Access::Public,
                is_final: true,
                is_static: true,
                is_transient: false,
                is_volatile: false,
                position: 0,
                value: Some(ConstantValue::from_literal("Value")),
                mangled: "Ljava/lang/String;".into(),
            });
            v2.define_type(t);
        }
        let added = AbstractMethodSets::new();
        let removed = AbstractMethodSets::new();
        let usage = UsageTables::new();
        let ctx = TypeMergeContext::new(&v1, &v2, &added, &removed, &usage);
        let templates = ctx.merge(t1, t2);
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].kind, ProblemKind::RenamedConstantField);
        assert_eq!(templates[0].old_value.as_deref(), Some("oldName"));
        assert_eq!(templates[0].new_value.as_deref(), Some("newName"));
    }
}

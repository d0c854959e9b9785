//! A single version's owned symbol table: interner, types, and methods.
//! Built once during ingestion and read-only once detection begins
//!. No version ever reaches into
//! another version's table — every cross-version comparison goes through
//! canonical names, never raw ids.

use std::collections::HashMap;

use crate::model::{
    interner::{Interner, TypeId},
    symbol::{Access, Method, Type, TypeKind},
};

/// An opaque handle to one [`Method`] within a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u32);

impl MethodId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The owned symbol table for one library version.
#[derive(Debug, Default)]
pub struct SymbolTable {
    interner: Interner,
    types: Vec<Type>,
    methods: Vec<Method>,
    methods_by_class: HashMap<TypeId, Vec<MethodId>>,
}

pub(crate) fn package_of(name: &str) -> String {
    name.trim_end_matches("[]")
        .rsplit_once('.')
        .map_or_else(String::new, |(pkg, _)| pkg.to_owned())
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, registering a placeholder [`Type`] (kind `Class`,
    /// no archive — i.e. synthetic/externally-resolved) the first time it
    /// is seen. Forward references (a superclass mentioned before its own
    /// declaration is parsed) resolve through this placeholder until
    /// [`Self::define_type`] fills it in.
    pub fn ensure_type(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.interner.get(name) {
            return id;
        }
        let id = self.interner.intern(name);
        debug_assert_eq!(id.index(), self.types.len());
        self.types.push(Type {
            name: name.to_owned(),
            kind: TypeKind::Class,
            package: package_of(name),
            archive: None,
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
        });
        id
    }

    /// Registers (or overwrites) the full record for a type, keyed by its
    /// name. The type's `kind` must match any placeholder previously
    /// created by [`Self::ensure_type`] for the same name.
    pub fn define_type(&mut self, type_: Type) -> TypeId {
        let id = self.ensure_type(&type_.name);
        let existing = &self.types[id.index()];
        debug_assert!(
            existing.archive.is_none() || existing.kind == type_.kind,
            "type {} re-registered with a different kind",
            type_.name
        );
        self.types[id.index()] = type_;
        id
    }

    /// Resolves a type by name without registering a placeholder.
    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.interner.get(name)
    }

    /// Marks a placeholder type (created by [`Self::ensure_type`]) as a
    /// synthetic primitive or array type, filling in its `kind` and, for
    /// arrays, its `base_type`. A no-op once the type carries real
    /// archive-backed data, so a forward reference never clobbers the
    /// eventual real declaration.
    pub fn mark_synthetic_kind(&mut self, id: TypeId, kind: TypeKind, base_type: Option<TypeId>) {
        let type_ = &mut self.types[id.index()];
        if type_.archive.is_some() {
            return;
        }
        type_.kind = kind;
        type_.base_type = base_type;
    }

    /// The record for `id`.
    #[must_use]
    pub fn type_(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// The canonical name for `id`.
    #[must_use]
    pub fn name_of(&self, id: TypeId) -> &str {
        self.interner.resolve(id)
    }

    /// Iterates over every registered type.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.interner.iter().map(|(id, _)| (id, self.type_(id)))
    }

    /// Registers a method, indexing it by its owning class for
    /// [`Self::methods_of`].
    pub fn add_method(&mut self, method: Method) -> MethodId {
        let class = method.class;
        #[allow(clippy::cast_possible_truncation)]
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(method);
        self.methods_by_class.entry(class).or_default().push(id);
        id
    }

    /// The record for `id`.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    /// All methods declared directly on `class`.
    pub fn methods_of(&self, class: TypeId) -> impl Iterator<Item = (MethodId, &Method)> {
        self.methods_by_class
            .get(&class)
            .into_iter()
            .flatten()
            .map(|&id| (id, self.method(id)))
    }

    /// Finds a method declared directly on `class` by short name and
    /// descriptor text.
    #[must_use]
    pub fn find_method(&self, class: TypeId, short_name: &str, descriptor: &str) -> Option<MethodId> {
        self.methods_of(class)
            .find(|(_, m)| m.short_name == short_name && m.descriptor.to_string() == descriptor)
            .map(|(id, _)| id)
    }

    /// Whether `class` has a constructor visible outside its own
    /// package (`public` or `protected`). Used as the base case for
    /// [`Self::is_externally_constructible`].
    fn has_visible_constructor(&self, class: TypeId) -> bool {
        self.methods_of(class)
            .any(|(_, m)| m.is_constructor && m.access.is_externally_visible())
    }

    /// Whether external code could plausibly hold a reference to an
    /// instance of `class`: it declares a visible constructor itself, or
    /// a superclass does. Interfaces and abstract classes
    /// with no visible constructor anywhere in the chain are still
    /// reachable if a concrete, constructible subclass could exist
    /// outside the analyzed set — this module only sees what was
    /// actually declared, so it answers conservatively from the
    /// declared chain alone.
    #[must_use]
    pub fn is_externally_constructible(&self, class: TypeId) -> bool {
        if !self.type_(class).is_class() {
            return true;
        }
        self.has_visible_constructor(class)
            || self
                .type_(class)
                .super_class
                .is_some_and(|sup| self.is_externally_constructible(sup))
    }

    /// Iterates over every registered method with its id.
    pub fn all_methods(&self) -> impl Iterator<Item = (MethodId, &Method)> {
        self.methods
            .iter()
            .enumerate()
            .map(|(i, m)| (MethodId(u32::try_from(i).expect("method index overflow")), m))
    }

    /// Walks the `extends`/`implements` chain of `class`, depth-first,
    /// yielding each supertype id exactly once.
    pub fn supertypes(&self, class: TypeId) -> Vec<TypeId> {
        let mut seen = Vec::new();
        let mut stack = vec![class];
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let t = self.type_(id);
            if let Some(sup) = t.super_class {
                if visited.insert(sup) {
                    seen.push(sup);
                }
                stack.push(sup);
            }
            for &iface in &t.super_interfaces {
                if !visited.contains(&iface) {
                    seen.push(iface);
                }
                stack.push(iface);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::symbol::Field;

    fn sample_type(name: &str) -> Type {
        Type {
            name: name.to_owned(),
            kind: TypeKind::Class,
            package: package_of(name),
            archive: Some("lib-v1.jar".to_owned()),
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

    #[test]
    fn ensure_then_define_reuses_the_same_id() {
        let mut table = SymbolTable::new();
        let placeholder = table.ensure_type("a.B");
        let full = table.define_type(sample_type("a.B"));
        assert_eq!(placeholder, full);
        assert_eq!(table.type_(full).archive.as_deref(), Some("lib-v1.jar"));
    }

    #[test]
    fn methods_are_indexed_by_owner() {
        let mut table = SymbolTable::new();
        let class = table.define_type(sample_type("a.B"));
        let other = table.define_type(sample_type("a.C"));
        let m = Method {
            short_name: "foo".into(),
            descriptor: "()V".parse().unwrap(),
            class,
            return_type: None,
            parameters: Vec::new(),
            exceptions: Default::default(),
            access: Access::Public,
            is_abstract: false,
            is_final: false,
            is_static: false,
            is_native: false,
            is_synchronized: false,
            is_constructor: false,
            is_deprecated: false,
            annotations: Default::default(),
            archive: Some("lib-v1.jar".into()),
        };
        table.add_method(m);
        assert_eq!(table.methods_of(class).count(), 1);
        assert_eq!(table.methods_of(other).count(), 0);
    }

    #[test]
    fn field_position_is_preserved() {
        let mut table = SymbolTable::new();
        let int_type = table.ensure_type("int");
        let mut t = sample_type("a.B");
        t.fields.push(Field {
            name: "x".into(),
            field_type: int_type,
            access: Access::Public,
            is_final: false,
            is_static: false,
            is_transient: false,
            is_volatile: false,
            position: 0,
            value: None,
            mangled: "I".into(),
        });
        assert_eq!(t.field("x").unwrap().position, 0);
    }
}

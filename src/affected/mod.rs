//! The affected-method propagator: given a type name implicated by a
//! type-level problem, enumerates the public methods whose signature
//! observably touches that type — through the receiver, a parameter, the
//! return type, or transitively through a field of any of those — so a
//! report can list which client-visible call sites a type-level change
//! actually reaches.

use std::collections::HashSet;

use crate::model::{interner::TypeId, SymbolTable};

/// Where, relative to a method's signature, the touched type was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// The method's receiver (`this`).
    Receiver,
    /// The method's return type.
    ReturnValue,
    /// A formal parameter, by zero-based position and recovered name.
    Parameter(usize, Option<String>),
}

/// One method found to be affected by a type-level change, the role the
/// touched type plays in its signature, and (if reached transitively)
/// the dotted field path from that role to the type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedMethod {
    /// The affected method's canonical id.
    pub method_id: String,
    /// Where in the signature the touched type was found.
    pub role: Role,
    /// The field path from `role` to the touched type; empty when the
    /// role itself is the touched type.
    pub path: Vec<String>,
}

/// The capped result of [`propagate`]: at most `limit` methods, plus a
/// count of how many further matches were dropped.
#[derive(Debug, Clone, Default)]
pub struct AffectedMethods {
    /// The (possibly truncated) list of affected methods.
    pub methods: Vec<AffectedMethod>,
    /// How many additional matches exist beyond `methods`, for an "and
    /// N others…" marker. Zero when nothing was dropped.
    pub truncated: usize,
}

const MAX_FIELD_DEPTH: usize = 8;

/// Depth-first search for a field path from `from` to `target`, cycle
/// guarded and depth-bounded. Returns the empty path if `from == target`.
fn find_path(table: &SymbolTable, from: TypeId, target: TypeId, visited: &mut HashSet<TypeId>, depth: usize) -> Option<Vec<String>> {
    if from == target {
        return Some(Vec::new());
    }
    if depth >= MAX_FIELD_DEPTH || !visited.insert(from) {
        return None;
    }
    let ty = table.type_(from);
    for field in &ty.fields {
        if !field.access.is_externally_visible() {
            continue;
        }
        if let Some(mut path) = find_path(table, field.field_type, target, visited, depth + 1) {
            path.insert(0, field.name.clone());
            return Some(path);
        }
    }
    None
}

/// Enumerates every public method in `table` whose receiver, a
/// parameter, or the return type touches `type_name` (directly or
/// through a field), capped at `limit` entries.
#[must_use]
pub fn propagate(table: &SymbolTable, type_name: &str, limit: usize) -> AffectedMethods {
    let Some(target) = table.type_id(type_name) else {
        return AffectedMethods::default();
    };

    let mut all = Vec::new();
    for (_, method) in table.all_methods() {
        if !method.access.is_externally_visible() {
            continue;
        }
        let owner_name = table.name_of(method.class).to_owned();
        let method_id = method.canonical_id(&owner_name);

        let mut visited = HashSet::new();
        if let Some(path) = find_path(table, method.class, target, &mut visited, 0) {
            all.push(AffectedMethod { method_id: method_id.clone(), role: Role::Receiver, path });
        }

        for (i, param) in method.parameters.iter().enumerate() {
            let mut visited = HashSet::new();
            if let Some(path) = find_path(table, param.param_type, target, &mut visited, 0) {
                all.push(AffectedMethod { method_id: method_id.clone(), role: Role::Parameter(i, param.name.clone()), path });
            }
        }

        if let Some(return_type) = method.return_type {
            let mut visited = HashSet::new();
            if let Some(path) = find_path(table, return_type, target, &mut visited, 0) {
                all.push(AffectedMethod { method_id: method_id.clone(), role: Role::ReturnValue, path });
            }
        }
    }

    let total = all.len();
    all.truncate(limit);
    AffectedMethods { truncated: total.saturating_sub(all.len()), methods: all }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        symbol::{Access, Field, Method, Parameter, Type, TypeKind},
        version::package_of,
    };

    fn archived_type(name: &str) -> Type {
        Type {
            name: name.to_owned(),
            kind: TypeKind::Class,
            package: package_of(name),
            archive: Some("lib.jar".to_owned()),
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

    fn plain_method(class: TypeId, name: &str, descriptor: &str, params: Vec<Parameter>, return_type: Option<TypeId>) -> Method {
        Method {
            short_name: name.into(),
            descriptor: descriptor.parse().unwrap(),
            class,
            return_type,
            parameters: params,
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
            archive: Some("lib.jar".into()),
        }
    }

    #[test]
    fn finds_methods_touching_type_by_parameter_and_return() {
        let mut table = SymbolTable::new();
        let widget = table.define_type(archived_type("a.Widget"));
        let consumer = table.define_type(archived_type("a.Consumer"));
        table.add_method(plain_method(consumer, "accept", "(La/Widget;)V", vec![Parameter { param_type: widget, name: Some("w".into()) }], None));
        table.add_method(plain_method(consumer, "make", "()La/Widget;", Vec::new(), Some(widget)));

        let result = propagate(&table, "a.Widget", 10);
        assert_eq!(result.methods.len(), 2);
        assert!(result.methods.iter().any(|m| matches!(m.role, Role::Parameter(0, _))));
        assert!(result.methods.iter().any(|m| m.role == Role::ReturnValue));
        assert_eq!(result.truncated, 0);
    }

    #[test]
    fn finds_methods_touching_type_transitively_through_a_field() {
        let mut table = SymbolTable::new();
        let widget = table.define_type(archived_type("a.Widget"));
        let mut holder_ty = archived_type("a.Holder");
        holder_ty.fields.push(Field {
            name: "inner".into(),
            field_type: widget,
            access: Access::Public,
            is_final: false,
            is_static: false,
            is_transient: false,
            is_volatile: false,
            position: 0,
            value: None,
            mangled: "La/Widget;".into(),
        });
        let holder = table.define_type(holder_ty);
        let consumer = table.define_type(archived_type("a.Consumer"));
        table.add_method(plain_method(consumer, "accept", "(La/Holder;)V", vec![Parameter { param_type: holder, name: Some("h".into()) }], None));

        let result = propagate(&table, "a.Widget", 10);
        assert_eq!(result.methods.len(), 1);
        assert_eq!(result.methods[0].path, vec!["inner".to_owned()]);
    }

    #[test]
    fn caps_output_and_reports_truncated_count() {
        let mut table = SymbolTable::new();
        let widget = table.define_type(archived_type("a.Widget"));
        let consumer = table.define_type(archived_type("a.Consumer"));
        for i in 0..5 {
            table.add_method(plain_method(
                consumer,
                &format!("accept{i}"),
                "(La/Widget;)V",
                vec![Parameter { param_type: widget, name: None }],
                None,
            ));
        }
        let result = propagate(&table, "a.Widget", 3);
        assert_eq!(result.methods.len(), 3);
        assert_eq!(result.truncated, 2);
    }

    #[test]
    fn unknown_type_name_yields_empty_result() {
        let table = SymbolTable::new();
        let result = propagate(&table, "a.DoesNotExist", 10);
        assert!(result.methods.is_empty());
        assert_eq!(result.truncated, 0);
    }
}

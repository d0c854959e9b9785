//! Resolves a source-level type name (`int`, `java.lang.String`,
//! `java.lang.String[]`) to a registered [`TypeId`], synthesizing
//! placeholder [`Type`] records for primitives and arrays the first time
//! each is referenced. Real, archive-backed classes are never touched
//! here — they go through [`SymbolTable::define_type`] when the
//! disassembly parser reaches their own declaration.

use crate::model::{interner::TypeId, symbol::TypeKind, SymbolTable};

const PRIMITIVE_NAMES: &[&str] = &[
    "void", "boolean", "char", "byte", "short", "int", "float", "long", "double",
];

/// Resolves `name` to a [`TypeId`], registering it if this is the first
/// time it is seen. Array names (`T[]`) resolve their base type first, so
/// `base_type` always resolves transitively to a non-array type.
pub fn ensure_resolved_type(table: &mut SymbolTable, name: &str) -> TypeId {
    if let Some(base_name) = name.strip_suffix("[]") {
        let base = ensure_resolved_type(table, base_name);
        let id = table.ensure_type(name);
        table.mark_synthetic_kind(id, TypeKind::Array, Some(base));
        id
    } else if PRIMITIVE_NAMES.contains(&name) {
        let id = table.ensure_type(name);
        table.mark_synthetic_kind(id, TypeKind::Primitive, None);
        id
    } else {
        table.ensure_type(name)
    }
}

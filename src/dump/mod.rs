//! The serialized API dump: a self-describing snapshot of one version's
//! symbol table, keyed by canonical name rather than the table's own
//! dense ids (those are only valid within the table that produced them).
//! Packing the dump into a `.zip`/`.tar.gz` archive is explicitly out of
//! scope for this crate (spec.md §1) — what lives here is the in-memory
//! record and its `serde_json` (de)serialization, gated on a major
//! version number so an old reader refuses a dump produced by an
//! incompatible newer format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::EngineError,
    model::{
        resolve::ensure_resolved_type,
        symbol::{Access, ConstantValue, TypeKind},
        SymbolTable,
    },
};

/// The dump format's `(major, minor)` version. A reader rejects a dump
/// whose major component differs; a minor bump is expected to add
/// optional fields only.
pub const DUMP_FORMAT_VERSION: (u32, u32) = (1, 0);

/// A field, with its type named rather than handle-referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    /// The field's simple name.
    pub name: String,
    /// The canonical name of the field's type.
    pub field_type: String,
    /// Declared accessibility.
    pub access: Access,
    /// Declared `final`.
    pub is_final: bool,
    /// Declared `static`.
    pub is_static: bool,
    /// Declared `transient`.
    pub is_transient: bool,
    /// Declared `volatile`.
    pub is_volatile: bool,
    /// Insertion index within the owning type.
    pub position: usize,
    /// The compile-time constant value, if any.
    pub value: Option<ConstantValue>,
    /// The canonical JVM field descriptor.
    pub mangled: String,
}

/// A type, with every cross-reference named rather than handle-referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRecord {
    /// The fully qualified name.
    pub name: String,
    /// The kind of this type.
    pub kind: TypeKind,
    /// The source archive; `None` for a synthetic/unresolved reference.
    pub archive: Option<String>,
    /// Declared accessibility.
    pub access: Access,
    /// Declared `abstract`.
    pub is_abstract: bool,
    /// Declared `final`.
    pub is_final: bool,
    /// Declared `static`.
    pub is_static: bool,
    /// Declared as an annotation interface.
    pub is_annotation: bool,
    /// Marked `@Deprecated`.
    pub is_deprecated: bool,
    /// The direct superclass's name, if any.
    pub super_class: Option<String>,
    /// The directly implemented/extended interfaces' names.
    pub super_interfaces: Vec<String>,
    /// Declared fields, in source order.
    pub fields: Vec<FieldRecord>,
    /// Annotation type names applied to this type.
    pub annotations: Vec<String>,
    /// For array types, the element type's name.
    pub base_type: Option<String>,
}

/// A formal parameter, with its type named rather than handle-referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// The canonical name of the parameter's type.
    pub param_type: String,
    /// The recovered parameter name, if any.
    pub name: Option<String>,
}

/// A method, with every cross-reference named rather than handle-referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodRecord {
    /// The method's simple name.
    pub short_name: String,
    /// The textual JVM descriptor.
    pub descriptor: String,
    /// The owning type's name.
    pub class: String,
    /// The return type's name; `None` for constructors.
    pub return_type: Option<String>,
    /// Declared parameters, in order.
    pub parameters: Vec<ParameterRecord>,
    /// Thrown types' names.
    pub exceptions: Vec<String>,
    /// Declared accessibility.
    pub access: Access,
    /// Declared `abstract`.
    pub is_abstract: bool,
    /// Declared `final`.
    pub is_final: bool,
    /// Declared `static`.
    pub is_static: bool,
    /// Declared `native`.
    pub is_native: bool,
    /// Declared `synchronized`.
    pub is_synchronized: bool,
    /// Whether this is a constructor.
    pub is_constructor: bool,
    /// Marked `@Deprecated`.
    pub is_deprecated: bool,
    /// Annotation type names applied to this method.
    pub annotations: Vec<String>,
    /// The owning class's source archive.
    pub archive: Option<String>,
}

/// The top-level serialized container: one version's complete symbol
/// table, self-describing enough to be diffed against a freshly-ingested
/// version without re-running ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiDump {
    /// The `(major, minor)` dump format version this record was written
    /// with.
    pub format_version: (u32, u32),
    /// This tool's own version string, for diagnostics only.
    pub tool_version: String,
    /// The library name this dump describes.
    pub library: String,
    /// The library version label this dump describes.
    pub version: String,
    /// Every type, keyed by canonical name.
    pub types: HashMap<String, TypeRecord>,
    /// Every method, keyed by its canonical id.
    pub methods: HashMap<String, MethodRecord>,
}

impl ApiDump {
    /// Captures `table` into a serializable dump for `library`/`version`.
    #[must_use]
    pub fn from_table(table: &SymbolTable, library: &str, version: &str, tool_version: &str) -> Self {
        let mut types = HashMap::new();
        for (id, ty) in table.types() {
            if ty.archive.is_none() && ty.kind != TypeKind::Array && ty.kind != TypeKind::Primitive {
                // A placeholder type (forward reference never resolved to a
                // real declaration) carries no useful API surface.
                continue;
            }
            let _ = id;
            types.insert(
                ty.name.clone(),
                TypeRecord {
                    name: ty.name.clone(),
                    kind: ty.kind,
                    archive: ty.archive.clone(),
                    access: ty.access,
                    is_abstract: ty.is_abstract,
                    is_final: ty.is_final,
                    is_static: ty.is_static,
                    is_annotation: ty.is_annotation,
                    is_deprecated: ty.is_deprecated,
                    super_class: ty.super_class.map(|id| table.name_of(id).to_owned()),
                    super_interfaces: ty.super_interfaces.iter().map(|&id| table.name_of(id).to_owned()).collect(),
                    fields: ty
                        .fields
                        .iter()
                        .map(|f| FieldRecord {
                            name: f.name.clone(),
                            field_type: table.name_of(f.field_type).to_owned(),
                            access: f.access,
                            is_final: f.is_final,
                            is_static: f.is_static,
                            is_transient: f.is_transient,
                            is_volatile: f.is_volatile,
                            position: f.position,
                            value: f.value.clone(),
                            mangled: f.mangled.clone(),
                        })
                        .collect(),
                    annotations: ty.annotations.iter().map(|&id| table.name_of(id).to_owned()).collect(),
                    base_type: ty.base_type.map(|id| table.name_of(id).to_owned()),
                },
            );
        }

        let mut methods = HashMap::new();
        for (_, m) in table.all_methods() {
            let owner_name = table.name_of(m.class).to_owned();
            methods.insert(
                m.canonical_id(&owner_name),
                MethodRecord {
                    short_name: m.short_name.clone(),
                    descriptor: m.descriptor.to_string(),
                    class: owner_name,
                    return_type: m.return_type.map(|id| table.name_of(id).to_owned()),
                    parameters: m.parameters.iter().map(|p| ParameterRecord { param_type: table.name_of(p.param_type).to_owned(), name: p.name.clone() }).collect(),
                    exceptions: m.exceptions.iter().map(|&id| table.name_of(id).to_owned()).collect(),
                    access: m.access,
                    is_abstract: m.is_abstract,
                    is_final: m.is_final,
                    is_static: m.is_static,
                    is_native: m.is_native,
                    is_synchronized: m.is_synchronized,
                    is_constructor: m.is_constructor,
                    is_deprecated: m.is_deprecated,
                    annotations: m.annotations.iter().map(|&id| table.name_of(id).to_owned()).collect(),
                    archive: m.archive.clone(),
                },
            );
        }

        Self { format_version: DUMP_FORMAT_VERSION, tool_version: tool_version.to_owned(), library: library.to_owned(), version: version.to_owned(), types, methods }
    }

    /// Serializes this dump to a JSON string.
    ///
    /// # Errors
    /// Returns [`EngineError::Generic`] if serialization fails (never
    /// expected for this record shape, but `serde_json` is fallible).
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Generic(e.to_string()))
    }

    /// Parses and validates a JSON-encoded dump.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidDump`] if the text is not
    /// well-formed, or [`EngineError::DumpVersion`] if its major format
    /// version differs from [`DUMP_FORMAT_VERSION`].
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let dump: Self = serde_json::from_str(text).map_err(|e| EngineError::InvalidDump(e.to_string()))?;
        if dump.format_version.0 != DUMP_FORMAT_VERSION.0 {
            return Err(EngineError::DumpVersion { found: dump.format_version.0, expected: DUMP_FORMAT_VERSION.0 });
        }
        Ok(dump)
    }

    /// Reconstructs a [`SymbolTable`] from this dump. The rebuilt table's
    /// ids are unrelated to the ids of the table the dump was captured
    /// from — every comparison against it must go through canonical
    /// names, exactly as a freshly-ingested table would be compared.
    #[must_use]
    pub fn into_table(self) -> SymbolTable {
        let mut table = SymbolTable::new();

        // Pass 1: register every type's identity (and kind, for
        // primitives/arrays) before resolving any cross-reference, so
        // forward references within the dump always land on the same id.
        for record in self.types.values() {
            let _ = ensure_resolved_type(&mut table, &record.name);
        }

        for record in self.types.values() {
            let ty = crate::model::symbol::Type {
                name: record.name.clone(),
                kind: record.kind,
                package: crate::model::version::package_of(&record.name),
                archive: record.archive.clone(),
                access: record.access,
                is_abstract: record.is_abstract,
                is_final: record.is_final,
                is_static: record.is_static,
                is_annotation: record.is_annotation,
                is_deprecated: record.is_deprecated,
                super_class: record.super_class.as_deref().map(|n| ensure_resolved_type(&mut table, n)),
                super_interfaces: record.super_interfaces.iter().map(|n| ensure_resolved_type(&mut table, n)).collect(),
                fields: record
                    .fields
                    .iter()
                    .map(|f| crate::model::symbol::Field {
                        name: f.name.clone(),
                        field_type: ensure_resolved_type(&mut table, &f.field_type),
                        access: f.access,
                        is_final: f.is_final,
                        is_static: f.is_static,
                        is_transient: f.is_transient,
                        is_volatile: f.is_volatile,
                        position: f.position,
                        value: f.value.clone(),
                        mangled: f.mangled.clone(),
                    })
                    .collect(),
                annotations: record.annotations.iter().map(|n| ensure_resolved_type(&mut table, n)).collect(),
                base_type: record.base_type.as_deref().map(|n| ensure_resolved_type(&mut table, n)),
            };
            table.define_type(ty);
        }

        for record in self.methods.values() {
            let class = ensure_resolved_type(&mut table, &record.class);
            let method = crate::model::symbol::Method {
                short_name: record.short_name.clone(),
                descriptor: record.descriptor.parse().unwrap_or_else(|_| "()V".parse().expect("valid fallback descriptor")),
                class,
                return_type: record.return_type.as_deref().map(|n| ensure_resolved_type(&mut table, n)),
                parameters: record.parameters.iter().map(|p| crate::model::symbol::Parameter { param_type: ensure_resolved_type(&mut table, &p.param_type), name: p.name.clone() }).collect(),
                exceptions: record.exceptions.iter().map(|n| ensure_resolved_type(&mut table, n)).collect(),
                access: record.access,
                is_abstract: record.is_abstract,
                is_final: record.is_final,
                is_static: record.is_static,
                is_native: record.is_native,
                is_synchronized: record.is_synchronized,
                is_constructor: record.is_constructor,
                is_deprecated: record.is_deprecated,
                annotations: record.annotations.iter().map(|n| ensure_resolved_type(&mut table, n)).collect(),
                archive: record.archive.clone(),
            };
            table.add_method(method);
        }

        table
    }
}

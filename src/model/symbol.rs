//! The symbol model: normalized, per-version records for types, fields,
//! and methods. Relationships between records are stored as
//! [`TypeId`] handles into the owning version's table, never as pointers,
//! so the model has no cycles to manage beyond explicit id lookups.

use std::collections::BTreeSet;

use crate::{model::interner::TypeId, types::MethodDescriptor};

/// Declared accessibility, ordered from most to least visible so that
/// `lhs < rhs` means "`rhs` is narrower than `lhs`" (used to detect
/// access-narrowing transitions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Access {
    /// `public`.
    Public,
    /// `protected`.
    Protected,
    /// Package-private (no modifier).
    PackagePrivate,
    /// `private`.
    Private,
}

impl Access {
    /// Whether this access level is visible to code outside the
    /// defining package (`public` or `protected`).
    #[must_use]
    pub fn is_externally_visible(self) -> bool {
        matches!(self, Self::Public | Self::Protected)
    }
}

/// The kind of a [`Type`] record. Never mutated after first registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TypeKind {
    /// A `class`.
    Class,
    /// An `interface`, including annotation interfaces.
    Interface,
    /// One of the eight primitive types or `void`.
    Primitive,
    /// An array type; see [`Type::base_type`].
    Array,
}

/// A compile-time constant value, retained verbatim as the disassembler
/// printed it. The empty string literal is represented by the sentinel
/// [`ConstantValue::EMPTY_STRING`] so a comparator can distinguish
/// "no constant" (`Field::value` is `None`) from "known, empty" constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, serde::Serialize, serde::Deserialize)]
pub struct ConstantValue(pub String);

impl ConstantValue {
    /// The sentinel token used in place of a zero-length string literal.
    pub const EMPTY_STRING: &'static str = "EMPTY_STRING";

    /// Builds a constant token from a literal as printed by the
    /// disassembler, substituting the sentinel for an empty string.
    #[must_use]
    pub fn from_literal(literal: &str) -> Self {
        if literal.is_empty() {
            Self(Self::EMPTY_STRING.to_owned())
        } else {
            Self(literal.to_owned())
        }
    }
}

/// One class/interface/array/primitive in a version's symbol table.
#[derive(Debug, Clone)]
pub struct Type {
    /// The fully qualified name (dots as package separator, `[]` suffix
    /// for arrays).
    pub name: String,
    /// The kind of this type.
    pub kind: TypeKind,
    /// The package, derived from `name`. Empty for the default package.
    pub package: String,
    /// The archive this type was ingested from. `None` marks a synthetic
    /// or externally-resolved type never backed by an analyzed archive.
    pub archive: Option<String>,
    /// Declared accessibility.
    pub access: Access,
    /// Declared `abstract`.
    pub is_abstract: bool,
    /// Declared `final`.
    pub is_final: bool,
    /// Declared `static` (for nested types).
    pub is_static: bool,
    /// Declared as an annotation interface.
    pub is_annotation: bool,
    /// Marked `@Deprecated`.
    pub is_deprecated: bool,
    /// The direct superclass, absent for interfaces and for
    /// `java.lang.Object`.
    pub super_class: Option<TypeId>,
    /// The directly implemented/extended interfaces.
    pub super_interfaces: BTreeSet<TypeId>,
    /// Declared fields, in source order. Positional index is significant:
    /// it is how a field rename is distinguished from a remove+add.
    pub fields: Vec<Field>,
    /// Annotation types applied to this type.
    pub annotations: BTreeSet<TypeId>,
    /// For array types, the element type. Resolves transitively to a
    /// non-array type.
    pub base_type: Option<TypeId>,
}

impl Type {
    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this type is a class (as opposed to an interface, array,
    /// or primitive).
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    /// Whether this type is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }
}

/// A declared field.
#[derive(Debug, Clone)]
pub struct Field {
    /// The field's simple name.
    pub name: String,
    /// The resolved field type.
    pub field_type: TypeId,
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
    /// Insertion index within the owning type's `fields` vector.
    pub position: usize,
    /// The compile-time constant value, if any. A field is a *constant
    /// field* iff it is `static`, `final`, and this is
    /// `Some`.
    pub value: Option<ConstantValue>,
    /// The canonical JVM field descriptor (e.g. `Ljava/lang/String;`).
    pub mangled: String,
}

impl Field {
    /// Whether this field is a *constant field*: `static`, `final`, and
    /// initialized to a compile-time constant, per the GLOSSARY.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.is_static && self.is_final && self.value.is_some()
    }
}

/// A declared method (or constructor, or static initializer).
#[derive(Debug, Clone)]
pub struct Method {
    /// The method's simple name. A constructor keeps the enclosing
    /// class's simple name here (distinguished only by `is_constructor`);
    /// the static initializer is named `<clinit>`.
    pub short_name: String,
    /// The parsed descriptor.
    pub descriptor: MethodDescriptor,
    /// The owning type.
    pub class: TypeId,
    /// The resolved return type; `None` for constructors, which have no
    /// return slot.
    pub return_type: Option<TypeId>,
    /// Declared parameters, in order.
    pub parameters: Vec<Parameter>,
    /// Declared checked and unchecked thrown types (`throws` clause).
    pub exceptions: BTreeSet<TypeId>,
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
    /// Whether this is a constructor (`<init>`).
    pub is_constructor: bool,
    /// Marked `@Deprecated`.
    pub is_deprecated: bool,
    /// Annotation types applied to this method.
    pub annotations: BTreeSet<TypeId>,
    /// The archive this method's owning class was ingested from.
    pub archive: Option<String>,
}

impl Method {
    /// The canonical id: `[package/]class."name":descriptor`, used as the
    /// key in [`crate::diff::problem::Problem`].
    #[must_use]
    pub fn canonical_id(&self, owner_name: &str) -> String {
        format!("{owner_name}.\"{}\":{}", self.short_name, self.descriptor)
    }

    /// Whether this method is the type's static initializer.
    #[must_use]
    pub fn is_static_initializer(&self) -> bool {
        self.short_name == "<clinit>"
    }
}

/// A declared formal parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// The resolved parameter type.
    pub param_type: TypeId,
    /// The parameter's name, if recovered from a `LocalVariableTable`
    /// (absent under `quick` mode or when debug info is stripped).
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_value_empty_string_uses_sentinel() {
        let v = ConstantValue::from_literal("");
        assert_eq!(v.0, ConstantValue::EMPTY_STRING);
        let v = ConstantValue::from_literal("hi");
        assert_eq!(v.0, "hi");
    }

    #[test]
    fn access_ordering_models_narrowing() {
        assert!(Access::Public < Access::Protected);
        assert!(Access::Protected < Access::PackagePrivate);
        assert!(Access::PackagePrivate < Access::Private);
        assert!(Access::Public.is_externally_visible());
        assert!(!Access::Private.is_externally_visible());
    }
}

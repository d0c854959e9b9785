//! The closed taxonomy of compatibility problems the differ can emit,
//! and the key a [`Problem`] is filed under: `(method id, kind, location)`.

use std::fmt;

/// Where, relative to a method's signature, a problem was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationBase {
    /// The method's receiver (`this`).
    Receiver,
    /// The method's return type.
    ReturnValue,
    /// A formal parameter, by zero-based position.
    Parameter(usize),
}

/// A dotted path rooted at a [`LocationBase`]: `this`, `RetVal`,
/// `RetVal.fieldName`, or a parameter's position followed by a field
/// path (`0.fieldName`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    base: LocationBase,
    path: Vec<String>,
}

impl Location {
    /// The method's receiver, `this`.
    #[must_use]
    pub fn this() -> Self {
        Self { base: LocationBase::Receiver, path: Vec::new() }
    }

    /// The method's return value.
    #[must_use]
    pub fn return_value() -> Self {
        Self { base: LocationBase::ReturnValue, path: Vec::new() }
    }

    /// The parameter at `position` (zero-based).
    #[must_use]
    pub fn parameter(position: usize) -> Self {
        Self { base: LocationBase::Parameter(position), path: Vec::new() }
    }

    /// Extends this location with a nested field name, used when a
    /// problem is attributed to a type reached through a field of the
    /// originally-touched type rather than the type itself.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.path.push(name.into());
        self
    }

    /// The base this location is rooted at.
    #[must_use]
    pub fn base(&self) -> LocationBase {
        self.base
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            LocationBase::Receiver => f.write_str("this")?,
            LocationBase::ReturnValue => f.write_str("RetVal")?,
            LocationBase::Parameter(pos) => write!(f, "{pos}")?,
        }
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// The closed set of compatibility-problem kinds the differ recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum ProblemKind {
    // --- Pass A / Pass B: method existence ---
    /// A method exists only in the newer version.
    AddedMethod,
    /// A method exists only in the older version.
    RemovedMethod,
    /// A `void`-returning method was replaced by a same-named,
    /// same-parameter method returning a non-`void` type.
    ChangedMethodReturnFromVoid,
    /// An added method overrides one already declared on a supertype
    /// that existed in the older version too.
    ClassOverriddenMethod,
    /// A removed concrete method is still reachable on the same class
    /// through the newer hierarchy.
    ClassMethodMovedUpHierarchy,

    // --- Pass C: attribute transitions ---
    /// A method changed from static to non-static or vice versa.
    MethodBecameStatic,
    /// See [`Self::MethodBecameStatic`].
    MethodBecameNonStatic,
    /// A method gained or lost `synchronized`.
    MethodBecameSynchronized,
    /// See [`Self::MethodBecameSynchronized`].
    MethodBecameNonSynchronized,
    /// A non-static method became `final`.
    NonStaticMethodBecameFinal,
    /// A static method became `final`.
    StaticMethodBecameFinal,
    /// A method's access was narrowed (`public`→`protected`/`private`,
    /// `protected`→`private`).
    ChangedMethodAccess,
    /// A concrete method on a class became `abstract`.
    MethodBecameAbstract,
    /// An abstract method on a class became concrete.
    MethodBecameNonAbstract,
    /// The per-class counterpart of [`Self::MethodBecameAbstract`], filed
    /// once per affected class rather than once per method.
    ClassMethodBecameAbstract,

    /// An abstract method gained a checked exception.
    AbstractMethodAddedCheckedException,
    /// An abstract method lost a checked exception.
    AbstractMethodRemovedCheckedException,
    /// A concrete method gained a checked exception.
    NonAbstractMethodAddedCheckedException,
    /// A concrete method lost a checked exception.
    NonAbstractMethodRemovedCheckedException,
    /// A method gained an unchecked (runtime) exception.
    AddedUncheckedException,
    /// A method lost an unchecked (runtime) exception.
    RemovedUncheckedException,

    // --- Type merge: kind and modifiers ---
    /// A class became an interface.
    ClassBecameInterface,
    /// An interface became a class.
    InterfaceBecameClass,
    /// A class gained `final`.
    ClassBecameFinal,
    /// A class lost `final`.
    ClassBecameNonFinal,
    /// A class gained `abstract`.
    ClassBecameAbstract,
    /// A class lost `abstract`.
    ClassBecameNonAbstract,

    // --- Type merge: abstract method propagation ---
    /// A concrete class gained a new abstract method (inherited from an
    /// added abstract supertype member, or declared directly).
    NonAbstractClassAddedAbstractMethod,
    /// An abstract class gained a new abstract method.
    AbstractClassAddedAbstractMethod,
    /// An interface gained a new abstract method.
    InterfaceAddedAbstractMethod,
    /// A class lost an abstract method.
    ClassRemovedAbstractMethod,
    /// An interface lost an abstract method.
    InterfaceRemovedAbstractMethod,

    // --- Type merge: supertype changes ---
    /// A class gained a superclass where it had none.
    AddedSuperClass,
    /// A class lost its superclass.
    RemovedSuperClass,
    /// A class's superclass was replaced by an unrelated type.
    ChangedSuperClass,
    /// An abstract class's new superclass is itself abstract.
    AbstractClassAddedSuperAbstractClass,
    /// A class or interface gained a new super-interface that declares
    /// abstract methods.
    InterfaceAddedSuperInterface,
    /// A class or interface gained a new super-interface that declares
    /// only constants.
    InterfaceAddedSuperConstantInterface,
    /// An abstract class gained a new super-interface.
    AbstractClassAddedSuperInterface,
    /// A class or interface lost a super-interface.
    InterfaceRemovedSuperInterface,

    // --- Type merge: fields ---
    /// A public or protected constant field was removed.
    RemovedConstantField,
    /// A public or protected non-constant field was removed.
    RemovedNonConstantField,
    /// A constant field was renamed (same positional slot and type).
    RenamedConstantField,
    /// A non-constant field was renamed (same positional slot and type).
    RenamedNonConstantField,
    /// A field's declared type changed.
    ChangedFieldType,
    /// A field's access was narrowed.
    ChangedFieldAccess,
    /// A constant field's compile-time value changed.
    ChangedFinalFieldValue,
    /// A field gained `final`.
    FieldBecameFinal,
    /// A field lost `final`.
    FieldBecameNonFinal,
    /// A non-constant field gained `static`.
    FieldBecameStatic,
    /// A non-constant field lost `static`.
    FieldBecameNonStatic,
    /// A constant field gained `static`.
    ConstantFieldBecameStatic,
    /// A constant field lost `static`.
    ConstantFieldBecameNonStatic,
    /// A new field was added to a class.
    ClassAddedField,
    /// A new field was added to an interface.
    InterfaceAddedField,
}

/// One detected compatibility problem, keyed by `(method id, kind,
/// location)` in the detector's problem set.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The canonical id of the method this problem is filed against.
    pub method_id: String,
    /// The kind of problem.
    pub kind: ProblemKind,
    /// Where, relative to the method's signature, the problem occurred.
    pub location: Location,
    /// The name of the type the problem concerns (the method's owner for
    /// a method-level problem, or the merged type for a type-level one).
    pub type_name: Option<String>,
    /// The method, field, or type this problem's kind names (e.g. the
    /// newly added method for `AddedMethod`).
    pub target: Option<String>,
    /// The value before the change (an exception type, a field value, …).
    pub old_value: Option<String>,
    /// The value after the change.
    pub new_value: Option<String>,
    /// For a parameter-position problem, the zero-based index.
    pub parameter_position: Option<usize>,
    /// For a parameter-position problem, the recovered parameter name.
    pub parameter_name: Option<String>,
    /// For a field-level problem, the field's type name.
    pub field_type: Option<String>,
    /// For a field-level problem, the field's compile-time value.
    pub field_value: Option<String>,
    /// A narrative refinement: the first caller observed to invoke a
    /// newly added abstract method, used by the classifier's
    /// no-callers-yet downgrade.
    pub add_effect: Option<String>,
}

impl Problem {
    /// Builds a problem with only its required key fields set; the
    /// remaining descriptive fields default to `None`.
    #[must_use]
    pub fn new(method_id: impl Into<String>, kind: ProblemKind, location: Location) -> Self {
        Self {
            method_id: method_id.into(),
            kind,
            location,
            type_name: None,
            target: None,
            old_value: None,
            new_value: None,
            parameter_position: None,
            parameter_name: None,
            field_type: None,
            field_value: None,
            add_effect: None,
        }
    }

    /// Sets [`Self::type_name`].
    #[must_use]
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Sets [`Self::target`].
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets [`Self::old_value`] and [`Self::new_value`].
    #[must_use]
    pub fn with_values(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_value = Some(old.into());
        self.new_value = Some(new.into());
        self
    }

    /// Sets [`Self::add_effect`].
    #[must_use]
    pub fn with_add_effect(mut self, effect: impl Into<String>) -> Self {
        self.add_effect = Some(effect.into());
        self
    }

    /// The `(type name, kind, target)` key used to cap the reported
    /// severity of a type-level change to its maximum across every
    /// method it touches.
    #[must_use]
    pub fn ceiling_key(&self) -> (String, ProblemKind, Option<String>) {
        (self.type_name.clone().unwrap_or_default(), self.kind, self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_matches_documented_grammar() {
        assert_eq!(Location::this().to_string(), "this");
        assert_eq!(Location::return_value().to_string(), "RetVal");
        assert_eq!(Location::return_value().field("count").to_string(), "RetVal.count");
        assert_eq!(Location::parameter(1).field("name").to_string(), "1.name");
    }

    #[test]
    fn ceiling_key_groups_by_type_kind_and_target() {
        let a = Problem::new("a.B.\"m\":()V", ProblemKind::InterfaceAddedAbstractMethod, Location::this())
            .with_type_name("a.Iface")
            .with_target("newMethod");
        let b = Problem::new("a.C.\"n\":()V", ProblemKind::InterfaceAddedAbstractMethod, Location::this())
            .with_type_name("a.Iface")
            .with_target("newMethod");
        assert_eq!(a.ceiling_key(), b.ceiling_key());
    }
}

//! The two declarative severity tables (binary, source) the classifier
//! looks up before applying any context override. Kept as plain
//! functions over the closed [`ProblemKind`] enum so a test can assert
//! on every variant without needing to construct a [`Problem`].

use super::Severity;
use crate::diff::problem::ProblemKind;

/// The base binary-compatibility severity for `kind`, before any
/// context-sensitive override is applied.
#[must_use]
pub fn binary_severity(kind: ProblemKind) -> Severity {
    use ProblemKind::{
        AbstractClassAddedAbstractMethod, AbstractClassAddedSuperAbstractClass, AbstractClassAddedSuperInterface,
        AbstractMethodAddedCheckedException, AbstractMethodRemovedCheckedException, AddedMethod, AddedSuperClass,
        AddedUncheckedException, ChangedFieldAccess, ChangedFieldType, ChangedFinalFieldValue, ChangedMethodAccess,
        ChangedMethodReturnFromVoid, ChangedSuperClass, ClassAddedField, ClassBecameAbstract, ClassBecameFinal,
        ClassBecameInterface, ClassBecameNonAbstract, ClassBecameNonFinal, ClassMethodBecameAbstract,
        ClassMethodMovedUpHierarchy, ClassOverriddenMethod, ClassRemovedAbstractMethod, ConstantFieldBecameNonStatic,
        ConstantFieldBecameStatic, FieldBecameFinal, FieldBecameNonFinal, FieldBecameNonStatic, FieldBecameStatic,
        InterfaceAddedAbstractMethod, InterfaceAddedField, InterfaceAddedSuperConstantInterface,
        InterfaceAddedSuperInterface, InterfaceBecameClass, InterfaceRemovedAbstractMethod,
        InterfaceRemovedSuperInterface, MethodBecameAbstract, MethodBecameNonAbstract, MethodBecameNonStatic,
        MethodBecameNonSynchronized, MethodBecameStatic, MethodBecameSynchronized, NonAbstractClassAddedAbstractMethod,
        NonAbstractMethodAddedCheckedException, NonAbstractMethodRemovedCheckedException, NonStaticMethodBecameFinal,
        RemovedConstantField, RemovedMethod, RemovedNonConstantField, RemovedSuperClass, RemovedUncheckedException,
        RenamedConstantField, RenamedNonConstantField, StaticMethodBecameFinal,
    };
    use Severity::{High, Low, Medium, Safe};

    match kind {
        AddedMethod
        | ClassOverriddenMethod
        | ClassMethodMovedUpHierarchy
        | MethodBecameSynchronized
        | MethodBecameNonSynchronized
        | MethodBecameNonAbstract
        | AbstractMethodRemovedCheckedException
        | NonAbstractMethodRemovedCheckedException
        | AddedUncheckedException
        | RemovedUncheckedException
        | ClassBecameNonFinal
        | ClassBecameNonAbstract
        | ClassRemovedAbstractMethod
        | InterfaceRemovedAbstractMethod
        | FieldBecameNonFinal
        | ClassAddedField
        | InterfaceAddedField => Safe,

        NonAbstractMethodAddedCheckedException
        | AbstractMethodAddedCheckedException
        | AddedSuperClass
        | InterfaceAddedSuperConstantInterface
        | RemovedConstantField
        | InterfaceRemovedSuperInterface => Low,

        StaticMethodBecameFinal
        | InterfaceAddedAbstractMethod
        | AbstractClassAddedAbstractMethod
        | RemovedSuperClass
        | AbstractClassAddedSuperAbstractClass
        | InterfaceAddedSuperInterface
        | AbstractClassAddedSuperInterface
        | ChangedFinalFieldValue
        | ConstantFieldBecameStatic
        | ConstantFieldBecameNonStatic => Medium,

        ChangedMethodReturnFromVoid
        | RemovedMethod
        | MethodBecameStatic
        | MethodBecameNonStatic
        | NonStaticMethodBecameFinal
        | ChangedMethodAccess
        | MethodBecameAbstract
        | ClassMethodBecameAbstract
        | ClassBecameInterface
        | InterfaceBecameClass
        | ClassBecameFinal
        | ClassBecameAbstract
        | NonAbstractClassAddedAbstractMethod
        | ChangedSuperClass
        | RemovedNonConstantField
        | RenamedNonConstantField
        | ChangedFieldType
        | ChangedFieldAccess
        | FieldBecameFinal
        | FieldBecameStatic
        | FieldBecameNonStatic => High,

        RenamedConstantField => Low,
    }
}

/// The base source-compatibility severity for `kind`, before any context
/// override is applied.
#[must_use]
pub fn source_severity(kind: ProblemKind) -> Severity {
    use ProblemKind::{
        AbstractClassAddedAbstractMethod, AbstractClassAddedSuperAbstractClass, AbstractClassAddedSuperInterface,
        AbstractMethodAddedCheckedException, AbstractMethodRemovedCheckedException, AddedMethod, AddedSuperClass,
        AddedUncheckedException, ChangedFieldAccess, ChangedFieldType, ChangedFinalFieldValue, ChangedMethodAccess,
        ChangedMethodReturnFromVoid, ChangedSuperClass, ClassAddedField, ClassBecameAbstract, ClassBecameFinal,
        ClassBecameInterface, ClassBecameNonAbstract, ClassBecameNonFinal, ClassMethodBecameAbstract,
        ClassMethodMovedUpHierarchy, ClassOverriddenMethod, ClassRemovedAbstractMethod, ConstantFieldBecameNonStatic,
        ConstantFieldBecameStatic, FieldBecameFinal, FieldBecameNonFinal, FieldBecameNonStatic, FieldBecameStatic,
        InterfaceAddedAbstractMethod, InterfaceAddedField, InterfaceAddedSuperConstantInterface,
        InterfaceAddedSuperInterface, InterfaceBecameClass, InterfaceRemovedAbstractMethod,
        InterfaceRemovedSuperInterface, MethodBecameAbstract, MethodBecameNonAbstract, MethodBecameNonStatic,
        MethodBecameNonSynchronized, MethodBecameStatic, MethodBecameSynchronized, NonAbstractClassAddedAbstractMethod,
        NonAbstractMethodAddedCheckedException, NonAbstractMethodRemovedCheckedException, NonStaticMethodBecameFinal,
        RemovedConstantField, RemovedMethod, RemovedNonConstantField, RemovedSuperClass, RemovedUncheckedException,
        RenamedConstantField, RenamedNonConstantField, StaticMethodBecameFinal,
    };
    use Severity::{High, Low, Medium, Safe};

    match kind {
        AddedMethod
        | ClassOverriddenMethod
        | ClassMethodMovedUpHierarchy
        | MethodBecameSynchronized
        | MethodBecameNonSynchronized
        | MethodBecameNonAbstract
        | AddedUncheckedException
        | RemovedUncheckedException
        | ClassBecameNonFinal
        | ClassBecameNonAbstract
        | ClassRemovedAbstractMethod
        | InterfaceRemovedAbstractMethod
        | ChangedFinalFieldValue
        | FieldBecameNonFinal
        | ClassAddedField
        | InterfaceAddedField => Safe,

        AbstractMethodRemovedCheckedException | NonAbstractMethodRemovedCheckedException | AddedSuperClass | InterfaceAddedSuperConstantInterface => Low,

        NonAbstractMethodAddedCheckedException
        | AbstractMethodAddedCheckedException
        | StaticMethodBecameFinal
        | InterfaceAddedAbstractMethod
        | AbstractClassAddedAbstractMethod
        | RemovedSuperClass
        | AbstractClassAddedSuperAbstractClass
        | InterfaceRemovedSuperInterface
        | ConstantFieldBecameStatic
        | ConstantFieldBecameNonStatic => Medium,

        ChangedMethodReturnFromVoid
        | RemovedMethod
        | MethodBecameStatic
        | MethodBecameNonStatic
        | NonStaticMethodBecameFinal
        | ChangedMethodAccess
        | MethodBecameAbstract
        | ClassMethodBecameAbstract
        | ClassBecameInterface
        | InterfaceBecameClass
        | ClassBecameFinal
        | ClassBecameAbstract
        | NonAbstractClassAddedAbstractMethod
        | InterfaceAddedSuperInterface
        | AbstractClassAddedSuperInterface
        | ChangedSuperClass
        | RemovedConstantField
        | RemovedNonConstantField
        | RenamedConstantField
        | RenamedNonConstantField
        | ChangedFieldType
        | ChangedFieldAccess
        | FieldBecameFinal
        | FieldBecameStatic
        | FieldBecameNonStatic => High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::problem::ProblemKind;

    fn all_kinds() -> Vec<ProblemKind> {
        use ProblemKind::{
            AbstractClassAddedAbstractMethod, AbstractClassAddedSuperAbstractClass, AbstractClassAddedSuperInterface,
            AbstractMethodAddedCheckedException, AbstractMethodRemovedCheckedException, AddedMethod, AddedSuperClass,
            AddedUncheckedException, ChangedFieldAccess, ChangedFieldType, ChangedFinalFieldValue,
            ChangedMethodAccess, ChangedMethodReturnFromVoid, ChangedSuperClass, ClassAddedField, ClassBecameAbstract,
            ClassBecameFinal, ClassBecameInterface, ClassBecameNonAbstract, ClassBecameNonFinal,
            ClassMethodBecameAbstract, ClassMethodMovedUpHierarchy, ClassOverriddenMethod, ClassRemovedAbstractMethod,
            ConstantFieldBecameNonStatic, ConstantFieldBecameStatic, FieldBecameFinal, FieldBecameNonFinal,
            FieldBecameNonStatic, FieldBecameStatic, InterfaceAddedAbstractMethod, InterfaceAddedField,
            InterfaceAddedSuperConstantInterface, InterfaceAddedSuperInterface, InterfaceBecameClass,
            InterfaceRemovedAbstractMethod, InterfaceRemovedSuperInterface, MethodBecameAbstract,
            MethodBecameNonAbstract, MethodBecameNonStatic, MethodBecameNonSynchronized, MethodBecameStatic,
            MethodBecameSynchronized, NonAbstractClassAddedAbstractMethod, NonAbstractMethodAddedCheckedException,
            NonAbstractMethodRemovedCheckedException, NonStaticMethodBecameFinal, RemovedConstantField,
            RemovedMethod, RemovedNonConstantField, RemovedSuperClass, RemovedUncheckedException,
            RenamedConstantField, RenamedNonConstantField, StaticMethodBecameFinal,
        };
        vec![
            AddedMethod,
            RemovedMethod,
            ChangedMethodReturnFromVoid,
            ClassOverriddenMethod,
            ClassMethodMovedUpHierarchy,
            MethodBecameStatic,
            MethodBecameNonStatic,
            MethodBecameSynchronized,
            MethodBecameNonSynchronized,
            NonStaticMethodBecameFinal,
            StaticMethodBecameFinal,
            ChangedMethodAccess,
            MethodBecameAbstract,
            MethodBecameNonAbstract,
            ClassMethodBecameAbstract,
            AbstractMethodAddedCheckedException,
            AbstractMethodRemovedCheckedException,
            NonAbstractMethodAddedCheckedException,
            NonAbstractMethodRemovedCheckedException,
            AddedUncheckedException,
            RemovedUncheckedException,
            ClassBecameInterface,
            InterfaceBecameClass,
            ClassBecameFinal,
            ClassBecameNonFinal,
            ClassBecameAbstract,
            ClassBecameNonAbstract,
            NonAbstractClassAddedAbstractMethod,
            AbstractClassAddedAbstractMethod,
            InterfaceAddedAbstractMethod,
            ClassRemovedAbstractMethod,
            InterfaceRemovedAbstractMethod,
            AddedSuperClass,
            RemovedSuperClass,
            ChangedSuperClass,
            AbstractClassAddedSuperAbstractClass,
            InterfaceAddedSuperInterface,
            InterfaceAddedSuperConstantInterface,
            AbstractClassAddedSuperInterface,
            InterfaceRemovedSuperInterface,
            RemovedConstantField,
            RemovedNonConstantField,
            RenamedConstantField,
            RenamedNonConstantField,
            ChangedFieldType,
            ChangedFieldAccess,
            ChangedFinalFieldValue,
            FieldBecameFinal,
            FieldBecameNonFinal,
            FieldBecameStatic,
            FieldBecameNonStatic,
            ConstantFieldBecameStatic,
            ConstantFieldBecameNonStatic,
            ClassAddedField,
            InterfaceAddedField,
        ]
    }

    #[test]
    fn every_kind_has_a_binary_and_source_severity() {
        for kind in all_kinds() {
            let _ = binary_severity(kind);
            let _ = source_severity(kind);
        }
    }

    #[test]
    fn removed_constant_field_is_low_binary_high_source() {
        assert_eq!(binary_severity(ProblemKind::RemovedConstantField), Severity::Low);
        assert_eq!(source_severity(ProblemKind::RemovedConstantField), Severity::High);
    }

    #[test]
    fn added_super_class_is_low_both_levels() {
        assert_eq!(binary_severity(ProblemKind::AddedSuperClass), Severity::Low);
        assert_eq!(source_severity(ProblemKind::AddedSuperClass), Severity::Low);
    }

    #[test]
    fn changed_final_field_value_is_never_safe_binary() {
        assert!(binary_severity(ProblemKind::ChangedFinalFieldValue) >= Severity::Medium);
    }

    #[test]
    fn scenario_removed_non_constant_field_is_high_high() {
        assert_eq!(binary_severity(ProblemKind::RemovedNonConstantField), Severity::High);
        assert_eq!(source_severity(ProblemKind::RemovedNonConstantField), Severity::High);
    }

    #[test]
    fn scenario_renamed_constant_field_is_low_high() {
        assert_eq!(binary_severity(ProblemKind::RenamedConstantField), Severity::Low);
        assert_eq!(source_severity(ProblemKind::RenamedConstantField), Severity::High);
    }

    #[test]
    fn scenario_added_checked_exception_is_low_medium() {
        assert_eq!(binary_severity(ProblemKind::NonAbstractMethodAddedCheckedException), Severity::Low);
        assert_eq!(source_severity(ProblemKind::NonAbstractMethodAddedCheckedException), Severity::Medium);
    }

    #[test]
    fn scenario_changed_return_from_void_is_high_high() {
        assert_eq!(binary_severity(ProblemKind::ChangedMethodReturnFromVoid), Severity::High);
        assert_eq!(source_severity(ProblemKind::ChangedMethodReturnFromVoid), Severity::High);
    }

    #[test]
    fn scenario_class_became_interface_is_high_high() {
        assert_eq!(binary_severity(ProblemKind::ClassBecameInterface), Severity::High);
        assert_eq!(source_severity(ProblemKind::ClassBecameInterface), Severity::High);
    }
}

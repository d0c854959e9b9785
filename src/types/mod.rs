//! JVM descriptor grammar: primitive types, field types, and method
//! descriptors, independent of any particular symbol table.

pub mod descriptor;

pub use descriptor::{FieldType, InvalidDescriptor, MethodDescriptor, PrimitiveType, ReturnType};

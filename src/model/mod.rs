//! The symbol model: per-version name interning, and the normalized
//! representation of types, fields, and methods.

pub mod interner;
pub mod resolve;
pub mod symbol;
pub mod version;

pub use interner::TypeId;
pub use symbol::{Access, ConstantValue, Field, Method, Parameter, Type, TypeKind};
pub use version::{MethodId, SymbolTable};

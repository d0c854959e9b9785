//! Non-generic JVM type descriptors: the textual grammar used for method
//! and field descriptors (e.g. `(Ljava/lang/String;)V`, `[I`).
//!
//! A descriptor names its referenced class types as plain binary-name
//! strings — resolving those names to a version's interned [`TypeId`]s is
//! the symbol model's job ([`crate::model`]), not this module's.
//!
//! [`TypeId`]: crate::model::interner::TypeId

use std::{fmt::Display, str::FromStr};

use itertools::Itertools;

/// A primitive type in Java.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveType {
    /// The `boolean` type.
    Boolean,
    /// The `char` type.
    Char,
    /// The `float` type.
    Float,
    /// The `double` type.
    Double,
    /// The `byte` type.
    Byte,
    /// The `short` type.
    Short,
    /// The `int` type.
    Int,
    /// The `long` type.
    Long,
    /// The `void` pseudo-type; only legal as a method's return type.
    Void,
}

impl PrimitiveType {
    fn descriptor_char(self) -> char {
        match self {
            Self::Boolean => 'Z',
            Self::Char => 'C',
            Self::Float => 'F',
            Self::Double => 'D',
            Self::Byte => 'B',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Void => 'V',
        }
    }

    /// The fixed set of names a type's `kind` may be `Primitive` for,
    /// per the closed set of primitive source names.
    #[must_use]
    pub fn source_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Void => "void",
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source_name())
    }
}

impl TryFrom<char> for PrimitiveType {
    type Error = InvalidDescriptor;

    fn try_from(descriptor: char) -> Result<Self, Self::Error> {
        match descriptor {
            'Z' => Ok(Self::Boolean),
            'C' => Ok(Self::Char),
            'F' => Ok(Self::Float),
            'D' => Ok(Self::Double),
            'B' => Ok(Self::Byte),
            'S' => Ok(Self::Short),
            'I' => Ok(Self::Int),
            'J' => Ok(Self::Long),
            'V' => Ok(Self::Void),
            unexpected => Err(InvalidDescriptor(unexpected.to_string())),
        }
    }
}

/// A field type (non-generic) in Java: a primitive, a class/interface
/// reference, or an array of either.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum FieldType {
    /// A primitive type. Never [`PrimitiveType::Void`] — that only occurs
    /// as [`ReturnType::Void`].
    Base(PrimitiveType),
    /// A reference type, named by its binary name (`java/lang/String`).
    Object(String),
    /// An array type.
    Array(Box<FieldType>),
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base(it) => it.fmt(f),
            Self::Object(name) => f.write_str(name),
            Self::Array(it) => write!(f, "{it}[]"),
        }
    }
}

impl FieldType {
    /// Wraps `self` as the element type of a fresh array type.
    #[must_use]
    pub fn make_array_type(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// The innermost, non-array element type. Identity for non-arrays.
    #[must_use]
    pub fn base_type(&self) -> &FieldType {
        match self {
            Self::Array(inner) => inner.base_type(),
            other => other,
        }
    }

    /// The JVM descriptor string for this type (`Ljava/lang/String;`, `[I`).
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Base(it) => it.descriptor_char().to_string(),
            Self::Object(name) => format!("L{name};"),
            Self::Array(inner) => format!("[{}", inner.descriptor()),
        }
    }
}

impl FromStr for FieldType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let mut chars = descriptor.chars();
        match chars.next() {
            Some('[') => Self::from_str(chars.as_str()).map(FieldType::make_array_type),
            Some('L') => {
                let name = chars.take_while_ref(|it| *it != ';').collect::<String>();
                match (chars.next(), chars.next()) {
                    (Some(';'), None) => Ok(Self::Object(name)),
                    _ => Err(InvalidDescriptor(descriptor.to_owned())),
                }
            }
            Some(c) if c != 'V' => match chars.next() {
                None => PrimitiveType::try_from(c).map(Self::Base),
                Some(_) => Err(InvalidDescriptor(descriptor.to_owned())),
            },
            _ => Err(InvalidDescriptor(descriptor.to_owned())),
        }
    }
}

/// The return type of a method: either `void` or a [`FieldType`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, derive_more::From)]
pub enum ReturnType {
    /// The method returns a specific type.
    Some(FieldType),
    /// The method returns `void`.
    Void,
}

impl Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Some(t) => t.fmt(f),
            Self::Void => f.write_str("void"),
        }
    }
}

impl ReturnType {
    /// The JVM descriptor fragment for this return type (`V`, `I`, `Ljava/lang/String;`).
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Some(it) => it.descriptor(),
            Self::Void => "V".to_owned(),
        }
    }
}

impl FromStr for ReturnType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor == "V" {
            Ok(Self::Void)
        } else {
            FieldType::from_str(descriptor).map(Self::Some)
        }
    }
}

/// The parsed form of a method descriptor: parameter types plus a return
/// type. This *is* a method's runtime identity — two methods with the
/// same owner, name, and descriptor are the same method.
#[derive(Debug, PartialEq, Eq, Hash, Clone, derive_more::Display)]
#[display("({}){return_type}", parameter_types.iter().map(FieldType::descriptor).join(""))]
pub struct MethodDescriptor {
    /// The parameter types, in declaration order.
    pub parameter_types: Vec<FieldType>,
    /// The return type.
    pub return_type: ReturnType,
}

const PARAM_START: char = '(';
const PARAM_END: char = ')';

impl FromStr for MethodDescriptor {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let remaining = descriptor
            .strip_prefix(PARAM_START)
            .ok_or_else(|| InvalidDescriptor(descriptor.to_owned()))?;
        let (parameter_types, remaining) = parse_params(remaining, descriptor)?;
        let return_type = ReturnType::from_str(remaining)
            .map_err(|_| InvalidDescriptor(descriptor.to_owned()))?;
        Ok(Self {
            parameter_types,
            return_type,
        })
    }
}

fn parse_params<'a>(
    mut remaining: &'a str,
    whole: &str,
) -> Result<(Vec<FieldType>, &'a str), InvalidDescriptor> {
    let mut parameter_types = Vec::new();
    loop {
        if let Some(rest) = remaining.strip_prefix(PARAM_END) {
            return Ok((parameter_types, rest));
        }
        let (dimension, after_dim) = parse_array_dimension(remaining);
        let (base_type, after_param) =
            parse_next_scalar(after_dim).map_err(|_| InvalidDescriptor(whole.to_owned()))?;
        let param_type = (0..dimension).fold(base_type, |acc, _| acc.make_array_type());
        parameter_types.push(param_type);
        remaining = after_param;
    }
}

fn parse_next_scalar(input: &str) -> Result<(FieldType, &str), InvalidDescriptor> {
    let mut chars = input.chars();
    match chars.next() {
        Some(c @ ('Z' | 'C' | 'F' | 'D' | 'B' | 'S' | 'I' | 'J')) => {
            Ok((FieldType::Base(PrimitiveType::try_from(c)?), chars.as_str()))
        }
        Some('L') => {
            let name = chars.take_while_ref(|it| *it != ';').collect::<String>();
            match chars.next() {
                Some(';') => Ok((FieldType::Object(name), chars.as_str())),
                _ => Err(InvalidDescriptor(input.to_owned())),
            }
        }
        _ => Err(InvalidDescriptor(input.to_owned())),
    }
}

fn parse_array_dimension(input: &str) -> (u8, &str) {
    let count = input.chars().take_while(|&c| c == '[').count();
    #[allow(clippy::cast_possible_truncation)]
    (count as u8, &input[count..])
}

/// An error indicating that a descriptor string did not match the JVM
/// descriptor grammar.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid descriptor: {0}")]
pub struct InvalidDescriptor(pub String);

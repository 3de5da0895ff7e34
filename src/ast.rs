//! Syntax tree for the GraphQL SDL subset accepted by the compiler.
//!
//! The tree is generic: directives carry untyped argument values and are only
//! given meaning by [`crate::directive`].

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Object(ObjectType),
    Interface(InterfaceType),
    Enum(EnumType),
    Scalar(ScalarType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub implements: Vec<String>,
    pub directives: Vec<Directive>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    pub name: String,
    pub directives: Vec<Directive>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub directives: Vec<Directive>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub name: String,
    pub directives: Vec<Directive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub typ: TypeRef,
    pub directives: Vec<Directive>,
}

/// A declared field type: `Name`, `Name!`, `[Name]`, `[Name!]!`, ...
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// The innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Whether the type is a list once the outer non-null marker is stripped.
    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => matches!(**inner, Self::List(_)),
            Self::Named(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<Argument>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
            Self::Enum(_) => "enum value",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

impl Document {
    pub fn objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Object(o) => Some(o),
            _ => None,
        })
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceType> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Interface(i) => Some(i),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumType> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Enum(e) => Some(e),
            _ => None,
        })
    }
}

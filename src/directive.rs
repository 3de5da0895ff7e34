//! Typed directives.
//!
//! The parser keeps directive arguments as untyped values. This module turns
//! the directives the layout depends on into typed values, rejecting unknown
//! or repeated arguments, missing arguments, and values of the wrong shape.
//! Other directives, such as `@deprecated` or `@aggregate`, are skipped.

use tracing::trace;

use crate::ast::{self, Argument, Value};

pub const ENTITY: &str = "entity";
pub const DERIVED_FROM: &str = "derivedFrom";
pub const FULLTEXT: &str = "fulltext";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DirectiveError {
    #[error("@{directive} is not allowed on {location}")]
    Misplaced {
        directive: String,
        location: &'static str,
    },
    #[error("@{0} given more than once")]
    Repeated(String),
    #[error("@{directive} is missing argument `{argument}`")]
    MissingArgument {
        directive: &'static str,
        argument: &'static str,
    },
    #[error("@{directive} has unknown argument `{argument}`")]
    UnknownArgument {
        directive: &'static str,
        argument: String,
    },
    #[error("@{directive} has argument `{argument}` more than once")]
    DuplicateArgument {
        directive: &'static str,
        argument: String,
    },
    #[error("@{directive} argument `{argument}` must be {expected}, found {found}")]
    InvalidArgument {
        directive: &'static str,
        argument: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// Options of `@entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityOptions {
    pub immutable: bool,
    pub timeseries: bool,
}

/// `@derivedFrom(field: "...")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFrom {
    pub field: String,
}

/// `@fulltext(name: ..., language: ..., algorithm: ..., include: [...])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fulltext {
    pub name: String,
    pub language: String,
    pub algorithm: String,
    pub include: Vec<FulltextInclude>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulltextInclude {
    pub entity: String,
    pub fields: Vec<String>,
}

/// Directives attached to an object type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeDirectives {
    pub entity: Option<EntityOptions>,
    pub fulltext: Vec<Fulltext>,
}

/// Ingest the directives of an object type.
pub fn type_directives(directives: &[ast::Directive]) -> Result<TypeDirectives, DirectiveError> {
    let mut out = TypeDirectives::default();

    for directive in directives {
        match directive.name.as_str() {
            ENTITY => {
                if out.entity.is_some() {
                    return Err(DirectiveError::Repeated(directive.name.clone()));
                }
                out.entity = Some(entity_options(&directive.arguments)?);
            }
            FULLTEXT => out.fulltext.push(fulltext(&directive.arguments)?),
            DERIVED_FROM => {
                return Err(DirectiveError::Misplaced {
                    directive: directive.name.clone(),
                    location: "a type",
                });
            }
            _ => trace!(directive = %directive.name, "skipping directive"),
        }
    }

    Ok(out)
}

/// Ingest the directives of a field; returns the derivation if there is one.
pub fn field_directives(directives: &[ast::Directive]) -> Result<Option<DerivedFrom>, DirectiveError> {
    let mut derived = None;

    for directive in directives {
        match directive.name.as_str() {
            DERIVED_FROM => {
                if derived.is_some() {
                    return Err(DirectiveError::Repeated(directive.name.clone()));
                }
                let args = Args::new(DERIVED_FROM, &directive.arguments, &["field"])?;
                derived = Some(DerivedFrom {
                    field: args.string("field")?,
                });
            }
            ENTITY | FULLTEXT => {
                return Err(DirectiveError::Misplaced {
                    directive: directive.name.clone(),
                    location: "a field",
                });
            }
            _ => trace!(directive = %directive.name, "skipping directive"),
        }
    }

    Ok(derived)
}

fn entity_options(arguments: &[Argument]) -> Result<EntityOptions, DirectiveError> {
    let args = Args::new(ENTITY, arguments, &["immutable", "timeseries"])?;
    Ok(EntityOptions {
        immutable: args.optional_bool("immutable")?.unwrap_or(false),
        timeseries: args.optional_bool("timeseries")?.unwrap_or(false),
    })
}

fn fulltext(arguments: &[Argument]) -> Result<Fulltext, DirectiveError> {
    let args = Args::new(FULLTEXT, arguments, &["name", "language", "algorithm", "include"])?;

    let include = args
        .list("include")?
        .iter()
        .map(|entry| {
            let entry = Args::object(FULLTEXT, "include", entry, &["entity", "fields"])?;
            let fields = entry
                .list("fields")?
                .iter()
                .map(|field| Args::object(FULLTEXT, "fields", field, &["name"])?.string("name"))
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, DirectiveError>(FulltextInclude {
                entity: entry.string("entity")?,
                fields,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Fulltext {
        name: args.string("name")?,
        language: args.word("language")?,
        algorithm: args.word("algorithm")?,
        include,
    })
}

/// A validated argument bag of one directive, or of one object value nested
/// inside a directive argument.
struct Args<'a> {
    directive: &'static str,
    arguments: &'a [Argument],
}

impl<'a> Args<'a> {
    fn new(
        directive: &'static str,
        arguments: &'a [Argument],
        allowed: &[&'static str],
    ) -> Result<Self, DirectiveError> {
        for (i, arg) in arguments.iter().enumerate() {
            if !allowed.contains(&arg.name.as_str()) {
                return Err(DirectiveError::UnknownArgument {
                    directive,
                    argument: arg.name.clone(),
                });
            }
            if arguments[..i].iter().any(|prev| prev.name == arg.name) {
                return Err(DirectiveError::DuplicateArgument {
                    directive,
                    argument: arg.name.clone(),
                });
            }
        }
        Ok(Self {
            directive,
            arguments,
        })
    }

    fn object(
        directive: &'static str,
        argument: &'static str,
        value: &'a Value,
        allowed: &[&'static str],
    ) -> Result<Self, DirectiveError> {
        match value {
            Value::Object(fields) => Self::new(directive, fields, allowed),
            other => Err(DirectiveError::InvalidArgument {
                directive,
                argument,
                expected: "an object",
                found: other.kind(),
            }),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }

    fn required(&self, name: &'static str) -> Result<&'a Value, DirectiveError> {
        self.get(name).ok_or(DirectiveError::MissingArgument {
            directive: self.directive,
            argument: name,
        })
    }

    fn invalid(&self, argument: &'static str, expected: &'static str, found: &Value) -> DirectiveError {
        DirectiveError::InvalidArgument {
            directive: self.directive,
            argument,
            expected,
            found: found.kind(),
        }
    }

    fn string(&self, name: &'static str) -> Result<String, DirectiveError> {
        match self.required(name)? {
            Value::Str(s) => Ok(s.clone()),
            other => Err(self.invalid(name, "a string", other)),
        }
    }

    /// A string or a bare enum value, e.g. `language: en`.
    fn word(&self, name: &'static str) -> Result<String, DirectiveError> {
        match self.required(name)? {
            Value::Str(s) | Value::Enum(s) => Ok(s.clone()),
            other => Err(self.invalid(name, "a string or enum value", other)),
        }
    }

    fn list(&self, name: &'static str) -> Result<&'a [Value], DirectiveError> {
        match self.required(name)? {
            Value::List(items) => Ok(items),
            other => Err(self.invalid(name, "a list", other)),
        }
    }

    fn optional_bool(&self, name: &'static str) -> Result<Option<bool>, DirectiveError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.invalid(name, "a boolean", other)),
        }
    }
}

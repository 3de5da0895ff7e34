//! Errors raised while compiling a schema into a [`crate::Layout`].
//!
//! Every error is fatal: compilation either yields a complete layout or one of
//! these, never a partial result.

use std::fmt;

use crate::directive::DirectiveError;
use crate::parser::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),
    #[error("Invalid directive on `{location}`: {source}")]
    Directive {
        location: String,
        #[source]
        source: DirectiveError,
    },
    #[error("Entity `{entity}` has no `id` field")]
    MissingId { entity: String },
    #[error("Unknown type `{type_name}` for field `{entity}.{field}`")]
    UnknownScalar {
        entity: String,
        field: String,
        type_name: String,
    },
    #[error("Unresolved relation at `{location}`: {reason}")]
    UnresolvedRelation { location: String, reason: String },
    #[error("Duplicate {kind} name `{name}`")]
    DuplicateName { kind: NameKind, name: String },
}

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed schema text or syntax tree.
    Syntax,
    UnknownScalar,
    UnresolvedRelation,
    DuplicateName,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax(_) | Self::Directive { .. } | Self::MissingId { .. } => ErrorKind::Syntax,
            Self::UnknownScalar { .. } => ErrorKind::UnknownScalar,
            Self::UnresolvedRelation { .. } => ErrorKind::UnresolvedRelation,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
        }
    }

    pub(crate) fn unresolved(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvedRelation {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Table,
    Enum,
    Column,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Enum => "enum",
            Self::Column => "column",
        })
    }
}

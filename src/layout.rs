//! The compiled relational layout of a subgraph schema.
//!
//! A [`Layout`] is built once by [`crate::compiler::compile`] and is read-only
//! afterwards: tables and enums can be looked up and iterated in declaration
//! order, but there is no mutation API.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Error, NameKind};

/// Row-identity column present on every table; the table's primary key.
pub const VID_COLUMN: &str = "vid";
/// Validity-range column present on every table.
pub const BLOCK_RANGE_COLUMN: &str = "block_range";
/// The declared identifier field of an entity.
pub const ID_FIELD: &str = "id";

/// Storage types used by the indexing engine's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    BigSerial,
    Int4Range,
    Text,
    Boolean,
    Numeric,
    Bytea,
    Integer,
    Int8,
    #[serde(rename = "tsvector")]
    TextSearch,
    Timestamptz,
}

impl DbType {
    /// The PostgreSQL spelling of the type.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::BigSerial => "bigserial",
            Self::Int4Range => "int4range",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::Bytea => "bytea",
            Self::Integer => "integer",
            Self::Int8 => "int8",
            Self::TextSearch => "tsvector",
            Self::Timestamptz => "timestamptz",
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ColumnType {
    Scalar {
        db_type: DbType,
    },
    Enum {
        name: String,
    },
    /// A reference to the `column` of one of `tables`. Entity references name
    /// a single table; interface references name every implementing table.
    Reference {
        tables: Vec<String>,
        column: String,
        db_type: DbType,
    },
    List {
        element: Box<ColumnType>,
    },
    TextSearch {
        db_type: DbType,
        language: String,
        algorithm: String,
        columns: Vec<String>,
    },
}

impl ColumnType {
    pub fn scalar(db_type: DbType) -> Self {
        Self::Scalar { db_type }
    }

    /// The storage type of the column, if it has a single one.
    ///
    /// Enums are stored with a dedicated enum type and lists as arrays of the
    /// element type, so neither has a plain `DbType`.
    pub fn db_type(&self) -> Option<DbType> {
        match self {
            Self::Scalar { db_type }
            | Self::Reference { db_type, .. }
            | Self::TextSearch { db_type, .. } => Some(*db_type),
            Self::Enum { .. } | Self::List { .. } => None,
        }
    }

    /// The reference carried by this type, looking through one list wrapper.
    pub fn as_reference(&self) -> Option<(&[String], &str)> {
        match self {
            Self::Reference { tables, column, .. } => Some((tables.as_slice(), column.as_str())),
            Self::List { element } => match element.as_ref() {
                Self::Reference { tables, column, .. } => Some((tables.as_slice(), column.as_str())),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: ColumnType,
    pub nullable: bool,
    pub is_primary: bool,
}

impl Column {
    pub(crate) fn vid() -> Self {
        Self {
            name: VID_COLUMN.to_string(),
            typ: ColumnType::scalar(DbType::BigSerial),
            nullable: false,
            is_primary: true,
        }
    }

    pub(crate) fn block_range() -> Self {
        Self {
            name: BLOCK_RANGE_COLUMN.to_string(),
            typ: ColumnType::scalar(DbType::Int4Range),
            nullable: false,
            is_primary: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    One,
    Many,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Many => "many",
        }
    }
}

/// A derived association: rows of `table` whose `column` references this
/// table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    pub name: String,
    pub table: String,
    pub column: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    name: String,
    immutable: bool,
    timeseries: bool,
    columns: IndexMap<String, Column>,
    relations: IndexMap<String, Vec<Relation>>,
}

impl Table {
    /// A table holding only the synthetic versioning columns.
    pub(crate) fn new(name: String, immutable: bool, timeseries: bool) -> Self {
        let mut columns = IndexMap::new();
        for column in [Column::vid(), Column::block_range()] {
            columns.insert(column.name.clone(), column);
        }
        Self {
            name,
            immutable,
            timeseries,
            columns,
            relations: IndexMap::new(),
        }
    }

    pub(crate) fn push_column(&mut self, column: Column) -> Result<(), Error> {
        if self.columns.contains_key(&column.name) {
            return Err(Error::DuplicateName {
                kind: NameKind::Column,
                name: format!("{}.{}", self.name, column.name),
            });
        }
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    pub(crate) fn push_relation(&mut self, column: String, relation: Relation) {
        self.relations.entry(column).or_default().push(relation);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the entity was declared `@entity(immutable: true)`.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Whether the entity was declared `@entity(timeseries: true)`.
    pub fn is_timeseries(&self) -> bool {
        self.timeseries
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.values().filter(|c| c.is_primary)
    }

    /// Relations recorded against a local column, in declaration order.
    pub fn relations_of(&self, column: &str) -> Option<&[Relation]> {
        self.relations.get(column).map(Vec::as_slice)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &[Relation])> {
        self.relations
            .iter()
            .map(|(column, rels)| (column.as_str(), rels.as_slice()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    tables: IndexMap<String, Table>,
    enums: IndexMap<String, Vec<String>>,
}

impl Layout {
    pub(crate) fn new(tables: IndexMap<String, Table>, enums: IndexMap<String, Vec<String>>) -> Self {
        Self { tables, enums }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Members of an enum, verbatim and in declaration order.
    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn enums(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.enums
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

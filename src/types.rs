//! Field type to column type mapping.

use std::collections::HashMap;

use crate::ast::TypeRef;
use crate::layout::{ColumnType, DbType, ID_FIELD};
use crate::naming::snake_case;

/// Map a built-in scalar name to its storage type.
pub fn scalar_db_type(name: &str) -> Option<DbType> {
    match name {
        "ID" | "String" => Some(DbType::Text),
        "Boolean" => Some(DbType::Boolean),
        "Int" => Some(DbType::Integer),
        "Int8" => Some(DbType::Int8),
        "BigInt" | "BigDecimal" => Some(DbType::Numeric),
        "Bytes" => Some(DbType::Bytea),
        "Timestamp" => Some(DbType::Timestamptz),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Not a built-in scalar, enum, entity or interface.
    Unknown(String),
    /// An interface that no entity implements.
    NoImplementors(String),
}

/// Resolves declared field types against the names a schema defines.
///
/// Lookups are by declared (not normalized) name; resolved types carry
/// normalized table and enum names.
#[derive(Debug, Default)]
pub struct TypeResolver<'a> {
    enums: HashMap<&'a str, String>,
    entities: HashMap<&'a str, String>,
    interfaces: HashMap<&'a str, Vec<String>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_enum(&mut self, name: &'a str) {
        self.enums.insert(name, snake_case(name));
    }

    pub fn add_entity(&mut self, name: &'a str) {
        self.entities.insert(name, snake_case(name));
    }

    /// Register an interface with the table names of its implementing
    /// entities, in declaration order.
    pub fn add_interface(&mut self, name: &'a str, tables: Vec<String>) {
        self.interfaces.insert(name, tables);
    }

    /// The table name of an entity type.
    pub fn entity_table(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    pub fn is_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Resolve a declared field type, ignoring nullability.
    pub fn resolve(&self, typ: &TypeRef) -> Result<ColumnType, ResolveError> {
        match typ {
            TypeRef::NonNull(inner) => self.resolve(inner),
            TypeRef::List(inner) => Ok(ColumnType::List {
                element: Box::new(self.resolve(inner)?),
            }),
            TypeRef::Named(name) => self.resolve_named(name),
        }
    }

    fn resolve_named(&self, name: &str) -> Result<ColumnType, ResolveError> {
        if let Some(db_type) = scalar_db_type(name) {
            return Ok(ColumnType::scalar(db_type));
        }
        if let Some(enum_name) = self.enums.get(name) {
            return Ok(ColumnType::Enum {
                name: enum_name.clone(),
            });
        }
        if let Some(table) = self.entities.get(name) {
            return Ok(reference(vec![table.clone()]));
        }
        match self.interfaces.get(name) {
            Some(tables) if tables.is_empty() => Err(ResolveError::NoImplementors(name.to_string())),
            Some(tables) => Ok(reference(tables.clone())),
            None => Err(ResolveError::Unknown(name.to_string())),
        }
    }
}

fn reference(tables: Vec<String>) -> ColumnType {
    ColumnType::Reference {
        tables,
        column: ID_FIELD.to_string(),
        db_type: DbType::Text,
    }
}

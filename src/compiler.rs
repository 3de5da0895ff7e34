//! Schema to layout compilation.
//!
//! Compilation is a pure batch function over a [`Document`] and runs in two
//! explicit passes:
//!
//! 1. Every `@entity` type becomes a [`Table`] holding the versioning columns
//!    and one column per stored field. Tables live in a vector and are
//!    addressed by index from then on. Derived fields are set aside.
//! 2. Derived fields and `@fulltext` directives are resolved against the
//!    finished tables. This pass only reads them and produces a list of
//!    [`Append`]s, which are applied once it has succeeded.
//!
//! Any error aborts the whole compilation.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{Document, Field, ObjectType};
use crate::directive::{self, DerivedFrom, DirectiveError, EntityOptions, Fulltext, FulltextInclude};
use crate::error::{Error, NameKind};
use crate::layout::{Column, ColumnType, DbType, ID_FIELD, Layout, Relation, RelationKind, Table};
use crate::naming::snake_case;
use crate::types::{ResolveError, TypeResolver};

/// Name of the type that carries schema-wide directives such as `@fulltext`.
pub const SCHEMA_TYPE: &str = "_Schema_";

/// Compile a parsed schema into its table layout.
pub fn compile(document: &Document) -> Result<Layout, Error> {
    let catalog = Catalog::collect(document)?;
    debug!(
        entities = catalog.entities.len(),
        enums = catalog.enums.len(),
        fulltext = catalog.fulltext.len(),
        "collected schema definitions"
    );

    let (tables, deferred) = build_tables(&catalog)?;
    debug!(tables = tables.len(), derived = deferred.len(), "built tables");

    let appends = link(&catalog, &tables, &deferred)?;
    debug!(appends = appends.len(), "linked relations");

    assemble(tables, appends, catalog.enums)
}

struct EntityDef<'a> {
    object: &'a ObjectType,
    table: String,
    options: EntityOptions,
    fields: Vec<(&'a Field, Option<DerivedFrom>)>,
}

/// Everything pass 1 needs: entity definitions with their directives
/// ingested, the enum registry, and the names types resolve against.
struct Catalog<'a> {
    entities: Vec<EntityDef<'a>>,
    enums: IndexMap<String, Vec<String>>,
    fulltext: Vec<Fulltext>,
    resolver: TypeResolver<'a>,
}

impl<'a> Catalog<'a> {
    fn collect(document: &'a Document) -> Result<Self, Error> {
        let mut entities: Vec<EntityDef<'a>> = Vec::new();
        let mut fulltext = Vec::new();
        let mut resolver = TypeResolver::new();
        let mut table_names = HashSet::new();

        for object in document.objects() {
            let is_entity = object.directives.iter().any(|d| d.name == directive::ENTITY);
            if !is_entity && object.name != SCHEMA_TYPE {
                trace!(name = %object.name, "skipping non-entity type");
                continue;
            }

            let directives = directive::type_directives(&object.directives).map_err(|source| {
                Error::Directive {
                    location: object.name.clone(),
                    source,
                }
            })?;

            if object.name == SCHEMA_TYPE {
                fulltext.extend(directives.fulltext);
            } else if !directives.fulltext.is_empty() {
                return Err(Error::Directive {
                    location: object.name.clone(),
                    source: DirectiveError::Misplaced {
                        directive: directive::FULLTEXT.to_string(),
                        location: "a type other than `_Schema_`",
                    },
                });
            }

            let Some(options) = directives.entity else {
                continue;
            };

            let fields = object
                .fields
                .iter()
                .map(|field| {
                    let derived = directive::field_directives(&field.directives).map_err(|source| {
                        Error::Directive {
                            location: format!("{}.{}", object.name, field.name),
                            source,
                        }
                    })?;
                    Ok((field, derived))
                })
                .collect::<Result<Vec<_>, Error>>()?;

            let table = snake_case(&object.name);
            if !table_names.insert(table.clone()) {
                return Err(Error::DuplicateName {
                    kind: NameKind::Table,
                    name: table,
                });
            }
            resolver.add_entity(&object.name);
            entities.push(EntityDef {
                object,
                table,
                options,
                fields,
            });
        }

        let mut enums = IndexMap::new();
        for definition in document.enums() {
            let name = snake_case(&definition.name);
            if enums.contains_key(&name) {
                return Err(Error::DuplicateName {
                    kind: NameKind::Enum,
                    name,
                });
            }
            enums.insert(name, definition.values.clone());
            resolver.add_enum(&definition.name);
        }

        for interface in document.interfaces() {
            let tables = entities
                .iter()
                .filter(|e| e.object.implements.contains(&interface.name))
                .map(|e| e.table.clone())
                .collect();
            resolver.add_interface(&interface.name, tables);
        }

        Ok(Self {
            entities,
            enums,
            fulltext,
            resolver,
        })
    }
}

/// A derived field of the entity at `table`, resolved in pass 2.
struct Deferred<'a> {
    table: usize,
    entity: &'a ObjectType,
    field: &'a Field,
    derived: DerivedFrom,
}

fn build_tables<'a>(catalog: &Catalog<'a>) -> Result<(Vec<Table>, Vec<Deferred<'a>>), Error> {
    let mut tables = Vec::with_capacity(catalog.entities.len());
    let mut deferred = Vec::new();

    for (index, entity) in catalog.entities.iter().enumerate() {
        tables.push(build_table(index, entity, &catalog.resolver, &mut deferred)?);
    }

    Ok((tables, deferred))
}

fn build_table<'a>(
    index: usize,
    entity: &EntityDef<'a>,
    resolver: &TypeResolver<'_>,
    deferred: &mut Vec<Deferred<'a>>,
) -> Result<Table, Error> {
    if !entity.object.fields.iter().any(|f| f.name == ID_FIELD) {
        return Err(Error::MissingId {
            entity: entity.object.name.clone(),
        });
    }

    let mut table = Table::new(
        entity.table.clone(),
        entity.options.immutable,
        entity.options.timeseries,
    );

    for &(field, ref derived) in &entity.fields {
        if let Some(derived) = derived {
            deferred.push(Deferred {
                table: index,
                entity: entity.object,
                field,
                derived: derived.clone(),
            });
            continue;
        }

        // The id column is stored as text whatever its declared scalar
        let typ = if field.name == ID_FIELD {
            ColumnType::scalar(DbType::Text)
        } else {
            resolver
                .resolve(&field.typ)
                .map_err(|err| resolve_error(entity.object, field, err))?
        };

        table.push_column(Column {
            name: snake_case(&field.name),
            typ,
            nullable: !field.typ.is_required(),
            is_primary: false,
        })?;
    }

    trace!(table = %table.name(), columns = table.column_count(), "built table");
    Ok(table)
}

fn resolve_error(entity: &ObjectType, field: &Field, err: ResolveError) -> Error {
    match err {
        ResolveError::Unknown(type_name) => Error::UnknownScalar {
            entity: entity.name.clone(),
            field: field.name.clone(),
            type_name,
        },
        ResolveError::NoImplementors(interface) => Error::unresolved(
            format!("{}.{}", entity.name, field.name),
            format!("interface `{}` has no implementing entities", interface),
        ),
    }
}

/// A pass 2 result, applied to the table at index `table`.
#[derive(Debug)]
enum Append {
    Relation {
        table: usize,
        column: String,
        relation: Relation,
    },
    Column {
        table: usize,
        column: Column,
    },
}

fn link(catalog: &Catalog<'_>, tables: &[Table], deferred: &[Deferred<'_>]) -> Result<Vec<Append>, Error> {
    let index: HashMap<&str, usize> = tables
        .iter()
        .enumerate()
        .map(|(i, table)| (table.name(), i))
        .collect();

    let mut appends = Vec::with_capacity(deferred.len());

    for derived in deferred {
        appends.push(link_relation(&catalog.resolver, tables, &index, derived)?);
    }

    for fulltext in &catalog.fulltext {
        for include in &fulltext.include {
            appends.push(fulltext_column(tables, &index, fulltext, include)?);
        }
    }

    Ok(appends)
}

fn link_relation(
    resolver: &TypeResolver<'_>,
    tables: &[Table],
    index: &HashMap<&str, usize>,
    deferred: &Deferred<'_>,
) -> Result<Append, Error> {
    let location = format!("{}.{}", deferred.entity.name, deferred.field.name);
    let source = &tables[deferred.table];
    let target_type = deferred.field.typ.base_name();

    let Some(target) = resolver
        .entity_table(target_type)
        .and_then(|name| index.get(name))
        .map(|&i| &tables[i])
    else {
        let reason = if resolver.is_interface(target_type) {
            format!("`{}` is an interface, not an entity", target_type)
        } else {
            format!("unknown entity `{}`", target_type)
        };
        return Err(Error::unresolved(location, reason));
    };

    let column_name = snake_case(&deferred.derived.field);
    let Some(column) = target.column(&column_name) else {
        return Err(Error::unresolved(
            location,
            format!("`{}` has no field `{}`", target_type, deferred.derived.field),
        ));
    };

    let Some((_, local_column)) = column
        .typ
        .as_reference()
        .filter(|(referenced, _)| referenced.iter().any(|t| t == source.name()))
    else {
        return Err(Error::unresolved(
            location,
            format!(
                "field `{}` of `{}` does not reference `{}`",
                deferred.derived.field, target_type, deferred.entity.name
            ),
        ));
    };

    let kind = if deferred.field.typ.is_list() {
        RelationKind::Many
    } else {
        RelationKind::One
    };
    trace!(
        table = %source.name(),
        relation = %deferred.field.name,
        target = %target.name(),
        kind = kind.as_str(),
        "linked relation"
    );

    Ok(Append::Relation {
        table: deferred.table,
        column: local_column.to_string(),
        relation: Relation {
            name: snake_case(&deferred.field.name),
            table: target.name().to_string(),
            column: column_name,
            kind,
        },
    })
}

fn fulltext_column(
    tables: &[Table],
    index: &HashMap<&str, usize>,
    fulltext: &Fulltext,
    include: &FulltextInclude,
) -> Result<Append, Error> {
    let location = format!("@fulltext({})", fulltext.name);
    let table_name = snake_case(&include.entity);
    let Some(&table) = index.get(table_name.as_str()) else {
        return Err(Error::unresolved(
            location,
            format!("unknown entity `{}`", include.entity),
        ));
    };

    let mut columns = Vec::with_capacity(include.fields.len());
    for field in &include.fields {
        let column = snake_case(field);
        if tables[table].column(&column).is_none() {
            return Err(Error::unresolved(
                location,
                format!("`{}` has no field `{}`", include.entity, field),
            ));
        }
        columns.push(column);
    }

    Ok(Append::Column {
        table,
        column: Column {
            name: snake_case(&fulltext.name),
            typ: ColumnType::TextSearch {
                db_type: DbType::TextSearch,
                language: fulltext.language.clone(),
                algorithm: fulltext.algorithm.clone(),
                columns,
            },
            nullable: true,
            is_primary: false,
        },
    })
}

fn assemble(
    mut tables: Vec<Table>,
    appends: Vec<Append>,
    enums: IndexMap<String, Vec<String>>,
) -> Result<Layout, Error> {
    for append in appends {
        match append {
            Append::Relation {
                table,
                column,
                relation,
            } => tables[table].push_relation(column, relation),
            Append::Column { table, column } => tables[table].push_column(column)?,
        }
    }

    let tables = tables
        .into_iter()
        .map(|table| (table.name().to_string(), table))
        .collect();
    Ok(Layout::new(tables, enums))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Definition, Directive, TypeRef};
    use crate::error::ErrorKind;
    use crate::layout::{BLOCK_RANGE_COLUMN, VID_COLUMN};
    use crate::parser::parse_document;

    fn compile_str(input: &str) -> Result<Layout, Error> {
        compile(&parse_document(input).unwrap())
    }

    const SIMPLE: &str = r#"
        type SomeComplexTableErc20Name @entity {
            "Some description about a string field"
            id: ID!,
            nullableField: Boolean,
            booleanField: Boolean!,
            bigIntField: BigInt!,
            bytesField: Bytes!,
            bigDecimalField: BigDecimal!,
            intField: Int!,
            int8Field: Int8!,
            stringField: String!
        }
    "#;

    #[test]
    fn test_table_columns() {
        let layout = compile_str(SIMPLE).unwrap();
        assert_eq!(layout.table_count(), 1);

        let table = layout.table("some_complex_table_erc_20_name").unwrap();
        assert_eq!(table.column_count(), 11);

        let pk: Vec<&str> = table.primary_key().map(|c| c.name.as_str()).collect();
        assert_eq!(pk, vec![VID_COLUMN]);

        let vid = table.column(VID_COLUMN).unwrap();
        assert_eq!(vid.typ, ColumnType::scalar(DbType::BigSerial));
        assert!(!vid.nullable);

        let block_range = table.column(BLOCK_RANGE_COLUMN).unwrap();
        assert_eq!(block_range.typ, ColumnType::scalar(DbType::Int4Range));
        assert!(!block_range.is_primary);
        assert!(!block_range.nullable);

        let id = table.column(ID_FIELD).unwrap();
        assert_eq!(id.typ, ColumnType::scalar(DbType::Text));
        assert!(!id.is_primary);
        assert!(!id.nullable);

        assert!(table.column("nullable_field").unwrap().nullable);
        assert!(!table.column("boolean_field").unwrap().nullable);
    }

    #[test]
    fn test_scalar_columns() {
        let layout = compile_str(SIMPLE).unwrap();
        let table = layout.table("some_complex_table_erc_20_name").unwrap();

        let expected = [
            ("boolean_field", DbType::Boolean),
            ("big_int_field", DbType::Numeric),
            ("bytes_field", DbType::Bytea),
            ("big_decimal_field", DbType::Numeric),
            ("int_field", DbType::Integer),
            ("int_8_field", DbType::Int8),
            ("string_field", DbType::Text),
        ];
        for (name, db_type) in expected {
            let column = table.column(name).unwrap_or_else(|| panic!("missing {}", name));
            assert_eq!(column.typ, ColumnType::scalar(db_type), "{}", name);
        }
    }

    #[test]
    fn test_column_order() {
        let layout = compile_str(SIMPLE).unwrap();
        let names: Vec<&str> = layout.tables().next().unwrap().column_names().take(4).collect();
        assert_eq!(names, vec![VID_COLUMN, BLOCK_RANGE_COLUMN, "id", "nullable_field"]);
    }

    #[test]
    fn test_id_is_always_text() {
        let layout = compile_str("type Pair @entity { id: Bytes! }").unwrap();
        let id = layout.table("pair").unwrap().column(ID_FIELD).unwrap();
        assert_eq!(id.typ, ColumnType::scalar(DbType::Text));
        assert!(!id.is_primary);
    }

    #[test]
    fn test_enum() {
        let input = r#"
            enum SomeComplexNamedErc20 {
                A
                B
                C
            }

            type SomeEnumTable @entity {
                id: ID!,
                enumField: SomeComplexNamedErc20!
            }
        "#;
        let layout = compile_str(input).unwrap();

        assert_eq!(layout.enum_count(), 1);
        assert_eq!(
            layout.enum_values("some_complex_named_erc_20"),
            Some(&["A".to_string(), "B".to_string(), "C".to_string()][..])
        );

        let column = layout.table("some_enum_table").unwrap().column("enum_field").unwrap();
        assert_eq!(
            column.typ,
            ColumnType::Enum {
                name: "some_complex_named_erc_20".into()
            }
        );
    }

    const RELATIONS: &str = r#"
        type SomeRelationParentTable @entity {
            id: ID!,
            children: [SomeRelationChildTable!]! @derivedFrom(field: "parentField")
        }

        type SomeRelationChildTable @entity {
            id: ID!,
            parentField: SomeRelationParentTable!
        }

        type SomeOneToOneRelationParentTable @entity {
            id: ID!,
            child: SomeRelationChildTable @derivedFrom(field: "parentField")
        }
    "#;

    #[test]
    fn test_relation_many() {
        let input = RELATIONS.replace(
            "parentField: SomeRelationParentTable!",
            "parentField: SomeRelationParentTable!\n otherParent: SomeOneToOneRelationParentTable",
        );
        let input = input.replace(
            "child: SomeRelationChildTable @derivedFrom(field: \"parentField\")",
            "child: SomeRelationChildTable @derivedFrom(field: \"otherParent\")",
        );
        let layout = compile_str(&input).unwrap();
        assert_eq!(layout.table_count(), 3);

        let parent = layout.table("some_relation_parent_table").unwrap();
        // derived fields produce no columns
        assert_eq!(parent.column_count(), 3);
        assert!(parent.column("children").is_none());

        let relations = parent.relations_of(ID_FIELD).unwrap();
        assert_eq!(
            relations,
            &[Relation {
                name: "children".into(),
                table: "some_relation_child_table".into(),
                column: "parent_field".into(),
                kind: RelationKind::Many,
            }]
        );

        let reference = &layout
            .table("some_relation_child_table")
            .unwrap()
            .column("parent_field")
            .unwrap()
            .typ;
        assert_eq!(
            *reference,
            ColumnType::Reference {
                tables: vec!["some_relation_parent_table".into()],
                column: ID_FIELD.into(),
                db_type: DbType::Text,
            }
        );

        let one = layout
            .table("some_one_to_one_relation_parent_table")
            .unwrap()
            .relations_of(ID_FIELD)
            .unwrap();
        assert_eq!(one[0].kind, RelationKind::One);
        assert_eq!(one[0].column, "other_parent");
    }

    #[test]
    fn test_relation_must_reference_source() {
        // parentField points at SomeRelationParentTable, not the one-to-one parent
        let err = compile_str(RELATIONS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedRelation);
        assert!(matches!(
            err,
            Error::UnresolvedRelation { ref location, .. }
                if location == "SomeOneToOneRelationParentTable.child"
        ));
    }

    #[test]
    fn test_relation_kind_follows_list() {
        let input = r#"
            type Parent @entity { id: ID! child: Child @derivedFrom(field: "parent") }
            type Child @entity { id: ID! parent: Parent! }
        "#;
        let layout = compile_str(input).unwrap();
        let relations = layout.table("parent").unwrap().relations_of(ID_FIELD).unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].kind, RelationKind::One);
    }

    #[test]
    fn test_relations_accumulate() {
        let input = r#"
            type Pool @entity {
                id: ID!
                swaps: [Swap!]! @derivedFrom(field: "pool")
                mints: [Mint!]! @derivedFrom(field: "pool")
                burns: [Burn!]! @derivedFrom(field: "pool")
            }
            type Swap @entity { id: ID! pool: Pool! }
            type Mint @entity { id: ID! pool: Pool! }
            type Burn @entity { id: ID! pool: Pool! }
        "#;
        let layout = compile_str(input).unwrap();
        let names: Vec<&str> = layout
            .table("pool")
            .unwrap()
            .relations_of(ID_FIELD)
            .unwrap()
            .iter()
            .map(|r| r.table.as_str())
            .collect();
        assert_eq!(names, vec!["swap", "mint", "burn"]);
    }

    #[test]
    fn test_relation_through_list_reference() {
        let input = r#"
            type Token @entity { id: ID! pools: [Pool!]! @derivedFrom(field: "tokens") }
            type Pool @entity { id: ID! tokens: [Token!]! }
        "#;
        let layout = compile_str(input).unwrap();
        let relations = layout.table("token").unwrap().relations_of(ID_FIELD).unwrap();
        assert_eq!(relations[0].column, "tokens");
        assert_eq!(relations[0].kind, RelationKind::Many);
    }

    #[test]
    fn test_unresolved_relations() {
        let missing_field = r#"
            type Parent @entity { id: ID! children: [Child!]! @derivedFrom(field: "nope") }
            type Child @entity { id: ID! parent: Parent! }
        "#;
        let not_reference = r#"
            type Parent @entity { id: ID! children: [Child!]! @derivedFrom(field: "name") }
            type Child @entity { id: ID! name: String! }
        "#;
        let unknown_target = r#"
            type Parent @entity { id: ID! children: [Ghost!]! @derivedFrom(field: "parent") }
        "#;
        let interface_target = r#"
            interface Node { id: ID! }
            type Parent @entity { id: ID! children: [Node!]! @derivedFrom(field: "parent") }
            type Child implements Node @entity { id: ID! parent: Parent! }
        "#;
        for input in [missing_field, not_reference, unknown_target, interface_target] {
            let err = compile_str(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnresolvedRelation, "{}", err);
        }
    }

    #[test]
    fn test_fulltext() {
        let input = r#"
            type SomeFulltextTable @entity {
                id: ID!,
                symbol: String!,
                name: String!,
            }

            type _Schema_
                @fulltext(
                    name: "FulltextField"
                    language: tr
                    algorithm: rank
                    include: [
                        {
                            entity: "SomeFulltextTable"
                            fields: [{ name: "symbol" }, { name: "name" }, { name: "id" }]
                        }
                    ]
                )
        "#;
        let layout = compile_str(input).unwrap();
        assert_eq!(layout.table_count(), 1);

        let table = layout.table("some_fulltext_table").unwrap();
        let search: Vec<&Column> = table
            .columns()
            .filter(|c| matches!(c.typ, ColumnType::TextSearch { .. }))
            .collect();
        assert_eq!(search.len(), 1);

        let column = search[0];
        assert_eq!(column.name, "fulltext_field");
        assert!(column.nullable);
        assert!(!column.is_primary);
        assert_eq!(
            column.typ,
            ColumnType::TextSearch {
                db_type: DbType::TextSearch,
                language: "tr".into(),
                algorithm: "rank".into(),
                columns: vec!["symbol".into(), "name".into(), "id".into()],
            }
        );
    }

    #[test]
    fn test_fulltext_on_several_entities() {
        let input = r#"
            type Token @entity { id: ID! symbol: String! }
            type Pool @entity { id: ID! poolName: String! }
            type _Schema_
                @fulltext(
                    name: "search"
                    language: en
                    algorithm: proximityRank
                    include: [
                        { entity: "Token", fields: [{ name: "symbol" }] }
                        { entity: "Pool", fields: [{ name: "poolName" }] }
                    ]
                )
        "#;
        let layout = compile_str(input).unwrap();
        for (table, source) in [("token", "symbol"), ("pool", "pool_name")] {
            let column = layout.table(table).unwrap().column("search").unwrap();
            let ColumnType::TextSearch { columns, algorithm, .. } = &column.typ else {
                panic!("expected text search column on {}", table);
            };
            assert_eq!(columns, &vec![source.to_string()]);
            assert_eq!(algorithm, "proximityRank");
        }
    }

    #[test]
    fn test_fulltext_errors() {
        let unknown_entity = r#"
            type Token @entity { id: ID! }
            type _Schema_ @fulltext(name: "s", language: en, algorithm: rank,
                include: [{ entity: "Pool", fields: [{ name: "id" }] }])
        "#;
        let unknown_field = r#"
            type Token @entity { id: ID! }
            type _Schema_ @fulltext(name: "s", language: en, algorithm: rank,
                include: [{ entity: "Token", fields: [{ name: "symbol" }] }])
        "#;
        for input in [unknown_entity, unknown_field] {
            assert_eq!(compile_str(input).unwrap_err().kind(), ErrorKind::UnresolvedRelation);
        }

        let collides = r#"
            type Token @entity { id: ID! symbol: String! }
            type _Schema_ @fulltext(name: "symbol", language: en, algorithm: rank,
                include: [{ entity: "Token", fields: [{ name: "id" }] }])
        "#;
        assert_eq!(compile_str(collides).unwrap_err().kind(), ErrorKind::DuplicateName);

        let misplaced = r#"
            type Token @entity @fulltext(name: "s", language: en, algorithm: rank, include: []) { id: ID! }
        "#;
        assert!(matches!(
            compile_str(misplaced),
            Err(Error::Directive {
                source: DirectiveError::Misplaced { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_scalar() {
        let err = compile_str("type Price @entity { id: ID! value: Float! }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownScalar);
        assert!(matches!(
            err,
            Error::UnknownScalar { ref entity, ref field, ref type_name }
                if entity == "Price" && field == "value" && type_name == "Float"
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let tables = "type PoolDay @entity { id: ID! } type Pool_Day @entity { id: ID! }";
        assert!(matches!(
            compile_str(tables),
            Err(Error::DuplicateName { kind: NameKind::Table, ref name }) if name == "pool_day"
        ));

        let enums = "enum Side { BUY } enum SIDE { SELL }";
        assert!(matches!(
            compile_str(enums),
            Err(Error::DuplicateName { kind: NameKind::Enum, .. })
        ));

        let columns = "type Pool @entity { id: ID! feeTier: Int fee_tier: Int }";
        assert!(matches!(
            compile_str(columns),
            Err(Error::DuplicateName { kind: NameKind::Column, ref name }) if name == "pool.fee_tier"
        ));
    }

    #[test]
    fn test_missing_id() {
        let err = compile_str("type Pool @entity { name: String }").unwrap_err();
        assert!(matches!(err, Error::MissingId { ref entity } if entity == "Pool"));
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }

    #[test]
    fn test_interface_reference() {
        let input = r#"
            interface Event { id: ID! }
            type Swap implements Event @entity { id: ID! }
            type Transfer implements Event @entity { id: ID! }
            type Tx @entity { id: ID! events: [Event!]! last: Event }
        "#;
        let layout = compile_str(input).unwrap();
        let tx = layout.table("tx").unwrap();
        assert_eq!(
            tx.column("last").unwrap().typ,
            ColumnType::Reference {
                tables: vec!["swap".into(), "transfer".into()],
                column: ID_FIELD.into(),
                db_type: DbType::Text,
            }
        );
        assert!(matches!(tx.column("events").unwrap().typ, ColumnType::List { .. }));
    }

    #[test]
    fn test_non_entity_types_are_skipped() {
        let input = r#"
            scalar Timestamp
            type Helper { value: Whatever }
            type Token @entity(immutable: true) { id: ID! createdAt: Timestamp! }
        "#;
        let layout = compile_str(input).unwrap();
        assert_eq!(layout.table_names().collect::<Vec<_>>(), vec!["token"]);

        let token = layout.table("token").unwrap();
        assert!(token.is_immutable());
        assert_eq!(token.column_count(), 4);
        assert_eq!(
            token.column("created_at").unwrap().typ,
            ColumnType::scalar(DbType::Timestamptz)
        );
    }

    #[test]
    fn test_unused_directives_are_ignored() {
        let input = r#"
            type Data @entity(timeseries: true) {
                id: Int8!
                timestamp: Timestamp!
                price: BigDecimal!
                legacyPrice: BigDecimal @deprecated(reason: "use price")
            }

            type Stats @aggregation(intervals: ["hour", "day"], source: "Data") {
                id: Int8!
                timestamp: Timestamp!
                sum: BigDecimal! @aggregate(fn: "sum", arg: "price")
            }

            type Token @entity @key(fields: "id") {
                id: ID!
                oldName: String @deprecated(reason: "use name")
                name: String!
            }
        "#;
        let layout = compile_str(input).unwrap();
        assert_eq!(layout.table_names().collect::<Vec<_>>(), vec!["data", "token"]);

        let data = layout.table("data").unwrap();
        assert!(data.is_timeseries());
        assert!(!data.is_immutable());
        assert!(data.column("legacy_price").unwrap().nullable);

        let token = layout.table("token").unwrap();
        assert!(!token.is_timeseries());
        assert_eq!(
            token.column("old_name").unwrap().typ,
            ColumnType::scalar(DbType::Text)
        );
    }

    #[test]
    fn test_known_directives_keep_strict_arguments() {
        let input = r#"type Token @entity(timeseries: true, mutable: false) @deprecated { id: ID! }"#;
        assert!(matches!(
            compile_str(input),
            Err(Error::Directive {
                source: DirectiveError::UnknownArgument { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_compile_hand_built_document() {
        let document = Document {
            definitions: vec![Definition::Object(ObjectType {
                name: "Account".into(),
                implements: vec![],
                directives: vec![Directive {
                    name: "entity".into(),
                    arguments: vec![],
                }],
                fields: vec![
                    Field {
                        name: "id".into(),
                        typ: TypeRef::non_null(TypeRef::named("ID")),
                        directives: vec![],
                    },
                    Field {
                        name: "balance".into(),
                        typ: TypeRef::named("BigInt"),
                        directives: vec![],
                    },
                ],
            })],
        };
        let layout = compile(&document).unwrap();
        let balance = layout.table("account").unwrap().column("balance").unwrap();
        assert_eq!(balance.typ, ColumnType::scalar(DbType::Numeric));
        assert!(balance.nullable);
    }

    #[test]
    fn test_repeated_compilation_is_identical() {
        let document = parse_document(SIMPLE).unwrap();
        assert_eq!(compile(&document).unwrap(), compile(&document).unwrap());
    }

    #[test]
    fn test_layout_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Layout>();

        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| compile_str(SIMPLE).unwrap().table_count()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}

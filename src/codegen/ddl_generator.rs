// DDL generator - renders table statements for a model definition

use serde::{Deserialize, Serialize};

use super::utils::{index_name, quote_name};
use crate::config::AuthConfig;
use crate::ent_schema::{FieldDefinition, FieldType, ModelDefinition, SchemaRegistry};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

/// Resolves foreign keys against `registry`, which holds the models as the
/// migration history knows them rather than the live schemas
pub struct DdlGenerator<'a> {
    dialect: Dialect,
    registry: &'a SchemaRegistry,
    auth: &'a AuthConfig,
}

impl<'a> DdlGenerator<'a> {
    pub fn new(dialect: Dialect, registry: &'a SchemaRegistry, auth: &'a AuthConfig) -> Self {
        Self {
            dialect,
            registry,
            auth,
        }
    }

    /// `CREATE TABLE` followed by one `CREATE INDEX` per foreign key
    pub fn create_table(&self, model: &ModelDefinition) -> AppResult<Vec<String>> {
        let table = model.db_table();
        let columns = model
            .fields
            .iter()
            .map(|field| self.column_sql(model, field))
            .collect::<AppResult<Vec<_>>>()?;

        let mut statements = vec![format!(
            "CREATE TABLE {} ({})",
            quote_name(&table),
            columns.join(", ")
        )];

        for (field, _) in model.foreign_keys() {
            let column = field.column();
            statements.push(format!(
                "CREATE INDEX {} ON {} ({})",
                quote_name(&index_name(&table, &column)),
                quote_name(&table),
                quote_name(&column)
            ));
        }

        Ok(statements)
    }

    pub fn drop_table(&self, model: &ModelDefinition) -> Vec<String> {
        vec![format!("DROP TABLE {}", quote_name(&model.db_table()))]
    }

    fn column_sql(&self, model: &ModelDefinition, field: &FieldDefinition) -> AppResult<String> {
        let mut sql = format!("{} {}", quote_name(&field.column()), self.column_type(model, field)?);

        if field.primary_key {
            sql.push_str(match (self.dialect, &field.field_type) {
                (Dialect::Sqlite, FieldType::BigAuto) => " NOT NULL PRIMARY KEY AUTOINCREMENT",
                (Dialect::Postgres, FieldType::BigAuto) => {
                    " NOT NULL PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY"
                }
                _ => " NOT NULL PRIMARY KEY",
            });
            return Ok(sql);
        }

        sql.push_str(if field.null { " NULL" } else { " NOT NULL" });
        if field.unique {
            sql.push_str(" UNIQUE");
        }

        if let Some(fk) = field.foreign_key() {
            let target = self.target_of(model, field)?;
            let target_pk = target.primary_key().ok_or_else(|| {
                AppError::SchemaError(vec![format!("{} has no primary key", target.label())])
            })?;
            sql.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE {}",
                quote_name(&target.db_table()),
                quote_name(&target_pk.column()),
                fk.on_delete.as_sql()
            ));
        }

        Ok(sql)
    }

    fn column_type(&self, model: &ModelDefinition, field: &FieldDefinition) -> AppResult<String> {
        let sql_type = match (&field.field_type, self.dialect) {
            (FieldType::BigAuto, Dialect::Sqlite) => "integer".to_string(),
            (FieldType::BigAuto, Dialect::Postgres) => "bigint".to_string(),
            (FieldType::Char { max_length }, _) => format!("varchar({})", max_length),
            (FieldType::Text, _) => "text".to_string(),
            (FieldType::DateTime, Dialect::Sqlite) => "datetime".to_string(),
            (FieldType::DateTime, Dialect::Postgres) => "timestamp with time zone".to_string(),
            (FieldType::ForeignKey(_), _) => {
                let target = self.target_of(model, field)?;
                match target.primary_key() {
                    // Referencing columns are plain integers, never generated
                    Some(pk) if pk.field_type == FieldType::BigAuto => "bigint".to_string(),
                    Some(pk) => self.column_type(target, pk)?,
                    None => {
                        return Err(AppError::SchemaError(vec![format!(
                            "{} has no primary key",
                            target.label()
                        )]))
                    }
                }
            }
        };
        Ok(sql_type)
    }

    fn target_of(&self, model: &ModelDefinition, field: &FieldDefinition) -> AppResult<&'a ModelDefinition> {
        let fk = field.foreign_key().ok_or_else(|| {
            AppError::SchemaError(vec![format!("{}.{} is not a foreign key", model.label(), field.name)])
        })?;
        self.registry.resolve(&fk.to, self.auth).ok_or_else(|| {
            AppError::SchemaError(vec![format!(
                "{}.{} points to undefined model '{}'",
                model.label(),
                field.name,
                fk.to.resolve(self.auth)
            )])
        })
    }
}

/// `ORDER BY` for unordered reads; the primary key breaks ties
pub fn order_by_clause(model: &ModelDefinition) -> String {
    let mut terms: Vec<String> = model
        .options
        .ordering
        .iter()
        .map(|term| {
            let column = model
                .field(&term.field)
                .map(|f| f.column())
                .unwrap_or_else(|| term.field.clone());
            format!(
                "{} {}",
                quote_name(&column),
                if term.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();

    if let Some(pk) = model.primary_key() {
        if !model.options.ordering.iter().any(|term| term.field == pk.name) {
            terms.push(format!("{} ASC", quote_name(&pk.column())));
        }
    }

    if terms.is_empty() {
        String::new()
    } else {
        format!("ORDER BY {}", terms.join(", "))
    }
}

// Ent Schema Framework - declarative model definitions
// A model is declared once as code; the DDL generator and migrations read it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());
static MODEL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap());

/// Schema definition trait, implemented once per persisted model
pub trait EntSchema: Send + Sync {
    /// Application the model belongs to, e.g. `website`
    fn app_label() -> &'static str
    where
        Self: Sized;

    /// CamelCase model name, e.g. `Page`
    fn model_name() -> &'static str
    where
        Self: Sized;

    fn fields() -> Vec<FieldDefinition>
    where
        Self: Sized;

    fn options() -> ModelOptions
    where
        Self: Sized,
    {
        ModelOptions::default()
    }

    fn definition() -> ModelDefinition
    where
        Self: Sized,
    {
        ModelDefinition::new(Self::app_label(), Self::model_name(), Self::fields())
            .with_options(Self::options())
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub primary_key: bool,
    /// Column accepts SQL NULL
    pub null: bool,
    /// Model validation accepts an empty value
    pub blank: bool,
    pub unique: bool,
    /// Never written after the row is inserted
    pub immutable: bool,
    pub default: Option<FieldDefault>,
    pub verbose_name: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            primary_key: false,
            null: false,
            blank: false,
            unique: false,
            immutable: false,
            default: None,
            verbose_name: None,
        }
    }

    /// Mark field as the primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.immutable = true;
        self
    }

    /// Mark field as optional (nullable and may be left blank)
    pub fn optional(mut self) -> Self {
        self.null = true;
        self.blank = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark field as immutable (can't be updated after creation)
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn verbose_name(mut self, name: &str) -> Self {
        self.verbose_name = Some(name.to_string());
        self
    }

    /// Column name in the table; foreign keys store `<name>_id`
    pub fn column(&self) -> String {
        match self.field_type {
            FieldType::ForeignKey(_) => format!("{}_id", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        match &self.field_type {
            FieldType::ForeignKey(fk) => Some(fk),
            _ => None,
        }
    }

    /// Model-level validation of a text value for this field
    pub fn validate_text(&self, value: &str) -> AppResult<()> {
        if !self.blank && value.is_empty() {
            return Err(AppError::Validation(format!(
                "field '{}' may not be blank",
                self.name
            )));
        }

        if let FieldType::Char { max_length } = self.field_type {
            let length = value.chars().count();
            if length > max_length {
                return Err(AppError::Validation(format!(
                    "field '{}' must have at most {} characters (it has {})",
                    self.name, max_length, length
                )));
            }
        }

        Ok(())
    }
}

/// Field types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// 64-bit integer generated by the storage engine
    BigAuto,
    Char { max_length: usize },
    Text,
    DateTime,
    ForeignKey(ForeignKey),
}

/// Field default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldDefault {
    /// Stamped with the current time when the row is inserted
    Now,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub to: ModelRef,
    pub on_delete: OnDelete,
    /// Name of the collection on the target model
    pub related_name: Option<String>,
}

impl ForeignKey {
    pub fn new(to: ModelRef, on_delete: OnDelete) -> Self {
        Self {
            to,
            on_delete,
            related_name: None,
        }
    }

    pub fn related_name(mut self, name: &str) -> Self {
        self.related_name = Some(name.to_string());
        self
    }
}

/// Target of a foreign key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelRef {
    /// `app_label.Model`
    Label(String),
    /// Resolved through a setting at the time of use
    Swappable(SwappableSetting),
}

impl ModelRef {
    /// Lowercased `app_label.model` this reference points at
    pub fn resolve(&self, auth: &AuthConfig) -> String {
        match self {
            ModelRef::Label(label) => label.to_lowercase(),
            ModelRef::Swappable(setting) => setting.resolve(auth).to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwappableSetting {
    AuthUserModel,
}

impl SwappableSetting {
    pub fn setting_name(self) -> &'static str {
        match self {
            SwappableSetting::AuthUserModel => "AUTH_USER_MODEL",
        }
    }

    pub fn resolve(self, auth: &AuthConfig) -> &str {
        match self {
            SwappableSetting::AuthUserModel => &auth.user_model,
        }
    }
}

/// Referential action taken when the target row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnDelete {
    Cascade,
    Restrict,
    SetNull,
}

impl OnDelete {
    pub fn as_sql(self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

/// One term of a model's default ordering; `-name` sorts descending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn parse(term: &str) -> Self {
        match term.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: term.to_string(),
                descending: false,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOptions {
    pub verbose_name: Option<String>,
    pub verbose_name_plural: Option<String>,
    pub ordering: Vec<OrderBy>,
    pub db_table: Option<String>,
}

impl ModelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose_name(mut self, name: &str) -> Self {
        self.verbose_name = Some(name.to_string());
        self
    }

    pub fn verbose_name_plural(mut self, name: &str) -> Self {
        self.verbose_name_plural = Some(name.to_string());
        self
    }

    pub fn ordering(mut self, terms: &[&str]) -> Self {
        self.ordering = terms.iter().map(|term| OrderBy::parse(term)).collect();
        self
    }

    pub fn db_table(mut self, table: &str) -> Self {
        self.db_table = Some(table.to_string());
        self
    }
}

/// Complete, self-contained description of one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub app_label: String,
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub options: ModelOptions,
}

impl ModelDefinition {
    pub fn new(app_label: &str, name: &str, fields: Vec<FieldDefinition>) -> Self {
        Self {
            app_label: app_label.to_string(),
            name: name.to_string(),
            fields,
            options: ModelOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.name)
    }

    pub fn label_lower(&self) -> String {
        self.label().to_lowercase()
    }

    pub fn db_table(&self) -> String {
        match &self.options.db_table {
            Some(table) => table.clone(),
            None => format!("{}_{}", self.app_label, self.name.to_lowercase()),
        }
    }

    pub fn verbose_name(&self) -> String {
        self.options
            .verbose_name
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    pub fn verbose_name_plural(&self) -> String {
        self.options
            .verbose_name_plural
            .clone()
            .unwrap_or_else(|| format!("{}s", self.verbose_name()))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_key(&self) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.primary_key)
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (&FieldDefinition, &ForeignKey)> {
        self.fields
            .iter()
            .filter_map(|f| f.foreign_key().map(|fk| (f, fk)))
    }

    /// Columns stamped with the current time on insert
    pub fn auto_now_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.default == Some(FieldDefault::Now))
            .map(|f| f.column())
            .collect()
    }

    /// Rejects writes to the named field once the row exists
    pub fn check_updatable(&self, field: &str) -> AppResult<()> {
        match self.field(field) {
            Some(f) if f.immutable => Err(AppError::Validation(format!(
                "field '{}' cannot be changed after creation",
                f.name
            ))),
            Some(_) => Ok(()),
            None => Err(AppError::Validation(format!(
                "{} has no field '{}'",
                self.label(),
                field
            ))),
        }
    }

    /// Validate a text value against the named field
    pub fn validate_text(&self, field: &str, value: &str) -> AppResult<()> {
        self.field(field)
            .ok_or_else(|| {
                AppError::Validation(format!("{} has no field '{}'", self.label(), field))
            })?
            .validate_text(value)
    }
}

/// Schema registry - holds all defined models, keyed by lowercased label
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: BTreeMap<String, ModelDefinition>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema
    pub fn register<T: EntSchema + 'static>(&mut self) {
        self.register_definition(T::definition());
    }

    pub fn register_definition(&mut self, model: ModelDefinition) {
        self.models.insert(model.label_lower(), model);
    }

    pub fn get(&self, label: &str) -> Option<&ModelDefinition> {
        self.models.get(&label.to_lowercase())
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }

    pub fn resolve(&self, target: &ModelRef, auth: &AuthConfig) -> Option<&ModelDefinition> {
        self.models.get(&target.resolve(auth))
    }

    /// Reverse accessors on `label`: (related name, model holding the foreign key)
    pub fn related_collections(
        &self,
        label: &str,
        auth: &AuthConfig,
    ) -> Vec<(String, &ModelDefinition)> {
        let label = label.to_lowercase();
        let mut collections = Vec::new();
        for model in self.models.values() {
            for (_, fk) in model.foreign_keys() {
                if fk.to.resolve(auth) == label {
                    let name = fk
                        .related_name
                        .clone()
                        .unwrap_or_else(|| format!("{}_set", model.name.to_lowercase()));
                    collections.push((name, model));
                }
            }
        }
        collections
    }

    /// Validate schema consistency, reporting every problem found
    pub fn validate(&self, auth: &AuthConfig) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for model in self.models.values() {
            self.validate_model(model, auth, &mut errors);
        }

        for model in self.models.values() {
            let mut seen = HashSet::new();
            for (name, source) in self.related_collections(&model.label(), auth) {
                if model.field(&name).is_some() {
                    errors.push(format!(
                        "Reverse accessor '{}' from {} clashes with field '{}' on {}",
                        name,
                        source.label(),
                        name,
                        model.label()
                    ));
                }
                if !seen.insert(name.clone()) {
                    errors.push(format!(
                        "Reverse accessor '{}' is declared more than once on {}",
                        name,
                        model.label()
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_model(&self, model: &ModelDefinition, auth: &AuthConfig, errors: &mut Vec<String>) {
        let label = model.label();

        if !IDENTIFIER.is_match(&model.app_label) {
            errors.push(format!("App label '{}' is not a valid identifier", model.app_label));
        }
        if !MODEL_NAME.is_match(&model.name) {
            errors.push(format!("Model name '{}' must be CamelCase", model.name));
        }
        if !IDENTIFIER.is_match(&model.db_table()) {
            errors.push(format!("{} has invalid table name '{}'", label, model.db_table()));
        }

        let primary_keys = model.fields.iter().filter(|f| f.primary_key).count();
        if primary_keys != 1 {
            errors.push(format!(
                "{} must declare exactly one primary key, found {}",
                label, primary_keys
            ));
        }

        let mut columns = HashSet::new();
        for field in &model.fields {
            if !IDENTIFIER.is_match(&field.name) {
                errors.push(format!("{} has invalid field name '{}'", label, field.name));
            }
            if !columns.insert(field.column()) {
                errors.push(format!("{} declares column '{}' twice", label, field.column()));
            }
            if field.primary_key && field.null {
                errors.push(format!("{}.{}: a primary key cannot be nullable", label, field.name));
            }
            if let Some(fk) = field.foreign_key() {
                if self.resolve(&fk.to, auth).is_none() {
                    errors.push(format!(
                        "{}.{} points to undefined model '{}'",
                        label,
                        field.name,
                        fk.to.resolve(auth)
                    ));
                }
                if fk.on_delete == OnDelete::SetNull && !field.null {
                    errors.push(format!(
                        "{}.{} uses SET NULL on delete but is not nullable",
                        label, field.name
                    ));
                }
            }
        }

        for term in &model.options.ordering {
            if model.field(&term.field).is_none() {
                errors.push(format!(
                    "{} orders by unknown field '{}'",
                    label, term.field
                ));
            }
        }
    }
}

//! Target schema definitions
//!
//! Each catalog dataset has an ordered column list. The definitions arrive as
//! JSON shaped like
//!
//! ```json
//! { "cover": { "filingId": "text", "filingDate": "date", ... }, ... }
//! ```
//!
//! Only the `date` type changes behavior (those columns are normalized); every
//! other type string is treated as a plain column. Projection keeps exactly the
//! schema's columns, in schema order, and drops everything else.

use crate::category::Category;
use crate::dates::DateNormalizer;
use crate::error::{Result, SyncError};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// One flat output row
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Date,
    Generic,
}

impl ColumnType {
    pub fn from_type_name(name: &str) -> Self {
        if name == "date" {
            ColumnType::Date
        } else {
            ColumnType::Generic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

/// Ordered columns of one category's dataset
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    category: Category,
    columns: Vec<Column>,
}

impl SchemaDefinition {
    pub fn new<I, S>(category: Category, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, kind)| Column {
                name: name.into(),
                kind,
            })
            .collect();

        if columns.is_empty() {
            return Err(SyncError::Schema(format!("{} has no columns", category)));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(SyncError::Schema(format!(
                    "{} has a blank column name",
                    category
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SyncError::Schema(format!(
                    "{} lists column '{}' twice",
                    category, column.name
                )));
            }
        }

        Ok(Self { category, columns })
    }

    fn from_json(category: Category, value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            SyncError::Schema(format!("{} definition must be an object", category))
        })?;

        let mut columns = Vec::with_capacity(object.len());
        for (name, kind) in object {
            let kind = kind.as_str().ok_or_else(|| {
                SyncError::Schema(format!(
                    "{}.{} type must be a string",
                    category, name
                ))
            })?;
            columns.push((name.clone(), ColumnType::from_type_name(kind)));
        }

        Self::new(category, columns)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn date_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnType::Date)
            .map(|c| c.name.as_str())
    }

    pub fn columns_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> {
        self.column_names().filter(move |name| name.starts_with(prefix))
    }

    /// Keep only this schema's columns, in schema order.
    ///
    /// A column absent from `row` is an error: silently publishing a null
    /// would hide an upstream format change.
    pub fn project(&self, row: &Row) -> Result<Row> {
        let mut projected = Row::with_capacity(self.columns.len());
        for name in self.column_names() {
            let value = row.get(name).ok_or_else(|| SyncError::Projection {
                category: self.category,
                column: name.to_string(),
            })?;
            projected.insert(name.to_string(), value.clone());
        }
        Ok(projected)
    }

    /// Normalize every date column present in `row`
    pub fn normalize_dates(&self, row: &mut Row, dates: &DateNormalizer) {
        for name in self.date_columns() {
            if let Some(value) = row.get_mut(name) {
                *value = dates.normalize(value);
            }
        }
    }
}

/// Schema definitions for all eight categories
#[derive(Debug, Clone)]
pub struct Schemas {
    // indexed by Category::index()
    definitions: Vec<SchemaDefinition>,
}

impl Schemas {
    /// Build from one definition per category; missing or repeated categories are rejected.
    pub fn new(definitions: Vec<SchemaDefinition>) -> Result<Self> {
        let mut slots: Vec<Option<SchemaDefinition>> = vec![None; Category::ALL.len()];

        for definition in definitions {
            let slot = &mut slots[definition.category.index()];
            if slot.is_some() {
                return Err(SyncError::Schema(format!(
                    "{} is defined more than once",
                    definition.category
                )));
            }
            *slot = Some(definition);
        }

        let mut definitions = Vec::with_capacity(slots.len());
        for (category, slot) in Category::ALL.into_iter().zip(slots) {
            let definition = slot.ok_or_else(|| {
                SyncError::Schema(format!("no schema definition for {}", category))
            })?;
            definitions.push(definition);
        }

        Ok(Self { definitions })
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SyncError::Schema("schema definitions must be an object".into()))?;

        let definitions = object
            .iter()
            .map(|(name, definition)| {
                let category: Category = name.parse()?;
                SchemaDefinition::from_json(category, definition)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(definitions)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::from_json(&serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Schema(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn get(&self, category: Category) -> &SchemaDefinition {
        &self.definitions[category.index()]
    }
}

//! Flattening and explosion of nested source records
//!
//! Catalog datasets are flat tables, so nested lists in the source either
//! collapse into one delimited string (offices, income sources) or fan out
//! into several rows (real properties, gifts).

use crate::category::{Category, Explosion};
use crate::error::{Result, SyncError};
use crate::schema::{Row, SchemaDefinition};
use serde_json::Value;

pub const OFFICES_FIELD: &str = "offices";
pub const INCOME_SOURCES_FIELD: &str = "incomeSources";
pub const REAL_PROPERTIES_FIELD: &str = "realProperties";
pub const LOAN_FIELD: &str = "loan";
pub const GIFTS_FIELD: &str = "gifts";

pub const REAL_PROPERTY_PREFIX: &str = "realProperty_";
pub const LOAN_PREFIX: &str = "loan_";

/// Fields copied from each gift onto its exploded row
pub const GIFT_FIELDS: [&str; 3] = ["amount", "description", "giftDate"];

/// Render a scalar for a joined string. Missing and null render as empty.
fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `"<position> - <district>"` per office, space separated
pub fn flatten_offices(offices: &[Value]) -> String {
    offices
        .iter()
        .map(|office| {
            format!(
                "{} - {}",
                text(office.get("filerPosition")),
                text(office.get("filerDivisionBoardDistrict"))
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Income source names joined with `|`
pub fn flatten_income_sources(income_sources: &[Value]) -> String {
    income_sources
        .iter()
        .map(|source| text(source.get("name")))
        .collect::<Vec<_>>()
        .join("|")
}

/// Replace the list stored under `field` with its flattened string form.
pub(crate) fn flatten_list_field(
    category: Category,
    row: &mut Row,
    field: &str,
    flatten: fn(&[Value]) -> String,
) -> Result<()> {
    let flat = match row.get(field) {
        Some(Value::Array(items)) => flatten(items),
        Some(other) => {
            return Err(SyncError::malformed(
                category,
                format!("'{}' should be a list, got {}", field, other),
            ))
        },
        None => {
            return Err(SyncError::malformed(
                category,
                format!("'{}' is missing", field),
            ))
        },
    };
    row.insert(field.to_string(), Value::String(flat));
    Ok(())
}

/// Turn one joined source item into its output rows, not yet projected.
pub fn explode(schema: &SchemaDefinition, item: Row) -> Result<Vec<Row>> {
    let category = schema.category();
    match category.explosion() {
        Explosion::Direct => Ok(vec![item]),
        Explosion::RealProperties => explode_real_properties(schema, item),
        Explosion::Loan => fold_loan(category, item).map(|row| vec![row]),
        Explosion::Gifts => explode_gifts(category, item),
    }
}

fn take_list(category: Category, item: &mut Row, field: &str) -> Result<Vec<Value>> {
    match item.remove(field) {
        Some(Value::Array(entries)) => Ok(entries),
        Some(other) => Err(SyncError::malformed(
            category,
            format!("'{}' should be a list, got {}", field, other),
        )),
        None => Err(SyncError::malformed(
            category,
            format!("'{}' is missing", field),
        )),
    }
}

fn into_object(category: Category, field: &str, value: Value) -> Result<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SyncError::malformed(
            category,
            format!("'{}' entry should be an object, got {}", field, other),
        )),
    }
}

/// One row per real property. Without properties a single row is kept with
/// every `realProperty_*` column of the schema set to null.
fn explode_real_properties(schema: &SchemaDefinition, mut item: Row) -> Result<Vec<Row>> {
    let category = schema.category();
    let properties = take_list(category, &mut item, REAL_PROPERTIES_FIELD)?;

    if properties.is_empty() {
        for column in schema.columns_with_prefix(REAL_PROPERTY_PREFIX) {
            item.insert(column.to_string(), Value::Null);
        }
        return Ok(vec![item]);
    }

    properties
        .into_iter()
        .map(|property| {
            let property = into_object(category, REAL_PROPERTIES_FIELD, property)?;
            let mut row = item.clone();
            for (key, value) in property {
                row.insert(format!("{}{}", REAL_PROPERTY_PREFIX, key), value);
            }
            Ok(row)
        })
        .collect()
}

fn fold_loan(category: Category, mut item: Row) -> Result<Row> {
    let loan = item.remove(LOAN_FIELD).ok_or_else(|| {
        SyncError::malformed(category, format!("'{}' is missing", LOAN_FIELD))
    })?;
    for (key, value) in into_object(category, LOAN_FIELD, loan)? {
        item.insert(format!("{}{}", LOAN_PREFIX, key), value);
    }
    Ok(item)
}

/// One row per gift; an item without gifts yields no rows.
fn explode_gifts(category: Category, mut item: Row) -> Result<Vec<Row>> {
    let gifts = take_list(category, &mut item, GIFTS_FIELD)?;

    gifts
        .into_iter()
        .map(|gift| {
            let mut gift = into_object(category, GIFTS_FIELD, gift)?;
            let mut row = item.clone();
            for field in GIFT_FIELDS {
                let value = gift.remove(field).ok_or_else(|| {
                    SyncError::malformed(category, format!("gift has no '{}'", field))
                })?;
                row.insert(field.to_string(), value);
            }
            Ok(row)
        })
        .collect()
}

//! Page transformation
//!
//! Turns decoded source pages into projected catalog rows and counts what it
//! saw on the way. Cover pages run first and build the [`FilerIndex`]; once the
//! cover phase is done the index is frozen and handed to the schedule phase,
//! which joins every schedule item against it.

use crate::category::Category;
use crate::dates::DateNormalizer;
use crate::error::{Result, SyncError};
use crate::flatten::{
    explode, flatten_income_sources, flatten_list_field, flatten_offices, INCOME_SOURCES_FIELD,
    OFFICES_FIELD,
};
use crate::sanity::SanityLedger;
use crate::schema::{Row, SchemaDefinition, Schemas};
use crate::source::Page;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

pub const FILING_ID_FIELD: &str = "filingId";

/// Array holding cover records in a cover page
pub const FILINGS_FIELD: &str = "filings";

/// Cover fields copied onto every schedule item of the same filing
pub const FILER_COLUMNS: [&str; 8] = [
    FILING_ID_FIELD,
    "filerName",
    "departmentName",
    "positionName",
    OFFICES_FIELD,
    "periodStart",
    "periodEnd",
    "filingDate",
];

/// Key a record by its filing id. Numeric ids are accepted as their decimal text.
pub fn filing_key(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Projected rows per category, waiting to be loaded
#[derive(Debug, Default)]
pub struct RowStore {
    rows: BTreeMap<Category, Vec<Row>>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, category: Category, rows: impl IntoIterator<Item = Row>) {
        self.rows.entry(category).or_default().extend(rows);
    }

    pub fn rows(&self, category: Category) -> &[Row] {
        self.rows.get(&category).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self, category: Category) -> usize {
        self.rows(category).len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(Vec::is_empty)
    }
}

/// Filer columns of every cover filing, keyed by filing id. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct FilerIndex {
    filers: HashMap<String, Row>,
}

impl FilerIndex {
    pub fn get(&self, filing_id: &str) -> Option<&Row> {
        self.filers.get(filing_id)
    }

    pub fn len(&self) -> usize {
        self.filers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filers.is_empty()
    }
}

/// Something that consumes source pages one at a time
pub trait PageTransform {
    fn transform_page(
        &mut self,
        page: &mut Page,
        ledger: &mut SanityLedger,
        store: &mut RowStore,
    ) -> Result<()>;
}

pub struct CoverTransformer<'a> {
    schema: &'a SchemaDefinition,
    dates: &'a DateNormalizer,
    filers: HashMap<String, Row>,
}

impl<'a> CoverTransformer<'a> {
    pub fn new(schemas: &'a Schemas, dates: &'a DateNormalizer) -> Self {
        Self {
            schema: schemas.get(Category::Cover),
            dates,
            filers: HashMap::new(),
        }
    }

    fn transform_filing(&mut self, mut filing: Row) -> Result<Row> {
        self.schema.normalize_dates(&mut filing, self.dates);
        flatten_list_field(Category::Cover, &mut filing, OFFICES_FIELD, flatten_offices)?;

        let filing_id = filing_key(filing.get(FILING_ID_FIELD)).ok_or_else(|| {
            SyncError::malformed(Category::Cover, "filing has no usable filingId")
        })?;

        let filer: Row = FILER_COLUMNS
            .iter()
            .filter_map(|&column| {
                filing
                    .get(column)
                    .map(|value| (column.to_string(), value.clone()))
            })
            .collect();
        if self.filers.insert(filing_id.clone(), filer).is_some() {
            warn!(filing_id = %filing_id, "Filing delivered twice, keeping the later one");
        }

        self.schema.project(&filing)
    }

    /// Freeze the filer records gathered so far.
    pub fn finish(self) -> FilerIndex {
        FilerIndex {
            filers: self.filers,
        }
    }
}

impl PageTransform for CoverTransformer<'_> {
    fn transform_page(
        &mut self,
        page: &mut Page,
        ledger: &mut SanityLedger,
        store: &mut RowStore,
    ) -> Result<()> {
        let filings = page.take_records(FILINGS_FIELD)?;
        let received = filings.len() as u64;

        let rows = filings
            .into_iter()
            .map(|filing| self.transform_filing(filing))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            page = page.index,
            url = ?page.url,
            filings = received,
            "Transformed cover page"
        );
        ledger.record_transformed(Category::Cover, received, rows.len() as u64);
        store.extend(Category::Cover, rows);
        Ok(())
    }
}

pub struct ScheduleTransformer<'a> {
    schemas: &'a Schemas,
    dates: &'a DateNormalizer,
    filers: FilerIndex,
}

impl<'a> ScheduleTransformer<'a> {
    pub fn new(schemas: &'a Schemas, dates: &'a DateNormalizer, filers: FilerIndex) -> Self {
        Self {
            schemas,
            dates,
            filers,
        }
    }

    /// Copy the filer columns onto `item`, replacing same-named fields.
    fn join(&self, category: Category, item: &mut Row) -> Result<()> {
        let filing_id = filing_key(item.get(FILING_ID_FIELD)).ok_or_else(|| SyncError::Join {
            category,
            filing_id: item
                .get(FILING_ID_FIELD)
                .map(Value::to_string)
                .unwrap_or_else(|| "<none>".to_string()),
        })?;

        let filer = self
            .filers
            .get(&filing_id)
            .ok_or_else(|| SyncError::Join {
                category,
                filing_id: filing_id.clone(),
            })?;

        for (column, value) in filer {
            item.insert(column.clone(), value.clone());
        }
        Ok(())
    }

    fn transform_item(&self, category: Category, mut item: Row) -> Result<Vec<Row>> {
        self.join(category, &mut item)?;

        if category.flattens_income_sources() {
            flatten_list_field(
                category,
                &mut item,
                INCOME_SOURCES_FIELD,
                flatten_income_sources,
            )?;
        }

        let schema = self.schemas.get(category);
        explode(schema, item)?
            .into_iter()
            .map(|row| {
                let mut row = schema.project(&row)?;
                schema.normalize_dates(&mut row, self.dates);
                Ok(row)
            })
            .collect()
    }
}

impl PageTransform for ScheduleTransformer<'_> {
    fn transform_page(
        &mut self,
        page: &mut Page,
        ledger: &mut SanityLedger,
        store: &mut RowStore,
    ) -> Result<()> {
        for category in Category::SCHEDULES {
            let items = page.take_records(category.as_str())?;
            if items.is_empty() {
                continue;
            }

            let received = items.len() as u64;
            let mut rows = Vec::with_capacity(items.len());
            for item in items {
                rows.extend(self.transform_item(category, item)?);
            }

            debug!(
                page = page.index,
                url = ?page.url,
                category = %category,
                items = received,
                rows = rows.len(),
                "Transformed schedule items"
            );
            ledger.record_transformed(category, received, rows.len() as u64);
            store.extend(category, rows);
        }
        Ok(())
    }
}

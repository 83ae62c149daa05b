//! Chunked catalog loader
//!
//! The first chunk written to a category's dataset during a run replaces the
//! dataset; every chunk after it upserts.

use crate::catalog::{Catalog, WriteMode};
use crate::category::Category;
use crate::config::{DatasetMap, DEFAULT_CHUNK_SIZE};
use crate::error::{Result, SyncError};
use crate::sanity::SanityLedger;
use crate::schema::Row;
use std::collections::HashSet;
use tracing::{debug, info};

pub const CHUNK_SIZE: usize = DEFAULT_CHUNK_SIZE;

pub struct Loader<C> {
    catalog: C,
    datasets: DatasetMap,
    chunk_size: usize,
    was_reset: HashSet<Category>,
}

impl<C: Catalog> Loader<C> {
    pub fn new(catalog: C, datasets: DatasetMap) -> Self {
        Self {
            catalog,
            datasets,
            chunk_size: CHUNK_SIZE,
            was_reset: HashSet::new(),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Whether `category` has already had its replacing write this run
    pub fn was_reset(&self, category: Category) -> bool {
        self.was_reset.contains(&category)
    }

    /// Write `rows` to the category's dataset and count the created rows.
    pub async fn load(
        &mut self,
        category: Category,
        rows: &[Row],
        ledger: &mut SanityLedger,
    ) -> Result<()> {
        let dataset = self.datasets.get(category).to_string();

        if rows.is_empty() {
            debug!(category = %category, "No {} rows to send", category);
            return Ok(());
        }

        info!(
            category = %category,
            dataset = %dataset,
            rows = rows.len(),
            "Sending {} rows to catalog",
            category
        );

        for (index, chunk) in rows.chunks(self.chunk_size).enumerate() {
            let mode = if self.was_reset.insert(category) {
                WriteMode::Replace
            } else {
                WriteMode::Upsert
            };
            debug!(
                category = %category,
                chunk = index + 1,
                rows = chunk.len(),
                mode = %mode,
                "Writing chunk"
            );

            let result = self
                .catalog
                .write(&dataset, chunk, mode)
                .await
                .map_err(|e| SyncError::Load {
                    category,
                    dataset: dataset.clone(),
                    detail: e.to_string(),
                })?;

            if result.errors > 0 {
                return Err(SyncError::Load {
                    category,
                    dataset,
                    detail: format!("catalog reported {} errors", result.errors),
                });
            }

            debug!(
                category = %category,
                created = result.rows_created,
                updated = result.rows_updated,
                "Chunk written"
            );
            ledger.record_created(category, result.rows_created);
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::WriteResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingCatalog {
        writes: Arc<Mutex<Vec<(String, WriteMode, usize)>>>,
        errors: u64,
        fail: bool,
    }

    #[async_trait]
    impl Catalog for RecordingCatalog {
        async fn write(&self, dataset: &str, rows: &[Row], mode: WriteMode) -> Result<WriteResult> {
            if self.fail {
                return Err(SyncError::Catalog {
                    dataset: dataset.to_string(),
                    detail: "503 Service Unavailable".to_string(),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((dataset.to_string(), mode, rows.len()));
            Ok(WriteResult {
                errors: self.errors,
                rows_created: rows.len() as u64,
                ..WriteResult::default()
            })
        }
    }

    fn datasets() -> DatasetMap {
        DatasetMap::new(Category::ALL.into_iter().map(|c| (c, format!("ds-{}", c)))).unwrap()
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| json!({"filingId": format!("F-{i}")}).as_object().unwrap().clone())
            .collect()
    }

    #[tokio::test]
    async fn test_first_chunk_replaces_rest_upsert() {
        let catalog = RecordingCatalog::default();
        let mut loader = Loader::new(catalog.clone(), datasets());
        let mut ledger = SanityLedger::new();

        loader
            .load(Category::ScheduleA1, &rows(2500), &mut ledger)
            .await
            .unwrap();

        let writes = catalog.writes.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![
                ("ds-scheduleA1".to_string(), WriteMode::Replace, 1000),
                ("ds-scheduleA1".to_string(), WriteMode::Upsert, 1000),
                ("ds-scheduleA1".to_string(), WriteMode::Upsert, 500),
            ]
        );
        assert_eq!(ledger.counter(Category::ScheduleA1).created, 2500);
        assert_eq!(ledger.items().created, 2500);
        assert!(loader.was_reset(Category::ScheduleA1));
    }

    #[tokio::test]
    async fn test_reset_is_tracked_per_category() {
        let catalog = RecordingCatalog::default();
        let mut loader = Loader::new(catalog.clone(), datasets()).with_chunk_size(2);
        let mut ledger = SanityLedger::new();

        loader.load(Category::Cover, &rows(3), &mut ledger).await.unwrap();
        loader.load(Category::ScheduleE, &rows(1), &mut ledger).await.unwrap();
        loader.load(Category::Cover, &rows(1), &mut ledger).await.unwrap();

        let modes: Vec<_> = catalog
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|(dataset, mode, _)| (dataset.clone(), *mode))
            .collect();
        assert_eq!(
            modes,
            vec![
                ("ds-cover".to_string(), WriteMode::Replace),
                ("ds-cover".to_string(), WriteMode::Upsert),
                ("ds-scheduleE".to_string(), WriteMode::Replace),
                ("ds-cover".to_string(), WriteMode::Upsert),
            ]
        );
        assert_eq!(ledger.counter(Category::Cover).created, 4);
        assert_eq!(ledger.items().created, 1);
    }

    #[tokio::test]
    async fn test_empty_category_sends_nothing() {
        let catalog = RecordingCatalog::default();
        let mut loader = Loader::new(catalog.clone(), datasets());
        let mut ledger = SanityLedger::new();

        loader.load(Category::ScheduleD, &[], &mut ledger).await.unwrap();

        assert!(catalog.writes.lock().unwrap().is_empty());
        assert!(!loader.was_reset(Category::ScheduleD));
    }

    #[tokio::test]
    async fn test_reported_errors_fail_the_load() {
        let catalog = RecordingCatalog {
            errors: 1,
            ..RecordingCatalog::default()
        };
        let mut loader = Loader::new(catalog, datasets());
        let err = loader
            .load(Category::ScheduleB, &rows(1), &mut SanityLedger::new())
            .await
            .unwrap_err();
        match err {
            SyncError::Load { category, dataset, .. } => {
                assert_eq!(category, Category::ScheduleB);
                assert_eq!(dataset, "ds-scheduleB");
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_catalog_failure_becomes_load_error() {
        let catalog = RecordingCatalog {
            fail: true,
            ..RecordingCatalog::default()
        };
        let mut loader = Loader::new(catalog, datasets());
        let err = loader
            .load(Category::Comments, &rows(1), &mut SanityLedger::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Load { category: Category::Comments, .. }));
        assert!(err.to_string().contains("503"));
    }
}

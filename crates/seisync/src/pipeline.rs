//! Sync pipeline
//!
//! Drives one run through its checkpoints:
//!
//! ```text
//! authenticate -> extract cover -> reconcile -> load cover -> reconcile
//!              -> extract schedules -> reconcile -> load schedules -> reconcile
//! ```
//!
//! Every step is awaited before the next begins. The first error stops the
//! run in [`SyncStage::Halted`] and is returned to the caller.

use crate::catalog::{Catalog, SocrataClient};
use crate::category::Category;
use crate::config::{DatasetMap, SyncConfig, Variant};
use crate::dates::DateNormalizer;
use crate::error::{Result, SyncError};
use crate::loader::Loader;
use crate::sanity::{SanityCounter, SanityLedger};
use crate::schema::{Row, Schemas};
use crate::source::{NetfileClient, PageKind, SourceApi};
use crate::stage::SyncStage;
use crate::transform::{CoverTransformer, PageTransform, RowStore, ScheduleTransformer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub variant: Variant,
    pub stage: SyncStage,
    pub counters: BTreeMap<Category, SanityCounter>,
    pub items: SanityCounter,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn counter(&self, category: Category) -> SanityCounter {
        self.counters.get(&category).copied().unwrap_or_default()
    }
}

pub struct SyncPipeline<S, C> {
    source: Option<S>,
    loader: Loader<C>,
    schemas: Schemas,
    dates: DateNormalizer,
    variant: Variant,
    ledger: SanityLedger,
    store: RowStore,
    stage: SyncStage,
}

impl<S: SourceApi, C: Catalog> SyncPipeline<S, C> {
    pub fn new(
        source: S,
        catalog: C,
        datasets: DatasetMap,
        schemas: Schemas,
        variant: Variant,
    ) -> Result<Self> {
        Ok(Self {
            source: Some(source),
            loader: Loader::new(catalog, datasets),
            schemas,
            dates: DateNormalizer::new()?,
            variant,
            ledger: SanityLedger::new(),
            store: RowStore::new(),
            stage: SyncStage::Started,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.loader = self.loader.with_chunk_size(chunk_size);
        self
    }

    pub fn stage(&self) -> SyncStage {
        self.stage
    }

    pub fn ledger(&self) -> &SanityLedger {
        &self.ledger
    }

    /// Rows transformed for `category` so far
    pub fn rows(&self, category: Category) -> &[Row] {
        self.store.rows(category)
    }

    /// Run every stage. A pipeline runs at most once.
    pub async fn run(&mut self) -> Result<SyncReport> {
        let started_at = Utc::now();
        info!(variant = %self.variant, "Starting sync");

        match self.execute().await {
            Ok(()) => {
                let report = self.report(started_at);
                info!(
                    variant = %self.variant,
                    cover = report.counter(Category::Cover).created,
                    items = report.items.created,
                    "Sync complete"
                );
                Ok(report)
            },
            Err(e) => {
                error!(stage = %self.stage, error = %e, "Sync halted");
                self.stage = SyncStage::Halted;
                Err(e)
            },
        }
    }

    fn advance(&mut self, stage: SyncStage) {
        debug_assert_eq!(self.stage.next(), Some(stage));
        self.stage = stage;
        debug!(stage = %stage, "Checkpoint reached");
    }

    async fn execute(&mut self) -> Result<()> {
        let source = self
            .source
            .take()
            .ok_or_else(|| SyncError::Config("pipeline has already run".into()))?;

        source.authenticate().await?;
        self.advance(SyncStage::Authenticated);

        let mut covers = CoverTransformer::new(&self.schemas, &self.dates);
        extract_all(
            &source,
            PageKind::Cover,
            &mut covers,
            &mut self.ledger,
            &mut self.store,
        )
        .await?;
        let filers = covers.finish();
        self.advance(SyncStage::CoverExtracted);

        self.ledger.confirm_extracted(PageKind::Cover)?;
        self.advance(SyncStage::CoverReconciled);

        self.loader
            .load(
                Category::Cover,
                self.store.rows(Category::Cover),
                &mut self.ledger,
            )
            .await?;
        self.advance(SyncStage::CoverLoaded);

        self.ledger.confirm_loaded(Category::Cover)?;
        self.advance(SyncStage::CoverLoadReconciled);

        info!(filers = filers.len(), "Extracting schedules");
        let mut schedules = ScheduleTransformer::new(&self.schemas, &self.dates, filers);
        extract_all(
            &source,
            PageKind::Schedule,
            &mut schedules,
            &mut self.ledger,
            &mut self.store,
        )
        .await?;
        drop(schedules);
        drop(source);
        self.advance(SyncStage::SchedulesExtracted);

        self.ledger.confirm_extracted(PageKind::Schedule)?;
        self.advance(SyncStage::SchedulesReconciled);

        for category in Category::SCHEDULES {
            self.loader
                .load(category, self.store.rows(category), &mut self.ledger)
                .await?;
        }
        self.advance(SyncStage::SchedulesLoaded);

        for category in Category::SCHEDULES {
            self.ledger.confirm_loaded(category)?;
        }
        self.ledger.confirm_items_loaded()?;
        self.advance(SyncStage::SchedulesLoadReconciled);

        Ok(())
    }

    fn report(&self, started_at: DateTime<Utc>) -> SyncReport {
        SyncReport {
            variant: self.variant,
            stage: self.stage,
            counters: Category::ALL
                .into_iter()
                .map(|c| (c, self.ledger.counter(c)))
                .collect(),
            items: self.ledger.items(),
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Fetch page 1 to learn the page count, then every remaining page in order.
async fn extract_all<S, T>(
    source: &S,
    kind: PageKind,
    transformer: &mut T,
    ledger: &mut SanityLedger,
    store: &mut RowStore,
) -> Result<()>
where
    S: SourceApi + ?Sized,
    T: PageTransform,
{
    let mut page = source.fetch_page(kind, 1).await?;
    let total = page.total_matching_count()?;
    let pages = page.total_matching_pages()?;
    ledger.set_total(kind, total);
    info!(
        kind = %kind,
        total,
        pages,
        "Total {} items: {}, pages: {}",
        kind,
        total,
        pages
    );

    transformer.transform_page(&mut page, ledger, store)?;

    for index in 2..=pages {
        let mut page = source.fetch_page(kind, index).await?;
        debug!(kind = %kind, page = index, of = pages, "Fetched page");
        transformer.transform_page(&mut page, ledger, store)?;
    }

    Ok(())
}

/// Sync one variant using the real NetFile and Socrata clients.
pub async fn run_sync(config: &SyncConfig, variant: Variant) -> Result<SyncReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!("sync", %run_id, %variant);

    async move {
        let schemas = Schemas::from_path(&config.schema_path)?;
        let source = NetfileClient::new(config.netfile.clone(), variant, config.http_timeout())?;
        let catalog = SocrataClient::new(config.socrata.clone(), config.http_timeout())?;

        let mut pipeline = SyncPipeline::new(
            source,
            catalog,
            config.datasets(variant).clone(),
            schemas,
            variant,
        )?
        .with_chunk_size(config.chunk_size);

        pipeline.run().await
    }
    .instrument(span)
    .await
}

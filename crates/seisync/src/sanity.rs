//! Count reconciliation
//!
//! Each category tracks four counts through a run:
//!
//! - `total`: what the source says it has, read from page 1
//! - `received`: items read from source pages
//! - `send`: rows produced after flattening and explosion
//! - `created`: rows the catalog confirms it wrote
//!
//! The schedule endpoint only reports one combined total, so schedule
//! categories are also summed into an `items` aggregate that carries it.

use crate::category::Category;
use crate::error::{Result, SyncError};
use crate::source::PageKind;
use crate::stage::SyncStage;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanityCounter {
    pub total: u64,
    pub received: u64,
    pub send: u64,
    pub created: u64,
}

#[derive(Debug, Clone)]
pub struct SanityLedger {
    categories: BTreeMap<Category, SanityCounter>,
    items: SanityCounter,
}

impl Default for SanityLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SanityLedger {
    pub fn new() -> Self {
        Self {
            categories: Category::ALL
                .into_iter()
                .map(|c| (c, SanityCounter::default()))
                .collect(),
            items: SanityCounter::default(),
        }
    }

    pub fn counter(&self, category: Category) -> SanityCounter {
        self.categories.get(&category).copied().unwrap_or_default()
    }

    /// Combined counter of every schedule category
    pub fn items(&self) -> SanityCounter {
        self.items
    }

    fn counter_mut(&mut self, category: Category) -> &mut SanityCounter {
        self.categories.entry(category).or_default()
    }

    /// Record the source-reported total from page 1 of `kind`.
    pub fn set_total(&mut self, kind: PageKind, total: u64) {
        match kind {
            PageKind::Cover => self.counter_mut(Category::Cover).total = total,
            PageKind::Schedule => self.items.total = total,
        }
    }

    pub fn record_transformed(&mut self, category: Category, received: u64, send: u64) {
        let counter = self.counter_mut(category);
        counter.received += received;
        counter.send += send;
        if category.is_schedule() {
            self.items.received += received;
            self.items.send += send;
        }
    }

    pub fn record_created(&mut self, category: Category, created: u64) {
        self.counter_mut(category).created += created;
        if category.is_schedule() {
            self.items.created += created;
        }
    }

    /// `received == total` once every page of `kind` has been read.
    pub fn confirm_extracted(&self, kind: PageKind) -> Result<()> {
        let (counter, label, stage) = match kind {
            PageKind::Cover => (
                self.counter(Category::Cover),
                "cover",
                SyncStage::CoverReconciled,
            ),
            PageKind::Schedule => (self.items, "schedule", SyncStage::SchedulesReconciled),
        };

        debug!(
            expected = counter.total,
            received = counter.received,
            "Expected {} {} items, got {}",
            counter.total,
            label,
            counter.received
        );
        if kind == PageKind::Schedule {
            for category in Category::SCHEDULES {
                debug!(
                    category = %category,
                    received = self.counter(category).received,
                    "Schedule items received"
                );
            }
        }

        if counter.received != counter.total {
            return Err(SyncError::Reconciliation {
                stage,
                detail: format!(
                    "did not receive expected number of {} items: expected {}, received {}",
                    label, counter.total, counter.received
                ),
            });
        }
        Ok(())
    }

    /// `send == created` for one category after its load.
    pub fn confirm_loaded(&self, category: Category) -> Result<()> {
        let counter = self.counter(category);
        info!(
            category = %category,
            received = counter.received,
            send = counter.send,
            created = counter.created,
            "Received {} {} items, sent {}, created {}",
            counter.received,
            category,
            counter.send,
            counter.created
        );

        if counter.send != counter.created {
            let stage = if category.is_schedule() {
                SyncStage::SchedulesLoadReconciled
            } else {
                SyncStage::CoverLoadReconciled
            };
            return Err(SyncError::Reconciliation {
                stage,
                detail: format!(
                    "did not load expected number of {} rows: sent {}, created {}",
                    category, counter.send, counter.created
                ),
            });
        }
        Ok(())
    }

    /// `send == created` across all schedule categories.
    pub fn confirm_items_loaded(&self) -> Result<()> {
        let items = self.items;
        info!(
            received = items.received,
            send = items.send,
            created = items.created,
            "Schedule items loaded"
        );

        if items.send != items.created {
            return Err(SyncError::Reconciliation {
                stage: SyncStage::SchedulesLoadReconciled,
                detail: format!(
                    "did not load expected number of schedule items: sent {}, created {}",
                    items.send, items.created
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_counts_roll_into_items() {
        let mut ledger = SanityLedger::new();
        ledger.record_transformed(Category::Cover, 2, 2);
        ledger.record_transformed(Category::ScheduleA2, 2, 3);
        ledger.record_transformed(Category::ScheduleD, 1, 2);

        assert_eq!(ledger.counter(Category::ScheduleA2).send, 3);
        assert_eq!(ledger.items().received, 3);
        assert_eq!(ledger.items().send, 5);
        assert_eq!(ledger.counter(Category::Cover).received, 2);
    }

    #[test]
    fn test_cover_excluded_from_items_created() {
        let mut ledger = SanityLedger::new();
        ledger.record_created(Category::Cover, 10);
        ledger.record_created(Category::ScheduleC, 4);
        assert_eq!(ledger.items().created, 4);
        assert_eq!(ledger.counter(Category::Cover).created, 10);
    }

    #[test]
    fn test_extraction_check() {
        let mut ledger = SanityLedger::new();
        ledger.set_total(PageKind::Cover, 2);
        ledger.record_transformed(Category::Cover, 1, 1);
        let err = ledger.confirm_extracted(PageKind::Cover).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Reconciliation { stage: SyncStage::CoverReconciled, .. }
        ));

        ledger.record_transformed(Category::Cover, 1, 1);
        ledger.confirm_extracted(PageKind::Cover).unwrap();
    }

    #[test]
    fn test_schedule_extraction_uses_combined_total() {
        let mut ledger = SanityLedger::new();
        ledger.set_total(PageKind::Schedule, 3);
        ledger.record_transformed(Category::Comments, 1, 1);
        ledger.record_transformed(Category::ScheduleA2, 2, 5);
        ledger.confirm_extracted(PageKind::Schedule).unwrap();

        ledger.set_total(PageKind::Schedule, 4);
        assert!(ledger.confirm_extracted(PageKind::Schedule).is_err());
    }

    #[test]
    fn test_load_check_compares_send_with_created() {
        let mut ledger = SanityLedger::new();
        ledger.record_transformed(Category::ScheduleA2, 2, 3);
        ledger.record_created(Category::ScheduleA2, 2);

        let err = ledger.confirm_loaded(Category::ScheduleA2).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Reconciliation { stage: SyncStage::SchedulesLoadReconciled, .. }
        ));
        assert!(ledger.confirm_items_loaded().is_err());

        ledger.record_created(Category::ScheduleA2, 1);
        ledger.confirm_loaded(Category::ScheduleA2).unwrap();
        ledger.confirm_items_loaded().unwrap();
    }
}

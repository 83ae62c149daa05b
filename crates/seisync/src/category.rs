//! Filing categories
//!
//! The source API splits a Form 700 filing into a cover sheet and seven
//! schedule sections. Each section is published to its own catalog dataset and
//! has its own rule for turning one source item into output rows.

use crate::error::{Result, SyncError};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Cover,
    Comments,
    ScheduleA1,
    ScheduleA2,
    ScheduleB,
    ScheduleC,
    ScheduleD,
    ScheduleE,
}

/// How one source item becomes output rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Explosion {
    /// One item, one row
    Direct,
    /// One row per entry of `realProperties`, fields under `realProperty_`
    RealProperties,
    /// The `loan` object folded into the row under `loan_`
    Loan,
    /// One row per entry of `gifts`
    Gifts,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Cover,
        Category::Comments,
        Category::ScheduleA1,
        Category::ScheduleA2,
        Category::ScheduleB,
        Category::ScheduleC,
        Category::ScheduleD,
        Category::ScheduleE,
    ];

    /// Every category delivered by the schedule endpoint, in processing order
    pub const SCHEDULES: [Category; 7] = [
        Category::Comments,
        Category::ScheduleA1,
        Category::ScheduleA2,
        Category::ScheduleB,
        Category::ScheduleC,
        Category::ScheduleD,
        Category::ScheduleE,
    ];

    /// Name used by the source API, the schema definitions and the dataset map
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Cover => "cover",
            Category::Comments => "comments",
            Category::ScheduleA1 => "scheduleA1",
            Category::ScheduleA2 => "scheduleA2",
            Category::ScheduleB => "scheduleB",
            Category::ScheduleC => "scheduleC",
            Category::ScheduleD => "scheduleD",
            Category::ScheduleE => "scheduleE",
        }
    }

    pub fn is_schedule(self) -> bool {
        !matches!(self, Category::Cover)
    }

    /// Position in [`Category::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn explosion(self) -> Explosion {
        match self {
            Category::ScheduleA2 => Explosion::RealProperties,
            Category::ScheduleB => Explosion::Loan,
            Category::ScheduleD => Explosion::Gifts,
            Category::Cover
            | Category::Comments
            | Category::ScheduleA1
            | Category::ScheduleC
            | Category::ScheduleE => Explosion::Direct,
        }
    }

    /// Whether items carry an `incomeSources` list that is collapsed to a string
    pub fn flattens_income_sources(self) -> bool {
        matches!(
            self,
            Category::ScheduleA2 | Category::ScheduleB | Category::ScheduleC
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| SyncError::Schema(format!("unknown category '{}'", s)))
    }
}

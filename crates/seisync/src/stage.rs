//! Checkpoints of a sync run
//!
//! A run moves through these stages strictly in order. Any failed request or
//! failed count check ends it in [`SyncStage::Halted`].

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStage {
    Started,
    Authenticated,
    CoverExtracted,
    CoverReconciled,
    CoverLoaded,
    CoverLoadReconciled,
    SchedulesExtracted,
    SchedulesReconciled,
    SchedulesLoaded,
    SchedulesLoadReconciled,
    Halted,
}

impl SyncStage {
    /// The stage that follows this one on the success path
    pub fn next(self) -> Option<SyncStage> {
        use SyncStage::*;
        match self {
            Started => Some(Authenticated),
            Authenticated => Some(CoverExtracted),
            CoverExtracted => Some(CoverReconciled),
            CoverReconciled => Some(CoverLoaded),
            CoverLoaded => Some(CoverLoadReconciled),
            CoverLoadReconciled => Some(SchedulesExtracted),
            SchedulesExtracted => Some(SchedulesReconciled),
            SchedulesReconciled => Some(SchedulesLoaded),
            SchedulesLoaded => Some(SchedulesLoadReconciled),
            SchedulesLoadReconciled | Halted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SyncStage::SchedulesLoadReconciled | SyncStage::Halted)
    }

    pub fn as_str(self) -> &'static str {
        use SyncStage::*;
        match self {
            Started => "STARTED",
            Authenticated => "AUTHENTICATED",
            CoverExtracted => "COVER_EXTRACTED",
            CoverReconciled => "COVER_RECONCILED",
            CoverLoaded => "COVER_LOADED",
            CoverLoadReconciled => "COVER_LOAD_RECONCILED",
            SchedulesExtracted => "SCHEDULES_EXTRACTED",
            SchedulesReconciled => "SCHEDULES_RECONCILED",
            SchedulesLoaded => "SCHEDULES_LOADED",
            SchedulesLoadReconciled => "SCHEDULES_LOAD_RECONCILED",
            Halted => "HALTED",
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_is_linear() {
        let mut stage = SyncStage::Started;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            visited.push(stage);
        }
        assert_eq!(stage, SyncStage::SchedulesLoadReconciled);
        assert_eq!(visited.len(), 10);
        assert!(!visited.contains(&SyncStage::Halted));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(SyncStage::Halted.is_terminal());
        assert!(SyncStage::SchedulesLoadReconciled.is_terminal());
        assert!(!SyncStage::CoverLoaded.is_terminal());
        assert_eq!(SyncStage::Halted.next(), None);
    }
}

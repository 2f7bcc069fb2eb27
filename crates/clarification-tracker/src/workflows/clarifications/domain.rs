use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date carried by rows whose date cell is missing or unreadable.
pub fn undated() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// One question/answer row mapped from a validated sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub number: i32,
    pub document_name: String,
    /// Name of the sheet the row came from.
    pub module: String,
    pub status: String,
    pub date: NaiveDate,
    pub question: String,
    pub answer: String,
}

impl Clarification {
    pub fn is_undated(&self) -> bool {
        self.date == undated()
    }
}

/// A validated sheet, with the selection flag the filter engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub checked: bool,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checked: false,
        }
    }
}

/// Status values the summary counts individually.
///
/// Matching is exact and case-sensitive; anything else only counts toward the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Closed,
    Open,
    OnHold,
    Pending,
}

impl StatusBucket {
    pub const fn ordered() -> [Self; 4] {
        [Self::Closed, Self::Open, Self::OnHold, Self::Pending]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Open => "Open",
            Self::OnHold => "On Hold",
            Self::Pending => "Pending",
        }
    }

    pub fn classify(status: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|bucket| bucket.label() == status)
    }
}

/// Per-module status counts over the full record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module: String,
    pub closed: usize,
    pub open: usize,
    pub on_hold: usize,
    pub pending: usize,
    pub total: usize,
}

impl ModuleSummary {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    pub fn count(&self, bucket: StatusBucket) -> usize {
        match bucket {
            StatusBucket::Closed => self.closed,
            StatusBucket::Open => self.open,
            StatusBucket::OnHold => self.on_hold,
            StatusBucket::Pending => self.pending,
        }
    }

    pub(crate) fn record(&mut self, status: &str) {
        match StatusBucket::classify(status) {
            Some(StatusBucket::Closed) => self.closed += 1,
            Some(StatusBucket::Open) => self.open += 1,
            Some(StatusBucket::OnHold) => self.on_hold += 1,
            Some(StatusBucket::Pending) => self.pending += 1,
            None => {}
        }
        self.total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_exact_and_case_sensitive() {
        assert_eq!(StatusBucket::classify("On Hold"), Some(StatusBucket::OnHold));
        assert_eq!(StatusBucket::classify("Closed"), Some(StatusBucket::Closed));
        assert_eq!(StatusBucket::classify("closed"), None);
        assert_eq!(StatusBucket::classify("OnHold"), None);
        assert_eq!(StatusBucket::classify("Open "), None);
    }

    #[test]
    fn unknown_statuses_only_raise_the_total() {
        let mut summary = ModuleSummary::new("Design");
        summary.record("Closed");
        summary.record("Deferred");
        summary.record("");

        assert_eq!(summary.closed, 1);
        assert_eq!(summary.total, 3);
        let bucketed: usize = StatusBucket::ordered()
            .into_iter()
            .map(|bucket| summary.count(bucket))
            .sum();
        assert_eq!(bucketed, 1);
    }

    #[test]
    fn undated_sentinel_is_the_calendar_minimum() {
        assert_eq!(undated(), NaiveDate::from_ymd_opt(1, 1, 1).unwrap());
    }
}

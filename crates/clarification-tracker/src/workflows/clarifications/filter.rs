use super::domain::Clarification;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Status value that disables the status criterion.
pub const ALL_STATUSES: &str = "All";

/// Active filter settings. Every criterion left at its default matches all records.
///
/// A record passes when it satisfies the status, module, date and search criteria
/// together; only the search fields are OR-combined among themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub modules: BTreeSet<String>,
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// True when the search criterion is active (non-blank text).
    pub fn has_search(&self) -> bool {
        self.search_needle().is_some()
    }

    pub fn is_match_all(&self) -> bool {
        self.status_filter().is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.modules.is_empty()
            && !self.has_search()
    }

    pub fn matches(&self, clarification: &Clarification) -> bool {
        self.passes(clarification, self.search_needle().as_deref())
    }

    /// Matching records in their original order. `records` is left untouched.
    pub fn apply(&self, records: &[Clarification]) -> Vec<Clarification> {
        let needle = self.search_needle();
        records
            .iter()
            .filter(|clarification| self.passes(clarification, needle.as_deref()))
            .cloned()
            .collect()
    }

    fn passes(&self, clarification: &Clarification, needle: Option<&str>) -> bool {
        self.matches_status(clarification)
            && self.matches_module(clarification)
            && self.matches_date(clarification)
            && self.matches_search(clarification, needle)
    }

    fn status_filter(&self) -> Option<&str> {
        self.status
            .as_deref()
            .filter(|status| !status.is_empty() && !status.eq_ignore_ascii_case(ALL_STATUSES))
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_lowercase)
    }

    fn matches_status(&self, clarification: &Clarification) -> bool {
        match self.status_filter() {
            None => true,
            Some(status) => clarification.status.to_lowercase() == status.to_lowercase(),
        }
    }

    fn matches_module(&self, clarification: &Clarification) -> bool {
        self.modules.is_empty() || self.modules.contains(&clarification.module)
    }

    fn matches_date(&self, clarification: &Clarification) -> bool {
        self.date_from.map_or(true, |from| clarification.date >= from)
            && self.date_to.map_or(true, |to| clarification.date <= to)
    }

    fn matches_search(&self, clarification: &Clarification, needle: Option<&str>) -> bool {
        let Some(needle) = needle else {
            return true;
        };

        let contains = |field: &str| field.to_lowercase().contains(needle);
        clarification.number.to_string().contains(needle)
            || contains(&clarification.document_name)
            || contains(&clarification.module)
            || contains(&clarification.status)
            || clarification
                .date
                .format("%Y-%m-%d")
                .to_string()
                .contains(needle)
            || contains(&clarification.question)
            || contains(&clarification.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn record(number: i32, status: &str, module: &str, date: NaiveDate) -> Clarification {
        Clarification {
            number,
            document_name: format!("Datasheet {number}"),
            module: module.to_string(),
            status: status.to_string(),
            date,
            question: "Confirm the pump rating".to_string(),
            answer: String::new(),
        }
    }

    fn sample() -> Vec<Clarification> {
        vec![
            record(1, "Closed", "A", ymd(2024, 1, 1)),
            record(2, "Open", "A", ymd(2024, 2, 1)),
            record(3, "Pending", "B", ymd(2024, 1, 15)),
        ]
    }

    fn numbers(records: &[Clarification]) -> Vec<i32> {
        records.iter().map(|c| c.number).collect()
    }

    #[test]
    fn default_criteria_match_everything() {
        let criteria = FilterCriteria::default();
        assert!(criteria.is_match_all());
        assert_eq!(criteria.apply(&sample()), sample());
    }

    #[test]
    fn all_sentinel_and_empty_status_match_everything() {
        for status in ["All", "all", "ALL", ""] {
            let criteria = FilterCriteria::default().with_status(status);
            assert_eq!(numbers(&criteria.apply(&sample())), vec![1, 2, 3]);
        }
    }

    #[test]
    fn status_is_case_insensitive() {
        let criteria = FilterCriteria::default().with_status("closed");
        assert_eq!(numbers(&criteria.apply(&sample())), vec![1]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let criteria = FilterCriteria::default()
            .with_date_range(Some(ymd(2024, 1, 1)), Some(ymd(2024, 1, 15)));
        assert_eq!(numbers(&criteria.apply(&sample())), vec![1, 3]);

        let open_ended = FilterCriteria::default().with_date_range(Some(ymd(2024, 1, 15)), None);
        assert_eq!(numbers(&open_ended.apply(&sample())), vec![2, 3]);
    }

    #[test]
    fn module_and_status_combine_with_and() {
        let criteria = FilterCriteria::default()
            .with_modules(["A"])
            .with_status("Closed");
        assert_eq!(numbers(&criteria.apply(&sample())), vec![1]);
    }

    #[test]
    fn criteria_never_widen_the_result() {
        // Any single matching dimension must not be enough to pass.
        let criteria = FilterCriteria::default()
            .with_status("Pending")
            .with_modules(["A"]);
        assert!(criteria.apply(&sample()).is_empty());

        let criteria = FilterCriteria::default()
            .with_status("Open")
            .with_date_range(Some(ymd(2024, 3, 1)), None);
        assert!(criteria.apply(&sample()).is_empty());

        let criteria = FilterCriteria::default()
            .with_modules(["B"])
            .with_search("Datasheet 1");
        assert!(criteria.apply(&sample()).is_empty());
    }

    #[test]
    fn search_spans_every_field() {
        let cases = [
            ("3", vec![3]),
            ("datasheet 2", vec![2]),
            ("b", vec![3]),
            ("PEND", vec![3]),
            ("2024-02", vec![2]),
            ("pump", vec![1, 2, 3]),
            ("nothing like this", vec![]),
        ];
        for (needle, expected) in cases {
            let criteria = FilterCriteria::default().with_search(needle);
            assert_eq!(
                numbers(&criteria.apply(&sample())),
                expected,
                "search for {needle:?}"
            );
        }
    }

    #[test]
    fn blank_search_is_disabled() {
        let criteria = FilterCriteria::default().with_search("   ");
        assert!(!criteria.has_search());
        assert_eq!(criteria.apply(&sample()).len(), 3);
    }

    #[test]
    fn apply_is_idempotent_and_matches_predicate() {
        let records = sample();
        let criteria = FilterCriteria::default().with_search("a");
        let first = criteria.apply(&records);
        let second = criteria.apply(&records);
        assert_eq!(first, second);
        assert_eq!(records, sample());
        assert!(first.iter().all(|c| criteria.matches(c)));
    }

    #[test]
    fn apply_agrees_with_matches_for_every_combination() {
        let statuses = [None, Some("Open"), Some("closed")];
        let modules: [&[&str]; 3] = [&[], &["A"], &["B"]];
        let ranges = [
            (None, None),
            (Some(ymd(2024, 1, 10)), None),
            (None, Some(ymd(2024, 1, 15))),
        ];
        let searches = [None, Some("datasheet 3"), Some("pump")];

        let records = sample();
        for status in statuses {
            for selected in modules {
                for (from, to) in ranges {
                    for search in searches {
                        let mut criteria = FilterCriteria::default()
                            .with_modules(selected.iter().copied())
                            .with_date_range(from, to);
                        if let Some(status) = status {
                            criteria = criteria.with_status(status);
                        }
                        if let Some(search) = search {
                            criteria = criteria.with_search(search);
                        }

                        let expected: Vec<Clarification> = records
                            .iter()
                            .filter(|c| criteria.matches(c))
                            .cloned()
                            .collect();
                        assert_eq!(criteria.apply(&records), expected, "{criteria:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn deserializes_partial_payloads() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"status":"Open","date_from":"2024-01-01","modules":["A"]}"#)
                .expect("criteria parse");
        assert_eq!(criteria.status.as_deref(), Some("Open"));
        assert_eq!(criteria.date_from, Some(ymd(2024, 1, 1)));
        assert!(criteria.date_to.is_none());
        assert!(criteria.modules.contains("A"));
    }
}

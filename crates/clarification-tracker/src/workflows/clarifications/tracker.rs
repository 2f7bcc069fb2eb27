use super::domain::{Clarification, Module, ModuleSummary};
use super::filter::FilterCriteria;
use super::ingest::{self, CancellationFlag, IngestionDiagnostic, IngestionError, IngestionResult};
use super::summary::summarize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Loaded clarifications plus the module selection and the current filtered view.
///
/// The full set only changes through [`replace`](Self::replace) or
/// [`load_path`](Self::load_path); filters never modify it.
#[derive(Debug, Clone, Default)]
pub struct ClarificationTracker {
    clarifications: Vec<Clarification>,
    modules: Vec<Module>,
    criteria: FilterCriteria,
    view: Vec<Clarification>,
    filter_applied: bool,
}

impl ClarificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_result(result: IngestionResult) -> Self {
        let mut tracker = Self::new();
        tracker.replace(result);
        tracker
    }

    /// Drops everything previously loaded and takes over `result`.
    pub fn replace(&mut self, result: IngestionResult) -> Vec<IngestionDiagnostic> {
        let IngestionResult {
            clarifications,
            modules,
            diagnostics,
        } = result;

        self.view = clarifications.clone();
        self.clarifications = clarifications;
        self.modules = modules;
        self.criteria = FilterCriteria::default();
        self.filter_applied = false;

        diagnostics
    }

    /// Ingests `path` and replaces the loaded state. On error the tracker is unchanged.
    pub async fn load_path(
        &mut self,
        path: impl AsRef<Path>,
        cancel: CancellationFlag,
    ) -> Result<Vec<IngestionDiagnostic>, IngestionError> {
        let result = ingest::load_path(path, cancel).await?;
        Ok(self.replace(result))
    }

    pub fn clarifications(&self) -> &[Clarification] {
        &self.clarifications
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn filtered(&self) -> &[Clarification] {
        &self.view
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn is_filter_applied(&self) -> bool {
        self.filter_applied
    }

    pub fn is_search_applied(&self) -> bool {
        self.filter_applied && self.criteria.has_search()
    }

    /// Recomputes the view from the full set.
    pub fn apply_filters(&mut self, criteria: FilterCriteria) -> &[Clarification] {
        self.view = criteria.apply(&self.clarifications);
        self.criteria = criteria;
        self.filter_applied = true;
        debug!(
            matched = self.view.len(),
            total = self.clarifications.len(),
            "filters applied"
        );
        &self.view
    }

    /// Like [`apply_filters`](Self::apply_filters), taking the module criterion from the
    /// checked modules.
    pub fn apply_selection_filters(&mut self, criteria: FilterCriteria) -> &[Clarification] {
        let criteria = FilterCriteria {
            modules: self.selected_modules(),
            ..criteria
        };
        self.apply_filters(criteria)
    }

    /// Clears every criterion and module check; the view becomes the full set again.
    pub fn reset_filters(&mut self) {
        self.set_all_checked(false);
        self.criteria = FilterCriteria::default();
        self.view = self.clarifications.clone();
        self.filter_applied = false;
    }

    /// Returns false when no module has that name.
    pub fn set_module_checked(&mut self, name: &str, checked: bool) -> bool {
        match self.modules.iter_mut().find(|module| module.name == name) {
            Some(module) => {
                module.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn set_all_checked(&mut self, checked: bool) {
        for module in &mut self.modules {
            module.checked = checked;
        }
    }

    pub fn selected_modules(&self) -> BTreeSet<String> {
        self.modules
            .iter()
            .filter(|module| module.checked)
            .map(|module| module.name.clone())
            .collect()
    }

    /// Per-module counts, always over the full set.
    pub fn summaries(&self) -> Vec<ModuleSummary> {
        summarize(&self.clarifications)
    }

    /// Rows an export should contain: the filtered view once a filter was applied.
    pub fn export_view(&self) -> &[Clarification] {
        if self.filter_applied {
            &self.view
        } else {
            &self.clarifications
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn record(number: i32, status: &str, module: &str, date: NaiveDate) -> Clarification {
        Clarification {
            number,
            document_name: format!("Doc {number}"),
            module: module.to_string(),
            status: status.to_string(),
            date,
            question: format!("Question {number}"),
            answer: String::new(),
        }
    }

    fn loaded() -> ClarificationTracker {
        ClarificationTracker::from_result(IngestionResult {
            clarifications: vec![
                record(1, "Closed", "A", ymd(2024, 1, 1)),
                record(2, "Open", "A", ymd(2024, 2, 1)),
                record(3, "Pending", "B", ymd(2024, 1, 15)),
            ],
            modules: vec![Module::new("A"), Module::new("B")],
            diagnostics: Vec::new(),
        })
    }

    #[test]
    fn selection_filter_uses_checked_modules() {
        let mut tracker = loaded();
        assert!(tracker.set_module_checked("B", true));
        assert!(!tracker.set_module_checked("Z", true));

        let view = tracker.apply_selection_filters(FilterCriteria::default());
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].number, 3);
        assert_eq!(tracker.criteria().modules.len(), 1);
    }

    #[test]
    fn reset_restores_full_view_and_clears_selection() {
        let mut tracker = loaded();
        let original = tracker.clarifications().to_vec();
        tracker.set_all_checked(true);
        tracker.apply_filters(FilterCriteria::default().with_search("question 2"));
        assert!(tracker.is_search_applied());
        assert_eq!(tracker.filtered().len(), 1);

        tracker.reset_filters();
        assert_eq!(tracker.filtered(), original.as_slice());
        assert_eq!(tracker.criteria(), &FilterCriteria::default());
        assert!(tracker.selected_modules().is_empty());
        assert!(!tracker.is_filter_applied());
    }

    #[test]
    fn replace_discards_previous_state() {
        let mut tracker = loaded();
        tracker.set_all_checked(true);
        tracker.apply_filters(FilterCriteria::default().with_status("Open"));

        let diagnostics = tracker.replace(IngestionResult {
            clarifications: vec![record(9, "Open", "C", ymd(2024, 5, 5))],
            modules: vec![Module::new("C")],
            diagnostics: Vec::new(),
        });

        assert!(diagnostics.is_empty());
        assert_eq!(tracker.clarifications().len(), 1);
        assert_eq!(tracker.filtered().len(), 1);
        assert_eq!(tracker.modules(), &[Module::new("C")]);
        assert!(!tracker.is_filter_applied());
    }

    #[test]
    fn export_view_follows_filter_state() {
        let mut tracker = loaded();
        assert_eq!(tracker.export_view().len(), 3);

        tracker.apply_filters(FilterCriteria::default().with_status("Closed"));
        assert_eq!(tracker.export_view().len(), 1);

        tracker.apply_filters(FilterCriteria::default().with_status("Rejected"));
        assert!(tracker.export_view().is_empty());
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_state() {
        let mut tracker = loaded();
        tracker.apply_filters(FilterCriteria::default().with_status("Closed"));

        let error = tracker
            .load_path("./missing-tracker.xlsx", CancellationFlag::new())
            .await
            .expect_err("missing file");
        assert!(matches!(error, IngestionError::SourceUnreadable { .. }));
        assert_eq!(tracker.clarifications().len(), 3);
        assert_eq!(tracker.filtered().len(), 1);
    }
}

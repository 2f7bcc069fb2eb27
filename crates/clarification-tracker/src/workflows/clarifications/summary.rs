use super::domain::{Clarification, ModuleSummary};
use std::collections::HashMap;

/// Groups records by module, in order of first appearance, and counts statuses.
///
/// Module names are compared exactly; no trimming or case folding.
pub fn summarize(records: &[Clarification]) -> Vec<ModuleSummary> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<ModuleSummary> = Vec::new();

    for clarification in records {
        let index = *positions
            .entry(clarification.module.as_str())
            .or_insert_with(|| {
                summaries.push(ModuleSummary::new(clarification.module.clone()));
                summaries.len() - 1
            });
        summaries[index].record(&clarification.status);
    }

    summaries
}

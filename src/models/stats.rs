use std::collections::BTreeMap;

use serde::Serialize;

/// Count per label (purpose or case type)
///
/// Unordered by count; use [`StatsSummary::ranked`] for a presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatsSummary(BTreeMap<String, usize>);

impl StatsSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, label: impl Into<String>) {
        *self.0.entry(label.into()).or_insert(0) += 1;
    }

    pub fn get(&self, label: &str) -> usize {
        self.0.get(label).copied().unwrap_or(0)
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Number of distinct labels
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Labels by descending count; equal counts keep label order
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Payload of the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CauseListStats {
    pub total_cases: usize,
    pub date: String,
    pub court_code: String,
    pub purposes: StatsSummary,
    pub case_types: StatsSummary,
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a summary was obtained.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    #[default]
    Llm,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub name: String,
    #[serde(default)]
    pub sum_insured: Option<Decimal>,
    #[serde(default)]
    pub deductible: Option<String>,
}

/// Structured coverage data extracted from a policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    #[serde(default)]
    pub document: String,
    #[serde(default)]
    pub insurer: Option<String>,
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub insured: Option<String>,
    #[serde(default)]
    pub premium: Option<Decimal>,
    #[serde(default)]
    pub coverages: Vec<Coverage>,
    #[serde(default)]
    pub source: ExtractionSource,
}

impl PolicySummary {
    pub fn coverage(&self, name: &str) -> Option<&Coverage> {
        let key = coverage_key(name);
        self.coverages.iter().find(|c| coverage_key(&c.name) == key)
    }
}

/// One row of the comparison table: a coverage and what each document says.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageRow {
    pub coverage: String,
    pub sum_insured: Vec<Option<Decimal>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyComparison {
    pub policies: Vec<PolicySummary>,
    pub rows: Vec<CoverageRow>,
}

impl PolicyComparison {
    /// Lines up the union of coverages across documents, keeping the first
    /// spelling seen for each coverage.
    pub fn build(policies: Vec<PolicySummary>) -> Self {
        let mut names: BTreeMap<String, String> = BTreeMap::new();
        for coverage in policies.iter().flat_map(|p| p.coverages.iter()) {
            names
                .entry(coverage_key(&coverage.name))
                .or_insert_with(|| coverage.name.trim().to_string());
        }

        let rows = names
            .into_values()
            .map(|name| CoverageRow {
                sum_insured: policies
                    .iter()
                    .map(|p| p.coverage(&name).and_then(|c| c.sum_insured))
                    .collect(),
                coverage: name,
            })
            .collect();

        Self { policies, rows }
    }
}

fn coverage_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

//! Company facts as published by the filings registry (XBRL `us-gaap` namespace).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Unit key of the monetary observations the screen reads.
pub const USD_UNIT: &str = "USD";

/// Every `us-gaap` concept reported by one company, keyed by tag name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyFacts {
    #[serde(default)]
    pub concepts: HashMap<String, FactConcept>,
}

impl CompanyFacts {
    pub fn concept(&self, tag: &str) -> Option<&FactConcept> {
        self.concepts.get(tag)
    }
}

/// One reported concept, with its observations grouped by unit of measure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactConcept {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub units: HashMap<String, Vec<FactEntry>>,
}

impl FactConcept {
    /// Observations reported in US dollars; empty when the concept has none.
    pub fn usd(&self) -> &[FactEntry] {
        self.units.get(USD_UNIT).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A single dated observation. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactEntry {
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub val: Option<Value>,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub filed: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_reads_only_the_usd_unit() {
        let mut concept = FactConcept::default();
        assert!(concept.usd().is_empty());

        concept.units.insert("EUR".into(), vec![FactEntry::default()]);
        assert!(concept.usd().is_empty());

        concept
            .units
            .insert(USD_UNIT.into(), vec![FactEntry::default(), FactEntry::default()]);
        assert_eq!(concept.usd().len(), 2);
    }
}

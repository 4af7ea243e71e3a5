//! Quarterly revenue extraction from registry facts.

use chrono::NaiveDate;
use screener_core::{CompanyFacts, FactEntry, FilingForm, RevenueObservation};
use serde_json::Value;

/// Revenue tags in lookup order. The first tag the company reports is used
/// on its own; tags are never merged.
pub const REVENUE_TAGS: [&str; 3] = [
    "Revenues",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
    "SalesRevenueNet",
];

const QUARTERS: usize = 4;

/// The four most recent 10-Q/10-K revenue observations, newest first.
///
/// Returns `None` when no revenue tag is reported, the chosen tag has no USD
/// observations, the observations never carry `end`, `form` and `val`, or
/// fewer than four qualifying observations exist.
pub fn extract_quarterly_revenue(facts: &CompanyFacts) -> Option<[RevenueObservation; 4]> {
    let concept = REVENUE_TAGS.iter().find_map(|tag| facts.concept(tag))?;
    let entries = concept.usd();
    if entries.is_empty() || !has_required_fields(entries) {
        return None;
    }

    let mut observations: Vec<RevenueObservation> =
        entries.iter().filter_map(to_observation).collect();
    // Stable sort keeps registry order between filings for the same period.
    observations.sort_by(|a, b| b.period_end.cmp(&a.period_end));
    observations.truncate(QUARTERS);

    observations.try_into().ok()
}

/// Each of `end`, `form` and `val` must appear on at least one observation.
fn has_required_fields(entries: &[FactEntry]) -> bool {
    entries.iter().any(|e| e.end.is_some())
        && entries.iter().any(|e| e.form.is_some())
        && entries.iter().any(|e| e.val.is_some())
}

fn to_observation(entry: &FactEntry) -> Option<RevenueObservation> {
    let form = FilingForm::from_form(entry.form.as_deref()?)?;
    let period_end = NaiveDate::parse_from_str(entry.end.as_deref()?, "%Y-%m-%d").ok()?;
    Some(RevenueObservation {
        period_end,
        form,
        value: entry.val.clone().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::FactConcept;
    use serde_json::json;
    use std::collections::HashMap;

    fn entry(end: &str, form: &str, val: Value) -> FactEntry {
        FactEntry {
            end: Some(end.to_string()),
            form: Some(form.to_string()),
            val: Some(val),
            ..Default::default()
        }
    }

    fn facts(tag: &str, entries: Vec<FactEntry>) -> CompanyFacts {
        let mut units = HashMap::new();
        units.insert("USD".to_string(), entries);
        let mut concepts = HashMap::new();
        concepts.insert(tag.to_string(), FactConcept { label: None, units });
        CompanyFacts { concepts }
    }

    fn values(obs: &[RevenueObservation; 4]) -> Vec<Value> {
        obs.iter().map(|o| o.value.clone()).collect()
    }

    #[test]
    fn test_latest_four_newest_first() {
        let f = facts(
            "Revenues",
            vec![
                entry("2023-03-31", "10-Q", json!(10)),
                entry("2023-12-31", "10-K", json!(40)),
                entry("2022-12-31", "10-K", json!(5)),
                entry("2023-06-30", "10-Q", json!(20)),
                entry("2023-09-30", "10-Q", json!(30)),
            ],
        );
        let obs = extract_quarterly_revenue(&f).unwrap();
        assert_eq!(values(&obs), vec![json!(40), json!(30), json!(20), json!(10)]);
        assert_eq!(obs[0].form, FilingForm::Annual);
    }

    #[test]
    fn test_other_forms_are_ignored() {
        let f = facts(
            "Revenues",
            vec![
                entry("2024-03-31", "8-K", json!(999)),
                entry("2023-12-31", "10-Q", json!(4)),
                entry("2023-09-30", "10-Q", json!(3)),
                entry("2023-06-30", "10-Q", json!(2)),
                entry("2023-03-31", "10-Q", json!(1)),
            ],
        );
        let obs = extract_quarterly_revenue(&f).unwrap();
        assert_eq!(values(&obs), vec![json!(4), json!(3), json!(2), json!(1)]);
    }

    #[test]
    fn test_three_quarters_is_no_data() {
        let f = facts(
            "Revenues",
            vec![
                entry("2023-12-31", "10-Q", json!(4)),
                entry("2023-09-30", "10-Q", json!(3)),
                entry("2023-06-30", "10-Q", json!(2)),
            ],
        );
        assert!(extract_quarterly_revenue(&f).is_none());
    }

    #[test]
    fn test_tag_priority_first_present_wins() {
        let mut f = facts(
            "SalesRevenueNet",
            vec![
                entry("2023-12-31", "10-Q", json!(4)),
                entry("2023-09-30", "10-Q", json!(3)),
                entry("2023-06-30", "10-Q", json!(2)),
                entry("2023-03-31", "10-Q", json!(1)),
            ],
        );
        // A higher priority tag with too little data still wins and yields nothing.
        let sparse = facts("Revenues", vec![entry("2023-12-31", "10-Q", json!(9))]);
        f.concepts.extend(sparse.concepts);
        assert!(extract_quarterly_revenue(&f).is_none());

        f.concepts.remove("Revenues");
        assert!(extract_quarterly_revenue(&f).is_some());
    }

    #[test]
    fn test_no_revenue_tag_is_no_data() {
        let f = facts("NetIncomeLoss", vec![entry("2023-12-31", "10-Q", json!(1))]);
        assert!(extract_quarterly_revenue(&f).is_none());
        assert!(extract_quarterly_revenue(&CompanyFacts::default()).is_none());
    }

    #[test]
    fn test_missing_value_field_is_no_data() {
        let entries = (1..=4)
            .map(|m| FactEntry {
                end: Some(format!("2023-0{}-28", m)),
                form: Some("10-Q".into()),
                val: None,
                ..Default::default()
            })
            .collect();
        assert!(extract_quarterly_revenue(&facts("Revenues", entries)).is_none());
    }

    #[test]
    fn test_empty_usd_unit_is_no_data() {
        assert!(extract_quarterly_revenue(&facts("Revenues", Vec::new())).is_none());
    }

    #[test]
    fn test_non_usd_units_are_no_data() {
        let mut f = facts("Revenues", vec![entry("2023-12-31", "10-Q", json!(1))]);
        let concept = f.concepts.get_mut("Revenues").unwrap();
        let usd = concept.units.remove("USD").unwrap();
        concept.units.insert("EUR".into(), usd);
        assert!(extract_quarterly_revenue(&f).is_none());
    }
}

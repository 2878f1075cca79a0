use std::fmt::Write;

use crate::metrics;
use crate::models::{FilterSpec, UsageFact};

/// Plain-text block with everything visible for the current scope. This is
/// what the summarization collaborator receives and what `report` writes.
pub fn build_summary_text(facts: &[UsageFact], filter: &FilterSpec, policy_label: &str) -> String {
    let computed = metrics::compute(facts, filter);
    let scoped = metrics::restrict(facts, filter);
    let roles = metrics::distinct_in_order(scoped.iter().map(|f| f.role.as_str()));

    let mut output = String::new();

    let _ = writeln!(output, "=== EXECUTIVE SUMMARY - ADOPTION ANALYTICS ===");
    let _ = writeln!(output);
    let _ = writeln!(output, "APPLIED FILTERS:");
    let _ = writeln!(output, "- Period policy: {policy_label}");
    let _ = writeln!(
        output,
        "- Months selected ({}): {}",
        filter.months.len(),
        filter.months.join(", ")
    );
    let _ = writeln!(
        output,
        "- Countries selected ({}): {}",
        filter.countries.len(),
        filter.countries.join(", ")
    );
    let _ = writeln!(
        output,
        "- Org units selected ({}): {}",
        filter.org_units.len(),
        filter.org_units.join(", ")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "HEADLINE METRICS:");
    let _ = writeln!(output, "- Eligible professionals: {}", computed.eligible);
    let _ = writeln!(output, "- Active users: {}", computed.active);
    let _ = writeln!(
        output,
        "- Cumulative adoption rate: {:.1}%",
        computed.cumulative_rate
    );
    let _ = writeln!(
        output,
        "- Average monthly adoption rate: {:.1}%",
        computed.average_rate
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "ADOPTION BY MONTH:");
    for month in &computed.monthly {
        let _ = writeln!(
            output,
            "- {}: {} eligible, {} active, {} inactive, {:.1}% adoption",
            month.month,
            month.eligible,
            month.active,
            month.eligible - month.active,
            month.rate
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "ADOPTION BY COUNTRY:");
    for country in &computed.by_country {
        let _ = writeln!(
            output,
            "- {}: {} eligible, {:.1}% adoption",
            country.value, country.eligible, country.rate
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "ADDITIONAL STATISTICS:");
    let _ = writeln!(output, "- Records analyzed: {}", scoped.len());
    let _ = writeln!(output, "- Distinct individuals: {}", computed.eligible);
    let _ = writeln!(output, "- Distinct countries: {}", computed.by_country.len());
    let _ = writeln!(output, "- Distinct org units: {}", computed.by_org_unit.len());
    let _ = writeln!(output, "- Distinct roles: {}", roles.len());
    let _ = writeln!(output, "- Months analyzed: {}", filter.months.len());
    let _ = writeln!(output, "- Total usage: {}", computed.total_usage);

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(name: &str, country: &str, month: &str, usage: u64) -> UsageFact {
        UsageFact {
            name: name.to_string(),
            country: country.to_string(),
            role: "Analyst".to_string(),
            org_unit: "Sales".to_string(),
            month: month.to_string(),
            usage,
        }
    }

    #[test]
    fn summary_text_carries_filters_and_headline_numbers() {
        let facts = vec![
            fact("Ana Ruiz", "CO", "Sep-24", 5),
            fact("Beto Paz", "CO", "Sep-24", 0),
        ];
        let filter = FilterSpec {
            months: vec!["Sep-24".to_string()],
            countries: vec!["CO".to_string()],
            org_units: vec!["Sales".to_string()],
        };

        let text = build_summary_text(&facts, &filter, "all months");

        assert!(text.contains("Period policy: all months"));
        assert!(text.contains("Months selected (1): Sep-24"));
        assert!(text.contains("Eligible professionals: 2"));
        assert!(text.contains("Cumulative adoption rate: 50.0%"));
        assert!(text.contains("- Sep-24: 2 eligible, 1 active, 1 inactive, 50.0% adoption"));
        assert!(text.contains("- CO: 2 eligible, 50.0% adoption"));
        assert!(text.contains("Records analyzed: 2"));
    }

    #[test]
    fn empty_scope_still_produces_a_complete_report() {
        let filter = FilterSpec {
            months: vec!["Sep-24".to_string()],
            countries: vec!["CO".to_string()],
            org_units: vec!["Sales".to_string()],
        };
        let text = build_summary_text(&[], &filter, "all months");

        assert!(text.contains("Eligible professionals: 0"));
        assert!(text.contains("Cumulative adoption rate: 0.0%"));
    }
}

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::models::{ReconciledRow, RosterRow, UsageFact, UsageRow};

/// Standing business rule: this org unit is removed from the reconciled
/// set before any metric is computed. Matched case-insensitively.
pub const EXCLUDED_ORG_UNIT: &str = "Operaciones";

const NAME_SENTINEL: &str = "Sin Nombre";
const COUNTRY_SENTINEL: &str = "Sin País";
const ROLE_SENTINEL: &str = "Sin Cargo";
const ORG_UNIT_SENTINEL: &str = "Sin Área";

const KEY_SAMPLE_LIMIT: usize = 10;

/// Join key: trimmed, inner whitespace collapsed, uppercased.
/// Never displayed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

fn or_sentinel(value: &str, sentinel: &str) -> String {
    if value.trim().is_empty() {
        sentinel.to_string()
    } else {
        value.to_string()
    }
}

/// Index rows by normalized key. A duplicated key keeps the last seen row
/// at the position of the first occurrence.
fn index_by_key<T>(
    rows: Vec<T>,
    key_of: impl Fn(&T) -> String,
    side: &str,
) -> (Vec<String>, HashMap<String, T>) {
    let mut order = Vec::with_capacity(rows.len());
    let mut by_key = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = key_of(&row);
        if by_key.insert(key.clone(), row).is_some() {
            warn!("duplicate {side} key {key:?}, keeping the last row");
        } else {
            order.push(key);
        }
    }
    (order, by_key)
}

/// Inner-join roster and usage rows on the normalized name. The roster's
/// original casing wins for display. Blank attributes become sentinels so
/// grouping never drops rows. An empty join is an error: it signals a key
/// format mismatch between the sources, not a business outcome.
pub fn reconcile(
    roster: Vec<RosterRow>,
    usage: Vec<UsageRow>,
) -> Result<Vec<ReconciledRow>, PipelineError> {
    let roster_rows = roster.len();
    let usage_rows = usage.len();

    let (roster_order, mut roster_by_key) =
        index_by_key(roster, |r| normalize_name(&r.name), "roster");
    let (usage_order, mut usage_by_key) =
        index_by_key(usage, |r| normalize_name(&r.name), "usage");

    let mut joined = Vec::new();
    for key in &roster_order {
        let Some(usage_row) = usage_by_key.remove(key) else {
            continue;
        };
        if let Some(person) = roster_by_key.remove(key) {
            joined.push((person, usage_row));
        }
    }

    if joined.is_empty() {
        return Err(PipelineError::EmptyJoin {
            roster_rows,
            usage_rows,
            roster_samples: roster_order.into_iter().take(KEY_SAMPLE_LIMIT).collect(),
            usage_samples: usage_order.into_iter().take(KEY_SAMPLE_LIMIT).collect(),
        });
    }

    let mut reconciled: Vec<ReconciledRow> = joined
        .into_iter()
        .map(|(person, usage_row)| ReconciledRow {
            name: or_sentinel(&person.name, NAME_SENTINEL),
            country: or_sentinel(&person.country, COUNTRY_SENTINEL),
            role: or_sentinel(&person.role, ROLE_SENTINEL),
            org_unit: or_sentinel(&person.org_unit, ORG_UNIT_SENTINEL),
            values: usage_row.values,
        })
        .collect();

    let before_exclusion = reconciled.len();
    reconciled.retain(|row| !row.org_unit.eq_ignore_ascii_case(EXCLUDED_ORG_UNIT));
    info!(
        "reconciled {} of {roster_rows} roster rows against {usage_rows} usage rows ({} excluded)",
        reconciled.len(),
        before_exclusion - reconciled.len()
    );

    Ok(reconciled)
}

/// Reshape the wide table into one fact per individual and month. Output
/// size is exactly rows x months; cells that do not parse count as zero.
pub fn melt(reconciled: &[ReconciledRow], month_columns: &[String]) -> Vec<UsageFact> {
    let mut facts = Vec::with_capacity(reconciled.len() * month_columns.len());
    for row in reconciled {
        for (index, month) in month_columns.iter().enumerate() {
            let raw = row.values.get(index).map(String::as_str).unwrap_or("");
            facts.push(UsageFact {
                name: row.name.clone(),
                country: row.country.clone(),
                role: row.role.clone(),
                org_unit: row.org_unit.clone(),
                month: month.clone(),
                usage: coerce_count(raw),
            });
        }
    }
    facts
}

pub fn coerce_count(raw: &str) -> u64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value as u64,
        _ => 0,
    }
}

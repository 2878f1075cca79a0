use std::collections::{HashMap, HashSet};

use crate::models::{
    DimensionAdoption, DimensionStats, FilterSpec, HeatmapCell, Metrics, MonthAdoption, UsageFact,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Country,
    OrgUnit,
}

impl Dimension {
    fn value_of<'a>(&self, fact: &'a UsageFact) -> &'a str {
        match self {
            Dimension::Country => &fact.country,
            Dimension::OrgUnit => &fact.org_unit,
        }
    }
}

pub fn adoption_rate(active: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        active as f64 / total as f64 * 100.0
    }
}

pub fn restrict<'a>(facts: &'a [UsageFact], filter: &FilterSpec) -> Vec<&'a UsageFact> {
    facts.iter().filter(|fact| filter.matches(fact)).collect()
}

/// Distinct values in first-appearance order. Grouping and tie-breaking
/// stay deterministic with respect to input order.
pub fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

fn count_individuals(facts: &[&UsageFact]) -> (usize, usize) {
    let eligible: HashSet<&str> = facts.iter().map(|f| f.name.as_str()).collect();
    let active: HashSet<&str> = facts
        .iter()
        .filter(|f| f.usage > 0)
        .map(|f| f.name.as_str())
        .collect();
    (eligible.len(), active.len())
}

fn per_individual_totals(facts: &[&UsageFact]) -> Vec<u64> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for fact in facts {
        *totals.entry(fact.name.as_str()).or_insert(0) += fact.usage;
    }
    totals.into_values().collect()
}

fn sample_std_dev(values: &[u64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt()
}

pub fn compute(facts: &[UsageFact], filter: &FilterSpec) -> Metrics {
    let scoped = restrict(facts, filter);

    let (eligible, active) = count_individuals(&scoped);
    let cumulative_rate = adoption_rate(active, eligible);

    // Per-month rates use the same ratio scoped to one month. The average
    // is the unweighted mean over months that have anyone in scope; a user
    // active in one of six months raises the cumulative rate but feeds a
    // low rate into only one term here.
    let mut monthly = Vec::with_capacity(filter.months.len());
    let mut month_rates = Vec::new();
    for month in &filter.months {
        let in_month: Vec<&UsageFact> = scoped
            .iter()
            .filter(|f| &f.month == month)
            .copied()
            .collect();
        let (month_eligible, month_active) = count_individuals(&in_month);
        let rate = adoption_rate(month_active, month_eligible);
        if month_eligible > 0 {
            month_rates.push(rate);
        }
        monthly.push(MonthAdoption {
            month: month.clone(),
            eligible: month_eligible,
            active: month_active,
            rate,
        });
    }
    let average_rate = if month_rates.is_empty() {
        0.0
    } else {
        month_rates.iter().sum::<f64>() / month_rates.len() as f64
    };

    let by_country = breakdown(&scoped, Dimension::Country);
    let by_org_unit = breakdown(&scoped, Dimension::OrgUnit);
    let heatmap = cross_tabulate(&scoped);

    let total_usage: u64 = scoped.iter().map(|f| f.usage).sum();
    let mean_usage = if eligible == 0 {
        0.0
    } else {
        total_usage as f64 / eligible as f64
    };
    let usage_std_dev = sample_std_dev(&per_individual_totals(&scoped));

    Metrics {
        eligible,
        active,
        cumulative_rate,
        average_rate,
        monthly,
        by_country,
        by_org_unit,
        heatmap,
        total_usage,
        mean_usage,
        usage_std_dev,
    }
}

fn breakdown(scoped: &[&UsageFact], dimension: Dimension) -> Vec<DimensionAdoption> {
    distinct_in_order(scoped.iter().map(|f| dimension.value_of(f)))
        .into_iter()
        .map(|value| {
            let subset: Vec<&UsageFact> = scoped
                .iter()
                .filter(|f| dimension.value_of(f) == value)
                .copied()
                .collect();
            let (eligible, active) = count_individuals(&subset);
            DimensionAdoption {
                rate: adoption_rate(active, eligible),
                value,
                eligible,
                active,
            }
        })
        .collect()
}

/// Country x org-unit cells for the heat-map view. Cells with no
/// individuals are omitted, not reported as zero.
fn cross_tabulate(scoped: &[&UsageFact]) -> Vec<HeatmapCell> {
    let countries = distinct_in_order(scoped.iter().map(|f| f.country.as_str()));
    let org_units = distinct_in_order(scoped.iter().map(|f| f.org_unit.as_str()));

    let mut cells = Vec::new();
    for country in &countries {
        for org_unit in &org_units {
            let subset: Vec<&UsageFact> = scoped
                .iter()
                .filter(|f| &f.country == country && &f.org_unit == org_unit)
                .copied()
                .collect();
            if subset.is_empty() {
                continue;
            }
            let (eligible, active) = count_individuals(&subset);
            cells.push(HeatmapCell {
                country: country.clone(),
                org_unit: org_unit.clone(),
                eligible,
                active,
                rate: adoption_rate(active, eligible),
            });
        }
    }
    cells
}

/// Detailed statistics table, one row per value of the dimension, sorted
/// descending by adoption rate (stable, so ties keep appearance order).
pub fn dimension_stats(
    facts: &[UsageFact],
    filter: &FilterSpec,
    dimension: Dimension,
) -> Vec<DimensionStats> {
    let scoped = restrict(facts, filter);
    let mut stats: Vec<DimensionStats> =
        distinct_in_order(scoped.iter().map(|f| dimension.value_of(f)))
            .into_iter()
            .map(|value| {
                let subset: Vec<&UsageFact> = scoped
                    .iter()
                    .filter(|f| dimension.value_of(f) == value)
                    .copied()
                    .collect();
                let (eligible, active) = count_individuals(&subset);
                let total_usage: u64 = subset.iter().map(|f| f.usage).sum();
                let mean_usage = if eligible == 0 {
                    0.0
                } else {
                    total_usage as f64 / eligible as f64
                };
                DimensionStats {
                    adoption_rate: adoption_rate(active, eligible),
                    std_dev: sample_std_dev(&per_individual_totals(&subset)),
                    value,
                    eligible,
                    active,
                    total_usage,
                    mean_usage,
                }
            })
            .collect();

    stats.sort_by(|a, b| {
        b.adoption_rate
            .partial_cmp(&a.adoption_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stats
}

use crate::metrics::{adoption_rate, distinct_in_order, restrict};
use crate::models::{FilterSpec, RankRow, UsageFact};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDimension {
    Individual,
    Country,
}

impl RankDimension {
    fn value_of<'a>(&self, fact: &'a UsageFact) -> &'a str {
        match self {
            RankDimension::Individual => &fact.name,
            RankDimension::Country => &fact.country,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    TotalUsage,
    AdoptionRate,
}

/// Top-N leaderboard over the filtered facts. Sorted descending by the
/// chosen metric; ties keep the grouping key's first-appearance order
/// (stable sort over input order, deterministic for a given input).
pub fn top_n(
    facts: &[UsageFact],
    filter: &FilterSpec,
    dimension: RankDimension,
    metric: RankMetric,
    n: usize,
) -> Vec<RankRow> {
    let scoped = restrict(facts, filter);

    let mut rows: Vec<RankRow> = distinct_in_order(scoped.iter().map(|f| dimension.value_of(f)))
        .into_iter()
        .map(|key| {
            let subset: Vec<&UsageFact> = scoped
                .iter()
                .filter(|f| dimension.value_of(f) == key)
                .copied()
                .collect();
            let eligible = distinct_in_order(subset.iter().map(|f| f.name.as_str())).len();
            let active = distinct_in_order(
                subset.iter().filter(|f| f.usage > 0).map(|f| f.name.as_str()),
            )
            .len();
            let total_usage: u64 = subset.iter().map(|f| f.usage).sum();
            let (country, org_unit, role) = match dimension {
                RankDimension::Individual => (
                    Some(subset[0].country.clone()),
                    Some(subset[0].org_unit.clone()),
                    Some(subset[0].role.clone()),
                ),
                RankDimension::Country => (None, None, None),
            };
            RankRow {
                position: 0,
                key,
                country,
                org_unit,
                role,
                eligible,
                active,
                total_usage,
                adoption_rate: adoption_rate(active, eligible),
            }
        })
        .collect();

    match metric {
        RankMetric::TotalUsage => rows.sort_by(|a, b| b.total_usage.cmp(&a.total_usage)),
        RankMetric::AdoptionRate => rows.sort_by(|a, b| {
            b.adoption_rate
                .partial_cmp(&a.adoption_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }

    rows.truncate(n);
    for (index, row) in rows.iter_mut().enumerate() {
        row.position = index + 1;
    }
    rows
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

    fn filter(months: &[&str], countries: &[&str]) -> FilterSpec {
        FilterSpec {
            months: months.iter().map(|m| m.to_string()).collect(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
            org_units: vec!["Sales".to_string()],
        }
    }

    #[test]
    fn individuals_rank_by_total_usage() {
        let facts = vec![
            fact("Ana Ruiz", "CO", "Sep-24", 2),
            fact("Beto Paz", "CO", "Sep-24", 9),
            fact("Caro Gil", "MX", "Sep-24", 4),
        ];
        let rows = top_n(
            &facts,
            &filter(&["Sep-24"], &["CO", "MX"]),
            RankDimension::Individual,
            RankMetric::TotalUsage,
            2,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[0].key, "Beto Paz");
        assert_eq!(rows[0].total_usage, 9);
        assert_eq!(rows[0].country.as_deref(), Some("CO"));
        assert_eq!(rows[1].key, "Caro Gil");
    }

    #[test]
    fn countries_rank_by_adoption_rate() {
        let facts = vec![
            fact("Ana Ruiz", "CO", "Sep-24", 0),
            fact("Beto Paz", "CO", "Sep-24", 1),
            fact("Caro Gil", "MX", "Sep-24", 1),
        ];
        let rows = top_n(
            &facts,
            &filter(&["Sep-24"], &["CO", "MX"]),
            RankDimension::Country,
            RankMetric::AdoptionRate,
            5,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "MX");
        assert!((rows[0].adoption_rate - 100.0).abs() < 1e-9);
        assert_eq!(rows[0].eligible, 1);
        assert_eq!(rows[1].key, "CO");
        assert_eq!(rows[1].eligible, 2);
        assert_eq!(rows[1].active, 1);
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let facts = vec![
            fact("Ana Ruiz", "MX", "Sep-24", 3),
            fact("Beto Paz", "CO", "Sep-24", 3),
        ];
        let rows = top_n(
            &facts,
            &filter(&["Sep-24"], &["CO", "MX"]),
            RankDimension::Individual,
            RankMetric::TotalUsage,
            5,
        );

        assert_eq!(rows[0].key, "Ana Ruiz");
        assert_eq!(rows[1].key, "Beto Paz");
    }

    #[test]
    fn fewer_groups_than_n_returns_all_without_padding() {
        let facts = vec![fact("Ana Ruiz", "CO", "Sep-24", 1)];
        let rows = top_n(
            &facts,
            &filter(&["Sep-24"], &["CO"]),
            RankDimension::Country,
            RankMetric::TotalUsage,
            5,
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].position, 1);
    }
}

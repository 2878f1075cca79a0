use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

/// Key assigned to labels that do not parse, so one malformed header
/// never aborts a run. Callers see the fallback through the returned flag.
pub const FALLBACK_KEY: MonthKey = MonthKey { year: 2024, month: 1 };

// Spanish and English month stems; full names ("Abril", "August") match
// through their three-letter stem.
const MONTH_STEMS: [(&str, u32); 16] = [
    ("ene", 1),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("abr", 4),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("ago", 8),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dic", 12),
    ("dec", 12),
];

/// Parse a free-form month label ("Sep-24", "Abril 2025", "04/2025") into a
/// sortable key. Returns the key and whether the fallback was used.
pub fn parse_label(label: &str) -> (MonthKey, bool) {
    let tokens: Vec<&str> = label
        .split(['-', '/', ' ', '\t'])
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() < 2 {
        return (FALLBACK_KEY, true);
    }

    let month_token = tokens[0].to_lowercase();
    let year_token = tokens[tokens.len() - 1];
    if !(2..=4).contains(&year_token.len()) || !year_token.chars().all(|c| c.is_ascii_digit()) {
        return (FALLBACK_KEY, true);
    }
    let Ok(mut year) = year_token.parse::<i32>() else {
        return (FALLBACK_KEY, true);
    };
    if year_token.len() == 2 {
        year += 2000;
    }

    let month = MONTH_STEMS
        .iter()
        .find(|(stem, _)| month_token.contains(stem))
        .map(|&(_, number)| number)
        .or_else(|| match month_token.parse::<u32>() {
            Ok(number) if (1..=12).contains(&number) => Some(number),
            _ => None,
        });

    match month {
        Some(month) => (MonthKey { year, month }, false),
        None => (FALLBACK_KEY, true),
    }
}

#[derive(Debug, Clone)]
pub struct SortedLabels {
    pub labels: Vec<String>,
    pub fallback_labels: Vec<String>,
}

/// Sort labels chronologically. The sort is stable, so labels sharing a key
/// (including every fallback label) keep their input order.
pub fn sort_labels(labels: &[String]) -> SortedLabels {
    let mut fallback_labels = Vec::new();
    let mut keyed: Vec<(MonthKey, &String)> = Vec::with_capacity(labels.len());

    for label in labels {
        let (key, used_fallback) = parse_label(label);
        if used_fallback {
            warn!("unrecognized month label {label:?}, sorting it under the fallback key");
            fallback_labels.push(label.clone());
        }
        keyed.push((key, label));
    }

    keyed.sort_by_key(|(key, _)| *key);
    SortedLabels {
        labels: keyed.into_iter().map(|(_, label)| label.clone()).collect(),
        fallback_labels,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodPolicy {
    All,
    PreviousMonth,
    LastN(usize),
    Explicit(Vec<String>),
}

/// Select the months to analyze out of a chronologically sorted label list.
/// `LastN` drops the most recent label first, treating it as in progress.
pub fn resolve(sorted: &[String], policy: &PeriodPolicy) -> Vec<String> {
    match policy {
        PeriodPolicy::All => sorted.to_vec(),
        PeriodPolicy::PreviousMonth => {
            if sorted.len() >= 2 {
                vec![sorted[sorted.len() - 2].clone()]
            } else {
                sorted.to_vec()
            }
        }
        PeriodPolicy::LastN(n) => {
            let history: &[String] = if sorted.len() > 1 {
                &sorted[..sorted.len() - 1]
            } else {
                &[]
            };
            history[history.len().saturating_sub(*n)..].to_vec()
        }
        PeriodPolicy::Explicit(wanted) => sorted
            .iter()
            .filter(|label| wanted.contains(label))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn parses_word_and_two_digit_year() {
        assert_eq!(parse_label("Sep-24"), (MonthKey { year: 2024, month: 9 }, false));
        assert_eq!(parse_label("DIC-25"), (MonthKey { year: 2025, month: 12 }, false));
    }

    #[test]
    fn parses_full_names_in_both_languages() {
        assert_eq!(parse_label("Abril 2025"), (MonthKey { year: 2025, month: 4 }, false));
        assert_eq!(parse_label("August 2024"), (MonthKey { year: 2024, month: 8 }, false));
        assert_eq!(parse_label("enero-25"), (MonthKey { year: 2025, month: 1 }, false));
    }

    #[test]
    fn parses_numeric_months() {
        assert_eq!(parse_label("9-24"), (MonthKey { year: 2024, month: 9 }, false));
        assert_eq!(parse_label("04/2025"), (MonthKey { year: 2025, month: 4 }, false));
    }

    #[test]
    fn unrecognized_labels_fall_back_and_report_it() {
        assert_eq!(parse_label("garbage"), (FALLBACK_KEY, true));
        assert_eq!(parse_label("13-24"), (FALLBACK_KEY, true));
        assert_eq!(parse_label(""), (FALLBACK_KEY, true));
        assert_eq!(parse_label("Sep-x4"), (FALLBACK_KEY, true));
    }

    #[test]
    fn parse_is_deterministic() {
        for label in ["Sep-24", "???", "04/2025"] {
            assert_eq!(parse_label(label), parse_label(label));
        }
    }

    #[test]
    fn sorts_across_years_and_collects_fallbacks() {
        let input = labels(&["Feb-25", "Sep-24", "bogus", "Ene-25"]);
        let sorted = sort_labels(&input);
        assert_eq!(
            sorted.labels,
            labels(&["bogus", "Sep-24", "Ene-25", "Feb-25"])
        );
        assert_eq!(sorted.fallback_labels, labels(&["bogus"]));
    }

    #[test]
    fn resolve_all_returns_input_unchanged() {
        let input = labels(&["Sep-24", "Oct-24"]);
        assert_eq!(resolve(&input, &PeriodPolicy::All), input);
        assert!(resolve(&[], &PeriodPolicy::All).is_empty());
    }

    #[test]
    fn previous_month_takes_second_to_last() {
        let input = labels(&["Sep-24", "Oct-24", "Nov-24"]);
        assert_eq!(resolve(&input, &PeriodPolicy::PreviousMonth), labels(&["Oct-24"]));
        assert_eq!(
            resolve(&labels(&["Sep-24"]), &PeriodPolicy::PreviousMonth),
            labels(&["Sep-24"])
        );
        assert!(resolve(&[], &PeriodPolicy::PreviousMonth).is_empty());
    }

    #[test]
    fn last_n_excludes_the_month_in_progress() {
        let input = labels(&["Jun-24", "Jul-24", "Aug-24", "Sep-24", "Oct-24"]);
        assert_eq!(
            resolve(&input, &PeriodPolicy::LastN(3)),
            labels(&["Jul-24", "Aug-24", "Sep-24"])
        );
    }

    #[test]
    fn last_n_with_short_history_returns_what_exists() {
        // Two historical months plus the one in progress.
        let input = labels(&["Aug-24", "Sep-24", "Oct-24"]);
        assert_eq!(
            resolve(&input, &PeriodPolicy::LastN(3)),
            labels(&["Aug-24", "Sep-24"])
        );
        assert!(resolve(&labels(&["Oct-24"]), &PeriodPolicy::LastN(3)).is_empty());
    }

    #[test]
    fn explicit_keeps_sorted_order() {
        let input = labels(&["Sep-24", "Oct-24", "Nov-24"]);
        let policy = PeriodPolicy::Explicit(labels(&["Nov-24", "Sep-24"]));
        assert_eq!(resolve(&input, &policy), labels(&["Sep-24", "Nov-24"]));
    }
}

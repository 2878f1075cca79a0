use serde::Serialize;

#[derive(Debug, Clone)]
pub struct RosterRow {
    pub name: String,
    pub country: String,
    pub role: String,
    pub org_unit: String,
}

#[derive(Debug, Clone)]
pub struct UsageRow {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UsageTable {
    pub month_columns: Vec<String>,
    pub rows: Vec<UsageRow>,
}

/// One joined row: roster attributes plus the raw per-month cells,
/// parallel to `UsageTable::month_columns`.
#[derive(Debug, Clone)]
pub struct ReconciledRow {
    pub name: String,
    pub country: String,
    pub role: String,
    pub org_unit: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageFact {
    pub name: String,
    pub country: String,
    pub role: String,
    pub org_unit: String,
    pub month: String,
    pub usage: u64,
}

/// An empty month, country or org-unit selection means "nothing selected",
/// not "everything".
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub months: Vec<String>,
    pub countries: Vec<String>,
    pub org_units: Vec<String>,
}

impl FilterSpec {
    pub fn is_degenerate(&self) -> bool {
        self.months.is_empty() || self.countries.is_empty() || self.org_units.is_empty()
    }

    pub fn matches(&self, fact: &UsageFact) -> bool {
        self.months.contains(&fact.month)
            && self.countries.contains(&fact.country)
            && self.org_units.contains(&fact.org_unit)
    }
}

#[derive(Debug, Clone)]
pub struct Metrics {
    pub eligible: usize,
    pub active: usize,
    pub cumulative_rate: f64,
    pub average_rate: f64,
    pub monthly: Vec<MonthAdoption>,
    pub by_country: Vec<DimensionAdoption>,
    pub by_org_unit: Vec<DimensionAdoption>,
    pub heatmap: Vec<HeatmapCell>,
    pub total_usage: u64,
    pub mean_usage: f64,
    pub usage_std_dev: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthAdoption {
    pub month: String,
    pub eligible: usize,
    pub active: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionAdoption {
    pub value: String,
    pub eligible: usize,
    pub active: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapCell {
    pub country: String,
    pub org_unit: String,
    pub eligible: usize,
    pub active: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionStats {
    pub value: String,
    pub eligible: usize,
    pub active: usize,
    pub adoption_rate: f64,
    pub total_usage: u64,
    pub mean_usage: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankRow {
    pub position: usize,
    pub key: String,
    pub country: Option<String>,
    pub org_unit: Option<String>,
    pub role: Option<String>,
    pub eligible: usize,
    pub active: usize,
    pub total_usage: u64,
    pub adoption_rate: f64,
}

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// One day of accumulated consumption in kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub consumption: f64,
}

impl DailyReading {
    pub fn new(date: NaiveDate, consumption: f64) -> Self {
        Self { date, consumption }
    }
}

/// Instantaneous power draw of one sensor, in watts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LivePower {
    pub actual_raw_w: f64,
}

impl LivePower {
    pub fn kilowatts(&self) -> f64 {
        self.actual_raw_w / 1000.0
    }
}

/// Disaggregated consumption of one sensor-day, label -> kWh.
///
/// Labels keep the order they were inserted (or received in JSON) and are
/// unique; inserting an existing label overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryBreakdown {
    #[serde(deserialize_with = "deserialize_nullable_values")]
    entries: IndexMap<String, f64>,
}

impl CategoryBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        self.entries.insert(label.into(), value);
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn total(&self) -> f64 {
        self.entries.values().fold(0.0, |acc, v| acc + v)
    }
}

impl<L: Into<String>> FromIterator<(L, f64)> for CategoryBreakdown {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(l, v)| (l.into(), v)).collect(),
        }
    }
}

/// Categories without an estimate arrive as `null`; they count as 0 kWh.
fn deserialize_nullable_values<'de, D>(deserializer: D) -> Result<IndexMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Option<f64>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(label, value)| (label, value.unwrap_or(0.0)))
        .collect())
}

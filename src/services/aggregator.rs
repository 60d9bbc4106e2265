//! Pure statistics over already-fetched readings. No I/O, no clock.

use crate::models::{CategoryBreakdown, DailyReading, DailyStats, PeriodDelta};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Total kWh; `0.0` (not `-0.0`) for no readings.
pub fn sum(readings: &[DailyReading]) -> f64 {
    readings.iter().fold(0.0, |acc, r| acc + r.consumption)
}

pub fn mean(readings: &[DailyReading]) -> f64 {
    if readings.is_empty() {
        return 0.0;
    }
    sum(readings) / readings.len() as f64
}

/// Smallest day; the first one wins on ties.
pub fn min_day(readings: &[DailyReading]) -> Option<DailyReading> {
    extreme_day(readings, Ordering::Less)
}

/// Largest day; the first one wins on ties.
pub fn max_day(readings: &[DailyReading]) -> Option<DailyReading> {
    extreme_day(readings, Ordering::Greater)
}

fn extreme_day(readings: &[DailyReading], wanted: Ordering) -> Option<DailyReading> {
    let mut iter = readings.iter();
    let mut best = *iter.next()?;
    for reading in iter {
        if reading.consumption.total_cmp(&best.consumption) == wanted {
            best = *reading;
        }
    }
    Some(best)
}

pub fn daily_stats(readings: &[DailyReading]) -> DailyStats {
    DailyStats {
        sum_kwh: sum(readings),
        mean_kwh: mean(readings),
        min_day: min_day(readings),
        max_day: max_day(readings),
    }
}

/// Union of all labels, ordered by summed value (largest first, then by
/// label), optionally cut to the `top_n` largest.
pub fn unify_categories(breakdowns: &[CategoryBreakdown], top_n: Option<usize>) -> Vec<String> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for breakdown in breakdowns {
        for (label, value) in breakdown.iter() {
            *totals.entry(label).or_insert(0.0) += value;
        }
    }

    let mut ranked: Vec<(&str, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    if let Some(n) = top_n {
        ranked.truncate(n);
    }

    ranked.into_iter().map(|(label, _)| label.to_string()).collect()
}

/// New breakdown with exactly `categories`, in that order, zero where absent.
///
/// `categories` must hold unique labels, as [`unify_categories`] returns them;
/// a repeated label is kept once.
pub fn fill_missing(breakdown: &CategoryBreakdown, categories: &[String]) -> CategoryBreakdown {
    categories
        .iter()
        .map(|label| (label.clone(), breakdown.get(label).unwrap_or(0.0)))
        .collect()
}

/// Merge several reading sequences into one per-date total, sorted by date.
pub fn daily_totals<'a, I>(series: I) -> Vec<DailyReading>
where
    I: IntoIterator<Item = &'a [DailyReading]>,
{
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for readings in series {
        for reading in readings {
            *by_date.entry(reading.date).or_insert(0.0) += reading.consumption;
        }
    }

    by_date
        .into_iter()
        .map(|(date, consumption)| DailyReading::new(date, consumption))
        .collect()
}

pub fn period_delta(current_kwh: f64, previous_kwh: f64) -> PeriodDelta {
    let absolute_kwh = current_kwh - previous_kwh;
    let percent = (previous_kwh != 0.0).then(|| absolute_kwh / previous_kwh * 100.0);

    PeriodDelta {
        current_kwh,
        previous_kwh,
        absolute_kwh,
        percent,
    }
}

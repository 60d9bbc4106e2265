use super::aggregator::{
    daily_stats, daily_totals, fill_missing, period_delta, sum, unify_categories,
};
use crate::api::ConsumptionSource;
use crate::config::SensorConfig;
use crate::error::Result;
use crate::models::{
    CategoryBreakdown, CenterRanking, DailyReading, DashboardSnapshot, ReportPeriod,
    SensorFailure, SensorSummary, TotalSummary,
};
use tracing::{debug, info, warn};

/// Per-sensor data before categories are unified across sensors.
struct FetchedSensor {
    sensor: SensorConfig,
    readings: Vec<DailyReading>,
    previous_sum_kwh: f64,
    year_ago_sum_kwh: f64,
    live_power_w: Option<f64>,
    breakdown: Option<CategoryBreakdown>,
}

/// The windows a report period is compared against.
#[derive(Clone, Copy)]
struct Comparisons {
    previous: Option<ReportPeriod>,
    year_ago: Option<ReportPeriod>,
}

/// Builds dashboard snapshots for a fixed set of customer centers.
pub struct DashboardService<S> {
    source: S,
    sensors: Vec<SensorConfig>,
    top_categories: Option<usize>,
}

impl<S: ConsumptionSource> DashboardService<S> {
    pub fn new(source: S, sensors: Vec<SensorConfig>, top_categories: Option<usize>) -> Self {
        Self {
            source,
            sensors,
            top_categories,
        }
    }

    /// Fetch every sensor for `period` and its comparison windows, then aggregate.
    ///
    /// A sensor whose consumption cannot be fetched is reported in `failures`
    /// and left out of every total. Live power and the category breakdown are
    /// optional; when only those fail the sensor stays in the snapshot.
    pub fn build_snapshot(&self, period: ReportPeriod) -> DashboardSnapshot {
        let comparisons = Comparisons {
            previous: period.previous(),
            year_ago: period.year_ago(),
        };
        let mut fetched = Vec::with_capacity(self.sensors.len());
        let mut failures = Vec::new();

        for sensor in &self.sensors {
            match self.fetch_sensor(sensor, period, comparisons) {
                Ok(data) => fetched.push(data),
                Err(e) => {
                    warn!(sensor_id = %sensor.id, name = %sensor.name, error = %e, "Skipping sensor");
                    failures.push(SensorFailure {
                        sensor_id: sensor.id.clone(),
                        name: sensor.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let breakdowns: Vec<CategoryBreakdown> =
            fetched.iter().filter_map(|f| f.breakdown.clone()).collect();
        let categories = unify_categories(&breakdowns, self.top_categories);

        let sensors: Vec<SensorSummary> = fetched
            .into_iter()
            .map(|f| SensorSummary {
                stats: daily_stats(&f.readings),
                categories: f.breakdown.as_ref().map(|b| fill_missing(b, &categories)),
                sensor_id: f.sensor.id,
                name: f.sensor.name,
                readings: f.readings,
                previous_sum_kwh: f.previous_sum_kwh,
                year_ago_sum_kwh: f.year_ago_sum_kwh,
                live_power_w: f.live_power_w,
            })
            .collect();

        let total = total_summary(&sensors);
        let (highest, lowest, ranking) = rank_centers(&sensors);

        info!(
            period = %period.label(),
            sensors = sensors.len(),
            failures = failures.len(),
            total_kwh = total.stats.sum_kwh,
            "Dashboard snapshot built"
        );

        DashboardSnapshot {
            period,
            period_label: period.label(),
            previous_period: comparisons.previous,
            year_ago_period: comparisons.year_ago,
            sensors,
            total,
            highest,
            lowest,
            ranking,
            categories,
            failures,
        }
    }

    fn fetch_sensor(
        &self,
        sensor: &SensorConfig,
        period: ReportPeriod,
        comparisons: Comparisons,
    ) -> Result<FetchedSensor> {
        let mut readings = self
            .source
            .usage_per_day(&sensor.id, period.start, period.end)?;
        readings.sort_by_key(|r| r.date);

        let previous_sum_kwh = self.window_sum(&sensor.id, comparisons.previous)?;
        let year_ago_sum_kwh = self.window_sum(&sensor.id, comparisons.year_ago)?;

        let live_power_w = optional(sensor, "live power", self.source.live_power(&sensor.id))
            .map(|live| live.actual_raw_w);
        let breakdown = optional(
            sensor,
            "disaggregation",
            self.source.disaggregation(&sensor.id, period.end),
        );

        debug!(
            sensor_id = %sensor.id,
            days = readings.len(),
            categories = breakdown.as_ref().map_or(0, CategoryBreakdown::len),
            "Sensor fetched"
        );

        Ok(FetchedSensor {
            sensor: sensor.clone(),
            readings,
            previous_sum_kwh,
            year_ago_sum_kwh,
            live_power_w,
            breakdown,
        })
    }

    /// Consumption summed over a comparison window; 0 when there is none.
    fn window_sum(&self, sensor_id: &str, window: Option<ReportPeriod>) -> Result<f64> {
        match window {
            Some(w) => Ok(sum(&self.source.usage_per_day(sensor_id, w.start, w.end)?)),
            None => Ok(0.0),
        }
    }
}

fn optional<T>(sensor: &SensorConfig, what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(sensor_id = %sensor.id, name = %sensor.name, error = %e, "No {} for sensor", what);
            None
        }
    }
}

fn total_summary(sensors: &[SensorSummary]) -> TotalSummary {
    let readings = daily_totals(sensors.iter().map(|s| s.readings.as_slice()));
    let stats = daily_stats(&readings);
    let previous_kwh = sensors.iter().fold(0.0, |acc, s| acc + s.previous_sum_kwh);
    let year_ago_kwh = sensors.iter().fold(0.0, |acc, s| acc + s.year_ago_sum_kwh);

    TotalSummary {
        delta: period_delta(stats.sum_kwh, previous_kwh),
        year_ago_delta: period_delta(stats.sum_kwh, year_ago_kwh),
        live_power_w: sensors
            .iter()
            .filter_map(|s| s.live_power_w)
            .fold(0.0, |acc, w| acc + w),
        readings,
        stats,
    }
}

/// Highest and lowest center by period sum (first listed wins ties) and
/// the full ranking, largest first.
fn rank_centers(
    sensors: &[SensorSummary],
) -> (Option<CenterRanking>, Option<CenterRanking>, Vec<CenterRanking>) {
    let mut ranking: Vec<CenterRanking> = sensors
        .iter()
        .map(|s| CenterRanking {
            sensor_id: s.sensor_id.clone(),
            name: s.name.clone(),
            sum_kwh: s.stats.sum_kwh,
        })
        .collect();

    let mut highest: Option<&CenterRanking> = None;
    let mut lowest: Option<&CenterRanking> = None;
    for center in &ranking {
        if highest.map_or(true, |h| center.sum_kwh > h.sum_kwh) {
            highest = Some(center);
        }
        if lowest.map_or(true, |l| center.sum_kwh < l.sum_kwh) {
            lowest = Some(center);
        }
    }
    let highest = highest.cloned();
    let lowest = lowest.cloned();

    ranking.sort_by(|a, b| b.sum_kwh.total_cmp(&a.sum_kwh));
    (highest, lowest, ranking)
}

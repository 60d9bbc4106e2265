use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar days a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    /// The `days` days ending on `end`. A length of 0 is treated as 1.
    ///
    /// `None` when the start would fall outside chrono's date range.
    pub fn last_days(end: NaiveDate, days: u32) -> Option<Self> {
        let span = Duration::try_days(i64::from(days.max(1)) - 1)?;
        let start = end.checked_sub_signed(span)?;
        Some(Self { start, end })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Period of equal length immediately before this one.
    pub fn previous(&self) -> Option<Self> {
        let end = self.start.pred_opt()?;
        let start = end.checked_sub_signed(Duration::try_days(self.days() - 1)?)?;
        Some(Self { start, end })
    }

    /// Same ISO week and weekday one year earlier, with the same length.
    /// A week 53 falls back to 52 weeks earlier when the prior year has none.
    pub fn year_ago(&self) -> Option<Self> {
        let week = self.start.iso_week();
        let start = NaiveDate::from_isoywd_opt(week.year() - 1, week.week(), self.start.weekday())
            .or_else(|| self.start.checked_sub_signed(Duration::weeks(52)))?;
        let end = start.checked_add_signed(Duration::try_days(self.days() - 1)?)?;
        Some(Self { start, end })
    }

    /// ISO calendar week of the first day.
    pub fn iso_week(&self) -> u32 {
        self.start.iso_week().week()
    }

    /// Header label, e.g. `(KW12) 18.03.2024 - 24.03.2024`.
    pub fn label(&self) -> String {
        format!(
            "(KW{}) {} - {}",
            self.iso_week(),
            self.start.format("%d.%m.%Y"),
            self.end.format("%d.%m.%Y")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week(end: NaiveDate) -> ReportPeriod {
        ReportPeriod::last_days(end, 7).unwrap()
    }

    #[test]
    fn test_last_days_is_inclusive() {
        let period = week(date(2024, 3, 24));

        assert_eq!(period.start, date(2024, 3, 18));
        assert_eq!(period.end, date(2024, 3, 24));
        assert_eq!(period.days(), 7);
    }

    #[test]
    fn test_zero_days_means_single_day() {
        let period = ReportPeriod::last_days(date(2024, 3, 24), 0).unwrap();
        assert_eq!(period.start, period.end);
        assert_eq!(period.days(), 1);
    }

    #[test]
    fn test_last_days_out_of_range_is_none() {
        assert_eq!(ReportPeriod::last_days(date(2024, 3, 24), u32::MAX), None);
        assert_eq!(ReportPeriod::last_days(NaiveDate::MIN, 2), None);
    }

    #[test]
    fn test_previous_period_abuts() {
        let previous = week(date(2024, 3, 24)).previous().unwrap();

        assert_eq!(previous.start, date(2024, 3, 11));
        assert_eq!(previous.end, date(2024, 3, 17));
        assert_eq!(previous.days(), 7);
    }

    #[test]
    fn test_previous_of_earliest_date_is_none() {
        let first = ReportPeriod::last_days(NaiveDate::MIN, 1).unwrap();
        assert_eq!(first.previous(), None);
    }

    #[test]
    fn test_year_ago_keeps_iso_week() {
        let period = week(date(2024, 3, 24));
        let year_ago = period.year_ago().unwrap();

        assert_eq!(year_ago.start, date(2023, 3, 20));
        assert_eq!(year_ago.end, date(2023, 3, 26));
        assert_eq!(year_ago.iso_week(), period.iso_week());
        assert_eq!(year_ago.label(), "(KW12) 20.03.2023 - 26.03.2023");
    }

    #[test]
    fn test_year_ago_without_week_53() {
        // 2020 has an ISO week 53, 2019 does not
        let period = week(date(2021, 1, 3));
        assert_eq!(period.iso_week(), 53);

        let year_ago = period.year_ago().unwrap();

        assert_eq!(year_ago.start, date(2019, 12, 30));
        assert_eq!(year_ago.days(), 7);
    }

    #[test]
    fn test_label_uses_iso_week() {
        assert_eq!(
            week(date(2024, 3, 24)).label(),
            "(KW12) 18.03.2024 - 24.03.2024"
        );
    }
}

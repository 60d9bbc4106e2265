pub mod consumption;
pub mod dashboard;
pub mod period;

pub use consumption::{CategoryBreakdown, DailyReading, LivePower};
pub use dashboard::{
    CenterRanking, DailyStats, DashboardSnapshot, PeriodDelta, SensorFailure, SensorSummary,
    TotalSummary,
};
pub use period::ReportPeriod;

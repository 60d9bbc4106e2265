pub mod aggregator;
pub mod dashboard;

pub use dashboard::DashboardService;

pub mod integration_report;
pub mod review_report;
pub mod user;
pub mod week;

pub mod annual_report;
pub mod businesses;
pub mod reset;

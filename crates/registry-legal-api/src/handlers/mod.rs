pub mod businesses;
pub mod filings;
pub mod internal;

//! SQLite backends for the business registry.
//!
//! [`ColinDb`] hosts the legacy COLIN tables and [`LegalDb`] the legal API's
//! own tables. Both wrap [`tokio_rusqlite`] so all database access runs on a
//! dedicated thread without blocking the async runtime.

mod colin;
mod encode;
mod legal;
mod schema;

pub mod error;

pub use colin::ColinDb;
pub use error::{Error, Result};
pub use legal::LegalDb;

#[cfg(test)]
mod tests;

//! Core types and trait definitions for the business registry services.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backends, the two HTTP services, and the emailer all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod business;
pub mod colin;
pub mod error;
pub mod filing;
pub mod reset;
pub mod store;
pub mod validation;

pub use error::{Error, Result};

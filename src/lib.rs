//! Backend-independent plan steering for Postgres.
//!
//! An external optimizer describes the execution strategy it wants (join
//! order, physical operators, auxiliary plan parameters) in an abstract form.
//! This crate translates that strategy into *pg_hint_plan* hint blocks plus
//! session settings that force Postgres to honor it, and parses Postgres'
//! native `EXPLAIN` reports back into the abstract plan model.

#![warn(missing_docs)]

pub mod error;
pub mod explain;
pub mod hinting;
pub mod model;
pub mod session;

pub use error::{PlanError, Result};

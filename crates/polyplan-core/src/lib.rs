#![forbid(unsafe_code)]
//! polyplan-core: the vocabulary shared by the plan graph and the operator kinds.
//!
//! - strongly-typed handles (`id`)
//! - the single error type (`error`)
//! - logical schemas and data-set type descriptors (`schema`, `types`)
//! - the cardinality-estimation hook carried by operators (`cardinality`)
//! - planner configuration (`config`) and stable hashing (`hash`)
//!
//! Nothing here knows how operators are wired together; that lives in `polyplan-plan`.

pub mod cardinality;
pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod schema;
pub mod types;

pub use error::{Error, Result};

/// Crate version, recorded in plan snapshots.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

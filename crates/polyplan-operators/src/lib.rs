#![forbid(unsafe_code)]
//! polyplan-operators: concrete elementary operator kinds.
//!
//! These only declare ports and cardinality estimators; they never process
//! data. Every kind implements `polyplan_plan::ElementaryOperator`.

pub mod aggregate;
pub mod coalesce;
pub mod estimate;
pub mod filter;
pub mod join;
pub mod map;
pub mod sink;
pub mod sort;
pub mod source;

pub use aggregate::{CountOperator, ReduceByOperator};
pub use coalesce::CoalesceOperator;
pub use filter::FilterOperator;
pub use join::{JoinOperator, JoinType};
pub use map::MapOperator;
pub use sink::CallbackSink;
pub use sort::SortOperator;
pub use source::{CollectionSource, TextFileSource};

use polyplan_core::error::{Error, Result};

/// Reject an output index an operator does not have.
pub(crate) fn check_output(operator: &str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange {
            operator: operator.to_string(),
            kind: "output",
            index,
            len,
        });
    }
    Ok(())
}

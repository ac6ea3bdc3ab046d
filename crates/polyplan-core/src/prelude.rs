//! Convenient re-exports for downstream crates.

pub use crate::cardinality::{
    CardinalityEstimate, CardinalityEstimator, DefaultCardinalityEstimator,
    FixedCardinalityEstimator,
};
pub use crate::config::PlannerConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::id::{AlternativeId, Epoch, InputSlotId, OperatorId, OutputSlotId, FIRST_EPOCH};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{DataSetType, DataUnitType};

#![forbid(unsafe_code)]
//! polyplan: a cross-platform data-processing plan representation.
//!
//! Re-exports the workspace crates under one roof:
//! - `polyplan_core`: handles, errors, data-set types, cardinality hooks, config
//! - `polyplan_plan`: the operator/slot graph with sub-plans and alternatives
//! - `polyplan_operators`: concrete elementary operator kinds

pub use polyplan_core;
pub use polyplan_operators;
pub use polyplan_plan;

pub use polyplan_core::{Error, Result};
pub use polyplan_plan::PlanGraph;

pub mod prelude {
    pub use polyplan_core::prelude::*;
    pub use polyplan_operators::{
        CallbackSink, CoalesceOperator, CollectionSource, CountOperator, FilterOperator,
        JoinOperator, JoinType, MapOperator, ReduceByOperator, SortOperator, TextFileSource,
    };
    pub use polyplan_plan::{
        Alternative, Container, ContainerRef, ElementaryOperator, OperatorKind, OperatorNode,
        PlanGraph, PlanSnapshot, SlotMapping, SlotSpec, TopDownVisitor,
    };
    pub use polyplan_plan::verify::{assert_consistent, verify_plan};
}

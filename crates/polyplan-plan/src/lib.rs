#![forbid(unsafe_code)]
//! polyplan-plan: the plan representation itself.
//!
//! A plan is a mutable, typed, nestable graph:
//! - operators own ordered input/output `slot`s; outputs fan out, inputs take one occupant
//! - composite operators (`subplan`, `alternative`) hide an inner sub-graph behind a
//!   fixed port interface, bridged by a `mapping::SlotMapping`
//! - `traversal` resolves slots across any number of composite boundaries
//!
//! Everything lives in one arena, `graph::PlanGraph`; operators and slots are
//! addressed by the handles from `polyplan_core::id`. Mutation is single-threaded.

pub mod alternative;
pub mod container;
pub mod graph;
pub mod mapping;
pub mod operator;
pub mod slot;
pub mod snapshot;
pub mod subplan;
pub mod traversal;
pub mod verify;
pub mod visitor;

pub use alternative::{Alternative, OperatorAlternative};
pub use container::{Container, ContainerRef};
pub use graph::PlanGraph;
pub use mapping::SlotMapping;
pub use operator::{ElementaryOperator, OperatorKind, OperatorNode};
pub use slot::{InputSlot, OutputSlot, SlotSpec};
pub use snapshot::PlanSnapshot;
pub use subplan::Subplan;
pub use visitor::TopDownVisitor;

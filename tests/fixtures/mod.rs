//! Shared plan builders for the integration tests.

#![allow(dead_code)]

use polyplan::prelude::*;

pub fn int64() -> DataSetType {
    DataSetType::basic(DataType::Int64)
}

pub fn source(g: &mut PlanGraph) -> OperatorId {
    g.add_operator(CollectionSource::new(int64())).unwrap()
}

pub fn map(g: &mut PlanGraph) -> OperatorId {
    g.add_operator(MapOperator::same_type(int64())).unwrap()
}

pub fn sink(g: &mut PlanGraph) -> OperatorId {
    g.add_operator(CallbackSink::new(int64())).unwrap()
}

/// `source -> map -> sink`, all connected at index 0.
pub fn chain(g: &mut PlanGraph) -> (OperatorId, OperatorId, OperatorId) {
    let a = source(g);
    let b = map(g);
    let c = sink(g);
    g.connect_operators(a, 0, b, 0).expect("connect source to map");
    g.connect_operators(b, 0, c, 0).expect("connect map to sink");
    (a, b, c)
}

pub fn verifying_graph() -> PlanGraph {
    PlanGraph::with_config(PlannerConfig {
        verify_rewrites: true,
        ..PlannerConfig::default()
    })
    .expect("valid config")
}

//! Equi-join of two inputs into one output.

use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimator, DefaultCardinalityEstimator};
use polyplan_core::error::Result;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;
use crate::estimate::{join_cardinality, HEURISTIC_CERTAINTY};

pub use crate::estimate::JoinType;

#[derive(Debug, Clone)]
pub struct JoinOperator {
    left: DataSetType,
    right: DataSetType,
    output: DataSetType,
    join_type: JoinType,
    /// `(left key, right key)` pairs.
    on: Vec<(String, String)>,
}

impl JoinOperator {
    pub fn new(left: DataSetType, right: DataSetType, output: DataSetType, join_type: JoinType) -> Self {
        Self {
            left,
            right,
            output,
            join_type,
            on: Vec::new(),
        }
    }

    pub fn on(mut self, left_key: impl Into<String>, right_key: impl Into<String>) -> Self {
        self.on.push((left_key.into(), right_key.into()));
        self
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn keys(&self) -> &[(String, String)] {
        &self.on
    }
}

impl ElementaryOperator for JoinOperator {
    fn name(&self) -> &str {
        "join"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::new("left", self.left.clone()),
            SlotSpec::new("right", self.right.clone()),
        ]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("output", self.output.clone())]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        let join_type = self.join_type;
        Ok(Some(Arc::new(DefaultCardinalityEstimator::new(
            HEURISTIC_CERTAINTY,
            2,
            move |c| join_cardinality(c[0], c[1], join_type),
        ))))
    }
}

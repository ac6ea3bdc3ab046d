//! Element-wise transformation; one output element per input element.

use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimator, DefaultCardinalityEstimator};
use polyplan_core::error::Result;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;

#[derive(Debug, Clone)]
pub struct MapOperator {
    input_type: DataSetType,
    output_type: DataSetType,
}

impl MapOperator {
    pub fn new(input_type: DataSetType, output_type: DataSetType) -> Self {
        Self {
            input_type,
            output_type,
        }
    }

    /// A map that keeps the element type.
    pub fn same_type(data_type: DataSetType) -> Self {
        Self::new(data_type.clone(), data_type)
    }
}

impl ElementaryOperator for MapOperator {
    fn name(&self) -> &str {
        "map"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("input", self.input_type.clone())]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("output", self.output_type.clone())]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        Ok(Some(Arc::new(DefaultCardinalityEstimator::new(1.0, 1, |c| c[0]))))
    }
}

//! Union of two inputs of the same type.

use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimator, DefaultCardinalityEstimator};
use polyplan_core::error::Result;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;

#[derive(Debug, Clone)]
pub struct CoalesceOperator {
    data_type: DataSetType,
}

impl CoalesceOperator {
    pub fn new(data_type: DataSetType) -> Self {
        Self { data_type }
    }
}

impl ElementaryOperator for CoalesceOperator {
    fn name(&self) -> &str {
        "coalesce"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::new("input0", self.data_type.clone()),
            SlotSpec::new("input1", self.data_type.clone()),
        ]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("output", self.data_type.clone())]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        Ok(Some(Arc::new(DefaultCardinalityEstimator::new(1.0, 2, |c| {
            c[0].saturating_add(c[1])
        }))))
    }
}

use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimator, DefaultCardinalityEstimator};
use polyplan_core::error::Result;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;

/// Orders its input by `keys`; the cardinality is unchanged.
#[derive(Debug, Clone)]
pub struct SortOperator {
    data_type: DataSetType,
    keys: Vec<String>,
}

impl SortOperator {
    pub fn new(data_type: DataSetType, keys: Vec<String>) -> Self {
        Self { data_type, keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl ElementaryOperator for SortOperator {
    fn name(&self) -> &str {
        "sort"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("input", self.data_type.clone())]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("output", self.data_type.clone())]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        Ok(Some(Arc::new(DefaultCardinalityEstimator::new(1.0, 1, |c| c[0]))))
    }
}

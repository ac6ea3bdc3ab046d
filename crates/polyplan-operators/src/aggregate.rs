//! Grouping operators.

use std::sync::Arc;

use polyplan_core::cardinality::{
    CardinalityEstimate, CardinalityEstimator, DefaultCardinalityEstimator, FixedCardinalityEstimator,
};
use polyplan_core::error::Result;
use polyplan_core::schema::DataType;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;
use crate::estimate::{group_count, HEURISTIC_CERTAINTY};

/// Groups by `keys` and reduces each group to one element.
#[derive(Debug, Clone)]
pub struct ReduceByOperator {
    data_type: DataSetType,
    keys: Vec<String>,
}

impl ReduceByOperator {
    pub fn new(data_type: DataSetType, keys: Vec<String>) -> Self {
        Self { data_type, keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl ElementaryOperator for ReduceByOperator {
    fn name(&self) -> &str {
        "reduce_by"
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
        let num_keys = self.keys.len();
        Ok(Some(Arc::new(DefaultCardinalityEstimator::new(
            HEURISTIC_CERTAINTY,
            1,
            move |c| group_count(c[0], num_keys),
        ))))
    }
}

/// Counts its input; always emits a single `Int64`.
#[derive(Debug, Clone)]
pub struct CountOperator {
    data_type: DataSetType,
}

impl CountOperator {
    pub fn new(data_type: DataSetType) -> Self {
        Self { data_type }
    }
}

impl ElementaryOperator for CountOperator {
    fn name(&self) -> &str {
        "count"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("input", self.data_type.clone())]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("output", DataSetType::basic(DataType::Int64))]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        Ok(Some(Arc::new(FixedCardinalityEstimator::new(
            1,
            CardinalityEstimate::exact(1),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_exactly_one() {
        let op = CountOperator::new(DataSetType::basic(DataType::Utf8));
        let est = op.cardinality_estimator(0).unwrap().unwrap();
        let out = est.estimate(&[CardinalityEstimate::new(5, 5000, 0.3)]).unwrap();
        assert_eq!(out, CardinalityEstimate::exact(1));
    }

    #[test]
    fn reduce_by_one_key_keeps_a_tenth() {
        let op = ReduceByOperator::new(DataSetType::basic(DataType::Utf8), vec!["k".into()]);
        let est = op.cardinality_estimator(0).unwrap().unwrap();
        let out = est.estimate(&[CardinalityEstimate::exact(1000)]).unwrap();
        assert_eq!((out.lower(), out.upper()), (100, 100));
    }
}

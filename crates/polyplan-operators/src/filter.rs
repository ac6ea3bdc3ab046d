//! Keeps the elements satisfying a predicate.
//!
//! The predicate is opaque text here; only its shape feeds the selectivity guess.

use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimator, DefaultCardinalityEstimator};
use polyplan_core::error::Result;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;
use crate::estimate::{filter_selectivity, filtered, HEURISTIC_CERTAINTY};

#[derive(Debug, Clone)]
pub struct FilterOperator {
    data_type: DataSetType,
    predicate: String,
}

impl FilterOperator {
    pub fn new(data_type: DataSetType, predicate: impl Into<String>) -> Self {
        Self {
            data_type,
            predicate: predicate.into(),
        }
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }
}

impl ElementaryOperator for FilterOperator {
    fn name(&self) -> &str {
        "filter"
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
        let selectivity = filter_selectivity(&self.predicate);
        Ok(Some(Arc::new(DefaultCardinalityEstimator::new(
            HEURISTIC_CERTAINTY,
            1,
            move |c| filtered(c[0], selectivity),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use polyplan_core::cardinality::CardinalityEstimate;
    use polyplan_core::schema::DataType;

    use super::*;

    #[test]
    fn equality_predicate_keeps_a_tenth() {
        let op = FilterOperator::new(DataSetType::basic(DataType::Int64), "x = 3");
        let est = op.cardinality_estimator(0).unwrap().unwrap();
        let out = est
            .estimate(&[CardinalityEstimate::new(100, 200, 1.0)])
            .unwrap();
        assert_eq!((out.lower(), out.upper()), (10, 20));
        assert!((out.correctness_prob() - 0.5).abs() < 1e-9);
    }
}

//! Operators without inputs.

use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimate, CardinalityEstimator, FixedCardinalityEstimator};
use polyplan_core::error::Result;
use polyplan_core::schema::DataType;
use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

use crate::check_output;

/// Emits an in-memory collection. If its size is known the output
/// cardinality is exact.
#[derive(Debug, Clone)]
pub struct CollectionSource {
    data_type: DataSetType,
    size: Option<u64>,
}

impl CollectionSource {
    pub fn new(data_type: DataSetType) -> Self {
        Self {
            data_type,
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }
}

impl ElementaryOperator for CollectionSource {
    fn name(&self) -> &str {
        "collection_source"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("output", self.data_type.clone())]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        Ok(self.size.map(|n| {
            Arc::new(FixedCardinalityEstimator::new(0, CardinalityEstimate::exact(n)))
                as Arc<dyn CardinalityEstimator>
        }))
    }
}

/// Reads lines of a text file.
#[derive(Debug, Clone)]
pub struct TextFileSource {
    path: String,
}

impl TextFileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ElementaryOperator for TextFileSource {
    fn name(&self) -> &str {
        "text_file_source"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("lines", DataSetType::basic(DataType::Utf8))]
    }

    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        check_output(self.name(), output_index, 1)?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_size_gives_exact_estimate() {
        let src = CollectionSource::new(DataSetType::basic(DataType::Int64)).with_size(42);
        let est = src.cardinality_estimator(0).unwrap().unwrap();
        assert_eq!(est.num_inputs(), 0);
        assert_eq!(est.estimate(&[]).unwrap(), CardinalityEstimate::exact(42));
    }

    #[test]
    fn unknown_size_has_no_estimator() {
        let src = CollectionSource::new(DataSetType::basic(DataType::Int64));
        assert!(src.cardinality_estimator(0).unwrap().is_none());
        assert!(src.cardinality_estimator(1).is_err());
    }
}

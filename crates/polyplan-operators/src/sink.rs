use polyplan_core::types::DataSetType;
use polyplan_plan::{ElementaryOperator, SlotSpec};

/// Hands every element to a caller-side callback, identified by `label`.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    data_type: DataSetType,
    label: String,
}

impl CallbackSink {
    pub fn new(data_type: DataSetType) -> Self {
        Self {
            data_type,
            label: "callback".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl ElementaryOperator for CallbackSink {
    fn name(&self) -> &str {
        "callback_sink"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("input", self.data_type.clone())]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        Vec::new()
    }
}

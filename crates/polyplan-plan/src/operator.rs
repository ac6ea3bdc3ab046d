//! Operator nodes and the capability elementary operators implement.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use polyplan_core::cardinality::CardinalityEstimator;
use polyplan_core::error::Result;
use polyplan_core::id::{Epoch, InputSlotId, OperatorId, OutputSlotId, FIRST_EPOCH};

use crate::alternative::OperatorAlternative;
use crate::container::ContainerRef;
use crate::slot::SlotSpec;
use crate::subplan::Subplan;

/// Trait that all concrete (non-composite) operator kinds implement.
///
/// The graph only needs the port declarations and, optionally, one cardinality
/// estimator per output. What the operator computes is opaque here.
pub trait ElementaryOperator: fmt::Debug + Send + Sync {
    /// Human-readable operator name (stable).
    fn name(&self) -> &str;

    fn inputs(&self) -> Vec<SlotSpec>;

    fn outputs(&self) -> Vec<SlotSpec>;

    /// Estimator for the output at `output_index`. Implementations reject
    /// indices outside their outputs with `Error::IndexOutOfRange`.
    fn cardinality_estimator(
        &self,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        let _ = output_index;
        Ok(None)
    }
}

/// Closed set of operator variants.
#[derive(Debug)]
pub enum OperatorKind {
    Elementary(Box<dyn ElementaryOperator>),
    Subplan(Subplan),
    Alternative(OperatorAlternative),
}

impl OperatorKind {
    pub fn label(&self) -> &str {
        match self {
            OperatorKind::Elementary(op) => op.name(),
            OperatorKind::Subplan(_) => "subplan",
            OperatorKind::Alternative(_) => "alternative",
        }
    }
}

/// One node of the arena.
#[derive(Debug)]
pub struct OperatorNode {
    pub(crate) id: OperatorId,
    pub(crate) kind: OperatorKind,
    pub(crate) num_inputs: usize,
    pub(crate) num_outputs: usize,
    pub(crate) inputs: Vec<InputSlotId>,
    pub(crate) outputs: Vec<OutputSlotId>,
    pub(crate) container: Option<ContainerRef>,
    pub(crate) epoch: Epoch,
    pub(crate) estimators: BTreeMap<usize, Arc<dyn CardinalityEstimator>>,
}

impl OperatorNode {
    pub(crate) fn new(
        id: OperatorId,
        kind: OperatorKind,
        num_inputs: usize,
        num_outputs: usize,
        container: Option<ContainerRef>,
        epoch: Epoch,
    ) -> Self {
        Self {
            id,
            kind,
            num_inputs,
            num_outputs,
            inputs: Vec::with_capacity(num_inputs),
            outputs: Vec::with_capacity(num_outputs),
            container,
            epoch,
            estimators: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> OperatorId {
        self.id
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.label()
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    pub fn inputs(&self) -> &[InputSlotId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputSlotId] {
        &self.outputs
    }

    /// The container this operator is nested in, or `None` for top-level operators.
    pub fn container(&self) -> Option<ContainerRef> {
        self.container
    }

    /// The composite operator enclosing this one.
    pub fn parent(&self) -> Option<OperatorId> {
        self.container.map(ContainerRef::to_operator)
    }

    /// Composites always report `FIRST_EPOCH`.
    pub fn epoch(&self) -> Epoch {
        if self.is_elementary() {
            self.epoch
        } else {
            FIRST_EPOCH
        }
    }

    pub fn is_source(&self) -> bool {
        self.num_inputs == 0
    }

    pub fn is_sink(&self) -> bool {
        self.num_outputs == 0
    }

    pub fn is_elementary(&self) -> bool {
        matches!(self.kind, OperatorKind::Elementary(_))
    }

    pub fn is_composite(&self) -> bool {
        !self.is_elementary()
    }

    pub fn is_subplan(&self) -> bool {
        matches!(self.kind, OperatorKind::Subplan(_))
    }

    pub fn is_alternative(&self) -> bool {
        matches!(self.kind, OperatorKind::Alternative(_))
    }

    pub fn as_elementary(&self) -> Option<&dyn ElementaryOperator> {
        match &self.kind {
            OperatorKind::Elementary(op) => Some(op.as_ref()),
            _ => None,
        }
    }

    pub fn as_subplan(&self) -> Option<&Subplan> {
        match &self.kind {
            OperatorKind::Subplan(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_alternative(&self) -> Option<&OperatorAlternative> {
        match &self.kind {
            OperatorKind::Alternative(a) => Some(a),
            _ => None,
        }
    }

    /// Slots are materialized; false only transiently while a composite is built.
    pub(crate) fn slots_complete(&self) -> bool {
        self.inputs.len() == self.num_inputs && self.outputs.len() == self.num_outputs
    }
}

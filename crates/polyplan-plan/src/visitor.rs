//! Top-down visitation of operators, dispatched on the operator kind.
//!
//! The visitor decides itself whether and how to descend: from a composite it
//! can enter through `Container::trace_output` and call `accept` again on the
//! inner operator. `via` names the output through which the caller arrived,
//! `None` when visiting a sink or starting fresh.

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{OperatorId, OutputSlotId};

use crate::graph::PlanGraph;
use crate::operator::OperatorKind;

pub trait TopDownVisitor {
    type Payload;
    type Output;

    fn visit_elementary(
        &mut self,
        graph: &PlanGraph,
        op: OperatorId,
        via: Option<OutputSlotId>,
        payload: Self::Payload,
    ) -> Result<Self::Output>;

    fn visit_subplan(
        &mut self,
        graph: &PlanGraph,
        op: OperatorId,
        via: Option<OutputSlotId>,
        payload: Self::Payload,
    ) -> Result<Self::Output>;

    fn visit_alternative(
        &mut self,
        graph: &PlanGraph,
        op: OperatorId,
        via: Option<OutputSlotId>,
        payload: Self::Payload,
    ) -> Result<Self::Output>;
}

impl PlanGraph {
    /// Dispatch `op` to the matching `visitor` method.
    pub fn accept<V: TopDownVisitor>(
        &self,
        op: OperatorId,
        via: Option<OutputSlotId>,
        visitor: &mut V,
        payload: V::Payload,
    ) -> Result<V::Output> {
        if let Some(output) = via {
            if !self.is_owner_of_output(op, output)? {
                return Err(Error::Ownership(format!(
                    "cannot visit {} via {}",
                    self.label(op),
                    self.describe_output(output)
                )));
            }
        }
        match self.operator(op)?.kind() {
            OperatorKind::Elementary(_) => visitor.visit_elementary(self, op, via, payload),
            OperatorKind::Subplan(_) => visitor.visit_subplan(self, op, via, payload),
            OperatorKind::Alternative(_) => visitor.visit_alternative(self, op, via, payload),
        }
    }
}

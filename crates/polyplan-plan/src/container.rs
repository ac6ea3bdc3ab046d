//! Boundary resolution for composite operators.
//!
//! A container is "the inside of a boundary": either a whole `Subplan` or one
//! `Alternative` of an `OperatorAlternative`. The set of kinds is closed, so
//! `ContainerRef` is a plain enum and `Container` dispatches on it.
//!
//! Direction names follow data flow. `follow_*` moves downstream (outer input
//! into inner inputs, inner output out to outer outputs); `trace_*`/`exit_*`
//! move upstream. Any slot that does not belong where it is claimed to belong
//! is an error: caller mistakes are `Ownership`, a mapping that points outside
//! the container is `Invariant` (the graph is corrupted).

use serde::{Deserialize, Serialize};

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{AlternativeId, InputSlotId, OperatorId, OutputSlotId};

use crate::graph::PlanGraph;
use crate::mapping::SlotMapping;
use crate::operator::{OperatorKind, OperatorNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerRef {
    Subplan(OperatorId),
    Alternative {
        operator: OperatorId,
        alternative: AlternativeId,
    },
}

impl ContainerRef {
    /// The composite operator this container belongs to.
    pub fn to_operator(self) -> OperatorId {
        match self {
            ContainerRef::Subplan(op) => op,
            ContainerRef::Alternative { operator, .. } => operator,
        }
    }
}

/// Read-only view of one container within a graph.
#[derive(Clone, Copy)]
pub struct Container<'g> {
    graph: &'g PlanGraph,
    which: ContainerRef,
}

impl PlanGraph {
    pub fn container(&self, which: ContainerRef) -> Result<Container<'_>> {
        let container = Container { graph: self, which };
        // Resolve once so a dangling reference fails here, not deep in a traversal.
        container.slot_mapping()?;
        Ok(container)
    }
}

impl<'g> Container<'g> {
    pub fn which(&self) -> ContainerRef {
        self.which
    }

    pub fn to_operator(&self) -> OperatorId {
        self.which.to_operator()
    }

    fn composite(&self) -> Result<&'g OperatorNode> {
        self.graph.operator(self.to_operator())
    }

    pub fn slot_mapping(&self) -> Result<&'g SlotMapping> {
        let composite = self.composite()?;
        match (self.which, &composite.kind) {
            (ContainerRef::Subplan(_), OperatorKind::Subplan(subplan)) => {
                Ok(subplan.slot_mapping())
            }
            (ContainerRef::Alternative { alternative, .. }, OperatorKind::Alternative(alts)) => alts
                .alternative(alternative)
                .map(|a| a.slot_mapping())
                .ok_or_else(|| {
                    Error::Invariant(format!(
                        "{} has no {}",
                        self.graph.label(self.to_operator()),
                        alternative
                    ))
                }),
            _ => Err(Error::Invariant(format!(
                "{:?} does not match the kind of {}",
                self.which,
                self.graph.label(self.to_operator())
            ))),
        }
    }

    /// Operators directly inside this container.
    pub fn children(&self) -> Result<Vec<OperatorId>> {
        match (self.which, &self.composite()?.kind) {
            (ContainerRef::Subplan(_), OperatorKind::Subplan(subplan)) => {
                Ok(subplan.members().collect())
            }
            (ContainerRef::Alternative { alternative, .. }, OperatorKind::Alternative(alts)) => {
                Ok(alts.alternative(alternative).map(|a| a.operator()).into_iter().collect())
            }
            _ => Err(Error::Invariant(format!(
                "{:?} does not match the kind of {}",
                self.which,
                self.graph.label(self.to_operator())
            ))),
        }
    }

    /// Is `op` registered directly in this container?
    pub fn contains(&self, op: OperatorId) -> Result<bool> {
        Ok(self.graph.container_of(op)? == Some(self.which))
    }

    /// The operator standing for the whole container when it is a sink.
    pub fn sink(&self) -> Result<OperatorId> {
        if !self.composite()?.is_sink() {
            return Err(Error::Unsupported(format!(
                "cannot enter {}: no output slot given and it is not a sink",
                self.graph.label(self.to_operator())
            )));
        }
        self.boundary_member(|subplan| subplan.sink(), "sink")
    }

    /// The operator standing for the whole container when it is a source.
    pub fn source(&self) -> Result<OperatorId> {
        if !self.composite()?.is_source() {
            return Err(Error::Unsupported(format!(
                "cannot enter {}: no input slot given and it is not a source",
                self.graph.label(self.to_operator())
            )));
        }
        self.boundary_member(|subplan| subplan.source(), "source")
    }

    fn boundary_member(
        &self,
        pick: impl Fn(&crate::subplan::Subplan) -> Option<OperatorId>,
        what: &str,
    ) -> Result<OperatorId> {
        match (self.which, &self.composite()?.kind) {
            (ContainerRef::Subplan(_), OperatorKind::Subplan(subplan)) => {
                // Several candidate members leave the entry point ambiguous.
                pick(subplan).ok_or_else(|| {
                    Error::Unsupported(format!(
                        "cannot enter {}: it has no single {what} member",
                        self.graph.label(self.to_operator())
                    ))
                })
            }
            _ => self.children()?.into_iter().next().ok_or_else(|| {
                Error::Invariant(format!(
                    "{} wraps no operator",
                    self.graph.label(self.to_operator())
                ))
            }),
        }
    }

    /// Downstream from an unconnected inner output to the composite's outputs it feeds.
    pub fn follow_output(&self, inner: OutputSlotId) -> Result<Vec<OutputSlotId>> {
        let owner = self.graph.output_slot(inner)?.owner();
        if !self.contains(owner)? {
            return Err(Error::Ownership(format!(
                "{} does not belong to {}",
                self.graph.describe_output(inner),
                self.graph.describe_nesting(self.to_operator())
            )));
        }
        let resolved = self.slot_mapping()?.resolve_downstream_output(inner);
        for &outer in &resolved {
            self.check_outer_output(outer)?;
        }
        Ok(resolved)
    }

    /// Downstream from one of the composite's inputs to the inner inputs it feeds.
    pub fn follow_input(&self, outer: InputSlotId) -> Result<Vec<InputSlotId>> {
        if !self.graph.is_owner_of_input(self.to_operator(), outer)? {
            return Err(Error::Ownership(format!(
                "cannot enter {} through {}",
                self.graph.describe_nesting(self.to_operator()),
                self.graph.describe_input(outer)
            )));
        }
        let resolved = self.slot_mapping()?.resolve_downstream_input(outer);
        for &inner in &resolved {
            let owner = self.graph.input_slot(inner)?.owner();
            if !self.contains(owner)? {
                return Err(Error::Invariant(format!(
                    "cannot enter through {}: owner of inner {} ({}) is not a child",
                    self.graph.describe_input(outer),
                    self.graph.describe_input(inner),
                    self.graph.describe_nesting(owner)
                )));
            }
        }
        Ok(resolved)
    }

    /// Upstream from one of the composite's outputs to the inner output feeding it.
    pub fn trace_output(&self, outer: OutputSlotId) -> Result<Option<OutputSlotId>> {
        if !self.graph.is_owner_of_output(self.to_operator(), outer)? {
            return Err(Error::Ownership(format!(
                "cannot enter {} through {}",
                self.graph.describe_nesting(self.to_operator()),
                self.graph.describe_output(outer)
            )));
        }
        let resolved = self.slot_mapping()?.resolve_upstream_output(outer);
        if let Some(inner) = resolved {
            let owner = self.graph.output_slot(inner)?.owner();
            if !self.contains(owner)? {
                return Err(Error::Invariant(format!(
                    "cannot enter through {}: owner of inner {} ({}) is not a child",
                    self.graph.describe_output(outer),
                    self.graph.describe_output(inner),
                    self.graph.describe_nesting(owner)
                )));
            }
        }
        Ok(resolved)
    }

    /// Upstream from an unoccupied inner input to the composite's input feeding it.
    pub fn trace_input(&self, inner: InputSlotId) -> Result<Option<InputSlotId>> {
        let slot = self.graph.input_slot(inner)?;
        if let Some(occupant) = slot.occupant() {
            return Err(Error::Unsupported(format!(
                "cannot trace {}: it is occupied by {}",
                self.graph.describe_input(inner),
                self.graph.describe_output(occupant)
            )));
        }
        if !self.contains(slot.owner())? {
            return Err(Error::Ownership(format!(
                "cannot trace {}: it does not belong to {}",
                self.graph.describe_input(inner),
                self.graph.describe_nesting(self.to_operator())
            )));
        }
        self.resolve_outer_input(inner)
    }

    /// Leave the container through an inner input. `None` if the input is not
    /// part of the boundary (it is fed from inside).
    pub fn exit_input(&self, inner: InputSlotId) -> Result<Option<InputSlotId>> {
        let owner = self.graph.input_slot(inner)?.owner();
        if self.graph.parent(owner)? != Some(self.to_operator()) {
            return Err(Error::Ownership(format!(
                "trying to exit {} from {}, which is not within it",
                self.graph.describe_nesting(self.to_operator()),
                self.graph.describe_input(inner)
            )));
        }
        self.resolve_outer_input(inner)
    }

    /// Leave a source container through its source operator.
    pub fn exit_operator(&self, inner: OperatorId) -> Result<Option<OperatorId>> {
        let source = self.source()?;
        Ok((source == inner).then_some(self.to_operator()))
    }

    fn resolve_outer_input(&self, inner: InputSlotId) -> Result<Option<InputSlotId>> {
        let resolved = self.slot_mapping()?.resolve_upstream_input(inner);
        if let Some(outer) = resolved {
            if !self.graph.is_owner_of_input(self.to_operator(), outer)? {
                return Err(Error::Invariant(format!(
                    "{} maps {} to foreign slot {}",
                    self.graph.label(self.to_operator()),
                    self.graph.describe_input(inner),
                    self.graph.describe_input(outer)
                )));
            }
        }
        Ok(resolved)
    }

    fn check_outer_output(&self, outer: OutputSlotId) -> Result<()> {
        if !self.graph.is_owner_of_output(self.to_operator(), outer)? {
            return Err(Error::Invariant(format!(
                "{} maps to foreign slot {}",
                self.graph.label(self.to_operator()),
                self.graph.describe_output(outer)
            )));
        }
        Ok(())
    }
}

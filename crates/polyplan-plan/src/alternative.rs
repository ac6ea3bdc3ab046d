//! Composite operator holding interchangeable sub-plans.
//!
//! Every alternative exposes the same external interface (the composite's own
//! ports) through its own `SlotMapping`, so a later search can pick one without
//! touching the rest of the plan. Alternatives are only ever added or replaced;
//! choosing among them is up to the caller.

use std::collections::BTreeSet;

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{AlternativeId, InputSlotId, OperatorId, OutputSlotId};

use crate::container::ContainerRef;
use crate::graph::PlanGraph;
use crate::mapping::SlotMapping;
use crate::operator::OperatorKind;

/// One candidate implementation: an operator (or sub-plan root) plus the
/// mapping from the composite's ports to its ports.
#[derive(Debug, Clone)]
pub struct Alternative {
    id: AlternativeId,
    operator: OperatorId,
    slot_mapping: SlotMapping,
}

impl Alternative {
    pub fn id(&self) -> AlternativeId {
        self.id
    }

    pub fn operator(&self) -> OperatorId {
        self.operator
    }

    pub fn slot_mapping(&self) -> &SlotMapping {
        &self.slot_mapping
    }

    /// The container handle under which the wrapped operator is registered.
    pub fn container_ref(&self, composite: OperatorId) -> ContainerRef {
        ContainerRef::Alternative {
            operator: composite,
            alternative: self.id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OperatorAlternative {
    alternatives: Vec<Alternative>,
}

impl OperatorAlternative {
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn alternative(&self, id: AlternativeId) -> Option<&Alternative> {
        self.alternatives.get(id.index()).filter(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Let alternative `id` reference `by` instead of the operators it absorbed.
    pub(crate) fn absorb(
        &mut self,
        id: AlternativeId,
        absorbed: &BTreeSet<OperatorId>,
        by: OperatorId,
        inputs: &[(InputSlotId, InputSlotId)],
        outputs: &[(OutputSlotId, OutputSlotId)],
    ) -> Result<()> {
        let alternative = self
            .alternatives
            .get_mut(id.index())
            .ok_or_else(|| Error::Invariant(format!("unknown {id}")))?;
        if absorbed.contains(&alternative.operator) {
            alternative.operator = by;
        }
        for &(inner, outer) in inputs {
            alternative.slot_mapping.rekey_input(inner, outer);
        }
        for &(inner, outer) in outputs {
            alternative.slot_mapping.repoint_output(inner, outer);
        }
        Ok(())
    }

    fn push(&mut self, operator: OperatorId, slot_mapping: SlotMapping) -> AlternativeId {
        let id = AlternativeId::from_index(self.alternatives.len());
        self.alternatives.push(Alternative {
            id,
            operator,
            slot_mapping,
        });
        id
    }
}

impl PlanGraph {
    /// Promote `operator` in place into the first alternative of a new
    /// `OperatorAlternative` and return the composite.
    ///
    /// Steps, in order:
    /// 1. create the composite with the same arity and container as `operator`;
    /// 2. mock `operator`'s output and input slots onto it;
    /// 3. steal all of `operator`'s external connections (both directions);
    /// 4. let the old parent, if any, replace `operator` with the composite;
    /// 5. register `operator` as the first alternative.
    ///
    /// Neighbours see the composite exactly where `operator` used to be.
    pub fn wrap_in_alternative(&mut self, operator: OperatorId) -> Result<OperatorId> {
        let node = self.operator(operator)?;
        if !node.slots_complete() {
            return Err(Error::Invariant(format!(
                "cannot wrap {}: its slots are not materialized",
                self.label(operator)
            )));
        }
        let (num_inputs, num_outputs, container) =
            (node.num_inputs(), node.num_outputs(), node.container());

        let composite = self.push_composite(
            OperatorKind::Alternative(OperatorAlternative::default()),
            num_inputs,
            num_outputs,
            container,
        );
        self.mock_outputs(operator, composite)?;
        self.mock_inputs(operator, composite)?;
        self.steal_output_connections(operator, composite)?;
        self.steal_input_connections(operator, composite)?;

        if let Some(parent) = container {
            self.replace_child(parent.to_operator(), operator, composite)?;
        }

        self.attach_alternative(composite, operator)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            operator = %self.label(operator),
            composite = %self.label(composite),
            "wrapped operator into alternative"
        );
        self.after_rewrite()?;
        Ok(composite)
    }

    /// Add a further candidate to an existing `OperatorAlternative`.
    ///
    /// The candidate must be an unconnected, top-level operator with the
    /// composite's arity and compatible port types.
    pub fn add_alternative(&mut self, composite: OperatorId, operator: OperatorId) -> Result<AlternativeId> {
        self.operator_alternative(composite)?;
        let node = self.operator(operator)?;
        if operator == composite || self.collect_parents(composite)?.contains(&operator) {
            return Err(Error::Ownership(format!(
                "{} cannot become an alternative of {}, which it encloses",
                self.label(operator),
                self.describe_nesting(composite)
            )));
        }
        if let Some(parent) = node.parent() {
            return Err(Error::Ownership(format!(
                "{} is already nested in {}",
                self.label(operator),
                self.label(parent)
            )));
        }
        if !node.slots_complete() {
            return Err(Error::Invariant(format!(
                "cannot add {}: its slots are not materialized",
                self.label(operator)
            )));
        }
        self.check_same_interface(composite, operator)?;
        self.check_detached(operator, "alternative candidate")?;

        let id = self.attach_alternative(composite, operator)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            operator = %self.label(operator),
            composite = %self.label(composite),
            alternative = %id,
            "added alternative"
        );
        self.after_rewrite()?;
        Ok(id)
    }

    /// Read-only view of the alternatives of `composite`.
    pub fn alternatives(&self, composite: OperatorId) -> Result<&[Alternative]> {
        Ok(self.operator_alternative(composite)?.alternatives())
    }

    /// The slot mapping between `composite` and one of its direct children.
    pub fn slot_mapping_for(&self, composite: OperatorId, child: OperatorId) -> Result<&SlotMapping> {
        if self.parent(child)? != Some(composite) {
            return Err(Error::NotAChild {
                child: self.label(child),
                parent: self.label(composite),
            });
        }
        match &self.operator(composite)?.kind {
            OperatorKind::Alternative(alts) => alts
                .alternatives()
                .iter()
                .find(|a| a.operator() == child)
                .map(Alternative::slot_mapping)
                .ok_or_else(|| {
                    Error::Invariant(format!(
                        "could not find the alternative of {} wrapping {}",
                        self.label(composite),
                        self.label(child)
                    ))
                }),
            OperatorKind::Subplan(subplan) => Ok(subplan.slot_mapping()),
            OperatorKind::Elementary(_) => Err(Error::Invariant(format!(
                "elementary {} is registered as a parent",
                self.label(composite)
            ))),
        }
    }

    /// Swap the direct child `old` of `composite` for `new`, which must have the
    /// same arity. Mappings referencing `old`'s slots are rewritten to `new`'s.
    /// On error nothing is changed.
    ///
    /// `new` must not be connected to anything yet: it takes over `old`'s place
    /// at the boundary of `composite`.
    pub fn replace(&mut self, composite: OperatorId, old: OperatorId, new: OperatorId) -> Result<()> {
        if old != new {
            self.check_detached(new, "replacement")?;
        }
        self.replace_child(composite, old, new)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            composite = %self.label(composite),
            old = %self.label(old),
            new = %self.label(new),
            "replaced child"
        );
        self.after_rewrite()
    }

    pub(crate) fn replace_child(&mut self, composite: OperatorId, old: OperatorId, new: OperatorId) -> Result<()> {
        self.check_same_arity(old, new)?;
        if self.parent(old)? != Some(composite) {
            return Err(Error::NotAChild {
                child: self.label(old),
                parent: self.label(composite),
            });
        }
        if old == new {
            return Ok(());
        }
        if new == composite || self.collect_parents(composite)?.contains(&new) {
            return Err(Error::Ownership(format!(
                "{} cannot replace a child of {}, which it encloses",
                self.label(new),
                self.describe_nesting(composite)
            )));
        }
        let new_container = self.container_of(new)?;
        if new_container.is_some() && new_container != self.container_of(old)? {
            return Err(Error::Ownership(format!(
                "replacement {} is already nested in {}",
                self.label(new),
                self.describe_nesting(new)
            )));
        }

        let node = self.operator(composite)?;
        if node.is_alternative() {
            self.replace_in_alternative(composite, old, new)
        } else if node.is_subplan() {
            self.replace_in_subplan(composite, old, new)
        } else {
            Err(Error::Unsupported(format!(
                "{} is elementary and has no children",
                self.label(composite)
            )))
        }
    }

    fn replace_in_alternative(&mut self, composite: OperatorId, old: OperatorId, new: OperatorId) -> Result<()> {
        // Build every rewritten mapping before mutating anything.
        let mut updates = Vec::new();
        for alternative in self.operator_alternative(composite)?.alternatives() {
            if alternative.operator() == old {
                let mut mapping = alternative.slot_mapping().clone();
                mapping.replace_input_slot_mappings(self, old, new)?;
                mapping.replace_output_slot_mappings(self, old, new)?;
                updates.push((alternative.id(), mapping));
            }
        }

        for (id, mapping) in updates {
            let alternative = self
                .operator_alternative_mut(composite)?
                .alternatives
                .get_mut(id.index())
                .ok_or_else(|| Error::Invariant(format!("{} vanished during replace", id)))?;
            alternative.operator = new;
            alternative.slot_mapping = mapping;
            self.set_container(new, Some(ContainerRef::Alternative {
                operator: composite,
                alternative: id,
            }))?;
        }
        self.set_container(old, None)
    }

    fn attach_alternative(&mut self, composite: OperatorId, operator: OperatorId) -> Result<AlternativeId> {
        let mapping = SlotMapping::wrap(self, operator, composite)?;
        let id = self.operator_alternative_mut(composite)?.push(operator, mapping);
        self.set_container(
            operator,
            Some(ContainerRef::Alternative {
                operator: composite,
                alternative: id,
            }),
        )?;
        Ok(id)
    }

    fn operator_alternative(&self, composite: OperatorId) -> Result<&OperatorAlternative> {
        self.operator(composite)?.as_alternative().ok_or_else(|| {
            Error::Unsupported(format!(
                "{} is not an operator alternative",
                self.label(composite)
            ))
        })
    }

    fn operator_alternative_mut(&mut self, composite: OperatorId) -> Result<&mut OperatorAlternative> {
        let label = self.label(composite);
        match &mut self.operator_mut(composite)?.kind {
            OperatorKind::Alternative(alts) => Ok(alts),
            _ => Err(Error::Unsupported(format!(
                "{label} is not an operator alternative"
            ))),
        }
    }

    /// Reject `operator` if any of its slots is still wired to a neighbour.
    fn check_detached(&self, operator: OperatorId, role: &str) -> Result<()> {
        let node = self.operator(operator)?;
        for &slot in node.inputs() {
            if let Some(occupant) = self.input_slot(slot)?.occupant() {
                return Err(Error::Ownership(format!(
                    "{role} {} is still fed by {}",
                    self.describe_input(slot),
                    self.describe_output(occupant)
                )));
            }
        }
        for &slot in node.outputs() {
            if !self.output_slot(slot)?.occupied_slots().is_empty() {
                return Err(Error::Ownership(format!(
                    "{role} {} still feeds other operators",
                    self.describe_output(slot)
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn check_same_arity(&self, a: OperatorId, b: OperatorId) -> Result<()> {
        let (na, nb) = (self.operator(a)?, self.operator(b)?);
        if na.num_inputs() != nb.num_inputs() || na.num_outputs() != nb.num_outputs() {
            return Err(Error::ShapeMismatch(format!(
                "{} has {} inputs/{} outputs, {} has {} inputs/{} outputs",
                self.label(a),
                na.num_inputs(),
                na.num_outputs(),
                self.label(b),
                nb.num_inputs(),
                nb.num_outputs()
            )));
        }
        Ok(())
    }

    /// Same arity, and every port of `candidate` can stand in for the composite's.
    fn check_same_interface(&self, composite: OperatorId, candidate: OperatorId) -> Result<()> {
        self.check_same_arity(composite, candidate)?;
        for i in 0..self.operator(composite)?.num_inputs() {
            let outer = self.input_slot(self.input(composite, i)?)?;
            let inner = self.input_slot(self.input(candidate, i)?)?;
            if !inner.data_type().accepts(outer.data_type()) {
                return Err(Error::ShapeMismatch(format!(
                    "input {i} of {} takes {}, {} provides {}",
                    self.label(candidate),
                    inner.data_type(),
                    self.label(composite),
                    outer.data_type()
                )));
            }
        }
        for i in 0..self.operator(composite)?.num_outputs() {
            let outer = self.output_slot(self.output(composite, i)?)?;
            let inner = self.output_slot(self.output(candidate, i)?)?;
            if !outer.data_type().accepts(inner.data_type()) {
                return Err(Error::ShapeMismatch(format!(
                    "output {i} of {} produces {}, {} declares {}",
                    self.label(candidate),
                    inner.data_type(),
                    self.label(composite),
                    outer.data_type()
                )));
            }
        }
        Ok(())
    }
}

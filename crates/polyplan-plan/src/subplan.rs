//! Composite operator encasing a connected sub-graph behind boundary slots.
//!
//! One outer input may feed several inner inputs; every outer output is fed by
//! exactly one inner output. Members are the operators directly inside.

use std::collections::{BTreeSet, VecDeque};

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{InputSlotId, OperatorId, OutputSlotId};

use crate::container::ContainerRef;
use crate::graph::PlanGraph;
use crate::mapping::SlotMapping;
use crate::operator::OperatorKind;

#[derive(Debug, Clone, Default)]
pub struct Subplan {
    slot_mapping: SlotMapping,
    members: BTreeSet<OperatorId>,
    source: Option<OperatorId>,
    sink: Option<OperatorId>,
}

impl Subplan {
    pub fn slot_mapping(&self) -> &SlotMapping {
        &self.slot_mapping
    }

    pub fn members(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.members.iter().copied()
    }

    pub fn contains_member(&self, op: OperatorId) -> bool {
        self.members.contains(&op)
    }

    /// The single member source, recorded when the subplan has no inputs.
    pub fn source(&self) -> Option<OperatorId> {
        self.source
    }

    /// The single member sink, recorded when the subplan has no outputs.
    pub fn sink(&self) -> Option<OperatorId> {
        self.sink
    }

    /// Replace absorbed members by the composite that now holds them.
    fn absorb(
        &mut self,
        absorbed: &BTreeSet<OperatorId>,
        by: OperatorId,
        inputs: &[(InputSlotId, InputSlotId)],
        outputs: &[(OutputSlotId, OutputSlotId)],
    ) {
        self.members.retain(|m| !absorbed.contains(m));
        self.members.insert(by);
        for slot in [&mut self.source, &mut self.sink].into_iter().flatten() {
            if absorbed.contains(&*slot) {
                *slot = by;
            }
        }
        for &(inner, outer) in inputs {
            self.slot_mapping.rekey_input(inner, outer);
        }
        for &(inner, outer) in outputs {
            self.slot_mapping.repoint_output(inner, outer);
        }
    }
}

impl PlanGraph {
    /// Encase the sub-graph delimited by `inputs` and `outputs` in a new `Subplan`.
    ///
    /// Members are the owners of the boundary slots plus everything connected to
    /// them without crossing the boundary. The new composite takes over the
    /// boundary's external connections and, if the members were nested, their
    /// place in the enclosing container.
    pub fn wrap_subplan(&mut self, inputs: &[InputSlotId], outputs: &[OutputSlotId]) -> Result<OperatorId> {
        if inputs.is_empty() && outputs.is_empty() {
            return Err(Error::Unsupported(
                "a subplan needs at least one boundary slot".to_string(),
            ));
        }
        let boundary_inputs: BTreeSet<_> = inputs.iter().copied().collect();
        let boundary_outputs: BTreeSet<_> = outputs.iter().copied().collect();
        if boundary_inputs.len() != inputs.len() || boundary_outputs.len() != outputs.len() {
            return Err(Error::ShapeMismatch(
                "duplicate slot in subplan boundary".to_string(),
            ));
        }

        let members = self.collect_members(&boundary_inputs, &boundary_outputs)?;
        let container = self.common_container(&members)?;
        self.check_boundary(&members, &boundary_inputs, &boundary_outputs, container)?;

        let source = if inputs.is_empty() {
            self.single_member(&members, |n| n.is_source())?
        } else {
            None
        };
        let sink = if outputs.is_empty() {
            self.single_member(&members, |n| n.is_sink())?
        } else {
            None
        };

        let composite = self.push_composite(
            OperatorKind::Subplan(Subplan::default()),
            inputs.len(),
            outputs.len(),
            container,
        );

        let mut mapping = SlotMapping::new();
        let mut input_pairs = Vec::with_capacity(inputs.len());
        for &inner in inputs {
            let outer = self.copy_input_slot(inner, composite)?;
            self.operator_mut(composite)?.inputs.push(outer);
            self.move_occupant(inner, outer)?;
            mapping.map_input(inner, outer);
            input_pairs.push((inner, outer));
        }
        let mut output_pairs = Vec::with_capacity(outputs.len());
        for &inner in outputs {
            let outer = self.copy_output_slot(inner, composite)?;
            self.operator_mut(composite)?.outputs.push(outer);
            self.move_fan_out(inner, outer)?;
            mapping.map_output(outer, inner);
            output_pairs.push((inner, outer));
        }

        if let OperatorKind::Subplan(subplan) = &mut self.operator_mut(composite)?.kind {
            subplan.slot_mapping = mapping;
            subplan.members = members.clone();
            subplan.source = source;
            subplan.sink = sink;
        }

        if let Some(parent) = container {
            self.hand_over_to(parent, &members, composite, &input_pairs, &output_pairs)?;
        }
        for &member in &members {
            self.set_container(member, Some(ContainerRef::Subplan(composite)))?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            composite = %self.label(composite),
            members = members.len(),
            "wrapped subplan"
        );
        self.after_rewrite()?;
        Ok(composite)
    }

    /// Encase a single operator, using all of its ports as the boundary.
    pub fn wrap_operator_in_subplan(&mut self, operator: OperatorId) -> Result<OperatorId> {
        let node = self.operator(operator)?;
        let (inputs, outputs) = (node.inputs().to_vec(), node.outputs().to_vec());
        self.wrap_subplan(&inputs, &outputs)
    }

    /// Direct members of a `Subplan`.
    pub fn subplan_members(&self, composite: OperatorId) -> Result<Vec<OperatorId>> {
        self.operator(composite)?
            .as_subplan()
            .map(|s| s.members().collect())
            .ok_or_else(|| Error::Unsupported(format!("{} is not a subplan", self.label(composite))))
    }

    pub(crate) fn replace_in_subplan(&mut self, composite: OperatorId, old: OperatorId, new: OperatorId) -> Result<()> {
        let subplan = self.operator(composite)?.as_subplan().ok_or_else(|| {
            Error::Unsupported(format!("{} is not a subplan", self.label(composite)))
        })?;
        let mut mapping = subplan.slot_mapping().clone();
        mapping.replace_input_slot_mappings(self, old, new)?;
        mapping.replace_output_slot_mappings(self, old, new)?;

        // Members are wired to each other directly; carry those wires over too.
        self.steal_input_connections(old, new)?;
        self.steal_output_connections(old, new)?;

        if let OperatorKind::Subplan(subplan) = &mut self.operator_mut(composite)?.kind {
            subplan.slot_mapping = mapping;
            subplan.members.remove(&old);
            subplan.members.insert(new);
            for slot in [&mut subplan.source, &mut subplan.sink].into_iter().flatten() {
                if *slot == old {
                    *slot = new;
                }
            }
        }
        self.set_container(new, Some(ContainerRef::Subplan(composite)))?;
        self.set_container(old, None)
    }

    /// Everything reachable from the boundary owners without crossing the boundary.
    fn collect_members(
        &self,
        boundary_inputs: &BTreeSet<InputSlotId>,
        boundary_outputs: &BTreeSet<OutputSlotId>,
    ) -> Result<BTreeSet<OperatorId>> {
        let mut members = BTreeSet::new();
        let mut queue = VecDeque::new();
        for &slot in boundary_inputs {
            queue.push_back(self.input_slot(slot)?.owner());
        }
        for &slot in boundary_outputs {
            queue.push_back(self.output_slot(slot)?.owner());
        }

        while let Some(op) = queue.pop_front() {
            if !members.insert(op) {
                continue;
            }
            let node = self.operator(op)?;
            for &slot in node.inputs() {
                if boundary_inputs.contains(&slot) {
                    continue;
                }
                if let Some(occupant) = self.input_slot(slot)?.occupant() {
                    queue.push_back(self.output_slot(occupant)?.owner());
                }
            }
            for &slot in node.outputs() {
                if boundary_outputs.contains(&slot) {
                    continue;
                }
                for &consumer in self.output_slot(slot)?.occupied_slots() {
                    queue.push_back(self.input_slot(consumer)?.owner());
                }
            }
        }
        Ok(members)
    }

    fn common_container(&self, members: &BTreeSet<OperatorId>) -> Result<Option<ContainerRef>> {
        let mut iter = members.iter().copied();
        let first = match iter.next() {
            Some(op) => op,
            None => return Ok(None),
        };
        let container = self.container_of(first)?;
        for op in iter {
            if self.container_of(op)? != container {
                return Err(Error::Ownership(format!(
                    "subplan members live in different containers: {} vs. {}",
                    self.describe_nesting(op),
                    self.describe_nesting(first)
                )));
            }
        }
        Ok(container)
    }

    fn check_boundary(
        &self,
        members: &BTreeSet<OperatorId>,
        boundary_inputs: &BTreeSet<InputSlotId>,
        boundary_outputs: &BTreeSet<OutputSlotId>,
        container: Option<ContainerRef>,
    ) -> Result<()> {
        for &slot in boundary_inputs {
            if let Some(occupant) = self.input_slot(slot)?.occupant() {
                if members.contains(&self.output_slot(occupant)?.owner()) {
                    return Err(Error::Ownership(format!(
                        "boundary input {} is fed from inside the subplan by {}",
                        self.describe_input(slot),
                        self.describe_output(occupant)
                    )));
                }
            }
        }
        for &slot in boundary_outputs {
            for &consumer in self.output_slot(slot)?.occupied_slots() {
                if members.contains(&self.input_slot(consumer)?.owner()) {
                    return Err(Error::Ownership(format!(
                        "boundary output {} feeds {} inside the subplan",
                        self.describe_output(slot),
                        self.describe_input(consumer)
                    )));
                }
            }
        }

        // Slots the enclosing container maps must stay reachable through the new boundary.
        if let Some(parent) = container {
            let mapping = self.container(parent)?.slot_mapping()?;
            for (inner, _) in mapping.input_entries() {
                let owner = self.input_slot(inner)?.owner();
                if members.contains(&owner) && !boundary_inputs.contains(&inner) {
                    return Err(Error::Ownership(format!(
                        "{} is mapped by {} but not part of the subplan boundary",
                        self.describe_input(inner),
                        self.label(parent.to_operator())
                    )));
                }
            }
            for (_, inner) in mapping.output_entries() {
                let owner = self.output_slot(inner)?.owner();
                if members.contains(&owner) && !boundary_outputs.contains(&inner) {
                    return Err(Error::Ownership(format!(
                        "{} is mapped by {} but not part of the subplan boundary",
                        self.describe_output(inner),
                        self.label(parent.to_operator())
                    )));
                }
            }
        }
        Ok(())
    }

    fn single_member(
        &self,
        members: &BTreeSet<OperatorId>,
        pred: impl Fn(&crate::operator::OperatorNode) -> bool,
    ) -> Result<Option<OperatorId>> {
        let mut found = None;
        for &op in members {
            if pred(self.operator(op)?) {
                if found.is_some() {
                    return Ok(None);
                }
                found = Some(op);
            }
        }
        Ok(found)
    }

    /// Let the enclosing container reference `composite` instead of the members it absorbed.
    fn hand_over_to(
        &mut self,
        parent: ContainerRef,
        members: &BTreeSet<OperatorId>,
        composite: OperatorId,
        inputs: &[(InputSlotId, InputSlotId)],
        outputs: &[(OutputSlotId, OutputSlotId)],
    ) -> Result<()> {
        let label = self.label(parent.to_operator());
        match (parent, &mut self.operator_mut(parent.to_operator())?.kind) {
            (ContainerRef::Subplan(_), OperatorKind::Subplan(subplan)) => {
                subplan.absorb(members, composite, inputs, outputs);
                Ok(())
            }
            (ContainerRef::Alternative { alternative, .. }, OperatorKind::Alternative(alts)) => {
                alts.absorb(alternative, members, composite, inputs, outputs)
            }
            _ => Err(Error::Invariant(format!(
                "{parent:?} does not match the kind of {label}"
            ))),
        }
    }
}

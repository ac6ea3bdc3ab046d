//! The plan arena and the slot connection protocol.
//!
//! `PlanGraph` owns every operator and every slot. Owners and containers are
//! stored as plain handles, so upward navigation is O(1) and there are no
//! reference cycles. Slots are never freed; slots replaced by mocking must be
//! unconnected at that point and are simply left behind.

use std::collections::HashSet;
use std::sync::Arc;

use polyplan_core::cardinality::{CardinalityEstimate, CardinalityEstimator};
use polyplan_core::config::PlannerConfig;
use polyplan_core::error::{Error, Result};
use polyplan_core::id::{Epoch, InputSlotId, OperatorId, OutputSlotId};

use crate::container::ContainerRef;
use crate::operator::{ElementaryOperator, OperatorKind, OperatorNode};
use crate::slot::{InputSlot, OutputSlot, SlotSpec};

#[derive(Debug, Default)]
pub struct PlanGraph {
    config: PlannerConfig,
    operators: Vec<OperatorNode>,
    inputs: Vec<InputSlot>,
    outputs: Vec<OutputSlot>,
}

impl PlanGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    // ----- construction -----

    /// Add an elementary operator; its slots are created from its port declarations.
    ///
    /// Slot names must be unique per direction, otherwise name lookups would be
    /// ambiguous. A rejected operator leaves the graph untouched.
    pub fn add_operator<O: ElementaryOperator + 'static>(&mut self, op: O) -> Result<OperatorId> {
        self.add_boxed_operator(Box::new(op))
    }

    pub fn add_boxed_operator(&mut self, op: Box<dyn ElementaryOperator>) -> Result<OperatorId> {
        let input_specs = op.inputs();
        let output_specs = op.outputs();
        check_unique_names(op.name(), "input", &input_specs)?;
        check_unique_names(op.name(), "output", &output_specs)?;

        let id = OperatorId::from_index(self.operators.len());
        let mut node = OperatorNode::new(
            id,
            OperatorKind::Elementary(op),
            input_specs.len(),
            output_specs.len(),
            None,
            self.config.first_epoch,
        );

        for spec in input_specs {
            let slot = InputSlotId::from_index(self.inputs.len());
            self.inputs
                .push(InputSlot::new(spec.name, id, spec.data_type));
            node.inputs.push(slot);
        }
        for spec in output_specs {
            let slot = OutputSlotId::from_index(self.outputs.len());
            self.outputs
                .push(OutputSlot::new(spec.name, id, spec.data_type));
            node.outputs.push(slot);
        }

        self.operators.push(node);
        #[cfg(feature = "tracing")]
        tracing::trace!(op = %id, name = %self.label(id), "added operator");
        Ok(id)
    }

    /// Add a composite whose slots are filled in afterwards by mocking.
    pub(crate) fn push_composite(
        &mut self,
        kind: OperatorKind,
        num_inputs: usize,
        num_outputs: usize,
        container: Option<ContainerRef>,
    ) -> OperatorId {
        let id = OperatorId::from_index(self.operators.len());
        self.operators.push(OperatorNode::new(
            id,
            kind,
            num_inputs,
            num_outputs,
            container,
            self.config.first_epoch,
        ));
        id
    }

    // ----- lookups -----

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn operator_ids(&self) -> impl Iterator<Item = OperatorId> + '_ {
        self.operators.iter().map(|n| n.id)
    }

    pub fn operator(&self, id: OperatorId) -> Result<&OperatorNode> {
        self.operators
            .get(id.index())
            .ok_or(Error::UnknownOperator(id))
    }

    pub(crate) fn operator_mut(&mut self, id: OperatorId) -> Result<&mut OperatorNode> {
        self.operators
            .get_mut(id.index())
            .ok_or(Error::UnknownOperator(id))
    }

    pub fn input_slot(&self, id: InputSlotId) -> Result<&InputSlot> {
        self.inputs
            .get(id.index())
            .ok_or_else(|| Error::unknown_input(id))
    }

    pub fn output_slot(&self, id: OutputSlotId) -> Result<&OutputSlot> {
        self.outputs
            .get(id.index())
            .ok_or_else(|| Error::unknown_output(id))
    }

    pub(crate) fn input_slot_mut(&mut self, id: InputSlotId) -> Result<&mut InputSlot> {
        self.inputs
            .get_mut(id.index())
            .ok_or_else(|| Error::unknown_input(id))
    }

    pub(crate) fn output_slot_mut(&mut self, id: OutputSlotId) -> Result<&mut OutputSlot> {
        self.outputs
            .get_mut(id.index())
            .ok_or_else(|| Error::unknown_output(id))
    }

    /// Number of input slots in the arena, detached ones included.
    pub fn input_slot_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_slot_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn input(&self, op: OperatorId, index: usize) -> Result<InputSlotId> {
        let node = self.operator(op)?;
        if index >= node.num_inputs {
            return Err(Error::IndexOutOfRange {
                operator: self.label(op),
                kind: "input",
                index,
                len: node.num_inputs,
            });
        }
        node.inputs.get(index).copied().ok_or_else(|| {
            Error::Invariant(format!("input slots of {} are not materialized", self.label(op)))
        })
    }

    pub fn output(&self, op: OperatorId, index: usize) -> Result<OutputSlotId> {
        let node = self.operator(op)?;
        if index >= node.num_outputs {
            return Err(Error::IndexOutOfRange {
                operator: self.label(op),
                kind: "output",
                index,
                len: node.num_outputs,
            });
        }
        node.outputs.get(index).copied().ok_or_else(|| {
            Error::Invariant(format!("output slots of {} are not materialized", self.label(op)))
        })
    }

    pub fn input_by_name(&self, op: OperatorId, name: &str) -> Result<InputSlotId> {
        for &slot in &self.operator(op)?.inputs {
            if self.input_slot(slot)?.name == name {
                return Ok(slot);
            }
        }
        Err(Error::UnknownSlotName {
            operator: self.label(op),
            name: name.to_string(),
        })
    }

    pub fn output_by_name(&self, op: OperatorId, name: &str) -> Result<OutputSlotId> {
        for &slot in &self.operator(op)?.outputs {
            if self.output_slot(slot)?.name == name {
                return Ok(slot);
            }
        }
        Err(Error::UnknownSlotName {
            operator: self.label(op),
            name: name.to_string(),
        })
    }

    /// Position of `slot` within its owner's inputs.
    pub fn input_index(&self, slot: InputSlotId) -> Result<usize> {
        let owner = self.input_slot(slot)?.owner;
        self.operator(owner)?
            .inputs
            .iter()
            .position(|&s| s == slot)
            .ok_or_else(|| {
                Error::Invariant(format!(
                    "{} is not listed by its owner {}",
                    slot,
                    self.label(owner)
                ))
            })
    }

    /// Position of `slot` within its owner's outputs.
    pub fn output_index(&self, slot: OutputSlotId) -> Result<usize> {
        let owner = self.output_slot(slot)?.owner;
        self.operator(owner)?
            .outputs
            .iter()
            .position(|&s| s == slot)
            .ok_or_else(|| {
                Error::Invariant(format!(
                    "{} is not listed by its owner {}",
                    slot,
                    self.label(owner)
                ))
            })
    }

    pub fn is_owner_of_input(&self, op: OperatorId, slot: InputSlotId) -> Result<bool> {
        Ok(self.input_slot(slot)?.owner == op)
    }

    pub fn is_owner_of_output(&self, op: OperatorId, slot: OutputSlotId) -> Result<bool> {
        Ok(self.output_slot(slot)?.owner == op)
    }

    pub fn container_of(&self, op: OperatorId) -> Result<Option<ContainerRef>> {
        Ok(self.operator(op)?.container)
    }

    /// The composite operator enclosing `op`, or `None` for top-level operators.
    pub fn parent(&self, op: OperatorId) -> Result<Option<OperatorId>> {
        Ok(self.operator(op)?.parent())
    }

    pub(crate) fn set_container(&mut self, op: OperatorId, container: Option<ContainerRef>) -> Result<()> {
        self.operator_mut(op)?.container = container;
        Ok(())
    }

    pub fn epoch(&self, op: OperatorId) -> Result<Epoch> {
        Ok(self.operator(op)?.epoch())
    }

    /// Only elementary operators carry a mutable epoch.
    pub fn set_epoch(&mut self, op: OperatorId, epoch: Epoch) -> Result<()> {
        let label = self.label(op);
        let node = self.operator_mut(op)?;
        if !node.is_elementary() {
            return Err(Error::Unsupported(format!(
                "cannot set the epoch of composite {label}"
            )));
        }
        node.epoch = epoch;
        Ok(())
    }

    // ----- connection protocol -----

    /// Connect `output` to `input`. The input must not be occupied already.
    pub fn connect_to(&mut self, output: OutputSlotId, input: InputSlotId) -> Result<()> {
        self.output_slot(output)?;
        if let Some(occupant) = self.input_slot(input)?.occupant {
            return Err(Error::Occupied {
                input: self.describe_input(input),
                occupant: self.describe_output(occupant),
            });
        }

        self.output_slot_mut(output)?.occupied.push(input);
        self.input_slot_mut(input)?.occupant = Some(output);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            output = %self.describe_output(output),
            input = %self.describe_input(input),
            "connected"
        );
        Ok(())
    }

    pub fn disconnect_from(&mut self, output: OutputSlotId, input: InputSlotId) -> Result<()> {
        self.output_slot(output)?;
        if self.input_slot(input)?.occupant != Some(output) {
            return Err(Error::NotConnected {
                output: self.describe_output(output),
                input: self.describe_input(input),
            });
        }

        self.output_slot_mut(output)?.occupied.retain(|&s| s != input);
        self.input_slot_mut(input)?.occupant = None;
        #[cfg(feature = "tracing")]
        tracing::trace!(
            output = %self.describe_output(output),
            input = %self.describe_input(input),
            "disconnected"
        );
        Ok(())
    }

    /// Connect output `this_output` of `this` to input `that_input` of `that`,
    /// checking the declared type compatibility first.
    pub fn connect_operators(
        &mut self,
        this: OperatorId,
        this_output: usize,
        that: OperatorId,
        that_input: usize,
    ) -> Result<()> {
        let output = self.output(this, this_output)?;
        let input = self.input(that, that_input)?;
        let produced = &self.output_slot(output)?.data_type;
        let expected = &self.input_slot(input)?.data_type;
        if !expected.accepts(produced) {
            return Err(Error::TypeMismatch {
                output: self.describe_output(output),
                input: self.describe_input(input),
                produced: produced.to_string(),
                expected: expected.to_string(),
            });
        }
        self.connect_to(output, input)
    }

    // ----- graph surgery primitives -----

    pub(crate) fn copy_input_slot(&mut self, template: InputSlotId, owner: OperatorId) -> Result<InputSlotId> {
        let t = self.input_slot(template)?;
        let copy = InputSlot::new(t.name.clone(), owner, t.data_type.clone());
        let id = InputSlotId::from_index(self.inputs.len());
        self.inputs.push(copy);
        Ok(id)
    }

    pub(crate) fn copy_output_slot(&mut self, template: OutputSlotId, owner: OperatorId) -> Result<OutputSlotId> {
        let t = self.output_slot(template)?;
        let copy = OutputSlot::new(t.name.clone(), owner, t.data_type.clone());
        let id = OutputSlotId::from_index(self.outputs.len());
        self.outputs.push(copy);
        Ok(id)
    }

    /// Give `mock` a fresh copy of every input slot of `template` (name and type).
    pub fn mock_inputs(&mut self, template: OperatorId, mock: OperatorId) -> Result<()> {
        let template_slots = self.operator(template)?.inputs.clone();
        let mock_node = self.operator(mock)?;
        if self.operator(template)?.num_inputs != mock_node.num_inputs {
            return Err(Error::ShapeMismatch(format!(
                "cannot mock inputs of {} onto {}: {} vs. {} inputs",
                self.label(template),
                self.label(mock),
                self.operator(template)?.num_inputs,
                mock_node.num_inputs
            )));
        }
        if template_slots.len() != mock_node.num_inputs {
            return Err(Error::Invariant(format!(
                "input slots of {} are not materialized",
                self.label(template)
            )));
        }
        for &old in &mock_node.inputs {
            if self.input_slot(old)?.occupant.is_some() {
                return Err(Error::Invariant(format!(
                    "cannot replace connected slot {}",
                    self.describe_input(old)
                )));
            }
        }

        let mut fresh = Vec::with_capacity(template_slots.len());
        for slot in template_slots {
            fresh.push(self.copy_input_slot(slot, mock)?);
        }
        self.operator_mut(mock)?.inputs = fresh;
        Ok(())
    }

    /// Give `mock` a fresh copy of every output slot of `template` (name and type).
    pub fn mock_outputs(&mut self, template: OperatorId, mock: OperatorId) -> Result<()> {
        let template_slots = self.operator(template)?.outputs.clone();
        let mock_node = self.operator(mock)?;
        if self.operator(template)?.num_outputs != mock_node.num_outputs {
            return Err(Error::ShapeMismatch(format!(
                "cannot mock outputs of {} onto {}: {} vs. {} outputs",
                self.label(template),
                self.label(mock),
                self.operator(template)?.num_outputs,
                mock_node.num_outputs
            )));
        }
        if template_slots.len() != mock_node.num_outputs {
            return Err(Error::Invariant(format!(
                "output slots of {} are not materialized",
                self.label(template)
            )));
        }
        for &old in &mock_node.outputs {
            if !self.output_slot(old)?.occupied.is_empty() {
                return Err(Error::Invariant(format!(
                    "cannot replace connected slot {}",
                    self.describe_output(old)
                )));
            }
        }

        let mut fresh = Vec::with_capacity(template_slots.len());
        for slot in template_slots {
            fresh.push(self.copy_output_slot(slot, mock)?);
        }
        self.operator_mut(mock)?.outputs = fresh;
        Ok(())
    }

    /// Move every upstream connection of `victim` onto the same input index of `thief`.
    pub fn steal_input_connections(&mut self, victim: OperatorId, thief: OperatorId) -> Result<()> {
        let victim_slots = self.operator(victim)?.inputs.clone();
        let thief_slots = self.operator(thief)?.inputs.clone();
        if victim_slots.len() != thief_slots.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot steal inputs of {} for {}: {} vs. {} inputs",
                self.label(victim),
                self.label(thief),
                victim_slots.len(),
                thief_slots.len()
            )));
        }

        // Validate everything first so a failure leaves the graph untouched.
        for (&v, &t) in victim_slots.iter().zip(&thief_slots) {
            if self.input_slot(v)?.occupant.is_some() {
                if let Some(occupant) = self.input_slot(t)?.occupant {
                    return Err(Error::Occupied {
                        input: self.describe_input(t),
                        occupant: self.describe_output(occupant),
                    });
                }
            }
        }

        for (v, t) in victim_slots.into_iter().zip(thief_slots) {
            if let Some(occupant) = self.input_slot(v)?.occupant {
                self.disconnect_from(occupant, v)?;
                self.connect_to(occupant, t)?;
            }
        }
        Ok(())
    }

    /// Move every downstream connection of `victim` onto the same output index of `thief`.
    pub fn steal_output_connections(&mut self, victim: OperatorId, thief: OperatorId) -> Result<()> {
        let victim_slots = self.operator(victim)?.outputs.clone();
        let thief_slots = self.operator(thief)?.outputs.clone();
        if victim_slots.len() != thief_slots.len() {
            return Err(Error::ShapeMismatch(format!(
                "cannot steal outputs of {} for {}: {} vs. {} outputs",
                self.label(victim),
                self.label(thief),
                victim_slots.len(),
                thief_slots.len()
            )));
        }

        for (v, t) in victim_slots.into_iter().zip(thief_slots) {
            self.move_fan_out(v, t)?;
        }
        Ok(())
    }

    /// Re-point the occupant of `from` to `to`, if there is one.
    pub(crate) fn move_occupant(&mut self, from: InputSlotId, to: InputSlotId) -> Result<()> {
        if let Some(occupant) = self.input_slot(from)?.occupant {
            self.disconnect_from(occupant, from)?;
            self.connect_to(occupant, to)?;
        }
        Ok(())
    }

    /// Re-point every input fed by `from` so it is fed by `to`.
    pub(crate) fn move_fan_out(&mut self, from: OutputSlotId, to: OutputSlotId) -> Result<()> {
        let occupied = self.output_slot(from)?.occupied.clone();
        for input in occupied {
            self.disconnect_from(from, input)?;
            self.connect_to(to, input)?;
        }
        Ok(())
    }

    // ----- cardinality hook -----

    /// Attach an estimator to one output, overriding the operator's own.
    pub fn register_cardinality_estimator(
        &mut self,
        op: OperatorId,
        output_index: usize,
        estimator: Arc<dyn CardinalityEstimator>,
    ) -> Result<()> {
        self.output(op, output_index)?;
        let num_inputs = self.operator(op)?.num_inputs;
        if estimator.num_inputs() != num_inputs {
            return Err(Error::Estimate(format!(
                "estimator for {} expects {} inputs, operator has {}",
                self.label(op),
                estimator.num_inputs(),
                num_inputs
            )));
        }
        self.operator_mut(op)?
            .estimators
            .insert(output_index, estimator);
        Ok(())
    }

    /// The estimator in effect for one output: a registered one, else the
    /// operator kind's default (composites have none of their own).
    pub fn cardinality_estimator(
        &self,
        op: OperatorId,
        output_index: usize,
    ) -> Result<Option<Arc<dyn CardinalityEstimator>>> {
        self.output(op, output_index)?;
        let node = self.operator(op)?;
        if let Some(registered) = node.estimators.get(&output_index) {
            return Ok(Some(Arc::clone(registered)));
        }
        match node.as_elementary() {
            Some(elementary) => elementary.cardinality_estimator(output_index),
            None => Ok(None),
        }
    }

    /// Invoke the effective estimator; `None` if the output has no estimator.
    pub fn estimate_cardinality(
        &self,
        op: OperatorId,
        output_index: usize,
        inputs: &[CardinalityEstimate],
    ) -> Result<Option<CardinalityEstimate>> {
        match self.cardinality_estimator(op, output_index)? {
            Some(estimator) => estimator.estimate(inputs).map(Some),
            None => Ok(None),
        }
    }

    // ----- descriptions for error messages -----

    /// `name#id`, e.g. `sort#3`.
    pub fn label(&self, op: OperatorId) -> String {
        match self.operators.get(op.index()) {
            Some(node) => format!("{}#{}", node.name(), op.get()),
            None => op.to_string(),
        }
    }

    pub fn describe_input(&self, slot: InputSlotId) -> String {
        match self.inputs.get(slot.index()) {
            Some(s) => format!("{}.{}", self.label(s.owner), s.name),
            None => slot.to_string(),
        }
    }

    pub fn describe_output(&self, slot: OutputSlotId) -> String {
        match self.outputs.get(slot.index()) {
            Some(s) => format!("{}.{}", self.label(s.owner), s.name),
            None => slot.to_string(),
        }
    }

    /// Verify the whole graph if the config asks for it.
    pub(crate) fn after_rewrite(&self) -> Result<()> {
        if self.config.verify_rewrites {
            crate::verify::verify_plan(self)?;
        }
        Ok(())
    }
}

fn check_unique_names(operator: &str, kind: &'static str, specs: &[SlotSpec]) -> Result<()> {
    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(Error::DuplicateSlotName {
                operator: operator.to_string(),
                kind,
                name: spec.name.clone(),
            });
        }
    }
    Ok(())
}

//! Bidirectional association between a composite's ports and a child's ports.
//!
//! Entries are stored in the upstream direction of data flow:
//! - inputs:  inner input  -> outer input (the composite's input feeds the inner one)
//! - outputs: outer output -> inner output (the inner output feeds the composite's)
//!
//! "Upstream" resolution reads an entry, "downstream" resolution scans for all
//! keys with a given value (one outer input may feed several inner inputs).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{InputSlotId, OperatorId, OutputSlotId};

use crate::graph::PlanGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMapping {
    inputs: BTreeMap<InputSlotId, InputSlotId>,
    outputs: BTreeMap<OutputSlotId, OutputSlotId>,
}

impl SlotMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every port of `inner` to the port at the same index of `outer`.
    pub fn wrap(graph: &PlanGraph, inner: OperatorId, outer: OperatorId) -> Result<Self> {
        let inner_node = graph.operator(inner)?;
        let outer_node = graph.operator(outer)?;
        if inner_node.num_inputs() != outer_node.num_inputs()
            || inner_node.num_outputs() != outer_node.num_outputs()
        {
            return Err(Error::ShapeMismatch(format!(
                "cannot map {} ({}→{}) onto {} ({}→{})",
                graph.label(inner),
                inner_node.num_inputs(),
                inner_node.num_outputs(),
                graph.label(outer),
                outer_node.num_inputs(),
                outer_node.num_outputs()
            )));
        }

        let mut mapping = Self::new();
        for i in 0..inner_node.num_inputs() {
            mapping.map_input(graph.input(inner, i)?, graph.input(outer, i)?);
        }
        for i in 0..inner_node.num_outputs() {
            mapping.map_output(graph.output(outer, i)?, graph.output(inner, i)?);
        }
        Ok(mapping)
    }

    pub fn map_input(&mut self, inner: InputSlotId, outer: InputSlotId) {
        self.inputs.insert(inner, outer);
    }

    pub fn map_output(&mut self, outer: OutputSlotId, inner: OutputSlotId) {
        self.outputs.insert(outer, inner);
    }

    /// Outer input feeding `inner`.
    pub fn resolve_upstream_input(&self, inner: InputSlotId) -> Option<InputSlotId> {
        self.inputs.get(&inner).copied()
    }

    /// Inner inputs fed by `outer`.
    pub fn resolve_downstream_input(&self, outer: InputSlotId) -> Vec<InputSlotId> {
        self.inputs
            .iter()
            .filter(|&(_, &o)| o == outer)
            .map(|(&inner, _)| inner)
            .collect()
    }

    /// Inner output feeding `outer`.
    pub fn resolve_upstream_output(&self, outer: OutputSlotId) -> Option<OutputSlotId> {
        self.outputs.get(&outer).copied()
    }

    /// Outer outputs fed by `inner`.
    pub fn resolve_downstream_output(&self, inner: OutputSlotId) -> Vec<OutputSlotId> {
        self.outputs
            .iter()
            .filter(|&(_, &i)| i == inner)
            .map(|(&outer, _)| outer)
            .collect()
    }

    pub fn input_entries(&self) -> impl Iterator<Item = (InputSlotId, InputSlotId)> + '_ {
        self.inputs.iter().map(|(&inner, &outer)| (inner, outer))
    }

    pub fn output_entries(&self) -> impl Iterator<Item = (OutputSlotId, OutputSlotId)> + '_ {
        self.outputs.iter().map(|(&outer, &inner)| (outer, inner))
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Re-key every inner input owned by `old` to the input at the same index of `new`.
    pub fn replace_input_slot_mappings(
        &mut self,
        graph: &PlanGraph,
        old: OperatorId,
        new: OperatorId,
    ) -> Result<()> {
        let mut rewritten = BTreeMap::new();
        for (&inner, &outer) in &self.inputs {
            let key = if graph.input_slot(inner)?.owner() == old {
                graph.input(new, graph.input_index(inner)?)?
            } else {
                inner
            };
            rewritten.insert(key, outer);
        }
        self.inputs = rewritten;
        Ok(())
    }

    /// Re-point every inner output owned by `old` to the output at the same index of `new`.
    pub fn replace_output_slot_mappings(
        &mut self,
        graph: &PlanGraph,
        old: OperatorId,
        new: OperatorId,
    ) -> Result<()> {
        for inner in self.outputs.values_mut() {
            if graph.output_slot(*inner)?.owner() == old {
                *inner = graph.output(new, graph.output_index(*inner)?)?;
            }
        }
        Ok(())
    }

    /// Swap one inner input for another, keeping its outer counterpart.
    pub fn rekey_input(&mut self, old_inner: InputSlotId, new_inner: InputSlotId) {
        if let Some(outer) = self.inputs.remove(&old_inner) {
            self.inputs.insert(new_inner, outer);
        }
    }

    /// Swap one inner output for another wherever it is referenced.
    pub fn repoint_output(&mut self, old_inner: OutputSlotId, new_inner: OutputSlotId) {
        for inner in self.outputs.values_mut() {
            if *inner == old_inner {
                *inner = new_inner;
            }
        }
    }
}

//! Typed ports.
//!
//! A slot belongs to exactly one operator for its whole life. Connections are
//! only changed through `PlanGraph::connect_to` / `disconnect_from`, which keep
//! both ends in sync: an input has an occupant `o` iff `o` lists that input.

use polyplan_core::id::{InputSlotId, OperatorId, OutputSlotId};
use polyplan_core::types::DataSetType;

/// Declaration of a port, used when an operator is added to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: String,
    pub data_type: DataSetType,
}

impl SlotSpec {
    pub fn new(name: impl Into<String>, data_type: DataSetType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputSlot {
    pub(crate) name: String,
    pub(crate) owner: OperatorId,
    pub(crate) data_type: DataSetType,
    pub(crate) occupant: Option<OutputSlotId>,
}

impl InputSlot {
    pub(crate) fn new(name: String, owner: OperatorId, data_type: DataSetType) -> Self {
        Self {
            name,
            owner,
            data_type,
            occupant: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> OperatorId {
        self.owner
    }

    pub fn data_type(&self) -> &DataSetType {
        &self.data_type
    }

    /// The output currently feeding this input, if any.
    pub fn occupant(&self) -> Option<OutputSlotId> {
        self.occupant
    }
}

#[derive(Debug, Clone)]
pub struct OutputSlot {
    pub(crate) name: String,
    pub(crate) owner: OperatorId,
    pub(crate) data_type: DataSetType,
    pub(crate) occupied: Vec<InputSlotId>,
}

impl OutputSlot {
    pub(crate) fn new(name: String, owner: OperatorId, data_type: DataSetType) -> Self {
        Self {
            name,
            owner,
            data_type,
            occupied: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> OperatorId {
        self.owner
    }

    pub fn data_type(&self) -> &DataSetType {
        &self.data_type
    }

    /// Inputs fed by this output, in connection order.
    pub fn occupied_slots(&self) -> &[InputSlotId] {
        &self.occupied
    }
}

//! Serializable, handle-stable view of a plan graph.
//!
//! A snapshot records what a plan looks like (operators, slots, connections,
//! nesting) in arena order. Two graphs built by the same sequence of calls yield
//! identical snapshots, hence identical fingerprints.

use serde::{Deserialize, Serialize};

use polyplan_core::error::Result;
use polyplan_core::hash::{hash_serde, Hash256};
use polyplan_core::id::{Epoch, InputSlotId, OperatorId, OutputSlotId};

use crate::container::ContainerRef;
use crate::graph::PlanGraph;
use crate::operator::OperatorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub version: String,
    pub operators: Vec<OperatorSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSnapshot {
    pub id: OperatorId,
    pub name: String,
    pub kind: String,
    pub epoch: Epoch,
    pub container: Option<ContainerRef>,
    pub inputs: Vec<InputSnapshot>,
    pub outputs: Vec<OutputSnapshot>,
    /// Direct children per inner container; empty for elementary operators.
    pub containers: Vec<ContainerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub id: InputSlotId,
    pub name: String,
    pub data_type: String,
    pub occupant: Option<OutputSlotId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSnapshot {
    pub id: OutputSlotId,
    pub name: String,
    pub data_type: String,
    pub occupied: Vec<InputSlotId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub container: ContainerRef,
    pub children: Vec<OperatorId>,
    /// `(inner, outer)` input pairs.
    pub inputs: Vec<(InputSlotId, InputSlotId)>,
    /// `(outer, inner)` output pairs.
    pub outputs: Vec<(OutputSlotId, OutputSlotId)>,
}

impl PlanSnapshot {
    pub fn capture(graph: &PlanGraph) -> Result<Self> {
        let mut operators = Vec::with_capacity(graph.len());
        for op in graph.operator_ids() {
            let node = graph.operator(op)?;

            let mut inputs = Vec::with_capacity(node.inputs().len());
            for &id in node.inputs() {
                let slot = graph.input_slot(id)?;
                inputs.push(InputSnapshot {
                    id,
                    name: slot.name().to_string(),
                    data_type: slot.data_type().to_string(),
                    occupant: slot.occupant(),
                });
            }

            let mut outputs = Vec::with_capacity(node.outputs().len());
            for &id in node.outputs() {
                let slot = graph.output_slot(id)?;
                outputs.push(OutputSnapshot {
                    id,
                    name: slot.name().to_string(),
                    data_type: slot.data_type().to_string(),
                    occupied: slot.occupied_slots().to_vec(),
                });
            }

            let mut containers = Vec::new();
            for which in graph.inner_containers(op)? {
                let container = graph.container(which)?;
                let mapping = container.slot_mapping()?;
                containers.push(ContainerSnapshot {
                    container: which,
                    children: container.children()?,
                    inputs: mapping.input_entries().collect(),
                    outputs: mapping.output_entries().collect(),
                });
            }

            operators.push(OperatorSnapshot {
                id: op,
                name: node.name().to_string(),
                kind: kind_label(node.kind()).to_string(),
                epoch: node.epoch(),
                container: node.container(),
                inputs,
                outputs,
                containers,
            });
        }

        Ok(Self {
            version: polyplan_core::VERSION.to_string(),
            operators,
        })
    }

    /// Stable content hash; independent of the process and platform.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn kind_label(kind: &OperatorKind) -> &'static str {
    match kind {
        OperatorKind::Elementary(_) => "elementary",
        OperatorKind::Subplan(_) => "subplan",
        OperatorKind::Alternative(_) => "alternative",
    }
}

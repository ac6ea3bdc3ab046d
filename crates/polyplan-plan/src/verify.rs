//! Structural verification of a plan graph.
//!
//! `verify_plan` walks the whole arena once and reports the first broken
//! invariant as `Error::Invariant`. It is run after every rewrite when
//! `PlannerConfig::verify_rewrites` is set, and by tests through
//! `assert_consistent`.

use std::collections::BTreeSet;

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{InputSlotId, OperatorId, OutputSlotId};

use crate::container::ContainerRef;
use crate::graph::PlanGraph;

/// Check ownership, connection symmetry, container back-references and slot
/// mappings of every operator in `graph`.
pub fn verify_plan(graph: &PlanGraph) -> Result<()> {
    let mut listed_inputs = BTreeSet::new();
    let mut listed_outputs = BTreeSet::new();

    for op in graph.operator_ids() {
        let node = graph.operator(op)?;
        if !node.slots_complete() {
            return broken(format!(
                "{} declares {}/{} slots but holds {}/{}",
                graph.label(op),
                node.num_inputs(),
                node.num_outputs(),
                node.inputs().len(),
                node.outputs().len()
            ));
        }
        for &slot in node.inputs() {
            if graph.input_slot(slot)?.owner() != op {
                return broken(format!("{} lists foreign {}", graph.label(op), graph.describe_input(slot)));
            }
            listed_inputs.insert(slot);
            verify_input_link(graph, slot)?;
        }
        for &slot in node.outputs() {
            if graph.output_slot(slot)?.owner() != op {
                return broken(format!("{} lists foreign {}", graph.label(op), graph.describe_output(slot)));
            }
            listed_outputs.insert(slot);
            verify_output_links(graph, slot)?;
        }
        verify_container(graph, op)?;
        for container in graph.inner_containers(op)? {
            verify_children(graph, container)?;
            verify_mapping(graph, container)?;
        }
    }

    verify_orphans(graph, &listed_inputs, &listed_outputs)
}

/// Panic with the first broken invariant. For tests and debug builds.
pub fn assert_consistent(graph: &PlanGraph) {
    if let Err(err) = verify_plan(graph) {
        panic!("inconsistent plan: {err}");
    }
}

fn broken<T>(msg: String) -> Result<T> {
    Err(Error::Invariant(msg))
}

fn verify_input_link(graph: &PlanGraph, input: InputSlotId) -> Result<()> {
    if let Some(occupant) = graph.input_slot(input)?.occupant() {
        if !graph.output_slot(occupant)?.occupied_slots().contains(&input) {
            return broken(format!(
                "{} names {} as occupant, which does not feed it",
                graph.describe_input(input),
                graph.describe_output(occupant)
            ));
        }
    }
    Ok(())
}

fn verify_output_links(graph: &PlanGraph, output: OutputSlotId) -> Result<()> {
    let occupied = graph.output_slot(output)?.occupied_slots();
    let distinct: BTreeSet<_> = occupied.iter().collect();
    if distinct.len() != occupied.len() {
        return broken(format!("{} feeds the same input twice", graph.describe_output(output)));
    }
    for &input in occupied {
        if graph.input_slot(input)?.occupant() != Some(output) {
            return broken(format!(
                "{} claims to feed {}, which is occupied by something else",
                graph.describe_output(output),
                graph.describe_input(input)
            ));
        }
    }
    Ok(())
}

/// A nested operator must be listed by the container it points to.
fn verify_container(graph: &PlanGraph, op: OperatorId) -> Result<()> {
    if let Some(which) = graph.container_of(op)? {
        if !graph.container(which)?.children()?.contains(&op) {
            return broken(format!(
                "{} points to {:?}, which does not list it",
                graph.label(op),
                which
            ));
        }
    }
    Ok(())
}

/// Every listed child must point back to the container listing it.
fn verify_children(graph: &PlanGraph, which: ContainerRef) -> Result<()> {
    for child in graph.container(which)?.children()? {
        if graph.container_of(child)? != Some(which) {
            return broken(format!(
                "{} lists {}, which points elsewhere",
                graph.describe_nesting(which.to_operator()),
                graph.label(child)
            ));
        }
    }
    Ok(())
}

/// Mapped outer slots belong to the composite, mapped inner slots to a direct
/// child, and inner boundary inputs are fed from outside only.
fn verify_mapping(graph: &PlanGraph, which: ContainerRef) -> Result<()> {
    let container = graph.container(which)?;
    let composite = which.to_operator();
    let mapping = container.slot_mapping()?;

    for (inner, outer) in mapping.input_entries() {
        if !graph.is_owner_of_input(composite, outer)? {
            return broken(format!(
                "{} maps to foreign {}",
                graph.label(composite),
                graph.describe_input(outer)
            ));
        }
        let inner_slot = graph.input_slot(inner)?;
        if !container.contains(inner_slot.owner())? {
            return broken(format!(
                "{} maps from {}, which is not inside it",
                graph.label(composite),
                graph.describe_input(inner)
            ));
        }
        if let Some(occupant) = inner_slot.occupant() {
            return broken(format!(
                "boundary input {} is also fed by {}",
                graph.describe_input(inner),
                graph.describe_output(occupant)
            ));
        }
    }

    for (outer, inner) in mapping.output_entries() {
        if !graph.is_owner_of_output(composite, outer)? {
            return broken(format!(
                "{} maps from foreign {}",
                graph.label(composite),
                graph.describe_output(outer)
            ));
        }
        if !container.contains(graph.output_slot(inner)?.owner())? {
            return broken(format!(
                "{} maps to {}, which is not inside it",
                graph.label(composite),
                graph.describe_output(inner)
            ));
        }
    }
    Ok(())
}

/// Slots dropped by mocking stay in the arena but must be fully detached.
fn verify_orphans(
    graph: &PlanGraph,
    listed_inputs: &BTreeSet<InputSlotId>,
    listed_outputs: &BTreeSet<OutputSlotId>,
) -> Result<()> {
    for index in 0..graph.input_slot_count() {
        let slot = InputSlotId::from_index(index);
        if !listed_inputs.contains(&slot) {
            if let Some(occupant) = graph.input_slot(slot)?.occupant() {
                return broken(format!(
                    "detached {} is still fed by {}",
                    graph.describe_input(slot),
                    graph.describe_output(occupant)
                ));
            }
        }
    }
    for index in 0..graph.output_slot_count() {
        let slot = OutputSlotId::from_index(index);
        if !listed_outputs.contains(&slot) && !graph.output_slot(slot)?.occupied_slots().is_empty() {
            return broken(format!("detached {} still feeds inputs", graph.describe_output(slot)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use polyplan_core::schema::DataType;
    use polyplan_core::types::DataSetType;

    use super::*;
    use crate::operator::ElementaryOperator;
    use crate::slot::SlotSpec;

    #[derive(Debug)]
    struct Pass;

    impl ElementaryOperator for Pass {
        fn name(&self) -> &str {
            "pass"
        }
        fn inputs(&self) -> Vec<SlotSpec> {
            vec![SlotSpec::new("in", DataSetType::basic(DataType::Int64))]
        }
        fn outputs(&self) -> Vec<SlotSpec> {
            vec![SlotSpec::new("out", DataSetType::basic(DataType::Int64))]
        }
    }

    #[test]
    fn empty_graph_is_consistent() {
        assert!(verify_plan(&PlanGraph::new()).is_ok());
    }

    #[test]
    fn wrapped_chain_is_consistent() {
        let mut g = PlanGraph::new();
        let a = g.add_operator(Pass).unwrap();
        let b = g.add_operator(Pass).unwrap();
        g.connect_operators(a, 0, b, 0).unwrap();
        let alt = g.wrap_in_alternative(b).unwrap();
        g.wrap_in_alternative(alt).unwrap();
        assert_consistent(&g);
    }

    #[test]
    fn one_sided_link_is_detected() {
        let mut g = PlanGraph::new();
        let a = g.add_operator(Pass).unwrap();
        let b = g.add_operator(Pass).unwrap();
        g.connect_operators(a, 0, b, 0).unwrap();
        let input = g.input(b, 0).unwrap();
        g.input_slot_mut(input).unwrap().occupant = None;
        let err = verify_plan(&g).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)), "{err}");
    }
}

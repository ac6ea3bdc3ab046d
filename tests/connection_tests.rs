//! Slot connection protocol: connect, disconnect, occupancy and type checks.

mod fixtures;

use fixtures::{chain, int64, map, sink, source};
use polyplan::prelude::*;

#[test]
fn connect_links_both_ends() {
    let mut g = PlanGraph::new();
    let a = source(&mut g);
    let b = map(&mut g);
    g.connect_operators(a, 0, b, 0).unwrap();

    let out = g.output(a, 0).unwrap();
    let input = g.input(b, 0).unwrap();
    assert_eq!(g.input_slot(input).unwrap().occupant(), Some(out));
    assert_eq!(g.output_slot(out).unwrap().occupied_slots(), &[input]);
    assert_eq!(g.input_operator_at(b, 0).unwrap(), Some(a));
    assert_consistent(&g);
}

#[test]
fn outputs_fan_out() {
    let mut g = PlanGraph::new();
    let a = source(&mut g);
    let b = map(&mut g);
    let c = map(&mut g);
    g.connect_operators(a, 0, b, 0).unwrap();
    g.connect_operators(a, 0, c, 0).unwrap();

    let out = g.output(a, 0).unwrap();
    assert_eq!(g.output_slot(out).unwrap().occupied_slots().len(), 2);
    assert_eq!(
        g.follow_output_recursively(out).unwrap(),
        vec![out],
        "a connected top-level output resolves to itself"
    );
}

#[test]
fn occupied_input_is_rejected() {
    let mut g = PlanGraph::new();
    let a = source(&mut g);
    let a2 = source(&mut g);
    let b = map(&mut g);
    g.connect_operators(a, 0, b, 0).unwrap();

    let err = g.connect_operators(a2, 0, b, 0).unwrap_err();
    assert!(matches!(err, Error::Occupied { .. }), "{err}");
    // The original link survives.
    assert_eq!(g.input_operator_at(b, 0).unwrap(), Some(a));
}

#[test]
fn disconnect_requires_an_existing_link() {
    let mut g = PlanGraph::new();
    let (a, b, _) = chain(&mut g);
    let out = g.output(a, 0).unwrap();
    let input = g.input(b, 0).unwrap();

    g.disconnect_from(out, input).unwrap();
    assert_eq!(g.input_slot(input).unwrap().occupant(), None);
    assert!(g.output_slot(out).unwrap().occupied_slots().is_empty());
    assert_eq!(g.input_operator_at(b, 0).unwrap(), None);

    let err = g.disconnect_from(out, input).unwrap_err();
    assert!(matches!(err, Error::NotConnected { .. }), "{err}");
}

#[test]
fn declared_types_must_be_compatible() {
    let mut g = PlanGraph::new();
    let text = g.add_operator(TextFileSource::new("/data/lines.txt")).unwrap();
    let b = map(&mut g);
    let err = g.connect_operators(text, 0, b, 0).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }), "{err}");
    assert!(err.to_string().contains("Utf8"), "{err}");
}

#[test]
fn widening_is_accepted() {
    let mut g = PlanGraph::new();
    let narrow = g.add_operator(CollectionSource::new(DataSetType::basic(DataType::Int32))).unwrap();
    let b = map(&mut g);
    g.connect_operators(narrow, 0, b, 0).unwrap();
}

#[test]
fn slot_indices_are_checked() {
    let mut g = PlanGraph::new();
    let a = source(&mut g);
    let c = sink(&mut g);
    let err = g.connect_operators(a, 1, c, 0).unwrap_err();
    assert!(
        matches!(err, Error::IndexOutOfRange { kind: "output", index: 1, len: 1, .. }),
        "{err}"
    );
    assert!(g.input(a, 0).is_err());
}

#[test]
fn slots_resolve_by_name_and_index() {
    let mut g = PlanGraph::new();
    let j = g.add_operator(JoinOperator::new(int64(), int64(), int64(), JoinType::Inner).on("k", "k")).unwrap();
    let right = g.input_by_name(j, "right").unwrap();
    assert_eq!(g.input(j, 1).unwrap(), right);
    assert_eq!(g.input_index(right).unwrap(), 1);
    assert!(g.is_owner_of_input(j, right).unwrap());
    assert!(matches!(
        g.output_by_name(j, "nope").unwrap_err(),
        Error::UnknownSlotName { .. }
    ));
}

#[test]
fn epochs_follow_the_config() {
    let mut g = PlanGraph::with_config(PlannerConfig {
        first_epoch: 7,
        ..PlannerConfig::default()
    })
    .unwrap();
    let (_, b, _) = chain(&mut g);
    assert_eq!(g.epoch(b).unwrap(), 7);
    g.set_epoch(b, 9).unwrap();
    assert_eq!(g.epoch(b).unwrap(), 9);

    let alt = g.wrap_in_alternative(b).unwrap();
    assert_eq!(g.epoch(alt).unwrap(), FIRST_EPOCH);
    assert!(matches!(g.set_epoch(alt, 3).unwrap_err(), Error::Unsupported(_)));
}

#[test]
fn invalid_config_is_rejected() {
    let err = PlanGraph::with_config(PlannerConfig {
        max_nesting_depth: 0,
        ..PlannerConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[derive(Debug)]
struct TwinInputs;

impl ElementaryOperator for TwinInputs {
    fn name(&self) -> &str {
        "twin_inputs"
    }

    fn inputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("in", int64()), SlotSpec::new("in", int64())]
    }

    fn outputs(&self) -> Vec<SlotSpec> {
        vec![SlotSpec::new("out", int64())]
    }
}

#[test]
fn duplicate_slot_names_are_rejected() {
    let mut g = PlanGraph::new();
    let a = source(&mut g);
    let before = (g.len(), g.input_slot_count(), g.output_slot_count());

    let err = g.add_operator(TwinInputs).unwrap_err();
    assert!(
        matches!(&err, Error::DuplicateSlotName { kind: "input", name, .. } if name == "in"),
        "{err}"
    );
    assert_eq!((g.len(), g.input_slot_count(), g.output_slot_count()), before);

    // The next operator still gets the next free handles.
    let b = map(&mut g);
    g.connect_operators(a, 0, b, 0).unwrap();
    assert_eq!(g.input_by_name(b, "in").unwrap(), g.input(b, 0).unwrap());
    assert_consistent(&g);
}

#[test]
fn mocking_and_stealing_require_equal_arity() {
    let mut g = PlanGraph::new();
    let wide = g.add_operator(CoalesceOperator::new(int64())).unwrap();
    let narrow = map(&mut g);
    let src = source(&mut g);
    let snk = sink(&mut g);

    assert!(matches!(g.mock_inputs(wide, narrow).unwrap_err(), Error::ShapeMismatch(_)));
    assert!(matches!(g.mock_outputs(src, snk).unwrap_err(), Error::ShapeMismatch(_)));
    assert!(matches!(
        g.steal_input_connections(wide, narrow).unwrap_err(),
        Error::ShapeMismatch(_)
    ));
    assert!(matches!(
        g.steal_output_connections(src, snk).unwrap_err(),
        Error::ShapeMismatch(_)
    ));

    assert_eq!(g.operator(narrow).unwrap().inputs().len(), 1);
    assert_eq!(g.operator(snk).unwrap().outputs().len(), 0);
    assert_consistent(&g);
}

#[test]
fn stealing_into_an_occupied_input_changes_nothing() {
    let mut g = PlanGraph::new();
    let (a, b, c) = (source(&mut g), source(&mut g), source(&mut g));
    let victim = g.add_operator(CoalesceOperator::new(int64())).unwrap();
    let thief = g.add_operator(CoalesceOperator::new(int64())).unwrap();
    g.connect_operators(a, 0, victim, 0).unwrap();
    g.connect_operators(b, 0, victim, 1).unwrap();
    g.connect_operators(c, 0, thief, 1).unwrap();

    let err = g.steal_input_connections(victim, thief).unwrap_err();
    assert!(matches!(err, Error::Occupied { .. }), "{err}");

    // The first input was not moved before the clash on the second.
    assert_eq!(g.input_operator_at(victim, 0).unwrap(), Some(a));
    assert_eq!(g.input_operator_at(victim, 1).unwrap(), Some(b));
    assert_eq!(g.input_operator_at(thief, 0).unwrap(), None);
    assert_eq!(g.input_operator_at(thief, 1).unwrap(), Some(c));
    let a_out = g.output(a, 0).unwrap();
    assert_eq!(g.output_slot(a_out).unwrap().occupied_slots(), &[g.input(victim, 0).unwrap()]);
    assert_consistent(&g);
}

#[test]
fn wrapping_keeps_what_neighbours_resolve_to() {
    let mut g = PlanGraph::new();
    let (a, b, c) = chain(&mut g);
    let a_out = g.output(a, 0).unwrap();
    let b_out = g.output(b, 0).unwrap();
    let c_in = g.input(c, 0).unwrap();
    let producer = |g: &PlanGraph| {
        let occupant = g.input_slot(c_in).unwrap().occupant().unwrap();
        g.trace_output_recursively(occupant).unwrap()
    };

    let followed = g.follow_output_recursively(a_out).unwrap();
    let traced = producer(&g);
    assert_eq!(traced, vec![b_out]);

    let alt = g.wrap_in_alternative(b).unwrap();
    assert_eq!(g.follow_output_recursively(a_out).unwrap(), followed);
    assert_eq!(producer(&g), traced);
    assert_eq!(
        g.follow_output_recursively(b_out).unwrap(),
        vec![g.output(alt, 0).unwrap()]
    );
    assert_eq!(
        g.follow_input_recursively(g.input(alt, 0).unwrap()).unwrap(),
        vec![g.input(b, 0).unwrap()]
    );
}

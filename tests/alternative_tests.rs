//! Operator alternatives: wrapping, adding candidates, replacing, and
//! resolving slots across the alternative boundary.

mod fixtures;

use std::collections::BTreeSet;

use fixtures::{chain, int64, map, verifying_graph};
use polyplan::prelude::*;

#[test]
fn wrapping_puts_the_composite_in_place() {
    let mut g = verifying_graph();
    let (a, b, c) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();

    let a_out = g.output(a, 0).unwrap();
    let alt_in = g.input(alt, 0).unwrap();
    assert_eq!(g.output_slot(a_out).unwrap().occupied_slots(), &[alt_in]);
    assert_eq!(g.input_operator_at(alt, 0).unwrap(), Some(a));
    assert_eq!(g.input_operator_at(c, 0).unwrap(), Some(alt));

    // The wrapped operator is detached from its former neighbours.
    let b_in = g.input(b, 0).unwrap();
    assert_eq!(g.input_slot(b_in).unwrap().occupant(), None);
    assert!(g.output_slot(g.output(b, 0).unwrap()).unwrap().occupied_slots().is_empty());
    assert_eq!(g.parent(b).unwrap(), Some(alt));
    assert_eq!(g.alternatives(alt).unwrap().len(), 1);

    // Still reachable from the inside.
    assert_eq!(g.input_operator_at(b, 0).unwrap(), Some(a));
    assert_eq!(g.outermost_input_slot(b, b_in).unwrap(), alt_in);
}

#[test]
fn composite_mocks_names_and_types() {
    let mut g = PlanGraph::new();
    let (_, b, _) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();

    let inner = g.input_slot(g.input(b, 0).unwrap()).unwrap();
    let outer = g.input_slot(g.input(alt, 0).unwrap()).unwrap();
    assert_eq!(inner.name(), outer.name());
    assert_eq!(inner.data_type(), outer.data_type());
    assert_eq!(outer.owner(), alt);
    assert!(g.operator(alt).unwrap().is_alternative());
}

#[test]
fn added_alternatives_share_the_external_interface() {
    let mut g = verifying_graph();
    let (a, b, _) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();
    let b2 = g.add_operator(SortOperator::new(int64(), vec!["x".into()])).unwrap();
    let id = g.add_alternative(alt, b2).unwrap();

    assert_eq!(g.alternatives(alt).unwrap().len(), 2);
    assert_eq!(g.alternatives(alt).unwrap()[1].id(), id);
    assert_eq!(g.parent(b2).unwrap(), Some(alt));

    let alt_in = g.input(alt, 0).unwrap();
    let alt_out = g.output(alt, 0).unwrap();
    for alternative in g.alternatives(alt).unwrap() {
        let op = alternative.operator();
        let mapping = alternative.slot_mapping();
        assert_eq!(mapping.resolve_upstream_input(g.input(op, 0).unwrap()), Some(alt_in));
        assert_eq!(mapping.resolve_upstream_output(alt_out), Some(g.output(op, 0).unwrap()));
        assert_eq!(g.slot_mapping_for(alt, op).unwrap(), mapping);
    }
    assert_eq!(g.input_operator_at(b2, 0).unwrap(), Some(a));
}

#[test]
fn candidates_must_fit() {
    let mut g = PlanGraph::new();
    let (a, b, _) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();

    let wide = g.add_operator(CoalesceOperator::new(int64())).unwrap();
    assert!(matches!(g.add_alternative(alt, wide).unwrap_err(), Error::ShapeMismatch(_)));

    let text = g.add_operator(MapOperator::same_type(DataSetType::basic(DataType::Utf8))).unwrap();
    assert!(matches!(g.add_alternative(alt, text).unwrap_err(), Error::ShapeMismatch(_)));

    let connected = map(&mut g);
    g.connect_operators(a, 0, connected, 0).unwrap();
    assert!(matches!(g.add_alternative(alt, connected).unwrap_err(), Error::Ownership(_)));

    // Already nested elsewhere.
    assert!(matches!(g.add_alternative(alt, b).unwrap_err(), Error::Ownership(_)));

    // Not an alternative at all.
    let plain = map(&mut g);
    assert!(matches!(g.add_alternative(a, plain).unwrap_err(), Error::Unsupported(_)));
    assert_eq!(g.alternatives(alt).unwrap().len(), 1);
}

#[test]
fn replace_swaps_a_child_with_the_same_shape() {
    let mut g = verifying_graph();
    let (a, b, c) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();
    let b3 = map(&mut g);

    g.replace(alt, b, b3).unwrap();
    let alternative = &g.alternatives(alt).unwrap()[0];
    assert_eq!(alternative.operator(), b3);
    assert_eq!(
        alternative.slot_mapping().resolve_upstream_input(g.input(b3, 0).unwrap()),
        Some(g.input(alt, 0).unwrap())
    );
    assert_eq!(g.parent(b3).unwrap(), Some(alt));
    assert_eq!(g.parent(b).unwrap(), None);
    assert_eq!(g.input_operator_at(b3, 0).unwrap(), Some(a));
    assert_eq!(g.input_operator_at(c, 0).unwrap(), Some(alt));
}

#[test]
fn replace_rejects_other_shapes_and_strangers() {
    let mut g = PlanGraph::new();
    let (_, b, _) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();

    let wide = g.add_operator(CoalesceOperator::new(int64())).unwrap();
    assert!(matches!(g.replace(alt, b, wide).unwrap_err(), Error::ShapeMismatch(_)));

    let stranger = map(&mut g);
    let other = map(&mut g);
    let err = g.replace(alt, stranger, other).unwrap_err();
    assert!(matches!(err, Error::NotAChild { .. }), "{err}");
    assert!(matches!(g.slot_mapping_for(alt, stranger).unwrap_err(), Error::NotAChild { .. }));

    // Nothing changed.
    assert_eq!(g.alternatives(alt).unwrap()[0].operator(), b);
    assert_consistent(&g);
}

#[test]
fn replace_rejects_a_composite_that_encloses_the_parent() {
    let mut g = PlanGraph::new();
    let (a, b, c) = chain(&mut g);
    let inner = g.wrap_in_alternative(b).unwrap();
    let outer = g.wrap_in_alternative(inner).unwrap();

    let err = g.replace(inner, b, outer).unwrap_err();
    assert!(matches!(err, Error::Ownership(_)), "{err}");
    assert_eq!(g.parent(inner).unwrap(), Some(outer));
    assert_eq!(g.parent(outer).unwrap(), None);
    assert_eq!(g.input_operator_at(outer, 0).unwrap(), Some(a));
    assert_eq!(g.input_operator_at(c, 0).unwrap(), Some(outer));

    // Unwired composites reach the nesting check itself.
    let lone = map(&mut g);
    let lone_inner = g.wrap_in_alternative(lone).unwrap();
    let lone_outer = g.wrap_in_alternative(lone_inner).unwrap();
    let err = g.replace(lone_inner, lone, lone_outer).unwrap_err();
    assert!(matches!(err, Error::Ownership(_)), "{err}");
    let err = g.replace(lone_inner, lone, lone_inner).unwrap_err();
    assert!(matches!(err, Error::Ownership(_)), "{err}");
    assert_eq!(g.alternatives(lone_inner).unwrap()[0].operator(), lone);
    assert_eq!(g.parent(lone_outer).unwrap(), None);

    assert!(g.collect_parents(b).is_ok());
    assert_consistent(&g);
}

#[test]
fn replace_rejects_a_wired_replacement() {
    let mut g = PlanGraph::new();
    let (_, b, _) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();
    let (a2, b2, c2) = chain(&mut g);

    let err = g.replace(alt, b, b2).unwrap_err();
    assert!(matches!(err, Error::Ownership(_)), "{err}");
    assert_eq!(g.alternatives(alt).unwrap()[0].operator(), b);
    assert_eq!(g.parent(b2).unwrap(), None);
    assert_eq!(g.input_operator_at(b2, 0).unwrap(), Some(a2));
    assert_eq!(g.input_operator_at(c2, 0).unwrap(), Some(b2));
    assert_consistent(&g);
}

#[test]
fn nested_alternatives_escalate_to_the_top() {
    let mut g = verifying_graph();
    let (a, b, _) = chain(&mut g);
    let inner = g.wrap_in_alternative(b).unwrap();
    let outer = g.wrap_in_alternative(inner).unwrap();

    let b_in = g.input(b, 0).unwrap();
    let outer_in = g.input(outer, 0).unwrap();
    assert_eq!(g.collect_parents(b).unwrap(), vec![b, inner, outer]);
    assert_eq!(g.input_operator_at(b, 0).unwrap(), Some(a));
    assert_eq!(g.outermost_input_slot(b, b_in).unwrap(), outer_in);
    assert_eq!(g.outermost_input_slot(outer, outer_in).unwrap(), outer_in);
    assert!(g.describe_nesting(b).contains(" < "));
}

#[test]
fn wrapping_a_nested_operator_keeps_its_place() {
    let mut g = verifying_graph();
    let (a, b, _) = chain(&mut g);
    let outer = g.wrap_in_alternative(b).unwrap();
    let inner = g.wrap_in_alternative(b).unwrap();

    assert_eq!(g.parent(inner).unwrap(), Some(outer));
    assert_eq!(g.alternatives(outer).unwrap()[0].operator(), inner);
    assert_eq!(g.collect_parents(b).unwrap(), vec![b, inner, outer]);
    assert_eq!(g.input_operator_at(b, 0).unwrap(), Some(a));
}

#[test]
fn outputs_surface_through_the_composite() {
    let mut g = PlanGraph::new();
    let (_, b, c) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();
    let b2 = map(&mut g);
    g.add_alternative(alt, b2).unwrap();

    let alt_out = g.output(alt, 0).unwrap();
    for op in [b, b2] {
        let out = g.output(op, 0).unwrap();
        assert_eq!(g.follow_output_recursively(out).unwrap(), vec![alt_out]);
    }

    let alt_in = g.input(alt, 0).unwrap();
    let entered: BTreeSet<_> = g.follow_input_recursively(alt_in).unwrap().into_iter().collect();
    let expected: BTreeSet<_> = [g.input(b, 0).unwrap(), g.input(b2, 0).unwrap()].into();
    assert_eq!(entered, expected);

    let traced: BTreeSet<_> = g.trace_output_recursively(alt_out).unwrap().into_iter().collect();
    let expected: BTreeSet<_> = [g.output(b, 0).unwrap(), g.output(b2, 0).unwrap()].into();
    assert_eq!(traced, expected);

    assert_eq!(g.upstream_operators(c).unwrap().len(), 2);
    assert_eq!(g.top_level_sinks(), vec![c]);
}

#[test]
fn containers_resolve_the_boundary() {
    let mut g = PlanGraph::new();
    let (_, b, _) = chain(&mut g);
    let alt = g.wrap_in_alternative(b).unwrap();
    let stray = map(&mut g);
    let which = g.container_of(b).unwrap().unwrap();
    let container = g.container(which).unwrap();

    assert_eq!(container.to_operator(), alt);
    assert_eq!(container.children().unwrap(), vec![b]);
    assert!(container.contains(b).unwrap());

    let b_in = g.input(b, 0).unwrap();
    let alt_in = g.input(alt, 0).unwrap();
    assert_eq!(container.trace_input(b_in).unwrap(), Some(alt_in));
    assert_eq!(container.follow_input(alt_in).unwrap(), vec![b_in]);
    assert_eq!(
        container.trace_output(g.output(alt, 0).unwrap()).unwrap(),
        Some(g.output(b, 0).unwrap())
    );

    // Slots from outside the container are refused.
    let stray_in = g.input(stray, 0).unwrap();
    assert!(matches!(container.trace_input(stray_in).unwrap_err(), Error::Ownership(_)));
    assert!(matches!(container.follow_input(b_in).unwrap_err(), Error::Ownership(_)));
    assert!(matches!(container.sink().unwrap_err(), Error::Unsupported(_)));
}

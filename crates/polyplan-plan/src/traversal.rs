//! Walking a plan across composite boundaries.
//!
//! These are defined purely on top of the slot and container contracts, so any
//! operator kind gets them for free. Upward escalation is bounded by
//! `PlannerConfig::max_nesting_depth`: nesting is finite in a sound graph, so
//! running past the bound means the container back-references form a cycle.

use std::collections::{BTreeSet, VecDeque};

use polyplan_core::error::{Error, Result};
use polyplan_core::id::{InputSlotId, OperatorId, OutputSlotId};

use crate::container::ContainerRef;
use crate::graph::PlanGraph;
use crate::operator::{OperatorKind, OperatorNode};

impl PlanGraph {
    /// The operator producing the data for `input` of `op`, escaping enclosing
    /// composites as needed. `None` if nothing is connected.
    pub fn input_operator(&self, op: OperatorId, input: InputSlotId) -> Result<Option<OperatorId>> {
        let (_, slot) = self.escalate_input(op, input)?;
        match self.input_slot(slot)?.occupant() {
            Some(occupant) => Ok(Some(self.output_slot(occupant)?.owner())),
            None => Ok(None),
        }
    }

    pub fn input_operator_at(&self, op: OperatorId, index: usize) -> Result<Option<OperatorId>> {
        let input = self.input(op, index)?;
        self.input_operator(op, input)
    }

    /// The outermost input slot that represents `input` of `op`.
    pub fn outermost_input_slot(&self, op: OperatorId, input: InputSlotId) -> Result<InputSlotId> {
        self.escalate_input(op, input).map(|(_, slot)| slot)
    }

    /// Exit enclosing containers for as long as they map the slot outward.
    fn escalate_input(&self, op: OperatorId, input: InputSlotId) -> Result<(OperatorId, InputSlotId)> {
        let (mut current, mut slot) = (op, input);
        for _ in 0..=self.config().max_nesting_depth {
            if !self.is_owner_of_input(current, slot)? {
                return Err(Error::Ownership(format!(
                    "{} does not belong to {}",
                    self.describe_input(slot),
                    self.label(current)
                )));
            }
            let outer = match self.container_of(current)? {
                Some(container) => self.container(container)?.exit_input(slot)?,
                None => None,
            };
            match outer {
                Some(outer) => {
                    current = self.input_slot(outer)?.owner();
                    slot = outer;
                }
                None => return Ok((current, slot)),
            }
        }
        Err(Error::Invariant(format!(
            "{} is nested deeper than {} levels",
            self.label(op),
            self.config().max_nesting_depth
        )))
    }

    /// All outputs that represent `output` at a boundary: outputs that are
    /// connected, or that belong to a top-level operator. An output inside an
    /// alternative can surface through several outer outputs.
    pub fn follow_output_recursively(&self, output: OutputSlotId) -> Result<Vec<OutputSlotId>> {
        let mut queue = VecDeque::from([output]);
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::new();

        while let Some(slot) = queue.pop_front() {
            if !seen.insert(slot) {
                continue;
            }
            let out = self.output_slot(slot)?;
            match self.container_of(out.owner())? {
                Some(container) if out.occupied_slots().is_empty() => {
                    queue.extend(self.container(container)?.follow_output(slot)?);
                }
                _ => resolved.push(slot),
            }
        }
        Ok(resolved)
    }

    /// Enter composites downstream from `input` until every resulting input is
    /// owned by an elementary operator. Alternatives contribute one branch each.
    pub fn follow_input_recursively(&self, input: InputSlotId) -> Result<Vec<InputSlotId>> {
        let mut queue = VecDeque::from([input]);
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::new();

        while let Some(slot) = queue.pop_front() {
            if !seen.insert(slot) {
                continue;
            }
            let owner = self.input_slot(slot)?.owner();
            let containers = self.inner_containers(owner)?;
            if containers.is_empty() {
                resolved.push(slot);
                continue;
            }
            for container in containers {
                queue.extend(self.container(container)?.follow_input(slot)?);
            }
        }
        Ok(resolved)
    }

    /// Enter composites upstream from `output` until every resulting output is
    /// owned by an elementary operator.
    pub fn trace_output_recursively(&self, output: OutputSlotId) -> Result<Vec<OutputSlotId>> {
        let mut queue = VecDeque::from([output]);
        let mut seen = BTreeSet::new();
        let mut resolved = Vec::new();

        while let Some(slot) = queue.pop_front() {
            if !seen.insert(slot) {
                continue;
            }
            let owner = self.output_slot(slot)?.owner();
            let containers = self.inner_containers(owner)?;
            if containers.is_empty() {
                resolved.push(slot);
                continue;
            }
            for container in containers {
                if let Some(inner) = self.container(container)?.trace_output(slot)? {
                    queue.push_back(inner);
                }
            }
        }
        Ok(resolved)
    }

    /// Containers directly inside `op`; empty for elementary operators.
    pub fn inner_containers(&self, op: OperatorId) -> Result<Vec<ContainerRef>> {
        Ok(match &self.operator(op)?.kind {
            OperatorKind::Elementary(_) => Vec::new(),
            OperatorKind::Subplan(_) => vec![ContainerRef::Subplan(op)],
            OperatorKind::Alternative(alts) => alts
                .alternatives()
                .iter()
                .map(|a| a.container_ref(op))
                .collect(),
        })
    }

    /// `op` followed by every enclosing composite, innermost first.
    pub fn collect_parents(&self, op: OperatorId) -> Result<Vec<OperatorId>> {
        let mut chain = vec![op];
        let mut current = op;
        while let Some(parent) = self.parent(current)? {
            if chain.len() > self.config().max_nesting_depth {
                return Err(Error::Invariant(format!(
                    "container chain of {} does not terminate",
                    self.label(op)
                )));
            }
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// Human-readable nesting path, e.g. `sort#3 < alternative#5 < subplan#9`.
    pub fn describe_nesting(&self, op: OperatorId) -> String {
        match self.collect_parents(op) {
            Ok(chain) => chain
                .into_iter()
                .map(|o| self.label(o))
                .collect::<Vec<_>>()
                .join(" < "),
            Err(_) => format!("{} < ...", self.label(op)),
        }
    }

    /// Top-level operators without outputs.
    pub fn top_level_sinks(&self) -> Vec<OperatorId> {
        self.top_level(|n| n.is_sink())
    }

    /// Top-level operators without inputs.
    pub fn top_level_sources(&self) -> Vec<OperatorId> {
        self.top_level(|n| n.is_source())
    }

    fn top_level(&self, pred: impl Fn(&OperatorNode) -> bool) -> Vec<OperatorId> {
        self.operator_ids()
            .filter_map(|id| self.operator(id).ok())
            .filter(|n| n.container().is_none() && pred(n))
            .map(|n| n.id())
            .collect()
    }

    /// Every operator `op` transitively consumes from, on its own nesting level,
    /// in breadth-first order.
    pub fn upstream_operators(&self, op: OperatorId) -> Result<Vec<OperatorId>> {
        let mut queue = VecDeque::from([op]);
        let mut seen = BTreeSet::from([op]);
        let mut order = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &slot in self.operator(current)?.inputs() {
                if let Some(occupant) = self.input_slot(slot)?.occupant() {
                    let producer = self.output_slot(occupant)?.owner();
                    if seen.insert(producer) {
                        order.push(producer);
                        queue.push_back(producer);
                    }
                }
            }
        }
        Ok(order)
    }
}

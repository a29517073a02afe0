//! Circuit graph structure.

use std::collections::HashMap;

use tracing::{trace, warn};

use super::node::{Node, Pin};
use super::types::{LogicValue, NodeId, PinRef};
use crate::error::{GatesimError, Result};

/// Outcome of re-evaluating a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Whether any output pin changed value
    pub changed: bool,
    /// Owners of the input pins that received a changed value, one entry per
    /// wire (a node wired twice appears twice)
    pub driven: Vec<NodeId>,
}

/// Outcome of a relaxation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relaxation {
    /// Rounds executed, including the final quiet round when converged
    pub rounds: usize,
    /// Whether a full round produced no output changes
    pub converged: bool,
}

/// An owned collection of nodes plus the wiring between their pins.
///
/// Nodes live in a map keyed by their stable id; a separate list keeps
/// insertion order, which relaxation walks. Wires are stored on the pins
/// themselves as [`PinRef`] pairs.
#[derive(Debug, Default)]
pub struct Circuit {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. Returns its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            warn!(node = %id, "node already in circuit, ignoring duplicate add");
            return id;
        }
        self.nodes.insert(id, node);
        self.order.push(id);
        id
    }

    /// Remove a node, first severing every wire on its pins.
    ///
    /// Returns the removed node, or `None` if it was not in the circuit.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let pins: Vec<(PinRef, Vec<PinRef>)> = self
            .nodes
            .get(&id)?
            .pins()
            .map(|p| (p.pin_ref(), p.connections().to_vec()))
            .collect();

        for (pin, peers) in pins {
            for peer in peers {
                self.unlink(pin, peer);
            }
        }

        self.order.retain(|n| *n != id);
        self.nodes.remove(&id)
    }

    /// Wire two pins together.
    ///
    /// Returns `Ok(false)` without touching anything when `a == b` or the
    /// pins are already connected. Directionality is not checked here; see
    /// [`validate_connection`](super::validate_connection).
    pub fn connect(&mut self, a: PinRef, b: PinRef) -> Result<bool> {
        self.require_pin(a)?;
        self.require_pin(b)?;
        if a == b || self.is_connected(a, b) {
            return Ok(false);
        }
        if let Some(pin) = self.pin_mut(a) {
            pin.connections.push(b);
        }
        if let Some(pin) = self.pin_mut(b) {
            pin.connections.push(a);
        }
        Ok(true)
    }

    /// Remove the wire between two pins. Returns `Ok(false)` if there was none.
    pub fn disconnect(&mut self, a: PinRef, b: PinRef) -> Result<bool> {
        self.require_pin(a)?;
        self.require_pin(b)?;
        Ok(self.unlink(a, b))
    }

    /// Whether `a` lists `b` as a peer.
    pub fn is_connected(&self, a: PinRef, b: PinRef) -> bool {
        self.pin(a).map_or(false, |p| p.is_connected_to(&b))
    }

    fn unlink(&mut self, a: PinRef, b: PinRef) -> bool {
        let mut removed = false;
        if let Some(pin) = self.pin_mut(a) {
            let before = pin.connections.len();
            pin.connections.retain(|p| *p != b);
            removed |= pin.connections.len() != before;
        }
        if let Some(pin) = self.pin_mut(b) {
            pin.connections.retain(|p| *p != a);
        }
        removed
    }

    fn require_pin(&self, pin: PinRef) -> Result<()> {
        if self.pin(pin).is_some() {
            Ok(())
        } else {
            Err(GatesimError::PinNotFound { pin })
        }
    }

    /// Overwrite a single pin value without evaluating anything.
    pub fn set_pin_value(&mut self, pin: PinRef, value: LogicValue) -> Result<()> {
        self.pin_mut(pin)
            .ok_or(GatesimError::PinNotFound { pin })?
            .set_value(value);
        Ok(())
    }

    /// Copy every output pin's current value onto its peers.
    ///
    /// Wiring alone never moves values, so a freshly loaded circuit has
    /// undefined inputs even where the driver is settled. Returns the owners
    /// of every input pin written.
    pub fn sync_wires(&mut self) -> Vec<NodeId> {
        let writes: Vec<(LogicValue, PinRef)> = self
            .nodes()
            .flat_map(|n| n.outputs())
            .flat_map(|p| p.connections().iter().map(move |peer| (p.value(), *peer)))
            .collect();

        let mut driven = Vec::new();
        for (value, peer) in writes {
            if let Some(pin) = self.pin_mut(peer) {
                pin.set_value(value);
                if peer.is_input() && !driven.contains(&peer.node) {
                    driven.push(peer.node);
                }
            }
        }
        driven
    }

    /// Resolve a pin handle.
    pub fn pin(&self, pin: PinRef) -> Option<&Pin> {
        self.nodes.get(&pin.node)?.pin(pin.direction, pin.index)
    }

    fn pin_mut(&mut self, pin: PinRef) -> Option<&mut Pin> {
        self.nodes
            .get_mut(&pin.node)?
            .pin_mut(pin.direction, pin.index)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    /// First node (in insertion order) with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|n| n.name() == name).map(Node::id)
    }

    /// Ids of the nodes matching `pred`, sorted by display name.
    ///
    /// The sort is stable, so equal names keep insertion order.
    pub fn sorted_by_name(&self, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let mut matching: Vec<&Node> = self.nodes().filter(|n| pred(n)).collect();
        matching.sort_by(|a, b| a.name().cmp(b.name()));
        matching.into_iter().map(Node::id).collect()
    }

    /// Recompute one node and push changed outputs onto every connected pin.
    pub fn update(&mut self, id: NodeId) -> Result<Propagation> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GatesimError::NodeNotFound { node: id })?;

        let before = node.output_values();
        node.compute()?;

        let changed: Vec<(LogicValue, Vec<PinRef>)> = node
            .outputs()
            .iter()
            .zip(before)
            .filter(|(pin, old)| pin.value() != *old)
            .map(|(pin, _)| (pin.value(), pin.connections().to_vec()))
            .collect();

        let mut propagation = Propagation {
            changed: !changed.is_empty(),
            driven: Vec::new(),
        };

        for (value, peers) in changed {
            for peer in peers {
                if let Some(pin) = self.pin_mut(peer) {
                    pin.set_value(value);
                    if peer.is_input() {
                        propagation.driven.push(peer.node);
                    }
                }
            }
        }

        Ok(propagation)
    }

    /// Re-evaluate every node in insertion order, round after round, until a
    /// round changes nothing or `max_rounds` is reached.
    ///
    /// Changes propagate eagerly: later nodes in a round already see what
    /// earlier nodes produced in that round.
    pub fn relax(&mut self, max_rounds: usize) -> Result<Relaxation> {
        let order = self.order.clone();
        for round in 1..=max_rounds {
            let mut changes = false;
            for id in &order {
                changes |= self.update(*id)?.changed;
            }
            if !changes {
                trace!(round, "relaxation converged");
                return Ok(Relaxation {
                    rounds: round,
                    converged: true,
                });
            }
        }
        Ok(Relaxation {
            rounds: max_rounds,
            converged: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Gate, InputSwitch, OutputBulb};

    fn and_with_peers() -> (Circuit, NodeId, NodeId, NodeId) {
        let mut c = Circuit::new();
        let sw = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())));
        let and = c.add_node(Node::new(Gate::And));
        let bulb = c.add_node(Node::new(Gate::OutputBulb(OutputBulb::new())));
        c.connect(PinRef::output(sw, 0), PinRef::input(and, 0)).unwrap();
        c.connect(PinRef::output(and, 0), PinRef::input(bulb, 0)).unwrap();
        (c, sw, and, bulb)
    }

    #[test]
    fn test_connect_is_symmetric() {
        let (c, sw, and, _) = and_with_peers();
        let a = PinRef::output(sw, 0);
        let b = PinRef::input(and, 0);
        assert!(c.is_connected(a, b));
        assert!(c.is_connected(b, a));
    }

    #[test]
    fn test_connect_rejects_self_and_duplicates() {
        let (mut c, sw, and, _) = and_with_peers();
        let a = PinRef::output(sw, 0);
        assert!(!c.connect(a, a).unwrap());
        assert!(c.pin(a).unwrap().connections().len() == 1);

        assert!(!c.connect(a, PinRef::input(and, 0)).unwrap());
        assert_eq!(c.pin(a).unwrap().connections().len(), 1);
    }

    #[test]
    fn test_connect_missing_pin() {
        let (mut c, sw, _, _) = and_with_peers();
        let result = c.connect(PinRef::output(sw, 0), PinRef::input(NodeId::new(), 0));
        assert!(matches!(result, Err(GatesimError::PinNotFound { .. })));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let (mut c, sw, and, bulb) = and_with_peers();
        let a = PinRef::output(sw, 0);
        let b = PinRef::input(and, 0);

        assert!(c.disconnect(a, b).unwrap());
        assert!(!c.disconnect(a, b).unwrap());
        assert!(c.pin(a).unwrap().connections().is_empty());
        assert!(c.pin(b).unwrap().connections().is_empty());

        // unrelated wire untouched
        assert!(c.is_connected(PinRef::output(and, 0), PinRef::input(bulb, 0)));
    }

    #[test]
    fn test_remove_node_leaves_no_dangling_peers() {
        let (mut c, sw, and, bulb) = and_with_peers();
        let sw2 = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())));
        c.connect(PinRef::output(sw2, 0), PinRef::input(and, 1)).unwrap();

        let removed = c.remove_node(and).unwrap();
        assert_eq!(removed.id(), and);
        assert!(!c.contains(and));
        assert_eq!(c.node_ids(), &[sw, bulb, sw2]);

        for node in c.nodes() {
            for pin in node.pins() {
                assert!(pin.connections().iter().all(|p| p.node != and));
            }
        }
        assert!(c.remove_node(and).is_none());
    }

    #[test]
    fn test_update_reports_driven_inputs() {
        let (mut c, sw, and, _) = and_with_peers();
        let p = c.update(sw).unwrap();
        // the switch already drives LOW from construction
        assert!(!p.changed);

        if let Gate::InputSwitch(s) = c.node_mut(sw).unwrap().gate_mut() {
            s.toggle();
        }
        let p = c.update(sw).unwrap();
        assert!(p.changed);
        assert_eq!(p.driven, vec![and]);
        assert_eq!(
            c.pin(PinRef::input(and, 0)).unwrap().value(),
            LogicValue::High
        );
    }

    #[test]
    fn test_sorted_by_name_is_stable() {
        let mut c = Circuit::new();
        let b = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())).named("B"));
        let a1 = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())).named("A"));
        let a2 = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::new())).named("A"));
        c.add_node(Node::new(Gate::Not).named("0"));
        let sorted = c.sorted_by_name(|n| matches!(n.gate(), Gate::InputSwitch(_)));
        assert_eq!(sorted, vec![a1, a2, b]);
    }

    #[test]
    fn test_sync_wires_pushes_driver_values() {
        let (mut c, sw, and, _) = and_with_peers();
        assert_eq!(
            c.pin(PinRef::input(and, 0)).unwrap().value(),
            LogicValue::Undefined
        );
        let driven = c.sync_wires();
        assert!(driven.contains(&and));
        assert_eq!(
            c.pin(PinRef::input(and, 0)).unwrap().value(),
            c.pin(PinRef::output(sw, 0)).unwrap().value()
        );
    }

    #[test]
    fn test_relax_settles_chain() {
        let (mut c, _, and, bulb) = and_with_peers();
        let sw2 = c.add_node(Node::new(Gate::InputSwitch(InputSwitch::with_state(true))));
        c.connect(PinRef::output(sw2, 0), PinRef::input(and, 1)).unwrap();

        let r = c.relax(100).unwrap();
        assert!(r.converged);
        assert_eq!(
            c.node(and).unwrap().output_values(),
            vec![LogicValue::Low]
        );
        match c.node(bulb).unwrap().gate() {
            Gate::OutputBulb(b) => assert!(!b.is_active()),
            _ => unreachable!(),
        }
    }
}

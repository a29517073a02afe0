//! Pins and nodes.

use super::types::{LogicValue, NodeId, PinDirection, PinRef};
use crate::components::Gate;
use crate::error::{GatesimError, Result};

/// A single signal terminal on a node.
///
/// Connections are symmetric: if this pin lists a peer, the peer lists this
/// pin. Only [`Circuit`](super::Circuit) edits connection sets, so the
/// symmetry is maintained in one place.
#[derive(Debug, Clone)]
pub struct Pin {
    owner: NodeId,
    direction: PinDirection,
    index: usize,
    value: LogicValue,
    pub(super) connections: Vec<PinRef>,
}

impl Pin {
    fn new(owner: NodeId, direction: PinDirection, index: usize) -> Self {
        Self {
            owner,
            direction,
            index,
            value: LogicValue::Undefined,
            connections: Vec::new(),
        }
    }

    /// Handle to this pin.
    pub fn pin_ref(&self) -> PinRef {
        PinRef {
            node: self.owner,
            direction: self.direction,
            index: self.index,
        }
    }

    pub fn node(&self) -> NodeId {
        self.owner
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> LogicValue {
        self.value
    }

    /// Unconditional overwrite. With several drivers on one input the last
    /// write wins.
    pub fn set_value(&mut self, value: LogicValue) {
        self.value = value;
    }

    /// Pins this pin is wired to.
    pub fn connections(&self) -> &[PinRef] {
        &self.connections
    }

    pub fn is_connected_to(&self, other: &PinRef) -> bool {
        self.connections.contains(other)
    }
}

/// A gate instance placed in a circuit.
///
/// The pin lists are sized from the gate's arity at construction and are
/// never reordered: pin indices are part of the document wire schema.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    /// Canvas position, carried through documents untouched
    pub position: (f64, f64),
    gate: Gate,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
}

impl Node {
    /// Create a node with a fresh id and the gate's default name.
    pub fn new(gate: Gate) -> Self {
        Self::with_id(NodeId::new(), gate)
    }

    /// Create a node with a known id (used when loading documents).
    pub fn with_id(id: NodeId, gate: Gate) -> Self {
        let inputs = (0..gate.input_count())
            .map(|i| Pin::new(id, PinDirection::Input, i))
            .collect();
        let outputs = (0..gate.output_count())
            .map(|i| Pin::new(id, PinDirection::Output, i))
            .collect();
        let mut node = Self {
            id,
            name: gate.default_name().to_string(),
            position: (0.0, 0.0),
            gate,
            inputs,
            outputs,
        };
        // Switches drive their commanded state from the moment they exist.
        if let Gate::InputSwitch(switch) = &node.gate {
            node.outputs[0].set_value(switch.state());
        }
        node
    }

    /// Builder-style display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder-style canvas position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = (x, y);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Swapping in a gate of another arity leaves the pin lists stale, so
    /// this stays inside the crate.
    pub(crate) fn gate_mut(&mut self) -> &mut Gate {
        &mut self.gate
    }

    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    /// Look up one of this node's pins.
    pub fn pin(&self, direction: PinDirection, index: usize) -> Option<&Pin> {
        match direction {
            PinDirection::Input => self.inputs.get(index),
            PinDirection::Output => self.outputs.get(index),
        }
    }

    pub(super) fn pin_mut(&mut self, direction: PinDirection, index: usize) -> Option<&mut Pin> {
        match direction {
            PinDirection::Input => self.inputs.get_mut(index),
            PinDirection::Output => self.outputs.get_mut(index),
        }
    }

    /// Every pin, inputs first.
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    pub fn input_values(&self) -> Vec<LogicValue> {
        self.inputs.iter().map(Pin::value).collect()
    }

    pub fn output_values(&self) -> Vec<LogicValue> {
        self.outputs.iter().map(Pin::value).collect()
    }

    /// Directly drive an input pin, bypassing wires.
    pub fn set_input(&mut self, index: usize, value: LogicValue) -> Result<()> {
        let pin_ref = PinRef::input(self.id, index);
        let pin = self
            .inputs
            .get_mut(index)
            .ok_or(GatesimError::PinNotFound { pin: pin_ref })?;
        pin.set_value(value);
        Ok(())
    }

    /// Recompute output pin values from the current input pin values.
    ///
    /// Idempotent for unchanged inputs, apart from the state a gate keeps on
    /// purpose (switch command, bulb activity, custom gate internals).
    pub fn compute(&mut self) -> Result<()> {
        let inputs = self.input_values();
        let values = self
            .gate
            .evaluate(&inputs)
            .map_err(|message| GatesimError::evaluation(&self.name, message))?;

        if values.len() != self.outputs.len() {
            return Err(GatesimError::evaluation(
                &self.name,
                format!(
                    "gate produced {} values for {} output pins",
                    values.len(),
                    self.outputs.len()
                ),
            ));
        }

        for (pin, value) in self.outputs.iter_mut().zip(values) {
            pin.set_value(value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Gate, InputSwitch};

    #[test]
    fn test_pins_sized_from_gate() {
        let and = Node::new(Gate::And);
        assert_eq!(and.inputs().len(), 2);
        assert_eq!(and.outputs().len(), 1);
        assert_eq!(and.name(), "AND");
        assert_eq!(and.inputs()[1].pin_ref(), PinRef::input(and.id(), 1));
        assert!(and.pins().all(|p| p.value() == LogicValue::Undefined));
    }

    #[test]
    fn test_switch_drives_initial_state() {
        let sw = Node::new(Gate::InputSwitch(InputSwitch::new()));
        assert_eq!(sw.outputs()[0].value(), LogicValue::Low);
    }

    #[test]
    fn test_compute_writes_outputs() {
        let mut not = Node::new(Gate::Not).named("inv");
        not.set_input(0, LogicValue::High).unwrap();
        not.compute().unwrap();
        assert_eq!(not.output_values(), vec![LogicValue::Low]);

        // unchanged inputs give unchanged outputs
        not.compute().unwrap();
        assert_eq!(not.output_values(), vec![LogicValue::Low]);
    }

    #[test]
    fn test_set_input_out_of_range() {
        let mut not = Node::new(Gate::Not);
        assert!(matches!(
            not.set_input(3, LogicValue::High),
            Err(GatesimError::PinNotFound { .. })
        ));
    }
}

//! Custom gates: user-defined components backed by a nested circuit.
//!
//! A custom gate's external input pins drive the internal input switches and
//! its external output pins read the internal output bulbs. Both mappings
//! pair pin ordinals with switches/bulbs sorted by name.
//!
//! Every evaluation relaxes the internal circuit: all internal nodes are
//! recomputed in insertion order, round after round, until a round changes
//! nothing or the round cap is hit. An internally oscillating chip therefore
//! costs at most `max_rounds` rounds per evaluation.

use tracing::{debug, warn};

use super::Gate;
use crate::circuit::{Circuit, LogicValue, NodeId, Relaxation};
use crate::document::{ChipSource, CircuitDocument, Loader};
use crate::error::Result;

/// Default cap on relaxation rounds per evaluation.
pub const MAX_RELAXATION_ROUNDS: usize = 100;

/// A gate whose behaviour is a nested circuit.
#[derive(Debug)]
pub struct CustomGate {
    chip_name: String,
    circuit: Circuit,
    input_nodes: Vec<NodeId>,
    output_nodes: Vec<NodeId>,
    input_count: usize,
    output_count: usize,
    max_rounds: usize,
    last_relaxation: Option<Relaxation>,
}

impl CustomGate {
    /// Build a custom gate from a chip definition.
    ///
    /// Nested custom gates inside the definition are looked up in `source`.
    pub fn new(name: &str, chip: &CircuitDocument, source: &dyn ChipSource) -> Result<Self> {
        Loader::new(source).build_chip(name, chip)
    }

    /// Wrap an already built circuit with `input_count` inputs and
    /// `output_count` outputs.
    ///
    /// A pin count that differs from the number of internal switches or
    /// bulbs is tolerated: surplus pins on either side stay unmapped.
    pub fn from_circuit(
        name: &str,
        mut circuit: Circuit,
        input_count: usize,
        output_count: usize,
    ) -> Self {
        // switches drive from construction, but wiring alone moves no values
        circuit.sync_wires();
        let input_nodes = circuit.sorted_by_name(|n| n.gate().is_switch());
        let output_nodes = circuit.sorted_by_name(|n| n.gate().is_bulb());

        if input_nodes.len() != input_count {
            warn!(
                chip = name,
                pins = input_count,
                switches = input_nodes.len(),
                "custom gate input count mismatch"
            );
        }
        if output_nodes.len() != output_count {
            warn!(
                chip = name,
                pins = output_count,
                bulbs = output_nodes.len(),
                "custom gate output count mismatch"
            );
        }

        Self {
            chip_name: name.to_string(),
            circuit,
            input_nodes,
            output_nodes,
            input_count,
            output_count,
            max_rounds: MAX_RELAXATION_ROUNDS,
            last_relaxation: None,
        }
    }

    /// Override the relaxation round cap.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn chip_name(&self) -> &str {
        &self.chip_name
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// The nested circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Internal switches in external input pin order.
    pub fn input_nodes(&self) -> &[NodeId] {
        &self.input_nodes
    }

    /// Internal bulbs in external output pin order.
    pub fn output_nodes(&self) -> &[NodeId] {
        &self.output_nodes
    }

    /// Relaxation result of the most recent evaluation.
    pub fn last_relaxation(&self) -> Option<Relaxation> {
        self.last_relaxation
    }

    pub(super) fn evaluate(
        &mut self,
        inputs: &[LogicValue],
    ) -> std::result::Result<Vec<LogicValue>, String> {
        for (value, id) in inputs.iter().zip(&self.input_nodes) {
            if let Some(Gate::InputSwitch(switch)) = self.circuit.node_mut(*id).map(|n| n.gate_mut()) {
                switch.drive(*value);
            }
        }

        let relaxation = self
            .circuit
            .relax(self.max_rounds)
            .map_err(|e| format!("in chip '{}': {e}", self.chip_name))?;
        if !relaxation.converged {
            debug!(
                chip = %self.chip_name,
                rounds = relaxation.rounds,
                "custom gate did not settle"
            );
        }
        self.last_relaxation = Some(relaxation);

        // Outputs are always defined: a bulb is either lit or not.
        let outputs = (0..self.output_count)
            .map(|i| {
                match self
                    .output_nodes
                    .get(i)
                    .and_then(|id| self.circuit.node(*id))
                    .map(|n| n.gate())
                {
                    Some(Gate::OutputBulb(bulb)) => LogicValue::from_bool(bulb.is_active()),
                    _ => LogicValue::Undefined,
                }
            })
            .collect();
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Node, PinRef};
    use crate::components::{InputSwitch, OutputBulb};
    use crate::document::{export_chip, NoChips};
    use LogicValue::{High, Low, Undefined};

    fn switch(name: &str) -> Node {
        Node::new(Gate::InputSwitch(InputSwitch::new())).named(name)
    }

    fn bulb(name: &str) -> Node {
        Node::new(Gate::OutputBulb(OutputBulb::new())).named(name)
    }

    /// Switches "A", "B" through a single AND into bulb "OUT".
    fn and_chip() -> CustomGate {
        let mut c = Circuit::new();
        let a = c.add_node(switch("A"));
        let b = c.add_node(switch("B"));
        let and = c.add_node(Node::new(Gate::And));
        let out = c.add_node(bulb("OUT"));
        c.connect(PinRef::output(a, 0), PinRef::input(and, 0)).unwrap();
        c.connect(PinRef::output(b, 0), PinRef::input(and, 1)).unwrap();
        c.connect(PinRef::output(and, 0), PinRef::input(out, 0)).unwrap();
        CustomGate::from_circuit("AND2", c, 2, 1)
    }

    #[test]
    fn test_and_chip_high_high() {
        let mut gate = and_chip();
        assert_eq!(gate.evaluate(&[High, High]).unwrap(), vec![High]);
        let r = gate.last_relaxation().unwrap();
        assert!(r.converged);
        assert!(r.rounds <= 2);
    }

    #[test]
    fn test_and_chip_high_low() {
        let mut gate = and_chip();
        assert_eq!(gate.evaluate(&[High, Low]).unwrap(), vec![Low]);
        // and back again: the chip keeps its internal state between calls
        assert_eq!(gate.evaluate(&[High, High]).unwrap(), vec![High]);
        assert_eq!(gate.evaluate(&[Low, High]).unwrap(), vec![Low]);
    }

    #[test]
    fn test_outputs_never_undefined() {
        let mut gate = and_chip();
        assert_eq!(gate.evaluate(&[Undefined, Undefined]).unwrap(), vec![Low]);
    }

    #[test]
    fn test_pins_follow_sorted_names() {
        // inserted out of order: "Z" then "A"
        let mut c = Circuit::new();
        let z = c.add_node(switch("Z"));
        let a = c.add_node(switch("A"));
        let bz = c.add_node(bulb("out_z"));
        let ba = c.add_node(bulb("out_a"));
        c.connect(PinRef::output(z, 0), PinRef::input(bz, 0)).unwrap();
        c.connect(PinRef::output(a, 0), PinRef::input(ba, 0)).unwrap();

        let mut gate = CustomGate::from_circuit("PASS", c, 2, 2);
        assert_eq!(gate.input_nodes(), &[a, z]);
        assert_eq!(gate.output_nodes(), &[ba, bz]);

        // pin 0 is "A" -> "out_a" (pin 0)
        assert_eq!(gate.evaluate(&[High, Low]).unwrap(), vec![High, Low]);
        assert_eq!(gate.evaluate(&[Low, High]).unwrap(), vec![Low, High]);
    }

    #[test]
    fn test_oscillating_chip_stops_at_round_cap() {
        let mut c = Circuit::new();
        let not = c.add_node(Node::new(Gate::Not));
        let out = c.add_node(bulb("OUT"));
        c.connect(PinRef::output(not, 0), PinRef::input(not, 0)).unwrap();
        c.connect(PinRef::output(not, 0), PinRef::input(out, 0)).unwrap();

        let mut gate = CustomGate::from_circuit("RING", c, 0, 1);
        let outputs = gate.evaluate(&[]).unwrap();
        let r = gate.last_relaxation().unwrap();
        assert_eq!(r.rounds, MAX_RELAXATION_ROUNDS);
        assert!(!r.converged);
        assert_eq!(outputs.len(), 1);
        assert!(outputs[0].is_defined());

        let mut capped = CustomGate::from_circuit("RING", Circuit::new(), 0, 0).with_max_rounds(7);
        capped.evaluate(&[]).unwrap();
        // empty circuit settles on the first round
        assert_eq!(capped.last_relaxation().unwrap().rounds, 1);
    }

    #[test]
    fn test_pin_count_mismatch_degrades() {
        let mut c = Circuit::new();
        let a = c.add_node(switch("A"));
        let out = c.add_node(bulb("OUT"));
        c.connect(PinRef::output(a, 0), PinRef::input(out, 0)).unwrap();

        // three declared inputs for one switch, two outputs for one bulb
        let mut gate = CustomGate::from_circuit("WIDE", c, 3, 2);
        assert_eq!(gate.evaluate(&[High, Low, Low]).unwrap(), vec![High, Undefined]);
    }

    #[test]
    fn test_new_from_exported_chip() {
        let mut c = Circuit::new();
        let a = c.add_node(switch("IN"));
        let not = c.add_node(Node::new(Gate::Not));
        let out = c.add_node(bulb("OUT"));
        c.connect(PinRef::output(a, 0), PinRef::input(not, 0)).unwrap();
        c.connect(PinRef::output(not, 0), PinRef::input(out, 0)).unwrap();
        let doc = export_chip(&c, "INV");

        let mut gate = CustomGate::new("INV", &doc, &NoChips).unwrap();
        assert_eq!(gate.chip_name(), "INV");
        assert_eq!(gate.input_count(), 1);
        assert_eq!(gate.evaluate(&[High]).unwrap(), vec![Low]);
        assert_eq!(gate.evaluate(&[Low]).unwrap(), vec![High]);
    }
}
